//! Process supervision: starting a child with its redirections and waiting on it.

use crate::command::{EXIT_FAILURE, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use crate::parser::{Redirect, RedirectKind, split_redirect};
use nix::errno::Errno;
use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

/// Whether the shell waits for a job before prompting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// The shell blocks until the child exits.
    Foreground,
    /// Fire and forget: the child gets `/dev/null` for every stream it does not
    /// redirect and the prompt returns at once.
    Background,
}

/// A program ready to be started, with at most one redirection.
#[derive(Debug)]
pub struct Job {
    program: PathBuf,
    argv: Vec<String>,
    mode: JobMode,
    redirect: Option<Redirect>,
}

impl Job {
    /// Prepare a job, taking a trailing `<op> <file>` pair off `argv`.
    pub fn new(program: PathBuf, mut argv: Vec<String>, mode: JobMode) -> Result<Self, ShellError> {
        let redirect = split_redirect(&mut argv)?;
        Ok(Self {
            program,
            argv,
            mode,
            redirect,
        })
    }

    /// Create the child process.
    ///
    /// A foreground job is waited for and its exit code returned. A background
    /// job is handed to `env.background` for later reaping and reports 0.
    pub fn start(
        self,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        let background = self.mode == JobMode::Background;
        let (mut child_in, mut child_out, mut child_err) = if background {
            (Stdio::null(), Stdio::null(), Stdio::null())
        } else {
            (stdin.stdio(), stdout.stdio(), Stdio::inherit())
        };

        // The redirection wins for the stream it targets.
        if let Some(redirect) = &self.redirect {
            let path = env.current_dir.join(&redirect.target);
            let file = redirect
                .kind
                .open(&path)
                .map_err(|source| ShellError::RedirectFailed { path, source })?;
            match redirect.kind {
                RedirectKind::Input => child_in = file.into(),
                RedirectKind::Output | RedirectKind::Append => child_out = file.into(),
                RedirectKind::Stderr => child_err = file.into(),
            }
        }

        let mut cmd = Command::new(&self.program);
        if let Some((name, args)) = self.argv.split_first() {
            cmd.arg0(name).args(args);
        }
        cmd.envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .stdin(child_in)
            .stdout(child_out)
            .stderr(child_err);

        let mut child = cmd.spawn().map_err(|e| spawn_error(&self.program, e))?;
        let pid = child.id();

        match self.mode {
            JobMode::Background => {
                log::info!("[{}] {} started in background", pid, self.program.display());
                env.background.push(child);
                Ok(0)
            }
            JobMode::Foreground => {
                log::debug!("waiting for foreground process {}", pid);
                match child.wait() {
                    Ok(status) => Ok(exit_code(pid, status)),
                    Err(e) => {
                        log::warn!("Foreground process {} did not exit normally: {}", pid, e);
                        Ok(EXIT_FAILURE)
                    }
                }
            }
        }
    }
}

/// Drop background children that have exited, without blocking.
pub fn reap_finished(children: &mut Vec<Child>) {
    children.retain_mut(|child| match child.try_wait() {
        Ok(Some(status)) => {
            log::debug!("background process {} finished: {}", child.id(), status);
            false
        }
        Ok(None) => true,
        Err(e) => {
            log::debug!("cannot query background process {}: {}", child.id(), e);
            false
        }
    });
}

fn spawn_error(program: &std::path::Path, e: io::Error) -> ShellError {
    let exec_failed = matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || e.raw_os_error() == Some(Errno::ENOEXEC as i32);

    if exec_failed {
        ShellError::ExecFailed {
            path: program.to_path_buf(),
            source: e,
        }
    } else {
        ShellError::ProcessCreationFailed(e)
    }
}

fn exit_code(pid: u32, status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => {
            log::warn!("Foreground process {} did not exit normally: {}", pid, status);
            terminated_by_signal(status)
        }
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}
