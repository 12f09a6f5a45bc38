use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::{Environment, SearchPath};
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::job::{Job, JobMode};
use crate::lexer::TokenizedLine;
use crate::parser::join_quoted;
use anyhow::Result;
use nix::unistd::{AccessFlags, access};
use std::path::{Path, PathBuf};

/// How a command name is turned into an executable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// `./name`: joined onto the current directory, prefix stripped.
    Local(&'a str),
    /// Any other name containing a `/`: used as is, relative to the current directory.
    Direct(&'a Path),
    /// A bare name, looked up in the search path.
    Search(&'a str),
}

impl<'a> Invocation<'a> {
    pub fn classify(name: &'a str) -> Self {
        if let Some(stripped) = name.strip_prefix("./") {
            Invocation::Local(stripped)
        } else if name.contains('/') {
            Invocation::Direct(Path::new(name))
        } else {
            Invocation::Search(name)
        }
    }
}

/// Resolve a command name the way the shell runs it.
///
/// Local and direct invocations are not checked for existence; a bad path
/// surfaces when the program is started. Bare names take the first search path
/// directory holding an executable file of that name.
pub fn resolve_command(
    search_path: &SearchPath,
    current_dir: &Path,
    name: &str,
) -> Result<PathBuf, ShellError> {
    match Invocation::classify(name) {
        Invocation::Local(stripped) => Ok(current_dir.join(stripped)),
        Invocation::Direct(path) => Ok(current_dir.join(path)),
        Invocation::Search("") => Err(ShellError::CommandNotFound(name.to_string())),
        Invocation::Search(cmd) => {
            find_in_path(search_path, cmd).ok_or_else(|| ShellError::CommandNotFound(name.to_string()))
        }
    }
}

fn find_in_path(search_path: &SearchPath, cmd: &str) -> Option<PathBuf> {
    search_path
        .iter()
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

/// Command that is not a builtin.
pub struct ExternalCommand {
    program: PathBuf,
    argv: Vec<String>,
    mode: JobMode,
}

impl ExternalCommand {
    /// Resolve `argv[0]` and prepare the command.
    pub fn resolve(env: &Environment, argv: Vec<String>, background: bool) -> Result<Self, ShellError> {
        let name = argv.first().map(String::as_str).unwrap_or_default();
        let program = resolve_command(&env.search_path, &env.current_dir, name)?;
        log::debug!("{} resolved to {}", name, program.display());
        Ok(Self {
            program,
            argv,
            mode: if background {
                JobMode::Background
            } else {
                JobMode::Foreground
            },
        })
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        line: &TokenizedLine,
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        if line.args.is_empty() {
            return Ok(None);
        }
        let argv = join_quoted(line.args.clone(), env.max_line)?;
        let cmd = ExternalCommand::resolve(env, argv, line.background)?;
        Ok(Some(Box::new(cmd)))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let job = Job::new(self.program, self.argv, self.mode)?;
        Ok(job.start(stdin, stdout, env)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn make_file(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").expect("write file");
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
    }

    #[test]
    fn test_classify() {
        assert_eq!(Invocation::classify("./run.sh"), Invocation::Local("run.sh"));
        assert_eq!(Invocation::classify("ls"), Invocation::Search("ls"));
        assert_eq!(
            Invocation::classify("/bin/ls"),
            Invocation::Direct(Path::new("/bin/ls"))
        );
        assert_eq!(
            Invocation::classify("bin/tool"),
            Invocation::Direct(Path::new("bin/tool"))
        );
    }

    #[test]
    fn test_local_invocation_joins_current_dir_without_checking() {
        let found = resolve_command(&SearchPath::default(), Path::new("/work"), "./missing").unwrap();
        assert_eq!(found, PathBuf::from("/work/missing"));
    }

    #[test]
    fn test_absolute_path_is_kept() {
        let found = resolve_command(&SearchPath::default(), Path::new("/work"), "/bin/sh").unwrap();
        assert_eq!(found, PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_single_component_found_in_path() {
        let found = resolve_command(&SearchPath::from_dirs(["/bin"]), Path::new("/"), "sh")
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found, PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_not_found_in_path() {
        let err = resolve_command(
            &SearchPath::from_dirs(["/bin", "/usr/bin"]),
            Path::new("/"),
            "surely-no-such-command-here",
        )
        .unwrap_err();
        assert!(matches!(err, ShellError::CommandNotFound(name) if name == "surely-no-such-command-here"));
    }

    #[test]
    fn test_first_match_in_search_order_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(&first.path().join("tool"), 0o755);
        make_file(&second.path().join("tool"), 0o755);

        let path = SearchPath::from_dirs([first.path(), second.path()]);
        let found = resolve_command(&path, Path::new("/"), "tool").unwrap();
        assert_eq!(found, first.path().join("tool"));
    }

    #[test]
    fn test_non_executable_candidates_are_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(&first.path().join("tool"), 0o644);
        fs::create_dir(second.path().join("tool")).unwrap();

        let path = SearchPath::from_dirs([first.path(), second.path()]);
        let err = resolve_command(&path, Path::new("/"), "tool").unwrap_err();
        assert!(matches!(err, ShellError::CommandNotFound(_)));
    }

    #[test]
    fn test_empty_name_is_not_found() {
        let err = resolve_command(&SearchPath::from_dirs(["/bin"]), Path::new("/"), "").unwrap_err();
        assert!(matches!(err, ShellError::CommandNotFound(_)));
    }
}
