use crate::command::{
    CommandFactory, EXIT_CLEAN, EXIT_FAILURE, EXIT_READ_ERROR, ExitCode, Stdin, Stdout,
};
use crate::config::Config;
use crate::env::Environment;
use crate::error::ShellError;
use crate::io_adapters::{LineSource, PlainInput, ReadOutcome};
use crate::job;
use crate::lexer;
use rustyline::DefaultEditor;
use std::io::{self, BufReader, IsTerminal, Read};
use std::process::Stdio;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only commands defined in this crate have factories: the builtins,
/// `bookmark` and external programs.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive shell: reads lines, dispatches them and supervises the children.
///
/// The interpreter owns the session [`Environment`] and an ordered list of
/// [`CommandFactory`] objects. Each line goes to the first factory that recognizes
/// its command name, so the order of the list is the classification order.
///
/// Example
/// ```no_run
/// use lokishell::{Config, Interpreter};
/// let mut sh = Interpreter::new(Config::default());
/// std::process::exit(sh.repl());
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    prompt: String,
    last_status: ExitCode,
}

impl Interpreter {
    /// Start a session from the process environment, loading bookmarks per `config`.
    pub fn new(config: Config) -> Self {
        let env = Environment::new(&config);
        Self::with_env(env, config.prompt)
    }

    /// Create an interpreter over an existing session with the default commands:
    /// `exit`/`quit`, `cd`, `bookmark`, then external programs.
    pub fn with_env(env: Environment, prompt: impl Into<String>) -> Self {
        use crate::builtin::{BookmarkCommand, Cd, Exit};
        use crate::external::ExternalCommand;
        Self::with_commands(
            env,
            prompt,
            vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<BookmarkCommand>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }

    /// Create an interpreter with a custom set of command factories.
    pub fn with_commands(
        env: Environment,
        prompt: impl Into<String>,
        commands: Vec<Box<dyn CommandFactory>>,
    ) -> Self {
        Self {
            env,
            commands,
            prompt: prompt.into(),
            last_status: 0,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Exit code of the last dispatched line; 1 if it could not be run.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Tokenize and run one line with the terminal as standard output.
    pub fn execute_line(&mut self, line: &str) -> anyhow::Result<ExitCode> {
        self.execute_line_with_output(line, Box::new(io::stdout()))
    }

    /// Tokenize and run one line, giving builtins `stdout` to print to.
    ///
    /// A blank line does nothing and succeeds.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        stdout: Box<dyn Stdout>,
    ) -> anyhow::Result<ExitCode> {
        let line = lexer::split_into_tokens(line, self.env.max_line)?;
        let Some(name) = line.name() else {
            return Ok(0);
        };

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, &line)? {
                return cmd.execute(Box::new(InheritedStdin), stdout, &mut self.env);
            }
        }
        Err(ShellError::CommandNotFound(name.to_string()).into())
    }

    /// Run the read-dispatch loop until end of input, `exit`, or a read failure.
    ///
    /// Errors of single commands are printed and the loop goes on. Bookmarks are
    /// saved once when the loop ends; a failed save is reported but does not
    /// change the returned status.
    pub fn run_with<S: LineSource + ?Sized>(&mut self, source: &mut S) -> ExitCode {
        let code = loop {
            job::reap_finished(&mut self.env.background);

            let line = match source.read_line(&self.prompt) {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::Eof) => break EXIT_CLEAN,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    report(&anyhow::Error::new(ShellError::Input(e)));
                    break EXIT_READ_ERROR;
                }
            };

            self.last_status = match self.execute_line(&line) {
                Ok(code) => code,
                Err(e) => {
                    report(&e);
                    EXIT_FAILURE
                }
            };

            if self.env.should_exit {
                break self.env.exit_code;
            }
        };

        if let Err(e) = self.env.bookmarks.save() {
            log::warn!("{}", e);
        }
        code
    }

    /// Run the loop on standard input, with line editing when it is a terminal.
    pub fn repl(&mut self) -> ExitCode {
        if io::stdin().is_terminal() {
            match DefaultEditor::new() {
                Ok(mut editor) => return self.run_with(&mut editor),
                Err(e) => log::warn!("line editing unavailable: {}", e),
            }
        }
        self.run_with(&mut PlainInput::new(BufReader::new(io::stdin())))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn report(e: &anyhow::Error) {
    eprintln!("lokishell: {:#}", e);
}

/// The shell's own standard input, passed through to children unchanged.
struct InheritedStdin;

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}
