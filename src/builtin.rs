use crate::command::{CommandFactory, EXIT_QUIT, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::interpreter::Factory;
use crate::lexer::TokenizedLine;
use crate::parser::join_quoted;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Other words that invoke the same command.
    fn aliases() -> &'static [&'static str] {
        &[]
    }

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        <T as BuiltinCommand>::execute(*self, &mut stdin, &mut stdout, env)
    }
}

/// Help text or a parse error produced by `argh` instead of a command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.is_error {
            eprintln!("{}", self.output.trim_end());
            Ok(1)
        } else {
            writeln!(stdout, "{}", self.output.trim_end())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        env: &Environment,
        line: &TokenizedLine,
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        let Some(name) = line.name() else {
            return Ok(None);
        };
        if name != T::name() && !T::aliases().contains(&name) {
            return Ok(None);
        }

        let args = join_quoted(line.args.clone(), env.max_line)?;
        let args: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
        Ok(Some(match T::from_args(&[name], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }))
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => PathBuf::from(env.get_var("HOME").ok_or(ShellError::HomeNotSet)?),
        };

        let new_dir = env.current_dir.join(target);
        let canonical = fs::canonicalize(&new_dir).map_err(|source| {
            ShellError::DirectoryChangeFailed {
                path: new_dir.clone(),
                source,
            }
        })?;

        env::set_current_dir(&canonical).map_err(|source| ShellError::DirectoryChangeFailed {
            path: canonical.clone(),
            source,
        })?;
        log::debug!("cd {}", canonical.display());
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit shell process, saving bookmarks first.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn aliases() -> &'static [&'static str] {
        &["quit"]
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        env.exit_code = EXIT_QUIT;
        Ok(EXIT_QUIT)
    }
}

const BOOKMARK_USAGE: &str = "bookmark -l | -i <index> | -d <index> | \"<command>\"";

/// What a `bookmark` line asks for. The first argument decides; anything that is
/// not an option adds the whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkOp {
    List,
    Run(i64),
    Delete(i64),
    Add(Vec<String>),
}

/// The `bookmark` builtin.
///
/// Parsed by hand rather than with `argh`: the words of a bookmarked command
/// (`bookmark ls -l`) must not be mistaken for options of `bookmark` itself.
#[derive(Debug)]
pub struct BookmarkCommand {
    pub op: BookmarkOp,
    /// The `bookmark` line itself ended with `&`; only `-i` honours it.
    pub background: bool,
}

impl BookmarkCommand {
    pub const NAME: &'static str = "bookmark";

    /// Parse the words following `bookmark`.
    pub fn parse(args: &[String], background: bool) -> Result<Self, ShellError> {
        let op = match args {
            [] => return Err(ShellError::Usage(BOOKMARK_USAGE)),
            [flag, ..] if flag == "-l" => BookmarkOp::List,
            [flag, index, ..] if flag == "-i" => BookmarkOp::Run(parse_index(index)?),
            [flag, index, ..] if flag == "-d" => BookmarkOp::Delete(parse_index(index)?),
            [flag] if flag == "-i" || flag == "-d" => return Err(ShellError::Usage(BOOKMARK_USAGE)),
            words => BookmarkOp::Add(words.to_vec()),
        };
        Ok(Self { op, background })
    }
}

fn parse_index(word: &str) -> Result<i64, ShellError> {
    word.parse()
        .map_err(|_| ShellError::InvalidIndex(word.to_string()))
}

impl CommandFactory for Factory<BookmarkCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        line: &TokenizedLine,
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        if line.name() != Some(BookmarkCommand::NAME) {
            return Ok(None);
        }
        let cmd = BookmarkCommand::parse(&line.args[1..], line.background)?;
        Ok(Some(Box::new(cmd)))
    }
}

impl ExecutableCommand for BookmarkCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let BookmarkCommand { op, background } = *self;
        match op {
            BookmarkOp::List => {
                for (index, command) in env.bookmarks.list() {
                    writeln!(stdout, "{} \"{}\"", index, command)?;
                }
                Ok(0)
            }
            BookmarkOp::Add(words) => {
                let index = env.bookmarks.add(words)?;
                log::info!("Added bookmark {}", index);
                Ok(0)
            }
            BookmarkOp::Delete(index) => {
                env.bookmarks.delete(index)?;
                log::info!("Bookmark {} deleted.", index);
                Ok(0)
            }
            BookmarkOp::Run(index) => {
                let resolved = env.bookmarks.resolve(index)?;
                let argv = join_quoted(resolved.args, env.max_line)?;
                let background = resolved.background || background;
                let cmd = ExternalCommand::resolve(env, argv, background)?;
                Box::new(cmd).execute(stdin, stdout, env)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkStore;
    use crate::env::SearchPath;
    use crate::io_adapters::{MemWriter, NullStream};
    use std::env as stdenv;
    use std::io::Cursor;
    use crate::env::lock_current_dir;

    fn test_env(dir: &std::path::Path) -> Environment {
        let path = stdenv::var_os("PATH").unwrap_or_else(|| "/usr/bin:/bin".into());
        Environment::isolated(
            dir.to_path_buf(),
            SearchPath::parse(&path),
            BookmarkStore::new(dir.join(".bookmarks.txt"), 3),
        )
    }

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    fn run_bookmark(env: &mut Environment, line: &str) -> Result<(ExitCode, String)> {
        let cmd = BookmarkCommand::parse(&words(line), false)?;
        let (out, handle) = MemWriter::with_handle();
        let code = Box::new(cmd).execute(Box::new(NullStream), Box::new(out), env)?;
        let printed = String::from_utf8(handle.borrow().clone())?;
        Ok((code, printed))
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");

        // save original cwd to restore later
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env(&orig);

        let target = Some(canonical_temp.to_string_lossy().to_string());
        let cmd = Cd { target };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");

        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env(&orig);
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());

        let cmd = Cd { target: None };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env(&orig);

        let target = Some(format!("nonexistent_dir_for_cd_test_{}", std::process::id()));
        let cmd = Cd { target };
        let err = cmd
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::DirectoryChangeFailed { .. })
        ));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }

    #[test]
    fn test_exit_sets_quit_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = test_env(dir.path());
        let code = Exit { _args: vec![] }
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(code, EXIT_QUIT);
        assert!(env.should_exit);
        assert_eq!(env.exit_code, EXIT_QUIT);
    }

    #[test]
    fn test_factory_matches_alias() {
        let dir = tempfile::tempdir().unwrap();
        let env = test_env(dir.path());
        let line = TokenizedLine {
            args: vec!["quit".into()],
            background: false,
        };
        assert!(Factory::<Exit>::default().try_create(&env, &line).unwrap().is_some());
        let line = TokenizedLine {
            args: vec!["exits".into()],
            background: false,
        };
        assert!(Factory::<Exit>::default().try_create(&env, &line).unwrap().is_none());
    }

    #[test]
    fn test_parse_bookmark_ops() {
        assert_eq!(BookmarkCommand::parse(&words("-l"), false).unwrap().op, BookmarkOp::List);
        assert_eq!(BookmarkCommand::parse(&words("-i 2"), false).unwrap().op, BookmarkOp::Run(2));
        assert_eq!(BookmarkCommand::parse(&words("-d 0"), false).unwrap().op, BookmarkOp::Delete(0));
        assert_eq!(
            BookmarkCommand::parse(&words("\"ls -l\""), false).unwrap().op,
            BookmarkOp::Add(words("\"ls -l\""))
        );
    }

    #[test]
    fn test_parse_bookmark_errors() {
        assert!(matches!(BookmarkCommand::parse(&[], false), Err(ShellError::Usage(_))));
        assert!(matches!(BookmarkCommand::parse(&words("-i"), false), Err(ShellError::Usage(_))));
        assert!(matches!(
            BookmarkCommand::parse(&words("-d x"), false),
            Err(ShellError::InvalidIndex(w)) if w == "x"
        ));
    }

    #[test]
    fn test_bookmark_add_list_delete() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = test_env(dir.path());

        run_bookmark(&mut env, "\"ls -l\"")?;
        run_bookmark(&mut env, "\"pwd\"")?;
        let (_, listed) = run_bookmark(&mut env, "-l")?;
        assert_eq!(listed, "0 \"ls -l\"\n1 \"pwd\"\n");

        run_bookmark(&mut env, "-d 0")?;
        let (_, listed) = run_bookmark(&mut env, "-l")?;
        assert_eq!(listed, "0 \"pwd\"\n");
        Ok(())
    }

    #[test]
    fn test_bookmark_capacity_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = test_env(dir.path());
        for _ in 0..3 {
            run_bookmark(&mut env, "\"pwd\"")?;
        }
        let err = run_bookmark(&mut env, "\"pwd\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::CapacityExceeded { capacity: 3 })
        ));
        assert_eq!(env.bookmarks.len(), 3);
        Ok(())
    }

    #[test]
    fn test_bookmark_run_executes_stored_command() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = test_env(dir.path());
        run_bookmark(&mut env, "\"echo stored > stored.txt\"")?;

        let (code, _) = run_bookmark(&mut env, "-i 0")?;
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(dir.path().join("stored.txt"))?, "stored\n");
        Ok(())
    }

    #[test]
    fn test_bookmark_run_out_of_range() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = test_env(dir.path());
        let err = run_bookmark(&mut env, "-i 4").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::IndexOutOfRange { index: 4, len: 0 })
        ));
        Ok(())
    }

    #[test]
    fn test_bookmark_run_background_entry() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = test_env(dir.path());
        run_bookmark(&mut env, "\"sleep 5 &\"")?;

        run_bookmark(&mut env, "-i 0")?;
        assert_eq!(env.background.len(), 1);
        let mut child = env.background.pop().unwrap();
        child.kill()?;
        child.wait()?;
        Ok(())
    }
}
