//! Post-processing of the token list: quote joining and redirection extraction.

use crate::error::ShellError;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Kind of redirection
///
/// Defines which standard stream of the child is rebound and how the file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): Reads standard input from a specified file.
    Input,
    /// Output redirection (`>`): Writes standard output to a file, **overwriting** the file if it exists.
    Output,
    /// Output redirection with append (`>>`): Writes standard output to a file, **appending** to the file if it exists.
    Append,
    /// Error redirection (`2>`): Writes standard error to a file, **overwriting** the file if it exists.
    Stderr,
}

impl RedirectKind {
    /// Recognize a redirection operator word.
    pub fn from_operator(word: &str) -> Option<Self> {
        match word {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            "2>" => Some(RedirectKind::Stderr),
            _ => None,
        }
    }

    /// Open `path` the way this redirection needs it.
    ///
    /// Output targets are created when missing; an input target must exist.
    pub fn open(self, path: &Path) -> io::Result<File> {
        match self {
            RedirectKind::Input => File::open(path),
            RedirectKind::Output | RedirectKind::Stderr => File::create(path),
            RedirectKind::Append => OpenOptions::new().append(true).create(true).open(path),
        }
    }
}

/// A single redirection request taken off the end of an argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    /// The file as typed by the user; relative paths are relative to the shell's
    /// current directory.
    pub target: PathBuf,
}

/// Remove a trailing `<op> <file>` pair from `argv` and return it.
///
/// Operators are only recognized as the second-to-last argument, so at most one
/// redirection is applied per command and an operator elsewhere is a plain
/// argument. An operator in the last position is an error.
pub fn split_redirect(argv: &mut Vec<String>) -> Result<Option<Redirect>, ShellError> {
    let len = argv.len();
    if len < 2 {
        return Ok(None);
    }
    if RedirectKind::from_operator(&argv[len - 1]).is_some() {
        return Err(ShellError::MalformedRedirection(argv[len - 1].clone()));
    }
    if len < 3 {
        return Ok(None);
    }
    let Some(kind) = RedirectKind::from_operator(&argv[len - 2]) else {
        return Ok(None);
    };

    let target = argv.pop().map(PathBuf::from).unwrap_or_default();
    argv.pop();
    Ok(Some(Redirect { kind, target }))
}

/// Merge double-quoted runs of arguments into single arguments.
///
/// Scanning starts at index 1; the command name is never joined. An argument
/// beginning with `"` opens a run, which absorbs the following arguments (with a
/// single space between them) until one ends with `"` or the list is exhausted.
/// Both quotes are stripped.
///
/// # Errors
///
/// Returns [`ShellError::CommandTooLong`] when a joined argument would exceed
/// `limit` bytes.
pub fn join_quoted(args: Vec<String>, limit: usize) -> Result<Vec<String>, ShellError> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    out.extend(iter.next());

    while let Some(arg) = iter.next() {
        let Some(opening) = arg.strip_prefix('"') else {
            out.push(arg);
            continue;
        };

        let mut scratch = String::new();
        let mut closed = push_part(&mut scratch, opening);
        while !closed {
            let Some(next) = iter.next() else { break };
            scratch.push(' ');
            closed = push_part(&mut scratch, &next);
            if scratch.len() > limit {
                return Err(ShellError::CommandTooLong { limit });
            }
        }
        if scratch.len() > limit {
            return Err(ShellError::CommandTooLong { limit });
        }
        out.push(scratch);
    }

    Ok(out)
}

/// Append one word of a quoted run; returns true if the word closed the run.
fn push_part(scratch: &mut String, word: &str) -> bool {
    match word.strip_suffix('"') {
        Some(inner) => {
            scratch.push_str(inner);
            true
        }
        None => {
            scratch.push_str(word);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join_two_words() {
        let joined = join_quoted(strings(&["echo", "\"hello", "world\""]), 256).unwrap();
        assert_eq!(joined, vec!["echo", "hello world"]);
    }

    #[test]
    fn test_single_quoted_word() {
        let joined = join_quoted(strings(&["echo", "\"hi\"", "there"]), 256).unwrap();
        assert_eq!(joined, vec!["echo", "hi", "there"]);
    }

    #[test]
    fn test_command_name_is_never_joined() {
        let joined = join_quoted(strings(&["\"echo", "a\""]), 256).unwrap();
        assert_eq!(joined, vec!["\"echo", "a\""]);
    }

    #[test]
    fn test_unterminated_run_takes_the_rest() {
        let joined = join_quoted(strings(&["grep", "\"a", "b", "c"]), 256).unwrap();
        assert_eq!(joined, vec!["grep", "a b c"]);
    }

    #[test]
    fn test_several_runs() {
        let args = strings(&["cmd", "\"a", "b\"", "-x", "\"c", "d\""]);
        let joined = join_quoted(args, 256).unwrap();
        assert_eq!(joined, vec!["cmd", "a b", "-x", "c d"]);
    }

    #[test]
    fn test_lone_quotes_keep_inner_spacing() {
        let joined = join_quoted(strings(&["echo", "\"", "hi", "\""]), 256).unwrap();
        assert_eq!(joined, vec!["echo", " hi "]);
    }

    #[test]
    fn test_joined_argument_over_limit() {
        let err = join_quoted(strings(&["echo", "\"aaaa", "bbbb\""]), 6).unwrap_err();
        assert!(matches!(err, ShellError::CommandTooLong { limit: 6 }));
    }

    #[test]
    fn test_split_output_redirect() {
        let mut argv = strings(&["echo", "hi", ">", "out.txt"]);
        let redirect = split_redirect(&mut argv).unwrap().unwrap();
        assert_eq!(argv, vec!["echo", "hi"]);
        assert_eq!(redirect.kind, RedirectKind::Output);
        assert_eq!(redirect.target, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_split_each_operator() {
        for (op, kind) in [
            ("<", RedirectKind::Input),
            (">>", RedirectKind::Append),
            ("2>", RedirectKind::Stderr),
        ] {
            let mut argv = strings(&["cmd", op, "file"]);
            let redirect = split_redirect(&mut argv).unwrap().unwrap();
            assert_eq!(redirect.kind, kind);
            assert_eq!(RedirectKind::from_operator(op), Some(kind));
            assert_eq!(argv, vec!["cmd"]);
        }
    }

    #[test]
    fn test_operator_elsewhere_is_an_argument() {
        let mut argv = strings(&["echo", ">", "a", "b"]);
        assert_eq!(split_redirect(&mut argv).unwrap(), None);
        assert_eq!(argv.len(), 4);
    }

    #[test]
    fn test_missing_target_is_malformed() {
        let mut argv = strings(&["ls", ">"]);
        let err = split_redirect(&mut argv).unwrap_err();
        assert!(matches!(err, ShellError::MalformedRedirection(op) if op == ">"));
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "one\n").unwrap();

        use std::io::Write;
        let mut f = RedirectKind::Append.open(&path).unwrap();
        f.write_all(b"two\n").unwrap();
        drop(f);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
