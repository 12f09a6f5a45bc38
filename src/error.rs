use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while reading, dispatching or supervising a command.
///
/// Apart from [`ShellError::Input`] with a non-interrupted cause, every variant is
/// recovered at the prompt: the dispatcher prints it to stderr and re-prompts.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Reading the next line from the terminal failed.
    #[error("error reading the command: {0}")]
    Input(#[source] io::Error),

    /// The input line or a quoted argument does not fit into the configured bound.
    #[error("command too long (limit is {limit} bytes)")]
    CommandTooLong { limit: usize },

    /// No search path directory holds an executable with this name.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// A redirection operator was the last argument, with no file name after it.
    #[error("syntax error: expected a file name after `{0}`")]
    MalformedRedirection(String),

    /// The redirection target could not be opened.
    #[error("{}: {source}", path.display())]
    RedirectFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The operating system refused to create a child process.
    #[error("error while creating child process: {0}")]
    ProcessCreationFailed(#[source] io::Error),

    /// The child was created but its program image could not be replaced.
    #[error("{}: {source}", path.display())]
    ExecFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid bookmark index {index} (there are {len} bookmarks)")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("`{0}` is not a bookmark index")]
    InvalidIndex(String),

    #[error("bookmark limit of {capacity} reached, delete one first")]
    CapacityExceeded { capacity: usize },

    #[error("cd: {}: {source}", path.display())]
    DirectoryChangeFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cd: no target and HOME not set")]
    HomeNotSet,

    #[error("cannot save bookmarks to {}: {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("usage: {0}")]
    Usage(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ShellError::CommandNotFound("frob".into()).to_string(),
            "frob: command not found"
        );
        assert_eq!(
            ShellError::CapacityExceeded { capacity: 10 }.to_string(),
            "bookmark limit of 10 reached, delete one first"
        );
    }
}
