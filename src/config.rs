use std::path::PathBuf;

/// Default bookmark file, relative to the directory the shell starts in.
pub const DEFAULT_BOOKMARK_FILE: &str = ".bookmarks.txt";
pub const DEFAULT_MAX_BOOKMARKS: usize = 10;
pub const DEFAULT_MAX_LINE: usize = 256;
pub const DEFAULT_PROMPT: &str = "lokishell: ";

/// Startup settings of an [`crate::Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where bookmarks are loaded from at startup and saved to at exit.
    pub bookmark_file: PathBuf,
    /// Maximum number of bookmarks; adding past it is rejected.
    pub max_bookmarks: usize,
    /// Maximum length in bytes of an input line and of a quoted argument.
    pub max_line: usize,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookmark_file: PathBuf::from(DEFAULT_BOOKMARK_FILE),
            max_bookmarks: DEFAULT_MAX_BOOKMARKS,
            max_line: DEFAULT_MAX_LINE,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}
