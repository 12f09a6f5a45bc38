use crate::bookmarks::BookmarkStore;
use crate::command::ExitCode;
use crate::config::Config;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Child;

/// Ordered list of directories scanned to resolve a bare command name.
///
/// Parsed once from `PATH` when the session starts and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Split a colon-delimited `PATH`-style value. Empty entries are skipped.
    pub fn parse(value: &OsStr) -> Self {
        Self {
            dirs: stdenv::split_paths(value)
                .filter(|d| !d.as_os_str().is_empty())
                .collect(),
        }
    }

    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// Mutable state of one shell session, passed explicitly to every command.
///
/// The environment contains:
/// - `vars`: environment variables handed to executed programs.
/// - `current_dir`: the working directory for command execution.
/// - `search_path`: directories scanned for bare command names.
/// - `bookmarks`: the saved command lines.
/// - `background`: children started with `&` that have not been reaped yet.
/// - `should_exit` / `exit_code`: set by `exit` so the loop knows when and how to stop.
///
/// Note: fields are public for simplicity, the way the REPL and builtins share them.
#[derive(Debug)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub search_path: SearchPath,
    pub bookmarks: BookmarkStore,
    pub background: Vec<Child>,
    /// Upper bound for input lines and quoted arguments.
    pub max_line: usize,
    pub should_exit: bool,
    pub exit_code: ExitCode,
}

impl Environment {
    /// Capture the current process state and load the bookmark file named by `config`.
    ///
    /// A relative bookmark file is anchored to the starting directory, so `cd`
    /// does not move where the session saves.
    pub fn new(config: &Config) -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let search_path = vars
            .get("PATH")
            .map(|p| SearchPath::parse(OsStr::new(p)))
            .unwrap_or_default();
        let bookmarks = BookmarkStore::load(
            current_dir.join(&config.bookmark_file),
            config.max_bookmarks,
        );
        Self {
            vars,
            current_dir,
            search_path,
            bookmarks,
            background: Vec::new(),
            max_line: config.max_line,
            should_exit: false,
            exit_code: 0,
        }
    }

    /// A session detached from the process environment, for embedding and tests.
    pub fn isolated(current_dir: PathBuf, search_path: SearchPath, bookmarks: BookmarkStore) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir,
            search_path,
            bookmarks,
            background: Vec::new(),
            max_line: crate::config::DEFAULT_MAX_LINE,
            should_exit: false,
            exit_code: 0,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}
