//! Persistent, index-addressed store of saved command lines.
//!
//! The on-disk format is plain text with one bookmark per line and the arguments
//! joined by single spaces. Embedded spaces are not escaped, so an argument that
//! contains a space comes back as several arguments after a save/load cycle.

use crate::error::ShellError;
use crate::lexer::BACKGROUND_MARKER;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// A saved command line. Each argument is owned independently of any input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    args: Vec<String>,
}

impl Bookmark {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The arguments joined with single spaces, as listed and persisted.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// A bookmark prepared for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub args: Vec<String>,
    /// The bookmark was stored with a trailing `&`, which is not part of `args`.
    pub background: bool,
}

/// Fixed-capacity ordered list of bookmarks mirrored to a file.
///
/// Indices are positions: deleting index `i` shifts every later bookmark down by
/// one, so an index must not be reused across a delete.
#[derive(Debug)]
pub struct BookmarkStore {
    path: PathBuf,
    capacity: usize,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkStore {
    /// An empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            bookmarks: Vec::new(),
        }
    }

    /// Read the store from `path`.
    ///
    /// A missing or unreadable file yields an empty store. Lines past `capacity`
    /// are dropped with a warning.
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let mut store = Self::new(path, capacity);
        let contents = match fs::read_to_string(&store.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no bookmark file at {}", store.path.display());
                return store;
            }
            Err(e) => {
                log::warn!("cannot read bookmark file {}: {}", store.path.display(), e);
                return store;
            }
        };

        for line in contents.lines() {
            let args: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
            if args.is_empty() {
                continue;
            }
            if store.bookmarks.len() == capacity {
                log::warn!(
                    "{} holds more than {} bookmarks, ignoring the rest",
                    store.path.display(),
                    capacity
                );
                break;
            }
            store.bookmarks.push(Bookmark { args });
        }
        log::debug!(
            "loaded {} bookmarks from {}",
            store.bookmarks.len(),
            store.path.display()
        );
        store
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Append a command line and return its index.
    ///
    /// `args` are the words after `bookmark` as typed, so a leading `"` on the
    /// first word and a trailing `"` on the last one are stripped.
    pub fn add(&mut self, mut args: Vec<String>) -> Result<usize, ShellError> {
        if self.bookmarks.len() >= self.capacity {
            return Err(ShellError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        if let Some(first) = args.first_mut() {
            if let Some(rest) = first.strip_prefix('"') {
                *first = rest.to_owned();
            }
        }
        if let Some(last) = args.last_mut() {
            if let Some(rest) = last.strip_suffix('"') {
                *last = rest.to_owned();
            }
        }
        args.retain(|a| !a.is_empty());
        if args.is_empty() {
            return Err(ShellError::Usage("bookmark \"<command>\""));
        }

        self.bookmarks.push(Bookmark { args });
        Ok(self.bookmarks.len() - 1)
    }

    /// Iterate over `(index, command line)` pairs in insertion order.
    pub fn list(&self) -> impl Iterator<Item = (usize, String)> + '_ {
        self.bookmarks
            .iter()
            .enumerate()
            .map(|(i, b)| (i, b.command_line()))
    }

    pub fn get(&self, index: i64) -> Result<&Bookmark, ShellError> {
        let pos = self.position(index)?;
        Ok(&self.bookmarks[pos])
    }

    /// Fetch the arguments of bookmark `index` for execution.
    pub fn resolve(&self, index: i64) -> Result<Resolved, ShellError> {
        let mut args = self.get(index)?.args.clone();
        let background = args.len() > 1 && args.last().is_some_and(|a| a == BACKGROUND_MARKER);
        if background {
            args.pop();
        }
        Ok(Resolved { args, background })
    }

    /// Remove bookmark `index`, shifting the later ones down.
    pub fn delete(&mut self, index: i64) -> Result<Bookmark, ShellError> {
        let pos = self.position(index)?;
        Ok(self.bookmarks.remove(pos))
    }

    /// Overwrite the bookmark file with the current contents.
    pub fn save(&self) -> Result<(), ShellError> {
        self.write_file().map_err(|source| ShellError::SaveFailed {
            path: self.path.clone(),
            source,
        })
    }

    fn write_file(&self) -> io::Result<()> {
        let mut out = BufWriter::new(fs::File::create(&self.path)?);
        for bookmark in &self.bookmarks {
            writeln!(out, "{}", bookmark.command_line())?;
        }
        out.flush()
    }

    fn position(&self, index: i64) -> Result<usize, ShellError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.bookmarks.len())
            .ok_or(ShellError::IndexOutOfRange {
                index,
                len: self.bookmarks.len(),
            })
    }
}
