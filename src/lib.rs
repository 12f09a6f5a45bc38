//! A small interactive shell with numbered command bookmarks.
//!
//! Lines are split on whitespace, with `"…"` joining words into one argument.
//! A trailing `&` runs the command in the background, and a trailing
//! `<`, `>`, `>>` or `2>` followed by a file name redirects one stream.
//! Besides external programs the shell knows `exit`/`quit`, `cd` and
//! `bookmark`, which saves command lines in a file and replays them by index.
//!
//! The main entry point is [`Interpreter`], which reads lines from a
//! [`io_adapters::LineSource`] and dispatches them through a list of pluggable
//! factories. The public modules [`command`] and [`env`] expose the traits and
//! the session state for implementing your own commands.

pub mod bookmarks;
mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
mod job;
mod lexer;
pub mod logger;
mod parser;
pub mod signals;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use config::Config;
pub use error::ShellError;
