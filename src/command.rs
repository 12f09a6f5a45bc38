use crate::env::Environment;
use crate::lexer::TokenizedLine;
use anyhow::Result;
use std::io::{Read, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status of the shell after end of input.
pub const EXIT_CLEAN: ExitCode = 0;
/// Status recorded for a command that could not be run.
pub const EXIT_FAILURE: ExitCode = 1;
/// Status of the shell after `exit` or `quit`.
pub const EXIT_QUIT: ExitCode = 3;
/// Status of the shell after an unrecoverable read error.
pub const EXIT_READ_ERROR: ExitCode = 255;

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// Implementors typically wrap standard input or an opened file. A blanket
/// implementation exists for any type that implements `Read` and `Into<Stdio>`
/// (e.g. `File`).
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A blanket implementation exists for any type that implements `Write` and `Into<Stdio>`.
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a tokenized line.
///
/// Returns `Ok(None)` when the factory doesn't recognize the command name, so the
/// next factory gets a chance. Errors mean the name was recognized but the line
/// cannot be turned into a command.
pub trait CommandFactory {
    fn try_create(
        &self,
        env: &Environment,
        line: &TokenizedLine,
    ) -> Result<Option<Box<dyn ExecutableCommand>>>;
}
