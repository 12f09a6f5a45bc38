use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::io::{self, BufRead, Read, Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// What one prompt cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// End of input (Ctrl-D or a closed pipe).
    Eof,
}

/// Source of command lines for the interpreter loop.
///
/// An error of kind [`io::ErrorKind::Interrupted`] means "no input this cycle";
/// any other error ends the session.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // History is a convenience, losing an entry is not worth a failure.
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Interrupted) => Err(io::ErrorKind::Interrupted.into()),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(other) => Err(io::Error::other(other.to_string())),
        }
    }
}

/// Line source for non-interactive input: prints the prompt, reads up to a newline.
///
/// Bytes that are not UTF-8 are replaced with U+FFFD instead of failing the read.
pub struct PlainInput<R> {
    reader: R,
    prompt_out: Option<Box<dyn Write>>,
}

impl<R: BufRead> PlainInput<R> {
    /// Read from `reader` and echo prompts to standard output.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt_out: Some(Box::new(io::stdout())),
        }
    }

    /// Read from `reader` without printing prompts.
    pub fn silent(reader: R) -> Self {
        Self {
            reader,
            prompt_out: None,
        }
    }
}

impl<R: BufRead> LineSource for PlainInput<R> {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        if let Some(out) = self.prompt_out.as_mut() {
            write!(out, "{}", prompt)?;
            out.flush()?;
        }
        let mut raw = Vec::new();
        match self.reader.read_until(b'\n', &mut raw)? {
            0 => Ok(ReadOutcome::Eof),
            _ => Ok(ReadOutcome::Line(String::from_utf8_lossy(&raw).into_owned())),
        }
    }
}

/// Stream that reads nothing and discards writes; children see `/dev/null`.
pub struct NullStream;

impl Read for NullStream {
    fn read(&mut self, _out: &mut [u8]) -> IoResult<usize> {
        Ok(0)
    }
}

impl Write for NullStream {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl crate::command::Stdin for NullStream {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

impl crate::command::Stdout for NullStream {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

/// Memory-backed writer for capturing what builtins print.
///
/// External programs cannot write into memory, so they get `/dev/null` instead.
#[derive(Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl crate::command::Stdout for MemWriter {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}
