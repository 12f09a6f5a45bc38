//! A module implementing lexical analysis (tokenization) of one input line.
//!
//! The grammar is deliberately tiny: arguments are separated by spaces and tabs,
//! a newline ends the line, and a standalone trailing `&` requests background
//! execution. Quotes are not interpreted here; see [`crate::parser::join_quoted`].

use crate::error::ShellError;

/// The word that marks a command for background execution when it stands alone
/// at the end of the line.
pub const BACKGROUND_MARKER: &str = "&";

/// Result of tokenizing one line: owned arguments plus the background flag.
///
/// The arguments never borrow from the input buffer, so the buffer can be
/// reused for the next prompt cycle as soon as tokenization returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    /// Command name followed by its arguments. Empty for a blank line.
    pub args: Vec<String>,
    /// Set when the line ended with a standalone `&`, which is not kept in `args`.
    pub background: bool,
}

impl TokenizedLine {
    /// The command name, if the line contained anything but whitespace.
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
    out: Vec<String>,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        LexingFSM {
            input: line.chars(),
            state: LexingState::Start,
            buffer: String::new(),
            out: Vec::new(),
        }
    }

    fn make_tokens(mut self) -> Vec<String> {
        while let Some(ch) = self.input.next() {
            match (self.state, ch) {
                // A newline is the last character examined.
                (_, '\n') => break,
                (LexingState::Start, ' ' | '\t') => {}
                (LexingState::ReadingWord, ' ' | '\t') => {
                    self.finalize_word();
                    self.state = LexingState::Start;
                }
                (_, c) => {
                    self.buffer.push(c);
                    self.state = LexingState::ReadingWord;
                }
            }
        }
        self.finalize_word();
        self.out
    }

    fn finalize_word(&mut self) {
        if !self.buffer.is_empty() {
            self.out.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Split a raw input line into arguments.
///
/// Only the part before the first newline is examined, and it must be at most
/// `max_line` bytes long. A trailing standalone `&` is stripped and reported via
/// [`TokenizedLine::background`]; an `&` anywhere else is an ordinary character.
pub fn split_into_tokens(line: &str, max_line: usize) -> Result<TokenizedLine, ShellError> {
    let line = line.split('\n').next().unwrap_or_default();
    if line.len() > max_line {
        return Err(ShellError::CommandTooLong { limit: max_line });
    }

    let mut args = LexingFSM::new(line).make_tokens();
    let background = args.last().is_some_and(|a| a == BACKGROUND_MARKER);
    if background {
        args.pop();
    }
    Ok(TokenizedLine { args, background })
}
