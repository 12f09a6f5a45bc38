//! Logging backend for the `log` facade: one line per record on stderr.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;

const PREFIX: &str = "\tLOKISHELL LOG:\t";

static LOGGER: Logger = Logger;

pub struct Logger;

/// Install the backend; records above `level` are dropped.
///
/// Fails if another logger was installed first.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

fn level_char(level: Level) -> char {
    match level {
        Level::Info => '*',
        Level::Warn => 'W',
        Level::Error => 'E',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

fn format_record(record: &Record) -> String {
    format!("{}[{}] {}", PREFIX, level_char(record.level()), record.args())
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{}", format_record(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
