use argh::FromArgs;
use log::LevelFilter;
use lokishell::config::{DEFAULT_BOOKMARK_FILE, DEFAULT_MAX_BOOKMARKS, DEFAULT_MAX_LINE, DEFAULT_PROMPT};
use lokishell::{Config, Interpreter, logger, signals};
use std::path::PathBuf;

/// Interactive shell with command bookmarks.
#[derive(FromArgs)]
struct Args {
    /// file bookmarks are loaded from and saved to
    #[argh(option, default = "PathBuf::from(DEFAULT_BOOKMARK_FILE)")]
    bookmarks: PathBuf,

    /// maximum number of bookmarks
    #[argh(option, default = "DEFAULT_MAX_BOOKMARKS")]
    max_bookmarks: usize,

    /// maximum length of an input line in bytes
    #[argh(option, default = "DEFAULT_MAX_LINE")]
    max_line: usize,

    /// prompt printed before each line
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    prompt: String,

    /// log resolution and process details
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// only log warnings and errors
    #[argh(switch, short = 'q')]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            bookmark_file: args.bookmarks,
            max_bookmarks: args.max_bookmarks,
            max_line: args.max_line,
            prompt: args.prompt,
        }
    }
}

fn main() {
    let args: Args = argh::from_env();

    if let Err(e) = logger::init(args.log_level()) {
        eprintln!("lokishell: cannot install logger: {}", e);
    }
    if let Err(e) = signals::install_suspend_handler() {
        log::warn!("cannot install Ctrl+Z handler: {}", e);
    }

    let mut sh = Interpreter::new(args.into());
    std::process::exit(sh.repl());
}
