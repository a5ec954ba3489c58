//! Logger setup for the command line.

use std::io::Write;

fn default_level(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Initializes `env_logger` with `[LEVEL] message` lines on stderr.
///
/// `RUST_LOG` overrides the level picked from the flags; `debug` wins over
/// `quiet`.
pub fn init_logging(quiet: bool, debug: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level(quiet, debug)),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
    .init();
}
