#![cfg(feature = "std")]

//! Stderr backend for the `log` facade. Stdout belongs to the game screens.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "SEA_BATTLE_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{} - {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// Level named by `value` (`off`, `error` ... `trace`, any case); `Info` for
/// anything else.
fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Route `log` records to stderr as `LEVEL - message`.
///
/// The threshold comes from [`LOG_ENV`]. Only the first call installs the
/// logger; the binaries and tests may call it freely.
pub fn init_logging() {
    let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_falls_back_to_info() {
        assert_eq!(parse_level(None), LevelFilter::Info);
        assert_eq!(parse_level(Some("chatty")), LevelFilter::Info);
        assert_eq!(parse_level(Some(" debug ")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("OFF")), LevelFilter::Off);
    }
}
