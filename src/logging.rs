//! Test log output.
//!
//! Every helper emits `tracing` events: a warning for each recorded issue and
//! debug or trace events for teardown, subscriptions and captures. Nothing is
//! printed until a subscriber is installed, which [`init_test_logging`] does
//! once per process using the test writer, so output is captured per test by
//! the harness.
//!
//! The level comes from the `TDDKIT_LOG` environment variable
//! (`error`, `warn`, `info`, `debug` or `trace`) and defaults to `info`.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "TDDKIT_LOG";

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with the level from `TDDKIT_LOG`.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(Level::INFO);
    init_test_logging_with_level(level);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops. A subscriber installed by
/// someone else is left in place.
pub fn init_test_logging_with_level(level: Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

fn parse_level(value: &str) -> Option<Level> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        init_test_logging_with_level(Level::TRACE);
        tracing::info!("logging initialized twice");
    }
}
