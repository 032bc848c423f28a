//! Configuration for a [`TestContext`](super::TestContext).

/// Environment variable that turns on fail-fast mode when set to `1` or `true`.
pub const FAIL_FAST_ENV: &str = "TDDKIT_FAIL_FAST";

/// Configuration for issue handling.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Panic on the first recorded issue instead of collecting.
    pub fail_fast: bool,
    /// Emit a `tracing` warning for every recorded issue.
    pub log_issues: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            log_issues: true,
        }
    }
}

impl ContextConfig {
    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration, with fail-fast taken from `TDDKIT_FAIL_FAST`.
    #[must_use]
    pub fn from_env() -> Self {
        let fail_fast = std::env::var(FAIL_FAST_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self {
            fail_fast,
            ..Self::default()
        }
    }

    /// Panic on the first recorded issue.
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Do not log recorded issues.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.log_issues = false;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
