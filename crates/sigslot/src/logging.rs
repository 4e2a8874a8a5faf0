#![forbid(unsafe_code)]

//! Structured logging.
//!
//! With the `tracing` feature every connect, disconnect, teardown and
//! emission is reported through [`tracing`]:
//!
//! | Event | Level | Fields |
//! |-------|-------|--------|
//! | `signal_emit` span | DEBUG | `signal`, `name`, `slots` |
//! | binding skipped (receiver gone) | DEBUG | `index` |
//! | slot failed | WARN | `index`, `error` |
//! | connect rejected | DEBUG | `signal`, `error` |
//! | connected / disconnected / torn down | TRACE | `signal`, `receiver`, `key`, `count` |
//!
//! Without the feature all of it compiles away.
//!
//! `tracing-json` additionally provides [`init_subscriber`], a ready-made
//! subscriber for binaries and test harnesses that do not install their own.

/// Output format selected by `SIGSLOT_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a `SIGSLOT_LOG_FORMAT` value. Unknown values fall back to text.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Read `SIGSLOT_LOG_FORMAT` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("SIGSLOT_LOG_FORMAT")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Filter directive used when `SIGSLOT_LOG` is unset.
pub const DEFAULT_FILTER: &str = "sigslot=info";

/// Install a global subscriber filtered by `SIGSLOT_LOG` (an `EnvFilter`
/// directive, default [`DEFAULT_FILTER`]) and formatted per
/// `SIGSLOT_LOG_FORMAT`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one stays in place.
#[cfg(feature = "tracing-json")]
pub fn init_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("SIGSLOT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Text => builder.try_init().is_ok(),
    }
}
