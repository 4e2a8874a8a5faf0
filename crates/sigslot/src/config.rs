#![forbid(unsafe_code)]

//! Construction-time configuration for signals and receivers.
//!
//! Both configs follow the builder style: start from `Default` and chain
//! `with_*` calls. [`SignalConfig::from_env`] reads overrides from the
//! process environment:
//!
//! | Variable | Values | Effect |
//! |----------|--------|--------|
//! | `SIGSLOT_REJECT_DUPLICATES` | `1/true/yes/on` | Reject repeated (receiver, method) pairs |
//! | `SIGSLOT_FAILURE_MODE` | `abort` / `continue` | How a failing slot affects the emission |

/// How an emission reacts to a bound method that returns `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop at the first failing method and return its error. Methods that
    /// already ran keep their effects.
    #[default]
    Abort,
    /// Run the whole snapshot, then return the first failure (if any).
    Continue,
}

impl FailureMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" | "stop" => Some(Self::Abort),
            "continue" | "all" => Some(Self::Continue),
            _ => None,
        }
    }
}

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration for a [`Signal`](crate::Signal).
#[derive(Debug, Clone, Default)]
pub struct SignalConfig {
    /// Name used in logs and `Debug` output.
    pub name: Option<String>,
    /// Fail `connect` with `DuplicateConnection` when the same
    /// (receiver, method) pair is already registered.
    pub reject_duplicates: bool,
    /// Failure propagation policy for `emit`.
    pub failure_mode: FailureMode,
    /// Registry capacity reserved up front.
    pub initial_capacity: usize,
}

impl SignalConfig {
    /// Create a config with defaults (duplicates allowed, abort on failure).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = get_env("SIGSLOT_REJECT_DUPLICATES") {
            config.reject_duplicates = env_flag(&value);
        }
        if let Some(mode) = get_env("SIGSLOT_FAILURE_MODE").and_then(|v| FailureMode::parse(&v)) {
            config.failure_mode = mode;
        }
        config
    }

    /// Set the signal name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set duplicate rejection.
    #[must_use]
    pub fn with_reject_duplicates(mut self, reject: bool) -> Self {
        self.reject_duplicates = reject;
        self
    }

    /// Set the failure propagation policy.
    #[must_use]
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Reserve registry capacity up front.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Configuration for a [`Receiver`](crate::Receiver).
#[derive(Debug, Clone, Default)]
pub struct ReceiverConfig {
    /// Name used in logs and `Debug` output.
    pub name: Option<String>,
    /// Back-reference capacity reserved up front.
    pub initial_capacity: usize,
}

impl ReceiverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the receiver name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reserve tracker capacity up front.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
