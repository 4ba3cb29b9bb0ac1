//! Dispatch configuration.

use serde::{Deserialize, Serialize};

/// When recorded entities are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Hold entities until the outermost transaction commits or rolls back.
    #[default]
    Deferred,
    /// Fire after-commit handlers as soon as an entity is recorded.
    ///
    /// Meant for test suites that wrap every test in a transaction that is
    /// never committed.
    Immediate,
}

/// Configuration for a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// When recorded entities are dispatched.
    pub mode: DispatchMode,
    /// Record an entity at most once per bucket.
    pub dedup: bool,
    /// Treat a panicking handler like one that returned an error.
    pub catch_panics: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Deferred,
            dedup: true,
            catch_panics: true,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset that fires handlers at record time.
    pub fn immediate() -> Self {
        Self {
            mode: DispatchMode::Immediate,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.dedup = enabled;
        self
    }

    pub fn with_catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }

    pub fn is_immediate(&self) -> bool {
        self.mode == DispatchMode::Immediate
    }
}
