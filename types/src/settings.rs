//! Resolved settings shared across crates.
//!
//! These types represent fully-validated configuration state. Raw TOML
//! structs (with `Option` fields) live in `catlint-config`; the
//! loader resolves them into these types at the parse boundary.
//!
//! Existence of an [`AnalyzerSettings`] is the proof that analysis is
//! enabled -- there is no `enabled: bool`.

use std::time::Duration;

pub const DEFAULT_LANGUAGE_ID: &str = "catlua";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("analyzer path must not be empty")]
    EmptyPath,
    #[error("interpreter must not be empty when set")]
    EmptyInterpreter,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("language_id must not be empty")]
    EmptyLanguageId,
}

/// How to launch the external analyzer.
///
/// Invariant: `program` is non-empty, `interpreter` is either absent or
/// non-empty, and `timeout` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerSettings {
    program: String,
    interpreter: Option<String>,
    timeout: Duration,
}

impl AnalyzerSettings {
    pub fn new(
        program: impl Into<String>,
        interpreter: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SettingsError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(SettingsError::EmptyPath);
        }
        if interpreter.as_deref().is_some_and(|i| i.trim().is_empty()) {
            return Err(SettingsError::EmptyInterpreter);
        }
        if timeout.is_zero() {
            return Err(SettingsError::ZeroTimeout);
        }
        Ok(Self {
            program,
            interpreter,
            timeout,
        })
    }

    /// The configured analyzer executable (or script, when an interpreter is set).
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Settings that shape the pipeline itself rather than the analyzer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSettings {
    language_id: String,
    debounce: Duration,
}

impl LintSettings {
    pub fn new(language_id: impl Into<String>, debounce: Duration) -> Result<Self, SettingsError> {
        let language_id = language_id.into();
        if language_id.trim().is_empty() {
            return Err(SettingsError::EmptyLanguageId);
        }
        Ok(Self {
            language_id,
            debounce,
        })
    }

    /// Language kind whose change notifications trigger analysis.
    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Quiet interval before a burst of changes triggers analysis.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            language_id: DEFAULT_LANGUAGE_ID.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}
