//! Core domain types for catlint.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
mod settings;

pub use ids::{DocumentId, RequestSeq};
pub use settings::{
    AnalyzerSettings, DEFAULT_DEBOUNCE_MS, DEFAULT_LANGUAGE_ID, DEFAULT_TIMEOUT_SECS,
    LintSettings, SettingsError,
};
