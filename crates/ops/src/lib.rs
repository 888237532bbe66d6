#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for extman
//!
//! This crate serves as the orchestration layer between the CLI and the
//! installer. Each operation announces itself on the event channel,
//! delegates to `extman-install` and returns a serializable report.

mod context;
mod install;
mod query;
mod types;
mod uninstall;

pub use context::{OpsContextBuilder, OpsCtx};
pub use types::ExtensionTarget;

// Re-export operation functions
pub use install::{discover_install, install, update};
pub use query::{discover, list_extensions, refresh_cache};
pub use uninstall::uninstall;

pub use extman_types::{DiscoveryReport, ExtensionSummary, InstallReport, UninstallReport};

use extman_errors::Error;

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Registered extensions
    ExtensionList(Vec<ExtensionSummary>),
    /// One extension after a refresh
    Extension(ExtensionSummary),
    /// Install, update or discover-install outcome
    InstallReport(InstallReport),
    /// Uninstall outcome
    UninstallReport(UninstallReport),
    /// Components found on disk
    DiscoveryReport(DiscoveryReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            extman_errors::OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::UninstallReport(report) => report.success,
            OperationResult::ExtensionList(_)
            | OperationResult::Extension(_)
            | OperationResult::InstallReport(_)
            | OperationResult::DiscoveryReport(_)
            | OperationResult::Success(_) => true,
        }
    }
}
