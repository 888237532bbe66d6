//! Report type definitions for operations

use crate::{ClientScope, Route};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of an install, update or discover-install
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstallReport {
    /// Route the adapter actually took (install may become update)
    pub route: Route,
    /// Element that was installed
    pub element: String,
    /// Persisted extension id
    pub extension_id: i64,
    /// Declared extension version, if any
    pub version: Option<String>,
    /// Text captured from lifecycle hooks
    pub messages: String,
    /// Non-fatal problems, e.g. a menu that could not be built
    pub warnings: Vec<String>,
    /// Total execution time
    pub duration_ms: u64,
}

/// Outcome of an uninstall
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UninstallReport {
    pub element: String,
    pub extension_id: i64,
    /// False when any best-effort cleanup step failed
    pub success: bool,
    /// Failures collected while cleaning up
    pub failures: Vec<String>,
    pub messages: String,
    pub duration_ms: u64,
}

/// Registered extension as listed to users
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtensionSummary {
    pub extension_id: i64,
    pub element: String,
    pub name: String,
    pub client: ClientScope,
    pub enabled: bool,
    pub protected: bool,
    pub version: Option<String>,
    pub schema_version: Option<String>,
}

/// Extensions found on disk but not registered
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub candidates: Vec<ExtensionSummary>,
    pub scanned_at: DateTime<Utc>,
}
