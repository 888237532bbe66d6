use extman_types::{InstallReport, Route, UninstallReport};
use std::time::Duration;

/// Outcome of install, update or discover-install
#[derive(Debug, Clone)]
pub struct InstallResult {
    /// Which flow actually ran; an install may have been routed to update
    pub route: Route,
    pub element: String,
    pub extension_id: i64,
    pub version: Option<String>,
    /// Text the lifecycle script wrote
    pub messages: String,
    /// Non-fatal phase failures
    pub warnings: Vec<String>,
    pub duration: Duration,
}

impl InstallResult {
    #[must_use]
    pub fn into_report(self) -> InstallReport {
        InstallReport {
            route: self.route,
            element: self.element,
            extension_id: self.extension_id,
            version: self.version,
            messages: self.messages,
            warnings: self.warnings,
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Outcome of an uninstall
///
/// Cleanup after the hooks is best-effort; `success` is false when any step
/// was collected into `failures`.
#[derive(Debug, Clone)]
pub struct UninstallResult {
    pub element: String,
    pub extension_id: i64,
    pub success: bool,
    pub failures: Vec<String>,
    pub messages: String,
    pub duration: Duration,
}

impl UninstallResult {
    #[must_use]
    pub fn into_report(self) -> UninstallReport {
        UninstallReport {
            element: self.element,
            extension_id: self.extension_id,
            success: self.success,
            failures: self.failures,
            messages: self.messages,
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
