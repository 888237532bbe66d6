use serde::{Deserialize, Serialize};

use super::FailureContext;
use extman_types::{ClientScope, Route};

/// Extension lifecycle events emitted by the installer adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// An install, update, uninstall or discover-install began
    Started {
        route: Route,
        element: String,
        version: Option<String>,
    },

    /// A phase of the running operation finished
    PhaseCompleted {
        route: Route,
        element: String,
        phase: String,
    },

    /// Install was redirected to update because the extension is present
    RoutedToUpdate { element: String },

    /// A lifecycle hook ran
    HookInvoked {
        route: Route,
        element: String,
        hook: String,
    },

    /// Files of one file set were synchronized
    FilesSynchronized {
        route: Route,
        element: String,
        scope: ClientScope,
        copied: usize,
        removed: usize,
    },

    /// A SQL batch finished
    SqlApplied {
        route: Route,
        element: String,
        statements: usize,
        schema_version: Option<String>,
    },

    /// Administrator menu nodes were created
    MenuBuilt {
        route: Route,
        element: String,
        nodes: usize,
    },

    /// Pushed installation steps were undone after a fatal failure
    RolledBack {
        route: Route,
        element: String,
        steps: usize,
        failures: usize,
    },

    /// The operation finished
    Completed {
        route: Route,
        element: String,
        extension_id: i64,
        warnings: usize,
    },

    /// The operation failed
    Failed {
        route: Route,
        element: String,
        failure: FailureContext,
    },

    /// A discovery scan finished
    DiscoveryCompleted { candidates: usize },
}

impl LifecycleEvent {
    /// Route of the operation this event belongs to, if any
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        match self {
            Self::Started { route, .. }
            | Self::PhaseCompleted { route, .. }
            | Self::HookInvoked { route, .. }
            | Self::FilesSynchronized { route, .. }
            | Self::SqlApplied { route, .. }
            | Self::MenuBuilt { route, .. }
            | Self::RolledBack { route, .. }
            | Self::Completed { route, .. }
            | Self::Failed { route, .. } => Some(*route),
            Self::RoutedToUpdate { .. } => Some(Route::Update),
            Self::DiscoveryCompleted { .. } => None,
        }
    }

    /// Element the event is about, if any
    #[must_use]
    pub fn element(&self) -> Option<&str> {
        match self {
            Self::Started { element, .. }
            | Self::PhaseCompleted { element, .. }
            | Self::RoutedToUpdate { element }
            | Self::HookInvoked { element, .. }
            | Self::FilesSynchronized { element, .. }
            | Self::SqlApplied { element, .. }
            | Self::MenuBuilt { element, .. }
            | Self::RolledBack { element, .. }
            | Self::Completed { element, .. }
            | Self::Failed { element, .. } => Some(element),
            Self::DiscoveryCompleted { .. } => None,
        }
    }
}
