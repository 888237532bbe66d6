use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use extman_errors::UserFacingError;
use extman_types::Route;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod lifecycle;
pub mod state;

pub use general::*;
pub use lifecycle::*;
pub use state::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Extension lifecycle events (install, update, uninstall, discover)
    Lifecycle(LifecycleEvent),

    /// Persistence events (records, nested-set trees, schema versions)
    State(StateEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::State(_) => EventSource::STATE,
            Self::Lifecycle(event) => match event.route() {
                Some(Route::Install | Route::DiscoverInstall) => EventSource::INSTALL,
                Some(Route::Update) => EventSource::UPDATE,
                Some(Route::Uninstall) => EventSource::UNINSTALL,
                None => EventSource::DISCOVER,
            },
        }
    }

    /// Severity of this event
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Lifecycle(LifecycleEvent::Failed { .. }) => EventLevel::Error,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Lifecycle(LifecycleEvent::RolledBack { .. }) => EventLevel::Warn,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Lifecycle(LifecycleEvent::PhaseCompleted { .. })
            | Self::State(StateEvent::TreeRebuilt { .. }) => EventLevel::Debug,

            _ => EventLevel::Info,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        self.level().into()
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "extman::events::general",
            Self::State(_) => "extman::events::state",
            Self::Lifecycle(event) => match event.route() {
                Some(Route::Install | Route::DiscoverInstall) => "extman::events::install",
                Some(Route::Update) => "extman::events::update",
                Some(Route::Uninstall) => "extman::events::uninstall",
                None => "extman::events::discover",
            },
        }
    }
}
