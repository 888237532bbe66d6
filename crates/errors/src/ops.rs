//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OpsError {
    #[error("operation failed: {message}")]
    OperationFailed { message: String },

    #[error("component not found: {component}")]
    MissingComponent { component: String },

    #[error("context creation failed: {message}")]
    ContextCreationFailed { message: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("no extensions specified")]
    NoExtensionsSpecified,

    #[error("extension not registered: {target}")]
    ExtensionNotRegistered { target: String },

    #[error("no discovered extension matches: {element}")]
    NotDiscovered { element: String },

    #[error("uninstall of {element} finished with {failures} failure(s)")]
    UninstallIncomplete { element: String, failures: usize },

    #[error("event channel closed")]
    EventChannelClosed,
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExtensionNotRegistered { .. } => {
                Some("Run `extman list` to see the registered extensions.")
            }
            Self::NotDiscovered { .. } => {
                Some("Run `extman discover` to see the extensions found on disk.")
            }
            Self::UninstallIncomplete { .. } => {
                Some("Inspect the warnings above and remove the leftover files manually.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::OperationFailed { .. } => "ops.operation_failed",
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::ContextCreationFailed { .. } => "ops.context_creation_failed",
            Self::SerializationError { .. } => "ops.serialization_error",
            Self::NoExtensionsSpecified => "ops.no_extensions_specified",
            Self::ExtensionNotRegistered { .. } => "ops.extension_not_registered",
            Self::NotDiscovered { .. } => "ops.not_discovered",
            Self::UninstallIncomplete { .. } => "ops.uninstall_incomplete",
            Self::EventChannelClosed => "ops.event_channel_closed",
        };
        Some(code)
    }
}
