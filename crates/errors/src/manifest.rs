//! Extension manifest error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ManifestError {
    #[error("manifest not found: {path}")]
    NotFound { path: String },

    #[error("invalid manifest: {message}")]
    Invalid { message: String },

    #[error("unsupported extension type: {found}")]
    UnsupportedType { found: String },

    #[error("invalid element name: {element}")]
    InvalidElement { element: String },

    #[error("invalid version {version}: {message}")]
    InvalidVersion { version: String, message: String },
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Point the command at the extension's manifest file."),
            Self::UnsupportedType { .. } => Some("Only `type = \"component\"` manifests are supported."),
            Self::Invalid { .. } | Self::InvalidElement { .. } | Self::InvalidVersion { .. } => {
                Some("Fix the manifest and retry.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "manifest.not_found",
            Self::Invalid { .. } => "manifest.invalid",
            Self::UnsupportedType { .. } => "manifest.unsupported_type",
            Self::InvalidElement { .. } => "manifest.invalid_element",
            Self::InvalidVersion { .. } => "manifest.invalid_version",
        };
        Some(code)
    }
}
