//! Installer lifecycle error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("another extension is already using directory: {path}")]
    DirectoryExists { path: String },

    #[error("manifest for {element} has no administration section")]
    MissingAdminSection { element: String },

    #[error("could not find an installed manifest for {element}{}", leftover_note(.leftovers))]
    ManifestMissing {
        element: String,
        /// Cleanup steps that failed while removing what was left
        leftovers: Vec<String>,
    },

    #[error("extension {element} is protected and cannot be uninstalled")]
    ProtectedExtension { element: String },

    #[error("extension not found: {id}")]
    ExtensionNotFound { id: i64 },

    #[error("failed to copy {source_path} to {destination}: {message}")]
    FileCopyFailed {
        source_path: String,
        destination: String,
        message: String,
    },

    #[error("{phase} SQL failed at statement {statement}: {message}")]
    SqlBatchFailed {
        phase: String,
        statement: usize,
        message: String,
    },

    #[error("{hook} hook refused the {route} operation")]
    HookFailed { hook: String, route: String },

    #[error("failed to build administrator menu: {message}")]
    MenuBuildFailed { message: String },

    #[error("failed to register asset {name}: {message}")]
    AssetStoreFailed { name: String, message: String },

    #[error("failed to store extension record for {element}: {message}")]
    ExtensionStoreFailed { element: String, message: String },

    #[error("failed to copy manifest to {destination}: {message}")]
    ManifestCopyFailed { destination: String, message: String },

    #[error("failed to create directory {path}: {message}")]
    DirectoryCreateFailed { path: String, message: String },

    #[error("failed to delete directory {path}: {message}")]
    DirectoryDeleteFailed { path: String, message: String },

    #[error("rollback failed: {message}")]
    RollbackFailed { message: String },

    #[error("installation failed: {message}")]
    Failed { message: String },
}

fn leftover_note(leftovers: &[String]) -> String {
    match leftovers.len() {
        0 => String::new(),
        n => format!(" ({n} cleanup failures: {})", leftovers.join("; ")),
    }
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DirectoryExists { .. } => Some(
                "Pass --overwrite to replace the existing files, or --upgrade to update in place.",
            ),
            Self::MissingAdminSection { .. } => {
                Some("Add an [administration] table to the extension manifest.")
            }
            Self::ManifestMissing { .. } => Some(
                "The extension files were removed; reinstall the extension before uninstalling it.",
            ),
            Self::ProtectedExtension { .. } => {
                Some("Protected extensions ship with the site and cannot be removed.")
            }
            Self::ExtensionNotFound { .. } => {
                Some("Run `extman list` to see the registered extensions.")
            }
            Self::SqlBatchFailed { .. } => {
                Some("Fix the failing statement in the extension's SQL file and retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DirectoryDeleteFailed { .. } | Self::DirectoryCreateFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DirectoryExists { .. } => "install.directory_exists",
            Self::MissingAdminSection { .. } => "install.missing_admin_section",
            Self::ManifestMissing { .. } => "install.manifest_missing",
            Self::ProtectedExtension { .. } => "install.protected_extension",
            Self::ExtensionNotFound { .. } => "install.extension_not_found",
            Self::FileCopyFailed { .. } => "install.file_copy_failed",
            Self::SqlBatchFailed { .. } => "install.sql_batch_failed",
            Self::HookFailed { .. } => "install.hook_failed",
            Self::MenuBuildFailed { .. } => "install.menu_build_failed",
            Self::AssetStoreFailed { .. } => "install.asset_store_failed",
            Self::ExtensionStoreFailed { .. } => "install.extension_store_failed",
            Self::ManifestCopyFailed { .. } => "install.manifest_copy_failed",
            Self::DirectoryCreateFailed { .. } => "install.directory_create_failed",
            Self::DirectoryDeleteFailed { .. } => "install.directory_delete_failed",
            Self::RollbackFailed { .. } => "install.rollback_failed",
            Self::Failed { .. } => "install.failed",
        };
        Some(code)
    }
}
