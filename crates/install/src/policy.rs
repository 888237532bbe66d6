//! What a phase failure does to the operation

use std::fmt;

/// Named phase of an installer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Preflight,
    CreateDirectories,
    CopyFiles,
    CopyMedia,
    CopyLanguages,
    InstallSql,
    SchemaUpdate,
    LifecycleHook,
    StoreRecord,
    ClearPendingUpdates,
    CopyManifest,
    BuildMenus,
    RegisterAsset,
    StampSchemaVersion,
    Postflight,
    UninstallSql,
    RemoveMenus,
    RemoveFiles,
    RemoveBookkeeping,
    RemoveDirectories,
    RemoveRecord,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::CreateDirectories => "create_directories",
            Self::CopyFiles => "copy_files",
            Self::CopyMedia => "copy_media",
            Self::CopyLanguages => "copy_languages",
            Self::InstallSql => "install_sql",
            Self::SchemaUpdate => "schema_update",
            Self::LifecycleHook => "lifecycle_hook",
            Self::StoreRecord => "store_record",
            Self::ClearPendingUpdates => "clear_pending_updates",
            Self::CopyManifest => "copy_manifest",
            Self::BuildMenus => "build_menus",
            Self::RegisterAsset => "register_asset",
            Self::StampSchemaVersion => "stamp_schema_version",
            Self::Postflight => "postflight",
            Self::UninstallSql => "uninstall_sql",
            Self::RemoveMenus => "remove_menus",
            Self::RemoveFiles => "remove_files",
            Self::RemoveBookkeeping => "remove_bookkeeping",
            Self::RemoveDirectories => "remove_directories",
            Self::RemoveRecord => "remove_record",
        }
    }

    /// How a failure in this phase is handled
    #[must_use]
    pub fn policy(self) -> FailurePolicy {
        match self {
            Self::Preflight
            | Self::CreateDirectories
            | Self::CopyFiles
            | Self::InstallSql
            | Self::SchemaUpdate
            | Self::LifecycleHook
            | Self::StoreRecord
            | Self::CopyManifest
            | Self::RegisterAsset => FailurePolicy::Abort,
            // Menus stay a warning even though the asset is fatal
            Self::CopyMedia
            | Self::CopyLanguages
            | Self::ClearPendingUpdates
            | Self::BuildMenus
            | Self::StampSchemaVersion
            | Self::Postflight => FailurePolicy::Warn,
            Self::UninstallSql
            | Self::RemoveMenus
            | Self::RemoveFiles
            | Self::RemoveBookkeeping
            | Self::RemoveDirectories
            | Self::RemoveRecord => FailurePolicy::Collect,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction to a failed phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Roll back every recorded step and fail the operation
    Abort,
    /// Report a warning and continue
    Warn,
    /// Record the failure, continue, and report it at the end
    Collect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menus_warn_but_assets_abort() {
        assert_eq!(Phase::BuildMenus.policy(), FailurePolicy::Warn);
        assert_eq!(Phase::RegisterAsset.policy(), FailurePolicy::Abort);
    }

    #[test]
    fn uninstall_cleanup_is_collected() {
        for phase in [
            Phase::UninstallSql,
            Phase::RemoveMenus,
            Phase::RemoveFiles,
            Phase::RemoveDirectories,
            Phase::RemoveRecord,
        ] {
            assert_eq!(phase.policy(), FailurePolicy::Collect, "{phase}");
        }
    }
}
