#![warn(clippy::pedantic)]
#![deny(clippy::all)]

//! Component installation with rollback for extman
//!
//! This crate installs, updates, removes and discovers components. Each
//! operation runs as a fixed sequence of phases; side effects are recorded
//! as they happen so a fatal failure can undo them in reverse order.

#[macro_use]
mod macros;
mod api;
mod context;
mod discover;
mod files;
mod installer;
mod menu;
mod paths;
mod phases;
mod policy;
mod schema;
mod script;
mod steps;
mod uninstall;

pub use discover::DiscoveryCandidate;
pub use files::{FileSyncPlan, SyncEntry};
pub use installer::Installer;
pub use menu::{root_link, submenu_link};
pub use paths::{components_dir, ExtensionPaths};
pub use policy::{FailurePolicy, Phase};
pub use schema::{parse_schema_version, replace_prefix, split_statements, TABLE_PREFIX_PLACEHOLDER};
pub use script::{Hook, HookOutcome, InstallerScript, ScriptContext, ScriptRegistry};
pub use steps::InstallationStep;

// Re-export the public API surface from api module
pub use api::config::InstallConfig;
pub use api::context::{InstallContext, UninstallContext, UpdateContext};
pub use api::result::{InstallResult, UninstallResult};

// Re-export EventSender for use by macros and contexts
pub use extman_events::EventSender;
