//! Install, update and discover-install commands
//!
//! Thin wrappers over the installer: build the request context, wire the
//! event channel through and turn the result into a serializable report.

use crate::OpsCtx;
use extman_errors::{Error, OpsError};
use extman_install::{InstallContext, UpdateContext};
use extman_types::{ElementId, InstallReport};
use std::path::Path;

/// Install a component from an unpacked package
///
/// # Errors
///
/// Returns an error if the descriptor cannot be read or a fatal install
/// phase fails; the installer has rolled back by then.
pub async fn install(
    ctx: &OpsCtx,
    manifest_path: &Path,
    overwrite: bool,
    upgrade: bool,
) -> Result<InstallReport, Error> {
    let operation = ctx.begin("install");
    let context = InstallContext::new()
        .with_manifest_path(manifest_path.to_path_buf())
        .with_overwrite(overwrite)
        .with_upgrade(upgrade)
        .with_event_sender(ctx.tx.clone());

    let result = ctx.installer.install(context).await.map(|r| r.into_report());
    ctx.end(&operation, result)
}

/// Update an installed component from an unpacked package
///
/// # Errors
///
/// Returns an error if the descriptor cannot be read or a fatal update
/// phase fails.
pub async fn update(ctx: &OpsCtx, manifest_path: &Path) -> Result<InstallReport, Error> {
    let operation = ctx.begin("update");
    let context = UpdateContext::new()
        .with_manifest_path(manifest_path.to_path_buf())
        .with_event_sender(ctx.tx.clone());

    let result = ctx.installer.update(context).await.map(|r| r.into_report());
    ctx.end(&operation, result)
}

/// Register a component whose files are already on disk
///
/// # Errors
///
/// Returns `OpsError::NotDiscovered` when discovery does not report the
/// element, or the installer's error.
pub async fn discover_install(ctx: &OpsCtx, element: &str) -> Result<InstallReport, Error> {
    let operation = ctx.begin("discover-install");
    let result = async {
        let element = ElementId::normalize(element)?;
        let candidate = ctx
            .installer
            .discover(Some(ctx.tx.clone()))
            .await?
            .into_iter()
            .find(|c| c.element == element)
            .ok_or_else(|| OpsError::NotDiscovered {
                element: element.to_string(),
            })?;

        let result = ctx
            .installer
            .discover_install(candidate, Some(ctx.tx.clone()))
            .await?;
        Ok::<_, Error>(result.into_report())
    }
    .await;
    ctx.end(&operation, result)
}
