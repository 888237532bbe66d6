//! Registry and filesystem phases shared by the install-type flows

use crate::context::OperationContext;
use crate::files;
use crate::policy::Phase;
use crate::steps::InstallationStep;
use extman_errors::{Error, InstallError};
use extman_events::EventEmitter;
use extman_manifest::ExtensionManifest;
use extman_platform::FilesystemOperations;
use extman_state::NewExtension;
use extman_types::{ClientScope, ElementId, ExtensionType};
use std::path::Path;

/// Registry state of a discovered but not yet installed extension
pub(crate) const STATE_DISCOVERED: i64 = -1;
/// Registry state of an installed extension
pub(crate) const STATE_INSTALLED: i64 = 0;

/// Registry row for a component described by `manifest`
///
/// # Errors
///
/// Returns an error if the manifest cache or parameters cannot be encoded.
pub(crate) fn new_extension(
    element: &ElementId,
    manifest: &ExtensionManifest,
    name: &str,
    client: ClientScope,
    state: i64,
) -> Result<NewExtension, Error> {
    Ok(NewExtension {
        name: name.to_string(),
        extension_type: ExtensionType::Component.as_str().to_string(),
        element: element.to_string(),
        folder: String::new(),
        client_id: client.client_id(),
        enabled: state == STATE_INSTALLED,
        access: 0,
        protected: false,
        manifest_cache: manifest.cache()?.to_json()?,
        params: manifest.params_json()?,
        state,
    })
}

pub(crate) fn require_admin_section(
    element: &ElementId,
    manifest: &ExtensionManifest,
) -> Result<(), Error> {
    if manifest.administration.is_none() {
        return Err(InstallError::MissingAdminSection {
            element: element.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Id stored by an earlier phase
pub(crate) fn extension_id(ctx: &OperationContext<'_>) -> Result<i64, Error> {
    ctx.extension_id.ok_or_else(|| {
        InstallError::Failed {
            message: format!("{} has no extension record yet", ctx.element),
        }
        .into()
    })
}

/// Create the site and administrator directories that are missing
pub(crate) async fn create_directories(ctx: &mut OperationContext<'_>) -> Result<(), Error> {
    for scope in [ClientScope::Site, ClientScope::Administrator] {
        let dir = ctx.paths.dir(scope).to_path_buf();
        if ctx.fs.exists(&dir).await {
            continue;
        }
        ctx.fs
            .create_dir_all(&dir)
            .await
            .map_err(|e| InstallError::DirectoryCreateFailed {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
        ctx.push(InstallationStep::CreatedDirectory(dir));
    }
    Ok(())
}

/// Store a new registry row for the operation's element
pub(crate) async fn store_record(
    ctx: &mut OperationContext<'_>,
    record: NewExtension,
) -> Result<(), Error> {
    let id = ctx
        .state
        .register_extension(&record)
        .await
        .map_err(|e| InstallError::ExtensionStoreFailed {
            element: ctx.element.to_string(),
            message: e.to_string(),
        })?;
    ctx.push(InstallationStep::RegisteredExtension { id });
    ctx.set_extension_id(id);
    Ok(())
}

/// Store the row for a fresh install
///
/// Installing with overwrite over a registered component takes over its
/// row instead of inserting a second one; that row is not rolled back.
pub(crate) async fn store_or_reuse(
    ctx: &mut OperationContext<'_>,
    record: NewExtension,
) -> Result<(), Error> {
    if !ctx.overwrite {
        return store_record(ctx, record).await;
    }
    let existing = ctx
        .state
        .find_extension(ctx.element.as_str(), ExtensionType::Component.as_str())
        .await?;
    let Some(row) = existing else {
        return store_record(ctx, record).await;
    };
    ctx.state
        .update_extension(row.extension_id, &record)
        .await
        .map_err(|e| InstallError::ExtensionStoreFailed {
            element: ctx.element.to_string(),
            message: e.to_string(),
        })?;
    ctx.emit_debug(format!(
        "reusing registry row {} for {}",
        row.extension_id, ctx.element
    ));
    ctx.set_extension_id(row.extension_id);
    Ok(())
}

/// Refresh name and manifest cache of an existing row
pub(crate) async fn refresh_record(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Result<(), Error> {
    let id = extension_id(ctx)?;
    let store_failed = |message: String| InstallError::ExtensionStoreFailed {
        element: ctx.element.to_string(),
        message,
    };
    let cache = manifest.cache()?.to_json()?;
    let updated = ctx
        .state
        .update_manifest_cache(id, manifest.display_name(), &cache)
        .await
        .map_err(|e| store_failed(e.to_string()))?;
    if !updated {
        return Err(store_failed(format!("extension {id} disappeared")).into());
    }
    Ok(())
}

/// Drop update-site entries queued for this component
pub(crate) async fn clear_pending_updates(ctx: &mut OperationContext<'_>) -> Result<(), Error> {
    let cleared = ctx
        .state
        .clear_pending_updates(
            ctx.element.as_str(),
            ExtensionType::Component.as_str(),
            ClientScope::Administrator.client_id(),
            "",
        )
        .await?;
    if cleared > 0 {
        ctx.emit_debug(format!("cleared {cleared} pending updates for {}", ctx.element));
    }
    Ok(())
}

async fn same_file(fs: &dyn FilesystemOperations, a: &Path, b: &Path) -> bool {
    match (fs.canonicalize(a).await, fs.canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Copy the descriptor into the administrator tree
pub(crate) async fn copy_manifest(ctx: &mut OperationContext<'_>, source: &Path) -> Result<(), Error> {
    let destination = ctx.paths.installed_manifest(&ctx.element);
    if same_file(ctx.fs, source, &destination).await {
        return Ok(());
    }

    let existed = ctx.fs.exists(&destination).await;
    ctx.fs
        .copy_file(source, &destination)
        .await
        .map_err(|e| InstallError::ManifestCopyFailed {
            destination: destination.display().to_string(),
            message: e.to_string(),
        })?;
    if !existed {
        ctx.push(InstallationStep::CopiedFile(destination));
    }
    Ok(())
}

/// Register the component's access-control asset unless one exists
pub(crate) async fn register_asset(ctx: &mut OperationContext<'_>) -> Result<(), Error> {
    let name = ctx.element.to_string();
    let asset_failed = |message: String| InstallError::AssetStoreFailed {
        name: name.clone(),
        message,
    };

    let existing = ctx
        .state
        .find_asset(&name)
        .await
        .map_err(|e| asset_failed(e.to_string()))?;
    if existing.is_some() {
        return Ok(());
    }

    ctx.state
        .register_asset(&name, &name, "{}")
        .await
        .map_err(|e| asset_failed(e.to_string()))?;
    ctx.push(InstallationStep::RegisteredAsset { name });
    Ok(())
}

/// Media and language copies; failures only warn
pub(crate) async fn copy_extras(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Result<(), Error> {
    if let Some(media) = manifest.media.as_ref() {
        run_phase!(ctx, Phase::CopyMedia, files::copy_media(ctx, media));
    }
    if let Some(set) = manifest.languages.as_ref() {
        run_phase!(
            ctx,
            Phase::CopyLanguages,
            files::copy_languages(ctx, ClientScope::Site, set)
        );
    }
    if let Some(set) = manifest.admin_languages() {
        run_phase!(
            ctx,
            Phase::CopyLanguages,
            files::copy_languages(ctx, ClientScope::Administrator, set)
        );
    }
    Ok(())
}
