//! Main installer implementation

use crate::context::OperationContext;
use crate::paths::ExtensionPaths;
use crate::phases::{self, STATE_INSTALLED};
use crate::policy::Phase;
use crate::script::{self, Hook, ScriptRegistry};
use crate::{files, menu, schema};
use crate::{InstallConfig, InstallContext, InstallResult, UpdateContext};
use extman_errors::{Error, InstallError, ManifestError};
use extman_events::{AppEvent, EventEmitter, EventSender, LifecycleEvent};
use extman_manifest::ExtensionManifest;
use extman_platform::{FilesystemOperations, LocalFilesystem};
use extman_state::{ExtensionRecord, StateManager};
use extman_types::{ClientScope, ElementId, ExtensionType, Route};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Component installer
///
/// Holds only long-lived collaborators; every operation builds its own
/// context and leaves nothing behind on the installer.
#[derive(Clone)]
pub struct Installer {
    pub(crate) config: InstallConfig,
    pub(crate) state: StateManager,
    pub(crate) fs: Arc<dyn FilesystemOperations>,
    pub(crate) scripts: ScriptRegistry,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("config", &self.config)
            .field("scripts", &self.scripts)
            .finish_non_exhaustive()
    }
}

impl Installer {
    /// Create an installer working on the local filesystem
    #[must_use]
    pub fn new(config: InstallConfig, state: StateManager) -> Self {
        Self {
            config,
            state,
            fs: Arc::new(LocalFilesystem::new()),
            scripts: ScriptRegistry::new(),
        }
    }

    #[must_use]
    pub fn with_filesystem(mut self, fs: Arc<dyn FilesystemOperations>) -> Self {
        self.fs = fs;
        self
    }

    /// Lifecycle scripts available to extensions that declare a `scriptfile`
    #[must_use]
    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    #[must_use]
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Read and validate a descriptor
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` for a missing file and a manifest
    /// error for invalid content.
    pub async fn load_manifest(&self, path: &Path) -> Result<ExtensionManifest, Error> {
        if !self.fs.exists(path).await {
            return Err(ManifestError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = self.fs.read_to_string(path).await?;
        ExtensionManifest::from_toml(&content)
    }

    /// Install a component from an unpacked package
    ///
    /// Routes to the update flow when the component's directories already
    /// exist and the package asks for an upgrade. Every side effect of a
    /// failed install is rolled back.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::DirectoryExists` when the component is present
    /// and neither overwrite nor upgrade applies, or the error of the first
    /// fatal phase.
    pub async fn install(&self, context: InstallContext) -> Result<InstallResult, Error> {
        let manifest = Arc::new(self.load_manifest(&context.manifest_path).await?);
        let element = manifest.element()?;
        let mut ctx = self.operation(
            Route::Install,
            manifest,
            element,
            &context.manifest_path,
            context.event_sender.clone(),
        );

        if let Err(err) = phases::require_admin_section(&ctx.element, &ctx.manifest) {
            ctx.failed(&err);
            return Err(err);
        }

        if let Some(existing) = self.existing_directory(&ctx.paths).await {
            let upgrade = ctx.manifest.has_update_section()
                || ctx.manifest.requests_upgrade()
                || ctx.script.as_ref().is_some_and(|s| s.handles_update())
                || context.upgrade;
            if upgrade {
                ctx.emit(AppEvent::Lifecycle(LifecycleEvent::RoutedToUpdate {
                    element: ctx.element.to_string(),
                }));
                ctx.set_route(Route::Update);
                let ctx = ctx.with_overwrite(true);
                return Self::run_update(ctx, &context.manifest_path).await;
            }
            if !(context.overwrite || self.config.overwrite) {
                let err: Error = InstallError::DirectoryExists {
                    path: existing.display().to_string(),
                }
                .into();
                ctx.failed(&err);
                return Err(err);
            }
            ctx = ctx.with_overwrite(true);
        }

        ctx.announce();
        match install_phases(&mut ctx, &context.manifest_path).await {
            Ok(()) => ctx.finish(),
            Err(err) => Err(ctx.abort(err).await),
        }
    }

    /// Update an installed component in place
    ///
    /// Files dropped from the new file lists are removed, pending schema
    /// scripts run and menus are rebuilt. A component without a registry
    /// row is registered as if freshly installed.
    ///
    /// # Errors
    ///
    /// Returns the error of the first fatal phase; its side effects are
    /// rolled back.
    pub async fn update(&self, context: UpdateContext) -> Result<InstallResult, Error> {
        let manifest = Arc::new(self.load_manifest(&context.manifest_path).await?);
        let element = manifest.element()?;
        let ctx = self
            .operation(
                Route::Update,
                manifest,
                element,
                &context.manifest_path,
                context.event_sender.clone(),
            )
            .with_overwrite(true);

        if let Err(err) = phases::require_admin_section(&ctx.element, &ctx.manifest) {
            ctx.failed(&err);
            return Err(err);
        }
        Self::run_update(ctx, &context.manifest_path).await
    }

    async fn run_update(
        mut ctx: OperationContext<'_>,
        manifest_path: &Path,
    ) -> Result<InstallResult, Error> {
        ctx.announce();
        match update_phases(&mut ctx, manifest_path).await {
            Ok(()) => ctx.finish(),
            Err(err) => Err(ctx.abort(err).await),
        }
    }

    /// Re-read the installed descriptor into the registry row
    ///
    /// Only the name and manifest cache change.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::ExtensionNotFound` for an unknown id and
    /// `InstallError::ManifestMissing` when no installed descriptor exists.
    pub async fn refresh_manifest_cache(&self, extension_id: i64) -> Result<ExtensionRecord, Error> {
        let record = self.registered(extension_id).await?;
        let element = record.element_id()?;
        let paths = ExtensionPaths::resolve(&self.config, &element);

        let mut manifest = None;
        for candidate in paths.manifest_candidates(&element) {
            if self.fs.exists(&candidate).await {
                manifest = Some(self.load_manifest(&candidate).await?);
                break;
            }
        }
        let manifest = manifest.ok_or_else(|| InstallError::ManifestMissing {
            element: element.to_string(),
            leftovers: Vec::new(),
        })?;

        let cache = manifest.cache()?.to_json()?;
        self.state
            .update_manifest_cache(extension_id, manifest.display_name(), &cache)
            .await?;
        self.registered(extension_id).await
    }

    pub(crate) async fn registered(&self, extension_id: i64) -> Result<ExtensionRecord, Error> {
        self.state
            .get_extension(extension_id)
            .await?
            .ok_or_else(|| InstallError::ExtensionNotFound { id: extension_id }.into())
    }

    pub(crate) fn operation(
        &self,
        route: Route,
        manifest: Arc<ExtensionManifest>,
        element: ElementId,
        manifest_path: &Path,
        events: Option<EventSender>,
    ) -> OperationContext<'_> {
        let source = manifest_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);
        OperationContext::new(self, route, manifest, element, source, events)
    }

    async fn existing_directory(&self, paths: &ExtensionPaths) -> Option<PathBuf> {
        for scope in [ClientScope::Site, ClientScope::Administrator] {
            let dir = paths.dir(scope);
            if self.fs.exists(dir).await {
                return Some(dir.to_path_buf());
            }
        }
        None
    }
}

async fn install_phases(ctx: &mut OperationContext<'_>, manifest_path: &Path) -> Result<(), Error> {
    let manifest = Arc::clone(&ctx.manifest);

    run_phase!(ctx, Phase::Preflight, script::invoke(ctx, Hook::Preflight));
    run_phase!(ctx, Phase::CreateDirectories, phases::create_directories(ctx));
    run_phase!(
        ctx,
        Phase::CopyFiles,
        files::sync_scope(ctx, ClientScope::Site, None, manifest.site_files())
    );
    run_phase!(
        ctx,
        Phase::CopyFiles,
        files::sync_scope(ctx, ClientScope::Administrator, None, manifest.admin_files())
    );
    run_phase!(ctx, Phase::CopyFiles, files::copy_script_file(ctx));
    phases::copy_extras(ctx, &manifest).await?;

    run_phase!(ctx, Phase::InstallSql, schema::run_install_sql(ctx, &manifest));
    run_phase!(ctx, Phase::LifecycleHook, script::invoke(ctx, Hook::Install));

    let record = phases::new_extension(
        &ctx.element,
        &manifest,
        manifest.display_name(),
        ClientScope::Administrator,
        STATE_INSTALLED,
    )?;
    run_phase!(ctx, Phase::StoreRecord, phases::store_or_reuse(ctx, record));
    let id = phases::extension_id(ctx)?;

    run_phase!(ctx, Phase::ClearPendingUpdates, phases::clear_pending_updates(ctx));
    run_phase!(ctx, Phase::CopyManifest, phases::copy_manifest(ctx, manifest_path));
    run_phase!(ctx, Phase::BuildMenus, menu::build_admin_menus(ctx, &manifest, id));
    run_phase!(ctx, Phase::RegisterAsset, phases::register_asset(ctx));
    run_phase!(
        ctx,
        Phase::StampSchemaVersion,
        schema::stamp_schema_version(ctx, &manifest, id)
    );
    run_phase!(ctx, Phase::Postflight, script::invoke(ctx, Hook::Postflight));
    Ok(())
}

/// Descriptor of the installed version, used to find files the new version
/// dropped
async fn previous_manifest(ctx: &OperationContext<'_>) -> Option<ExtensionManifest> {
    for candidate in ctx.paths.manifest_candidates(&ctx.element) {
        if !ctx.fs.exists(&candidate).await {
            continue;
        }
        let parsed = match ctx.fs.read_to_string(&candidate).await {
            Ok(content) => ExtensionManifest::from_toml(&content),
            Err(err) => Err(err.into()),
        };
        match parsed {
            Ok(manifest) => return Some(manifest),
            Err(err) => ctx.emit_warning_with_context(
                format!("ignoring installed manifest {}: {err}", candidate.display()),
                ctx.element.to_string(),
            ),
        }
    }
    None
}

async fn update_phases(ctx: &mut OperationContext<'_>, manifest_path: &Path) -> Result<(), Error> {
    let manifest = Arc::clone(&ctx.manifest);
    let previous = previous_manifest(ctx).await;

    run_phase!(ctx, Phase::Preflight, script::invoke(ctx, Hook::Preflight));
    run_phase!(ctx, Phase::CreateDirectories, phases::create_directories(ctx));
    run_phase!(
        ctx,
        Phase::CopyFiles,
        files::sync_scope(
            ctx,
            ClientScope::Site,
            previous.as_ref().and_then(ExtensionManifest::site_files),
            manifest.site_files(),
        )
    );
    run_phase!(
        ctx,
        Phase::CopyFiles,
        files::sync_scope(
            ctx,
            ClientScope::Administrator,
            previous.as_ref().and_then(ExtensionManifest::admin_files),
            manifest.admin_files(),
        )
    );
    run_phase!(ctx, Phase::CopyFiles, files::copy_script_file(ctx));
    phases::copy_extras(ctx, &manifest).await?;

    let existing = ctx
        .state
        .find_extension(ctx.element.as_str(), ExtensionType::Component.as_str())
        .await?;
    let fresh = existing.is_none();
    match existing {
        Some(record) => {
            ctx.set_extension_id(record.extension_id);
            run_phase!(
                ctx,
                Phase::SchemaUpdate,
                schema::run_schema_updates(ctx, &manifest, record.extension_id)
            );
        }
        None => {
            ctx.emit_debug(format!("{} has no registry row, registering", ctx.element));
            let record = phases::new_extension(
                &ctx.element,
                &manifest,
                manifest.display_name(),
                ClientScope::Administrator,
                STATE_INSTALLED,
            )?;
            run_phase!(ctx, Phase::StoreRecord, phases::store_record(ctx, record));
            run_phase!(ctx, Phase::InstallSql, schema::run_install_sql(ctx, &manifest));
        }
    }
    let id = phases::extension_id(ctx)?;

    run_phase!(ctx, Phase::BuildMenus, menu::build_admin_menus(ctx, &manifest, id));
    run_phase!(ctx, Phase::LifecycleHook, script::invoke(ctx, Hook::Update));
    run_phase!(ctx, Phase::ClearPendingUpdates, phases::clear_pending_updates(ctx));
    if !fresh {
        run_phase!(ctx, Phase::StoreRecord, phases::refresh_record(ctx, &manifest));
    }
    run_phase!(ctx, Phase::CopyManifest, phases::copy_manifest(ctx, manifest_path));
    run_phase!(ctx, Phase::RegisterAsset, phases::register_asset(ctx));
    if fresh {
        run_phase!(
            ctx,
            Phase::StampSchemaVersion,
            schema::stamp_schema_version(ctx, &manifest, id)
        );
    }
    run_phase!(ctx, Phase::Postflight, script::invoke(ctx, Hook::Postflight));
    Ok(())
}
