//! Components present on disk but missing from the registry

use crate::context::OperationContext;
use crate::paths::components_dir;
use crate::phases::{self, STATE_DISCOVERED, STATE_INSTALLED};
use crate::policy::Phase;
use crate::script::{self, Hook};
use crate::{menu, schema, InstallResult, Installer};
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, EventSender, LifecycleEvent};
use extman_manifest::ExtensionManifest;
use extman_state::NewExtension;
use extman_types::{ClientScope, ElementId, ExtensionSummary, ExtensionType, Route};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Unregistered component found by [`Installer::discover`]
#[derive(Debug, Clone)]
pub struct DiscoveryCandidate {
    pub element: ElementId,
    /// Tree the component was found in
    pub client: ClientScope,
    pub manifest_path: PathBuf,
    pub version: Option<String>,
    /// Row that would be stored, in the discovered state
    pub extension: NewExtension,
}

impl DiscoveryCandidate {
    /// Listing row; the id is 0 because nothing is stored yet
    #[must_use]
    pub fn summary(&self) -> ExtensionSummary {
        ExtensionSummary {
            extension_id: 0,
            element: self.element.to_string(),
            name: self.extension.name.clone(),
            client: self.client,
            enabled: self.extension.enabled,
            protected: self.extension.protected,
            version: self.version.clone(),
            schema_version: None,
        }
    }
}

impl Installer {
    /// Scan both component trees for descriptors of unregistered components
    ///
    /// A component present in both trees is reported once, from the
    /// administrator tree. Unreadable descriptors are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if a component tree cannot be listed or the registry
    /// cannot be queried.
    pub async fn discover(
        &self,
        events: Option<EventSender>,
    ) -> Result<Vec<DiscoveryCandidate>, Error> {
        let mut found: BTreeMap<ElementId, DiscoveryCandidate> = BTreeMap::new();
        let trees = [
            (ClientScope::Administrator, components_dir(&self.config.admin_root)),
            (ClientScope::Site, components_dir(&self.config.site_root)),
        ];

        for (client, tree) in trees {
            if !self.fs.is_dir(&tree).await {
                continue;
            }
            for dir in self.fs.list_dir(&tree).await? {
                if !self.fs.is_dir(&dir).await {
                    continue;
                }
                if let Some(candidate) = self.inspect(&dir, client, events.as_ref()).await? {
                    found.entry(candidate.element.clone()).or_insert(candidate);
                }
            }
        }

        if let Some(tx) = &events {
            tx.emit(AppEvent::Lifecycle(LifecycleEvent::DiscoveryCompleted {
                candidates: found.len(),
            }));
        }
        Ok(found.into_values().collect())
    }

    async fn inspect(
        &self,
        dir: &std::path::Path,
        client: ClientScope,
        events: Option<&EventSender>,
    ) -> Result<Option<DiscoveryCandidate>, Error> {
        let warn = |message: String| {
            if let Some(tx) = events {
                tx.emit_warning(message);
            }
        };

        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        let Ok(element) = ElementId::normalize(name) else {
            return Ok(None);
        };
        if self
            .state
            .find_extension(element.as_str(), ExtensionType::Component.as_str())
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let manifest_path = dir.join(element.manifest_file_name());
        if !self.fs.exists(&manifest_path).await {
            return Ok(None);
        }
        let manifest = match self.load_manifest(&manifest_path).await {
            Ok(manifest) => manifest,
            Err(err) => {
                warn(format!("skipping {}: {err}", manifest_path.display()));
                return Ok(None);
            }
        };
        match manifest.element() {
            Ok(declared) if declared == element => {}
            _ => {
                warn(format!(
                    "skipping {}: descriptor does not describe {element}",
                    manifest_path.display()
                ));
                return Ok(None);
            }
        }

        let extension =
            phases::new_extension(&element, &manifest, element.as_str(), client, STATE_DISCOVERED)?;
        Ok(Some(DiscoveryCandidate {
            element,
            client,
            manifest_path,
            version: manifest.version.clone(),
            extension,
        }))
    }

    /// Register and set up a component whose files are already in place
    ///
    /// No files are copied. The registry row is stored first so the SQL,
    /// menu and hook phases have an id to work with; any fatal failure
    /// removes it again.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::MissingAdminSection` for a descriptor without
    /// an administration section, or the error of the first fatal phase.
    pub async fn discover_install(
        &self,
        candidate: DiscoveryCandidate,
        events: Option<EventSender>,
    ) -> Result<InstallResult, Error> {
        let manifest = Arc::new(self.load_manifest(&candidate.manifest_path).await?);
        let mut ctx = self.operation(
            Route::DiscoverInstall,
            manifest,
            candidate.element.clone(),
            &candidate.manifest_path,
            events,
        );
        ctx.announce();

        match discover_install_phases(&mut ctx, candidate.client).await {
            Ok(()) => ctx.finish(),
            Err(err) => Err(ctx.abort(err).await),
        }
    }
}

async fn store_discovered(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
    client: ClientScope,
) -> Result<(), Error> {
    let record = phases::new_extension(
        &ctx.element,
        manifest,
        manifest.display_name(),
        client,
        STATE_INSTALLED,
    )?;

    let existing = ctx
        .state
        .find_extension(ctx.element.as_str(), ExtensionType::Component.as_str())
        .await?;
    match existing {
        None => phases::store_record(ctx, record).await,
        Some(row) if row.state == STATE_DISCOVERED => {
            ctx.state
                .update_extension(row.extension_id, &record)
                .await
                .map_err(|e| InstallError::ExtensionStoreFailed {
                    element: ctx.element.to_string(),
                    message: e.to_string(),
                })?;
            ctx.set_extension_id(row.extension_id);
            Ok(())
        }
        Some(row) => Err(InstallError::ExtensionStoreFailed {
            element: ctx.element.to_string(),
            message: format!("already installed as extension {}", row.extension_id),
        }
        .into()),
    }
}

async fn discover_install_phases(
    ctx: &mut OperationContext<'_>,
    client: ClientScope,
) -> Result<(), Error> {
    let manifest = Arc::clone(&ctx.manifest);

    run_phase!(ctx, Phase::StoreRecord, store_discovered(ctx, &manifest, client));
    phases::require_admin_section(&ctx.element, &manifest)?;
    let id = phases::extension_id(ctx)?;

    run_phase!(ctx, Phase::Preflight, script::invoke(ctx, Hook::Preflight));
    run_phase!(ctx, Phase::InstallSql, schema::run_install_sql(ctx, &manifest));
    run_phase!(ctx, Phase::BuildMenus, menu::build_admin_menus(ctx, &manifest, id));
    run_phase!(
        ctx,
        Phase::StampSchemaVersion,
        schema::stamp_schema_version(ctx, &manifest, id)
    );
    run_phase!(ctx, Phase::LifecycleHook, script::invoke(ctx, Hook::Install));
    run_phase!(ctx, Phase::ClearPendingUpdates, phases::clear_pending_updates(ctx));
    run_phase!(ctx, Phase::RegisterAsset, phases::register_asset(ctx));
    run_phase!(ctx, Phase::Postflight, script::invoke(ctx, Hook::Postflight));
    Ok(())
}
