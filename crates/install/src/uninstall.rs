//! Component removal
//!
//! Once the hooks have agreed, removal is best-effort: every cleanup step
//! runs even when an earlier one failed, and failures are collected into
//! the result instead of stopping the operation.

use crate::context::OperationContext;
use crate::paths::ExtensionPaths;
use crate::policy::Phase;
use crate::script::{self, Hook};
use crate::{files, menu, schema};
use crate::{Installer, UninstallContext, UninstallResult};
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, FailureContext, LifecycleEvent};
use extman_state::ExtensionRecord;
use extman_types::{ClientScope, ElementId, ExtensionType, Route};
use std::path::Path;
use std::sync::Arc;

impl Installer {
    /// Remove an installed component
    ///
    /// Protected extensions are refused without touching anything. When the
    /// installed descriptor is gone the directories and menus are removed
    /// anyway and `InstallError::ManifestMissing` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or protected extension, a missing
    /// descriptor, or a hook that aborts. Cleanup failures after the hooks
    /// are reported through [`UninstallResult::failures`] instead.
    pub async fn uninstall(&self, context: UninstallContext) -> Result<UninstallResult, Error> {
        let record = self.registered(context.extension_id).await?;
        let element = record.element_id()?;

        if record.protected {
            return Err(InstallError::ProtectedExtension {
                element: element.to_string(),
            }
            .into());
        }

        let installed = ExtensionPaths::resolve(&self.config, &element)
            .installed_manifest(&element);
        if !self.fs.exists(&installed).await {
            return Err(self.remove_orphan(&record, &element, &context).await);
        }

        let manifest = Arc::new(self.load_manifest(&installed).await?);
        let mut ctx = self.operation(
            Route::Uninstall,
            manifest,
            element,
            &installed,
            context.event_sender.clone(),
        );
        ctx.set_extension_id(record.extension_id);
        ctx.announce();

        for hook in [Hook::Preflight, Hook::Uninstall] {
            if let Err(err) = script::invoke(&mut ctx, hook).await {
                ctx.failed(&err);
                return Err(err);
            }
        }

        remove_everything(&mut ctx, &record).await;

        let failures = ctx.take_failures();
        let success = failures.is_empty();
        ctx.emit(AppEvent::Lifecycle(LifecycleEvent::Completed {
            route: Route::Uninstall,
            element: ctx.element.to_string(),
            extension_id: record.extension_id,
            warnings: failures.len(),
        }));

        Ok(UninstallResult {
            element: ctx.element.to_string(),
            extension_id: record.extension_id,
            success,
            failures,
            messages: ctx.take_output(),
            duration: ctx.elapsed(),
        })
    }

    /// Clean up what can be found for a component whose descriptor is gone
    async fn remove_orphan(
        &self,
        record: &ExtensionRecord,
        element: &ElementId,
        context: &UninstallContext,
    ) -> Error {
        let paths = ExtensionPaths::resolve(&self.config, element);
        let mut leftovers = Vec::new();
        for scope in [ClientScope::Site, ClientScope::Administrator] {
            let dir = paths.dir(scope);
            if !self.fs.exists(dir).await {
                continue;
            }
            if let Err(e) = self.fs.remove_dir_all(dir).await {
                let err = InstallError::DirectoryDeleteFailed {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                };
                leftovers.push(format!("{}: {err}", Phase::RemoveDirectories));
            }
        }
        if let Err(err) = menu::remove_admin_menus(&self.state, record.extension_id).await {
            leftovers.push(format!("{}: {err}", Phase::RemoveMenus));
        }

        if let Some(sender) = &context.event_sender {
            for leftover in &leftovers {
                sender.emit_warning_with_context(leftover.clone(), element.to_string());
            }
        }

        let err: Error = InstallError::ManifestMissing {
            element: element.to_string(),
            leftovers,
        }
        .into();
        if let Some(sender) = &context.event_sender {
            sender.emit(AppEvent::Lifecycle(LifecycleEvent::Failed {
                route: Route::Uninstall,
                element: element.to_string(),
                failure: FailureContext::from_error(&err),
            }));
        }
        err
    }
}

async fn remove_everything(ctx: &mut OperationContext<'_>, record: &ExtensionRecord) {
    let manifest = Arc::clone(&ctx.manifest);
    let id = record.extension_id;
    let element = ctx.element.to_string();

    let result = schema::run_uninstall_sql(ctx, &manifest).await;
    settle(ctx, Phase::UninstallSql, result);

    let result = menu::remove_admin_menus(ctx.state, id).await.map(drop);
    settle(ctx, Phase::RemoveMenus, result);

    let mut file_failures = files::remove_media(ctx, &manifest).await;
    file_failures.extend(files::remove_languages(ctx, &manifest).await);
    for failure in file_failures {
        let err: Error = InstallError::Failed { message: failure }.into();
        ctx.collect(Phase::RemoveFiles, &err);
    }

    let result = ctx.state.delete_schema_version(id).await.map(drop);
    settle(ctx, Phase::RemoveBookkeeping, result);
    let result = ctx.state.remove_asset(&element).await.map(drop);
    settle(ctx, Phase::RemoveBookkeeping, result);
    let result = ctx.state.delete_categories(&element).await.map(drop);
    settle(ctx, Phase::RemoveBookkeeping, result);
    let result = ctx
        .state
        .clear_pending_updates(
            &element,
            ExtensionType::Component.as_str(),
            ClientScope::Administrator.client_id(),
            "",
        )
        .await
        .map(drop);
    settle(ctx, Phase::RemoveBookkeeping, result);

    for scope in [ClientScope::Site, ClientScope::Administrator] {
        let dir = ctx.paths.dir(scope).to_path_buf();
        let result = remove_directory(ctx, &dir).await;
        settle(ctx, Phase::RemoveDirectories, result);
    }

    let result = ctx.state.remove_extension(id, &element).await.map(drop);
    settle(ctx, Phase::RemoveRecord, result);
}

/// Collect-policy phases never fail the operation
fn settle(ctx: &mut OperationContext<'_>, phase: Phase, result: Result<(), Error>) {
    if let Err(err) = ctx.settle(phase, result) {
        ctx.collect(phase, &err);
    }
}

async fn remove_directory(ctx: &OperationContext<'_>, dir: &Path) -> Result<(), Error> {
    if !ctx.fs.exists(dir).await {
        return Ok(());
    }
    ctx.fs.remove_dir_all(dir).await.map_err(|e| {
        InstallError::DirectoryDeleteFailed {
            path: dir.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
