//! Operation-scoped state threaded through every phase

use crate::paths::ExtensionPaths;
use crate::policy::{FailurePolicy, Phase};
use crate::script::{InstallerScript, ScriptContext};
use crate::steps::InstallationStep;
use crate::{InstallConfig, InstallResult, Installer};
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, EventSender, FailureContext, LifecycleEvent};
use extman_manifest::ExtensionManifest;
use extman_platform::FilesystemOperations;
use extman_state::StateManager;
use extman_types::{ElementId, Route};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Everything one install, update, uninstall or discover-install needs
///
/// Created per operation and dropped when it ends; the [`Installer`] itself
/// keeps no per-operation state.
pub(crate) struct OperationContext<'a> {
    pub fs: &'a dyn FilesystemOperations,
    pub state: &'a StateManager,
    pub config: &'a InstallConfig,
    pub route: Route,
    pub element: ElementId,
    pub manifest: Arc<ExtensionManifest>,
    pub paths: ExtensionPaths,
    /// Directory holding the descriptor being installed
    pub source: PathBuf,
    pub overwrite: bool,
    pub script: Option<Arc<dyn InstallerScript>>,
    pub script_ctx: ScriptContext,
    pub extension_id: Option<i64>,
    steps: Vec<InstallationStep>,
    warnings: Vec<String>,
    failures: Vec<String>,
    events: Option<EventSender>,
    started: Instant,
}

impl EventEmitter for OperationContext<'_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl<'a> OperationContext<'a> {
    pub fn new(
        installer: &'a Installer,
        route: Route,
        manifest: Arc<ExtensionManifest>,
        element: ElementId,
        source: PathBuf,
        events: Option<EventSender>,
    ) -> Self {
        let paths = ExtensionPaths::resolve(&installer.config, &element);
        let script = manifest
            .scriptfile
            .as_ref()
            .and_then(|_| installer.scripts.resolve(&element));
        let script_ctx = ScriptContext::new(element.clone(), route, Arc::clone(&manifest));

        Self {
            fs: installer.fs.as_ref(),
            state: &installer.state,
            config: &installer.config,
            route,
            element,
            manifest,
            paths,
            source,
            overwrite: installer.config.overwrite,
            script,
            script_ctx,
            extension_id: None,
            steps: Vec::new(),
            warnings: Vec::new(),
            failures: Vec::new(),
            events,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn set_extension_id(&mut self, id: i64) {
        self.extension_id = Some(id);
        self.script_ctx.set_extension_id(id);
    }

    pub fn set_route(&mut self, route: Route) {
        self.route = route;
        self.script_ctx.set_route(route);
    }

    pub fn push(&mut self, step: InstallationStep) {
        self.steps.push(step);
    }

    pub fn announce(&self) {
        self.emit(AppEvent::Lifecycle(LifecycleEvent::Started {
            route: self.route,
            element: self.element.to_string(),
            version: self.manifest.version.clone(),
        }));
    }

    /// Apply the phase's failure policy to its result
    ///
    /// # Errors
    ///
    /// Returns the phase error unchanged when the policy is
    /// [`FailurePolicy::Abort`].
    pub fn settle(&mut self, phase: Phase, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Ok(()) => {
                self.emit_phase(self.route, self.element.as_str(), phase.as_str());
                Ok(())
            }
            Err(err) => match phase.policy() {
                FailurePolicy::Abort => Err(err),
                FailurePolicy::Warn => {
                    self.warn(phase, &err);
                    Ok(())
                }
                FailurePolicy::Collect => {
                    self.collect(phase, &err);
                    Ok(())
                }
            },
        }
    }

    pub fn warn(&mut self, phase: Phase, err: &Error) {
        let message = format!("{phase}: {err}");
        self.emit_warning_with_context(message.clone(), self.element.to_string());
        self.warnings.push(message);
    }

    pub fn collect(&mut self, phase: Phase, err: &Error) {
        let message = format!("{phase}: {err}");
        self.emit_warning_with_context(message.clone(), self.element.to_string());
        self.failures.push(message);
    }

    /// Undo every recorded step, newest first
    ///
    /// Failures are reported and skipped so the remaining steps still run.
    /// Returns the number of steps that could not be undone.
    pub async fn rollback(&mut self) -> usize {
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len();
        let mut failed = 0;

        for step in steps.into_iter().rev() {
            if let Err(err) = self.undo(&step).await {
                failed += 1;
                self.emit_warning_with_context(
                    format!("rollback of {} failed: {err}", step.describe()),
                    self.element.to_string(),
                );
            }
        }

        self.emit(AppEvent::Lifecycle(LifecycleEvent::RolledBack {
            route: self.route,
            element: self.element.to_string(),
            steps: total,
            failures: failed,
        }));
        failed
    }

    async fn undo(&self, step: &InstallationStep) -> Result<(), Error> {
        match step {
            InstallationStep::CreatedDirectory(path) | InstallationStep::CopiedFolder(path) => {
                if self.fs.exists(path).await {
                    self.fs.remove_dir_all(path).await?;
                }
            }
            InstallationStep::CopiedFile(path) => {
                if self.fs.exists(path).await {
                    self.fs.remove_file(path).await?;
                }
            }
            InstallationStep::CreatedMenuNode { id } => {
                self.state.remove_menu_node(*id).await?;
            }
            InstallationStep::RegisteredExtension { id } => {
                self.state.delete_schema_version(*id).await?;
                self.state
                    .remove_extension(*id, self.element.as_str())
                    .await?;
            }
            InstallationStep::RegisteredAsset { name } => {
                self.state.remove_asset(name).await?;
            }
        }
        Ok(())
    }

    /// Roll back after a fatal phase error and report it
    pub async fn abort(&mut self, err: Error) -> Error {
        self.rollback().await;
        self.failed(&err);
        err
    }

    /// Report a failure that needs no rollback
    pub fn failed(&self, err: &Error) {
        self.emit(AppEvent::Lifecycle(LifecycleEvent::Failed {
            route: self.route,
            element: self.element.to_string(),
            failure: FailureContext::from_error(err),
        }));
    }

    /// Build the result of a successful install-type operation
    ///
    /// # Errors
    ///
    /// Returns an error if no extension record was stored or found.
    pub fn finish(&mut self) -> Result<InstallResult, Error> {
        let extension_id = self.extension_id.ok_or_else(|| InstallError::Failed {
            message: format!("{} finished without an extension record", self.route.as_str()),
        })?;

        self.emit(AppEvent::Lifecycle(LifecycleEvent::Completed {
            route: self.route,
            element: self.element.to_string(),
            extension_id,
            warnings: self.warnings.len(),
        }));

        Ok(InstallResult {
            route: self.route,
            element: self.element.to_string(),
            extension_id,
            version: self.manifest.version.clone(),
            messages: self.script_ctx.take_output(),
            warnings: std::mem::take(&mut self.warnings),
            duration: self.started.elapsed(),
        })
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    pub fn take_output(&mut self) -> String {
        self.script_ctx.take_output()
    }

    pub fn take_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.failures)
    }
}
