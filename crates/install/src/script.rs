//! Lifecycle hooks supplied by an extension
//!
//! An extension that declares a `scriptfile` may have an [`InstallerScript`]
//! registered for its element. The installer resolves it once per operation
//! and calls it at fixed points; any hook can stop the operation by
//! returning [`HookOutcome::Abort`].

use crate::context::OperationContext;
use async_trait::async_trait;
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, LifecycleEvent};
use extman_manifest::ExtensionManifest;
use extman_types::{ElementId, Route};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of a hook call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    Abort,
}

/// Lifecycle hook points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Preflight,
    Install,
    Update,
    Uninstall,
    Postflight,
}

impl Hook {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Install => "install",
            Self::Update => "update",
            Self::Uninstall => "uninstall",
            Self::Postflight => "postflight",
        }
    }
}

/// What a hook can see, plus the buffer it writes user-facing output to
#[derive(Debug, Clone)]
pub struct ScriptContext {
    element: ElementId,
    route: Route,
    extension_id: Option<i64>,
    manifest: Arc<ExtensionManifest>,
    output: String,
}

impl ScriptContext {
    #[must_use]
    pub fn new(element: ElementId, route: Route, manifest: Arc<ExtensionManifest>) -> Self {
        Self {
            element,
            route,
            extension_id: None,
            manifest,
            output: String::new(),
        }
    }

    #[must_use]
    pub fn element(&self) -> &ElementId {
        &self.element
    }

    #[must_use]
    pub fn route(&self) -> Route {
        self.route
    }

    /// Registry id, once the record exists
    #[must_use]
    pub fn extension_id(&self) -> Option<i64> {
        self.extension_id
    }

    #[must_use]
    pub fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    /// Append text shown to the user when the operation finishes
    pub fn echo(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    pub(crate) fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    pub(crate) fn set_extension_id(&mut self, id: i64) {
        self.extension_id = Some(id);
    }

    pub(crate) fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

/// Hooks an extension can implement; every method defaults to a no-op
#[async_trait]
pub trait InstallerScript: Send + Sync {
    /// Runs before anything is touched
    async fn preflight(&self, _route: Route, _ctx: &mut ScriptContext) -> HookOutcome {
        HookOutcome::Continue
    }

    async fn install(&self, _ctx: &mut ScriptContext) -> HookOutcome {
        HookOutcome::Continue
    }

    async fn update(&self, _ctx: &mut ScriptContext) -> HookOutcome {
        HookOutcome::Continue
    }

    /// Whether [`update`](Self::update) does real work; installing over an
    /// existing copy then runs as an update
    fn handles_update(&self) -> bool {
        false
    }

    /// Runs before anything is removed
    async fn uninstall(&self, _ctx: &mut ScriptContext) -> HookOutcome {
        HookOutcome::Continue
    }

    /// Runs last; an abort here is only reported
    async fn postflight(&self, _route: Route, _ctx: &mut ScriptContext) -> HookOutcome {
        HookOutcome::Continue
    }
}

/// Scripts keyed by element
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, Arc<dyn InstallerScript>>,
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut elements: Vec<_> = self.scripts.keys().collect();
        elements.sort();
        f.debug_struct("ScriptRegistry")
            .field("elements", &elements)
            .finish()
    }
}

impl ScriptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `script` for `element`, replacing any previous one
    pub fn register(&mut self, element: &ElementId, script: Arc<dyn InstallerScript>) {
        self.scripts.insert(element.as_str().to_string(), script);
    }

    #[must_use]
    pub fn resolve(&self, element: &ElementId) -> Option<Arc<dyn InstallerScript>> {
        self.scripts.get(element.as_str()).cloned()
    }
}

/// Call one hook of the operation's script, if it has one
///
/// # Errors
///
/// Returns `InstallError::HookFailed` when the hook returns
/// [`HookOutcome::Abort`].
pub(crate) async fn invoke(ctx: &mut OperationContext<'_>, hook: Hook) -> Result<(), Error> {
    let Some(script) = ctx.script.clone() else {
        return Ok(());
    };
    let route = ctx.route;

    let script_ctx = &mut ctx.script_ctx;
    let outcome = match hook {
        Hook::Preflight => script.preflight(route, script_ctx).await,
        Hook::Install => script.install(script_ctx).await,
        Hook::Update => script.update(script_ctx).await,
        Hook::Uninstall => script.uninstall(script_ctx).await,
        Hook::Postflight => script.postflight(route, script_ctx).await,
    };

    ctx.emit(AppEvent::Lifecycle(LifecycleEvent::HookInvoked {
        route,
        element: ctx.element.to_string(),
        hook: hook.as_str().to_string(),
    }));

    match outcome {
        HookOutcome::Continue => Ok(()),
        HookOutcome::Abort => Err(InstallError::HookFailed {
            hook: hook.as_str().to_string(),
            route: route.as_str().to_string(),
        }
        .into()),
    }
}
