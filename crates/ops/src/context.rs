//! Operations context for dependency injection

use extman_config::Config;
use extman_errors::{Error, OpsError};
use extman_events::{EventEmitter, EventSender};
use extman_install::{InstallConfig, Installer, ScriptRegistry};
use extman_state::StateManager;
use std::time::Instant;
use uuid::Uuid;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Registry database
    pub state: StateManager,
    /// Component installer bound to the configured site
    pub installer: Installer,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl OpsCtx {
    // No public constructor - use OpsContextBuilder instead

    /// Announce an operation; the returned handle reports its end
    pub(crate) fn begin(&self, name: &str) -> Operation {
        let operation = Operation {
            label: format!("{name} {}", Uuid::new_v4().simple()),
            started: Instant::now(),
        };
        self.emit_operation_started(operation.label.clone());
        operation
    }

    /// Report the end of an operation and pass its result through
    pub(crate) fn end<T>(&self, operation: &Operation, result: Result<T, Error>) -> Result<T, Error> {
        match &result {
            Ok(_) => {
                self.emit_debug(format!(
                    "{} finished in {} ms",
                    operation.label,
                    operation.elapsed_ms()
                ));
                self.emit_operation_completed(operation.label.clone(), true);
            }
            Err(err) => self.emit_operation_failed(operation.label.clone(), err.to_string()),
        }
        result
    }
}

/// Running operation, labelled with a unique id for log correlation
pub(crate) struct Operation {
    label: String,
    started: Instant,
}

impl Operation {
    pub(crate) fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    state: Option<StateManager>,
    tx: Option<EventSender>,
    config: Option<Config>,
    scripts: ScriptRegistry,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set state manager
    #[must_use]
    pub fn with_state(mut self, state: StateManager) -> Self {
        self.state = Some(state);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Lifecycle scripts handed to the installer
    #[must_use]
    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let state = self.state.ok_or_else(|| OpsError::MissingComponent {
            component: "state".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.unwrap_or_default();
        let installer = Installer::new(InstallConfig::from_config(&config), state.clone())
            .with_scripts(self.scripts);

        Ok(OpsCtx {
            state,
            installer,
            tx,
            config,
        })
    }
}
