//! Event handling and user feedback
//!
//! Events are always forwarded to tracing. In interactive mode the
//! user-relevant ones are also printed to stderr so stdout stays reserved
//! for the final result.

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use extman_events::{AppEvent, GeneralEvent, LifecycleEvent};

/// Event handler for progress display and user feedback
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    quiet: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);
        if self.quiet {
            return;
        }

        match event {
            AppEvent::Lifecycle(lifecycle) => self.handle_lifecycle(lifecycle),
            AppEvent::General(general) => self.handle_general(general),
            AppEvent::State(_) => {}
        }
    }

    fn handle_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Started {
                route,
                element,
                version,
            } => {
                let version = version.map(|v| format!(" {v}")).unwrap_or_default();
                self.status(&format!("{route} {element}{version}"));
            }
            LifecycleEvent::RoutedToUpdate { element } => {
                self.status(&format!("{element} is already installed, updating instead"));
            }
            LifecycleEvent::FilesSynchronized {
                scope,
                copied,
                removed,
                ..
            } => {
                let mut line = format!("  {scope} files: {copied} copied");
                if removed > 0 {
                    line.push_str(&format!(", {removed} removed"));
                }
                self.detail(&line);
            }
            LifecycleEvent::SqlApplied {
                statements,
                schema_version,
                ..
            } => {
                let line = match schema_version {
                    Some(version) => format!("  SQL: {statements} statement(s), schema {version}"),
                    None => format!("  SQL: {statements} statement(s)"),
                };
                self.detail(&line);
            }
            LifecycleEvent::HookInvoked { hook, .. } => {
                self.detail(&format!("  hook: {hook}"));
            }
            LifecycleEvent::MenuBuilt { nodes, .. } => {
                self.detail(&format!("  admin menu: {nodes} node(s)"));
            }
            LifecycleEvent::PhaseCompleted { phase, .. } => {
                if self.debug_enabled {
                    self.detail(&format!("  phase {phase} done"));
                }
            }
            LifecycleEvent::RolledBack {
                steps, failures, ..
            } => {
                let line = if failures == 0 {
                    format!("Rolled back {steps} step(s)")
                } else {
                    format!("Rolled back {steps} step(s), {failures} could not be undone")
                };
                self.warning(&line);
            }
            LifecycleEvent::Completed {
                route,
                element,
                warnings,
                ..
            } => {
                let line = if warnings == 0 {
                    format!("{route} of {element} complete")
                } else {
                    format!("{route} of {element} complete with {warnings} warning(s)")
                };
                self.success(&line);
            }
            LifecycleEvent::Failed {
                route,
                element,
                failure,
            } => {
                self.error(&format!("{route} of {element} failed: {}", failure.message));
            }
            LifecycleEvent::DiscoveryCompleted { candidates } => {
                self.status(&format!("Discovery found {candidates} candidate(s)"));
            }
        }
    }

    fn handle_general(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.warning(&format!("{message} ({context})")),
                None => self.warning(&message),
            },
            GeneralEvent::Error { message, details } => match details {
                Some(details) => self.error(&format!("{message}: {details}")),
                None => self.error(&message),
            },
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug_enabled {
                    self.detail(&message);
                }
            }
            GeneralEvent::OperationStarted { .. }
            | GeneralEvent::OperationCompleted { .. }
            | GeneralEvent::OperationFailed { .. } => {}
        }
    }

    fn status(&self, message: &str) {
        self.write(&self.paint(message, |s| s.cyan().bold()));
    }

    fn detail(&self, message: &str) {
        self.write(&self.paint(message, |s| s.dim()));
    }

    fn success(&self, message: &str) {
        self.write(&self.paint(message, |s| s.green()));
    }

    fn warning(&self, message: &str) {
        self.write(&self.paint(&format!("warning: {message}"), |s| s.yellow()));
    }

    fn error(&self, message: &str) {
        self.write(&self.paint(&format!("error: {message}"), |s| s.red().bold()));
    }

    fn paint(
        &self,
        message: &str,
        styler: impl FnOnce(console::StyledObject<&str>) -> console::StyledObject<&str>,
    ) -> String {
        if self.colors_enabled {
            styler(style(message).force_styling(true)).to_string()
        } else {
            message.to_string()
        }
    }

    fn write(&self, line: &str) {
        // A closed stderr is not an error for the command
        let _ = self.term.write_line(line);
    }
}
