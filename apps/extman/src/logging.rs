//! Structured logging integration for events
//!
//! Converts installer events into tracing records with structured fields so
//! the debug log file can be filtered by element, route and phase.

use extman_events::{AppEvent, GeneralEvent, LifecycleEvent, StateEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.event_source();
    let source = source.as_str();

    match event {
        AppEvent::Lifecycle(lifecycle) => match lifecycle {
            LifecycleEvent::Started {
                route,
                element,
                version,
            } => {
                info!(
                    source,
                    route = %route,
                    element = %element,
                    version = ?version,
                    "Extension operation started"
                );
            }
            LifecycleEvent::PhaseCompleted {
                route,
                element,
                phase,
            } => {
                debug!(source, route = %route, element = %element, phase = %phase, "Phase completed");
            }
            LifecycleEvent::RoutedToUpdate { element } => {
                info!(source, element = %element, "Install routed to update");
            }
            LifecycleEvent::HookInvoked {
                route,
                element,
                hook,
            } => {
                info!(source, route = %route, element = %element, hook = %hook, "Lifecycle hook invoked");
            }
            LifecycleEvent::FilesSynchronized {
                route,
                element,
                scope,
                copied,
                removed,
            } => {
                info!(
                    source,
                    route = %route,
                    element = %element,
                    scope = %scope,
                    copied,
                    removed,
                    "Files synchronized"
                );
            }
            LifecycleEvent::SqlApplied {
                route,
                element,
                statements,
                schema_version,
            } => {
                info!(
                    source,
                    route = %route,
                    element = %element,
                    statements,
                    schema_version = ?schema_version,
                    "SQL applied"
                );
            }
            LifecycleEvent::MenuBuilt {
                route,
                element,
                nodes,
            } => {
                info!(source, route = %route, element = %element, nodes, "Menu built");
            }
            LifecycleEvent::RolledBack {
                route,
                element,
                steps,
                failures,
            } => {
                warn!(
                    source,
                    route = %route,
                    element = %element,
                    steps,
                    failures,
                    "Operation rolled back"
                );
            }
            LifecycleEvent::Completed {
                route,
                element,
                extension_id,
                warnings,
            } => {
                info!(
                    source,
                    route = %route,
                    element = %element,
                    extension_id,
                    warnings,
                    "Extension operation completed"
                );
            }
            LifecycleEvent::Failed {
                route,
                element,
                failure,
            } => {
                error!(
                    source,
                    route = %route,
                    element = %element,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Extension operation failed"
                );
            }
            LifecycleEvent::DiscoveryCompleted { candidates } => {
                info!(source, candidates, "Discovery completed");
            }
        },

        AppEvent::State(state) => match state {
            StateEvent::DatabaseReady { path } => {
                debug!(source, path = %path, "Database ready");
            }
            StateEvent::ExtensionRegistered {
                extension_id,
                element,
            } => {
                info!(source, extension_id, element = %element, "Extension registered");
            }
            StateEvent::ExtensionUpdated {
                extension_id,
                element,
            } => {
                info!(source, extension_id, element = %element, "Extension updated");
            }
            StateEvent::ExtensionRemoved {
                extension_id,
                element,
            } => {
                info!(source, extension_id, element = %element, "Extension removed");
            }
            StateEvent::SchemaVersionRecorded {
                extension_id,
                version,
            } => {
                info!(source, extension_id, version = %version, "Schema version recorded");
            }
            StateEvent::TreeRebuilt { table, nodes } => {
                trace!(source, table = %table, nodes, "Nested set rebuilt");
            }
        },

        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(source, message = %message, context = ?context, "Warning");
            }
            GeneralEvent::Error { message, details } => {
                error!(source, message = %message, details = ?details, "Error");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source, message = %message, context = ?context, "Debug log");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(source, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(source, operation = %operation, error = %error, "Operation failed");
            }
        },
    }
}
