//! Integration tests for events

#[cfg(test)]
mod tests {
    use extman_events::*;
    use extman_types::Route;

    #[tokio::test]
    async fn test_event_sender_ext() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, AppEvent::General(GeneralEvent::Error { .. })));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[test]
    fn test_lifecycle_levels_and_targets() {
        let failed = AppEvent::Lifecycle(LifecycleEvent::Failed {
            route: Route::Update,
            element: "com_blog".into(),
            failure: FailureContext::new(None::<String>, "boom", None::<String>, false),
        });
        assert_eq!(failed.log_level(), tracing::Level::ERROR);
        assert_eq!(failed.log_target(), "extman::events::update");
        assert_eq!(failed.event_source().as_str(), "update");

        let discovered = AppEvent::Lifecycle(LifecycleEvent::DiscoveryCompleted { candidates: 2 });
        assert_eq!(discovered.log_target(), "extman::events::discover");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AppEvent::State(StateEvent::ExtensionRegistered {
            extension_id: 7,
            element: "com_blog".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "state");
        assert_eq!(json["event"]["type"], "ExtensionRegistered");
    }
}
