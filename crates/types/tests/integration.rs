//! Integration tests for types

#[cfg(test)]
mod tests {
    use extman_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_client_scope_round_trips_through_client_id() {
        for scope in [ClientScope::Site, ClientScope::Administrator] {
            assert_eq!(ClientScope::from_client_id(scope.client_id()), Some(scope));
        }
        assert_eq!(ClientScope::from_client_id(7), None);
    }

    #[test]
    fn test_route_names_match_hook_arguments() {
        assert_eq!(Route::DiscoverInstall.to_string(), "discover_install");
        assert_eq!(Route::Update.as_str(), "update");
    }

    #[test]
    fn test_element_serializes_as_plain_string() {
        let element = ElementId::normalize("Contact").unwrap();
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(json, "\"com_contact\"");
        let back: ElementId = serde_json::from_str("\"Contact\"").unwrap();
        assert_eq!(back, element);
    }

    proptest! {
        #[test]
        fn normalized_elements_are_prefixed_lowercase_commands(raw in "[A-Za-z0-9_. !/-]{1,24}") {
            if let Ok(element) = ElementId::normalize(&raw) {
                let s = element.as_str();
                prop_assert!(s.starts_with("com_"));
                prop_assert!(s.chars().all(|c| c.is_ascii_lowercase()
                    || c.is_ascii_digit()
                    || matches!(c, '_' | '.' | '-')));
                // Normalizing twice is a no-op
                prop_assert_eq!(ElementId::normalize(s).unwrap(), element.clone());
            }
        }
    }
}
