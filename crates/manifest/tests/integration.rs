//! Integration tests for manifest crate

#[cfg(test)]
mod tests {
    use extman_manifest::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_manifest_from_disk_and_cache_snapshot() {
        let temp = tempdir().unwrap();
        let manifest_path = temp.path().join("contact.toml");
        tokio::fs::write(
            &manifest_path,
            r#"
name = "COM_CONTACT"
version = "3.4.1"
creation_date = "April 2006"
author = "Project"
author_email = "admin@example.org"
description = "Contact forms"

[administration]
menu = { title = "COM_CONTACT", hidden = true }
"#,
        )
        .await
        .unwrap();

        let content = tokio::fs::read_to_string(&manifest_path).await.unwrap();
        let manifest = ExtensionManifest::from_toml(&content).unwrap();

        assert_eq!(manifest.element().unwrap().as_str(), "com_contact");
        assert!(manifest.admin_menu().unwrap().hidden);

        let cache = manifest.cache().unwrap();
        assert_eq!(cache.name, "COM_CONTACT");
        assert_eq!(cache.extension_type, "component");
        assert_eq!(cache.version, "3.4.1");
        assert_eq!(cache.filename, "contact");

        let json = cache.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["creationDate"], "April 2006");
        assert_eq!(value["authorEmail"], "admin@example.org");
        assert_eq!(ManifestCache::from_json(&json).unwrap(), cache);
    }

    #[test]
    fn test_file_set_names_cover_files_and_folders() {
        let set = FileSet {
            folder: Some("site".into()),
            files: vec!["a.php".into(), "b.php".into()],
            folders: vec!["views".into()],
        };
        let names: Vec<_> = set.names().into_iter().collect();
        assert_eq!(names, vec!["a.php", "b.php", "views"]);
        assert!(set.entries().any(|e| e.is_folder() && e.name() == "views"));
    }

    #[test]
    fn test_submenu_params_keep_link_order() {
        let submenu = SubmenuSpec {
            title: "Items".into(),
            task: Some("list".into()),
            view: Some("items".into()),
            ..SubmenuSpec::default()
        };
        let keys: Vec<_> = submenu
            .query_params()
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(keys, vec!["task", "view"]);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ExtensionManifest::from_toml("name = ").unwrap_err();
        assert!(err.to_string().contains("invalid manifest"));
    }
}
