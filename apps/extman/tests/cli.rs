//! End-to-end tests driving the extman binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const NEWS: &str = r#"
name = "News"
version = "3.1.0"

[files]
folder = "site"
files = ["news.php"]

[administration.files]
folder = "admin"
files = ["news.php"]

[administration.menu]
title = "COM_NEWS"
"#;

struct Site {
    _temp: TempDir,
    root: PathBuf,
    config: PathBuf,
}

impl Site {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let config = root.join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[paths]\nsite_root = {:?}\ndatabase = {:?}\n",
                root.join("site").display().to_string(),
                root.join("state.sqlite").display().to_string(),
            ),
        )
        .unwrap();
        Self {
            _temp: temp,
            root,
            config,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_extman"))
            .arg("--config")
            .arg(&self.config)
            .arg("--color")
            .arg("never")
            .args(args)
            .env_remove("EXTMAN_SITE_ROOT")
            .env_remove("EXTMAN_ADMIN_ROOT")
            .env_remove("EXTMAN_DATABASE")
            .env_remove("EXTMAN_OUTPUT")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn package(&self) -> PathBuf {
        let base = self.root.join("packages/news");
        write(&base.join("site/news.php"), "<?php");
        write(&base.join("admin/news.php"), "<?php");
        let manifest = base.join("news.toml");
        write(&manifest, NEWS);
        manifest
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn empty_registry_lists_nothing() {
    let site = Site::new();
    let value = site.json(&["list"]);
    assert_eq!(value["type"], "ExtensionList");
    assert!(value["data"].as_array().unwrap().is_empty());
}

#[test]
fn install_list_uninstall_round() {
    let site = Site::new();
    let manifest = site.package();

    let value = site.json(&["install", manifest.to_str().unwrap()]);
    assert_eq!(value["type"], "InstallReport");
    assert_eq!(value["data"]["element"], "com_news");
    assert!(site
        .root
        .join("site/administrator/components/com_news/news.php")
        .exists());

    let value = site.json(&["list"]);
    assert_eq!(value["data"][0]["element"], "com_news");
    assert_eq!(value["data"][0]["version"], "3.1.0");

    let output = site.run(&["uninstall", "news"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("uninstall com_news"));
    assert!(!site.root.join("site/components/com_news").exists());
}

#[test]
fn unknown_target_fails_with_code() {
    let site = Site::new();
    let output = site.run(&["uninstall", "com_ghost"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ops.extension_not_registered"), "{stderr}");
}

#[test]
fn second_install_without_overwrite_is_refused() {
    let site = Site::new();
    let manifest = site.package();
    site.json(&["install", manifest.to_str().unwrap()]);

    // Package has no update section, so an existing directory blocks install
    let output = site.run(&["install", manifest.to_str().unwrap()]);
    assert!(!output.status.success());

    let value = site.json(&["install", "--overwrite", manifest.to_str().unwrap()]);
    assert_eq!(value["data"]["route"], "install");
}

#[test]
fn site_root_flag_takes_admin_tree_along() {
    let site = Site::new();
    let stale_admin = site.root.join("stale-admin");
    std::fs::write(
        &site.config,
        format!(
            "[paths]\nsite_root = {:?}\nadmin_root = {:?}\ndatabase = {:?}\n",
            site.root.join("site").display().to_string(),
            stale_admin.display().to_string(),
            site.root.join("state.sqlite").display().to_string(),
        ),
    )
    .unwrap();
    let manifest = site.package();
    let moved = site.root.join("moved");

    let value = site.json(&[
        "--site-root",
        moved.to_str().unwrap(),
        "install",
        manifest.to_str().unwrap(),
    ]);
    assert_eq!(value["data"]["element"], "com_news");
    assert!(moved
        .join("administrator/components/com_news/news.php")
        .exists());
    assert!(!stale_admin.exists());
}
