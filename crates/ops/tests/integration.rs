//! Integration tests for ops crate

use extman_config::Config;
use extman_errors::{Error, OpsError};
use extman_events::{AppEvent, EventReceiver, GeneralEvent};
use extman_ops::*;
use extman_state::StateManager;
use extman_types::Route;
use std::path::{Path, PathBuf};
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

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    ctx: OpsCtx,
    rx: EventReceiver,
}

async fn fixture() -> Fixture {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path().to_path_buf();

    let mut config = Config::default();
    config.paths.site_root = Some(root.join("site"));
    config.paths.database = Some(root.join("state.sqlite"));

    let (tx, rx) = extman_events::channel();
    let state = StateManager::open(&config.db_path(), None)
        .await
        .expect("open state");
    let ctx = OpsContextBuilder::new()
        .with_state(state)
        .with_event_sender(tx)
        .with_config(config)
        .build()
        .expect("build context");

    Fixture {
        _temp: temp,
        root,
        ctx,
        rx,
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    std::fs::write(path, content).expect("write file");
}

fn news_package(root: &Path) -> PathBuf {
    let base = root.join("packages").join("news");
    write(&base.join("site/news.php"), "<?php");
    write(&base.join("admin/news.php"), "<?php");
    let manifest = base.join("news.toml");
    write(&manifest, NEWS);
    manifest
}

fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn builder_requires_state() {
    let (tx, _rx) = extman_events::channel();
    let err = OpsContextBuilder::new()
        .with_event_sender(tx)
        .build()
        .err()
        .expect("missing state");
    assert!(matches!(
        err,
        Error::Ops(OpsError::MissingComponent { .. })
    ));
}

#[tokio::test]
async fn install_list_and_uninstall_by_element() {
    let mut fx = fixture().await;
    let report = install(&fx.ctx, &news_package(&fx.root), false, false)
        .await
        .expect("install");
    assert_eq!(report.route, Route::Install);
    assert_eq!(report.element, "com_news");

    let listed = list_extensions(&fx.ctx).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].version.as_deref(), Some("3.1.0"));
    assert_eq!(listed[0].name, "News");

    let removed = uninstall(&fx.ctx, "news").await.expect("uninstall");
    assert!(removed.success);
    assert!(list_extensions(&fx.ctx).await.unwrap().is_empty());

    let events = drain(&mut fx.rx);
    let started = events
        .iter()
        .filter(|e| matches!(e, AppEvent::General(GeneralEvent::OperationStarted { .. })))
        .count();
    assert_eq!(started, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::General(GeneralEvent::OperationCompleted { success: true, .. })
    )));
}

#[tokio::test]
async fn unknown_target_is_not_registered() {
    let fx = fixture().await;
    let err = uninstall(&fx.ctx, "com_missing").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ops(OpsError::ExtensionNotRegistered { .. })
    ));
    let err = refresh_cache(&fx.ctx, "77").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ops(OpsError::ExtensionNotRegistered { .. })
    ));
}

#[tokio::test]
async fn discovery_reports_and_installs_candidates() {
    let fx = fixture().await;
    let admin = fx.ctx.config.admin_root().join("components").join("com_news");
    write(&admin.join("news.toml"), NEWS);
    write(&admin.join("news.php"), "<?php");

    let report = discover(&fx.ctx).await.expect("discover");
    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.candidates[0].element, "com_news");
    assert!(!report.candidates[0].enabled);

    let err = discover_install(&fx.ctx, "com_other").await.unwrap_err();
    assert!(matches!(err, Error::Ops(OpsError::NotDiscovered { .. })));

    let installed = discover_install(&fx.ctx, "com_news")
        .await
        .expect("discover install");
    assert_eq!(installed.route, Route::DiscoverInstall);

    let refreshed = refresh_cache(&fx.ctx, &installed.extension_id.to_string())
        .await
        .expect("refresh");
    assert_eq!(refreshed.version.as_deref(), Some("3.1.0"));
}

#[tokio::test]
async fn results_serialize_with_type_tag() {
    let fx = fixture().await;
    let listed = list_extensions(&fx.ctx).await.unwrap();
    let json = OperationResult::ExtensionList(listed).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "ExtensionList");
    assert!(value["data"].as_array().unwrap().is_empty());
}
