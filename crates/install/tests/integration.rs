//! Integration tests for install crate

use async_trait::async_trait;
use extman_errors::{Error, InstallError, StorageError};
use extman_events::{AppEvent, GeneralEvent};
use extman_install::*;
use extman_platform::{FilesystemOperations, LocalFilesystem};
use extman_state::{NewMenuNode, StateManager};
use extman_types::{ClientScope, ElementId, Route};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const BLOG_V1: &str = r#"
name = "Blog"
version = "1.0.0"

[files]
folder = "site"
files = ["blog.php", "router.php"]

[administration.files]
folder = "admin"
files = ["blog.php"]
folders = ["sql"]

[administration.menu]
title = "COM_BLOG"

[[administration.submenu]]
title = "COM_BLOG_POSTS"
view = "posts"

[[install.sql.file]]
driver = "sqlite"
path = "sql/install.sql"

[[uninstall.sql.file]]
driver = "sqlite"
path = "sql/uninstall.sql"

[[update.schemas.schemapath]]
type = "sqlite"
path = "sql/updates"
"#;

const BLOG_V2: &str = r#"
name = "Blog"
version = "1.1.0"

[files]
folder = "site"
files = ["router.php", "search.php"]

[administration.files]
folder = "admin"
files = ["blog.php"]
folders = ["sql"]

[administration.menu]
title = "COM_BLOG"

[[administration.submenu]]
title = "COM_BLOG_POSTS"
view = "posts"

[[administration.submenu]]
title = "COM_BLOG_TAGS"
view = "tags"

[[install.sql.file]]
driver = "sqlite"
path = "sql/install.sql"

[[uninstall.sql.file]]
driver = "sqlite"
path = "sql/uninstall.sql"

[[update.schemas.schemapath]]
type = "sqlite"
path = "sql/updates"
"#;

struct Sandbox {
    _temp: TempDir,
    root: PathBuf,
    installer: Installer,
}

impl Sandbox {
    async fn new() -> Self {
        Self::with_scripts(ScriptRegistry::new()).await
    }

    async fn with_scripts(scripts: ScriptRegistry) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path().to_path_buf();
        let site = root.join("site");
        let admin = site.join("administrator");
        std::fs::create_dir_all(&admin).expect("admin root");

        let state = StateManager::open(&root.join("state.sqlite"), None)
            .await
            .expect("open state");
        let config = InstallConfig::default()
            .with_roots(site, admin)
            .with_table_prefix("ext_");
        let installer = Installer::new(config, state).with_scripts(scripts);
        Self {
            _temp: temp,
            root,
            installer,
        }
    }

    fn state(&self) -> &StateManager {
        self.installer.state()
    }

    fn paths(&self, element: &str) -> ExtensionPaths {
        let element = ElementId::normalize(element).expect("element");
        ExtensionPaths::resolve(self.installer.config(), &element)
    }

    /// Unpack a package with the given descriptor and files; returns the
    /// descriptor path
    fn package(&self, dir: &str, manifest_name: &str, manifest: &str, files: &[(&str, &str)]) -> PathBuf {
        let base = self.root.join("packages").join(dir);
        for (path, content) in files {
            write(&base.join(path), content);
        }
        let manifest_path = base.join(manifest_name);
        write(&manifest_path, manifest);
        manifest_path
    }

    fn blog_v1(&self) -> PathBuf {
        self.package(
            "blog-1.0.0",
            "blog.toml",
            BLOG_V1,
            &[
                ("site/blog.php", "<?php // site"),
                ("site/router.php", "<?php // router"),
                ("admin/blog.php", "<?php // admin"),
                (
                    "admin/sql/install.sql",
                    "CREATE TABLE #__blog_posts (id INTEGER PRIMARY KEY, title TEXT);",
                ),
                ("admin/sql/uninstall.sql", "DROP TABLE IF EXISTS #__blog_posts;"),
                ("admin/sql/updates/1.0.0.sql", "-- baseline"),
            ],
        )
    }

    fn blog_v2(&self) -> PathBuf {
        self.package(
            "blog-1.1.0",
            "blog.toml",
            BLOG_V2,
            &[
                ("site/router.php", "<?php // router v2"),
                ("site/search.php", "<?php // search"),
                ("admin/blog.php", "<?php // admin v2"),
                (
                    "admin/sql/install.sql",
                    "CREATE TABLE #__blog_posts (id INTEGER PRIMARY KEY, title TEXT, body TEXT);",
                ),
                ("admin/sql/uninstall.sql", "DROP TABLE IF EXISTS #__blog_posts;"),
                ("admin/sql/updates/1.0.0.sql", "-- baseline"),
                (
                    "admin/sql/updates/1.1.0.sql",
                    "ALTER TABLE #__blog_posts ADD COLUMN body TEXT;",
                ),
            ],
        )
    }

    async fn install(&self, manifest_path: PathBuf) -> Result<InstallResult, Error> {
        self.installer
            .install(InstallContext::new().with_manifest_path(manifest_path))
            .await
    }

    async fn menu_signature(&self, extension_id: i64) -> Vec<(String, String, String)> {
        let mut nodes: Vec<_> = self
            .state()
            .component_menus(extension_id, 1)
            .await
            .expect("menus")
            .into_iter()
            .map(|n| (n.title, n.alias, n.link))
            .collect();
        nodes.sort();
        nodes
    }

    async fn menu_rows(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu")
            .fetch_one(self.state().pool())
            .await
            .expect("count menu");
        count
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    std::fs::write(path, content).expect("write file");
}

#[tokio::test]
async fn install_then_uninstall_leaves_nothing_behind() {
    let sandbox = Sandbox::new().await;
    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    assert_eq!(result.route, Route::Install);
    assert_eq!(result.element, "com_blog");
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let paths = sandbox.paths("com_blog");
    assert!(paths.site.join("blog.php").is_file());
    assert!(paths.admin.join("sql/install.sql").is_file());
    assert!(paths.admin.join("blog.toml").is_file());
    assert!(sandbox.state().table_exists("ext_blog_posts").await.unwrap());

    let id = result.extension_id;
    let record = sandbox.state().get_extension(id).await.unwrap().unwrap();
    assert_eq!(record.name, "Blog");
    assert!(record.enabled);
    assert_eq!(record.schema_version.as_deref(), Some("1.0.0"));
    assert_eq!(sandbox.menu_signature(id).await.len(), 2);
    assert!(sandbox.state().find_asset("com_blog").await.unwrap().is_some());

    let removed = sandbox
        .installer
        .uninstall(UninstallContext::new().with_extension_id(id))
        .await
        .expect("uninstall");
    assert!(removed.success, "{:?}", removed.failures);

    assert!(!paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(!sandbox.state().table_exists("ext_blog_posts").await.unwrap());
    assert!(sandbox.state().get_extension(id).await.unwrap().is_none());
    assert!(sandbox.menu_signature(id).await.is_empty());
    assert_eq!(sandbox.menu_rows().await, 1);
    assert!(sandbox.state().find_asset("com_blog").await.unwrap().is_none());
    assert!(sandbox.state().schema_version(id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_files_and_applies_newer_schema_scripts() {
    let sandbox = Sandbox::new().await;
    let installed = sandbox.install(sandbox.blog_v1()).await.expect("install");

    let updated = sandbox
        .installer
        .update(UpdateContext::new().with_manifest_path(sandbox.blog_v2()))
        .await
        .expect("update");
    assert_eq!(updated.route, Route::Update);
    assert_eq!(updated.extension_id, installed.extension_id);

    let paths = sandbox.paths("com_blog");
    assert!(!paths.site.join("blog.php").exists());
    assert!(paths.site.join("router.php").is_file());
    assert!(paths.site.join("search.php").is_file());

    sandbox
        .state()
        .execute_sql("SELECT body FROM ext_blog_posts")
        .await
        .expect("column added by 1.1.0.sql");
    let record = sandbox
        .state()
        .get_extension(updated.extension_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.schema_version.as_deref(), Some("1.1.0"));
    assert!(record.manifest_cache.contains("1.1.0"));
}

#[tokio::test]
async fn repeated_update_is_idempotent() {
    let sandbox = Sandbox::new().await;
    sandbox.install(sandbox.blog_v1()).await.expect("install");

    let manifest = sandbox.blog_v2();
    let first = sandbox
        .installer
        .update(UpdateContext::new().with_manifest_path(manifest.clone()))
        .await
        .expect("first update");
    let menus = sandbox.menu_signature(first.extension_id).await;
    assert_eq!(menus.len(), 3);

    let second = sandbox
        .installer
        .update(UpdateContext::new().with_manifest_path(manifest))
        .await
        .expect("second update");
    assert_eq!(second.extension_id, first.extension_id);
    assert_eq!(sandbox.menu_signature(second.extension_id).await, menus);
    assert_eq!(sandbox.menu_rows().await, 4);
}

#[tokio::test]
async fn install_with_update_section_routes_to_update() {
    let sandbox = Sandbox::new().await;
    sandbox.install(sandbox.blog_v1()).await.expect("install");

    let result = sandbox.install(sandbox.blog_v2()).await.expect("routed");
    assert_eq!(result.route, Route::Update);
    assert_eq!(result.version.as_deref(), Some("1.1.0"));
}

const PLAIN: &str = r#"
name = "Plain"
version = "0.1.0"

[files]
folder = "site"
files = ["plain.php"]

[administration.files]
folder = "admin"
files = ["plain.php"]

[administration.menu]
title = "COM_PLAIN"
hidden = true
"#;

fn plain(sandbox: &Sandbox) -> PathBuf {
    sandbox.package(
        "plain",
        "plain.toml",
        PLAIN,
        &[("site/plain.php", "<?php"), ("admin/plain.php", "<?php")],
    )
}

#[tokio::test]
async fn existing_directory_refuses_install_without_touching_it() {
    let sandbox = Sandbox::new().await;
    let paths = sandbox.paths("com_plain");
    write(&paths.site.join("local.txt"), "keep me");

    let err = sandbox.install(plain(&sandbox)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::DirectoryExists { .. })
    ));
    assert!(paths.site.join("local.txt").is_file());
    assert!(!paths.site.join("plain.php").exists());
    assert!(!paths.admin.exists());
    assert!(sandbox.state().list_extensions().await.unwrap().is_empty());
}

#[tokio::test]
async fn overwrite_installs_over_existing_directory() {
    let sandbox = Sandbox::new().await;
    let paths = sandbox.paths("com_plain");
    write(&paths.site.join("plain.php"), "stale");

    let result = sandbox
        .installer
        .install(
            InstallContext::new()
                .with_manifest_path(plain(&sandbox))
                .with_overwrite(true),
        )
        .await
        .expect("overwrite install");
    assert_eq!(result.route, Route::Install);
    assert_eq!(
        std::fs::read_to_string(paths.site.join("plain.php")).unwrap(),
        "<?php"
    );
}

#[tokio::test]
async fn overwrite_reinstall_reuses_registry_row() {
    let sandbox = Sandbox::new().await;
    let first = sandbox.install(plain(&sandbox)).await.expect("install");

    let second = sandbox
        .installer
        .install(
            InstallContext::new()
                .with_manifest_path(plain(&sandbox))
                .with_overwrite(true),
        )
        .await
        .expect("reinstall");
    assert_eq!(second.extension_id, first.extension_id);
    assert_eq!(sandbox.state().list_extensions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn hidden_menu_creates_no_nodes() {
    let sandbox = Sandbox::new().await;
    let result = sandbox.install(plain(&sandbox)).await.expect("install");
    assert!(sandbox.menu_signature(result.extension_id).await.is_empty());
    assert_eq!(sandbox.menu_rows().await, 1);
}

#[tokio::test]
async fn failing_install_sql_rolls_everything_back() {
    let sandbox = Sandbox::new().await;
    let manifest = sandbox.package(
        "broken",
        "broken.toml",
        r#"
name = "Broken"

[files]
folder = "site"
files = ["broken.php"]

[administration.files]
folder = "admin"
folders = ["sql"]

[administration.menu]
title = "COM_BROKEN"

[[install.sql.file]]
path = "sql/install.sql"
"#,
        &[
            ("site/broken.php", "<?php"),
            (
                "admin/sql/install.sql",
                "CREATE TABLE #__first (id INTEGER);\n\
                 INSERT INTO #__missing VALUES (1);\n\
                 CREATE TABLE #__third (id INTEGER);",
            ),
        ],
    );

    let err = sandbox.install(manifest).await.unwrap_err();
    match err {
        Error::Install(InstallError::SqlBatchFailed { statement, .. }) => assert_eq!(statement, 2),
        other => panic!("unexpected error: {other}"),
    }

    let paths = sandbox.paths("com_broken");
    assert!(!paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(!sandbox.state().table_exists("ext_third").await.unwrap());
    assert!(sandbox.state().list_extensions().await.unwrap().is_empty());
    assert_eq!(sandbox.menu_rows().await, 1);
}

#[tokio::test]
async fn asset_failure_removes_registry_row_and_menus() {
    let sandbox = Sandbox::new().await;
    sandbox.state().execute_sql("DROP TABLE assets").await.unwrap();

    let err = sandbox.install(sandbox.blog_v1()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::AssetStoreFailed { .. })
    ));

    let paths = sandbox.paths("com_blog");
    assert!(!paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(sandbox.state().list_extensions().await.unwrap().is_empty());
    assert_eq!(sandbox.menu_rows().await, 1);
}

#[tokio::test]
async fn stale_menu_node_with_same_link_is_replaced() {
    let sandbox = Sandbox::new().await;
    sandbox
        .state()
        .add_menu_node(&NewMenuNode {
            menutype: "main".to_string(),
            title: "COM_BLOG".to_string(),
            alias: "COM_BLOG".to_string(),
            link: "index.php?option=com_blog".to_string(),
            node_type: "component".to_string(),
            published: false,
            parent_id: 1,
            component_id: 999,
            client_id: 1,
            img: "class:component".to_string(),
            home: false,
        })
        .await
        .unwrap();

    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(sandbox.menu_signature(result.extension_id).await.len(), 2);
    assert!(sandbox.state().component_menus(999, 1).await.unwrap().is_empty());
    assert_eq!(sandbox.menu_rows().await, 3);
}

#[tokio::test]
async fn alias_clash_with_foreign_link_only_warns() {
    let sandbox = Sandbox::new().await;
    sandbox
        .state()
        .add_menu_node(&NewMenuNode {
            menutype: "main".to_string(),
            title: "Other".to_string(),
            alias: "COM_BLOG".to_string(),
            link: "index.php?option=com_other".to_string(),
            node_type: "component".to_string(),
            published: false,
            parent_id: 1,
            component_id: 42,
            client_id: 1,
            img: String::new(),
            home: false,
        })
        .await
        .unwrap();

    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("build_menus"));
    assert_eq!(sandbox.state().component_menus(42, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn protected_extension_is_not_uninstalled() {
    let sandbox = Sandbox::new().await;
    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    sandbox
        .state()
        .execute_sql("UPDATE extensions SET protected = 1")
        .await
        .unwrap();

    let err = sandbox
        .installer
        .uninstall(UninstallContext::new().with_extension_id(result.extension_id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::ProtectedExtension { .. })
    ));
    assert!(sandbox.paths("com_blog").admin.join("blog.toml").is_file());
    assert!(sandbox
        .state()
        .get_extension(result.extension_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn uninstall_without_descriptor_cleans_up_and_reports() {
    let sandbox = Sandbox::new().await;
    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    let paths = sandbox.paths("com_blog");
    std::fs::remove_file(paths.admin.join("blog.toml")).unwrap();

    let err = sandbox
        .installer
        .uninstall(UninstallContext::new().with_extension_id(result.extension_id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::ManifestMissing { .. })
    ));
    assert!(!paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(sandbox.menu_signature(result.extension_id).await.is_empty());
}

/// Local disk that refuses to delete one directory
struct StuckDirectory {
    stuck: PathBuf,
}

#[async_trait]
impl FilesystemOperations for StuckDirectory {
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        LocalFilesystem.create_dir_all(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        if path == self.stuck {
            return Err(StorageError::PermissionDenied {
                path: path.display().to_string(),
            });
        }
        LocalFilesystem.remove_dir_all(path).await
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        LocalFilesystem.remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        LocalFilesystem.exists(path).await
    }

    async fn is_dir(&self, path: &Path) -> bool {
        LocalFilesystem.is_dir(path).await
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        LocalFilesystem.copy_file(src, dst).await
    }

    async fn copy_directory(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        LocalFilesystem.copy_directory(src, dst).await
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        LocalFilesystem.read_to_string(path).await
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, StorageError> {
        LocalFilesystem.list_dir(path).await
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, StorageError> {
        LocalFilesystem.canonicalize(path).await
    }
}

#[tokio::test]
async fn uninstall_without_descriptor_reports_stuck_directories() {
    let mut sandbox = Sandbox::new().await;
    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    let paths = sandbox.paths("com_blog");
    std::fs::remove_file(paths.admin.join("blog.toml")).unwrap();
    sandbox.installer = sandbox
        .installer
        .clone()
        .with_filesystem(Arc::new(StuckDirectory {
            stuck: paths.site.clone(),
        }));

    let (tx, mut rx) = extman_events::channel();
    let err = sandbox
        .installer
        .uninstall(
            UninstallContext::new()
                .with_extension_id(result.extension_id)
                .with_event_sender(tx),
        )
        .await
        .unwrap_err();

    match err {
        Error::Install(InstallError::ManifestMissing { leftovers, .. }) => {
            assert_eq!(leftovers.len(), 1, "{leftovers:?}");
            assert!(leftovers[0].starts_with("remove_directories"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(sandbox.menu_signature(result.extension_id).await.is_empty());

    let mut warnings = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::General(GeneralEvent::Warning { message, .. }) = event {
            warnings.push(message);
        }
    }
    assert!(
        warnings.iter().any(|w| w.contains("remove_directories")),
        "{warnings:?}"
    );
}

const GALLERY: &str = r#"
name = "Gallery"
version = "1.0.0"

[files]
folder = "site"
files = ["gallery.php"]

[media]
folder = "media"
files = ["app.js"]
folders = ["css"]

[languages]
folder = "language"

[[languages.language]]
tag = "en-GB"
file = "en-GB.com_gallery.ini"

[administration.files]
folder = "admin"
files = ["gallery.php"]

[administration.languages]
folder = "admin/language"

[[administration.languages.language]]
tag = "en-GB"
file = "en-GB.com_gallery.sys.ini"
"#;

#[tokio::test]
async fn media_and_language_files_come_and_go_with_the_component() {
    let sandbox = Sandbox::new().await;
    let manifest = sandbox.package(
        "gallery",
        "gallery.toml",
        GALLERY,
        &[
            ("site/gallery.php", "<?php"),
            ("admin/gallery.php", "<?php"),
            ("media/app.js", "init();"),
            ("media/css/gallery.css", "body {}"),
            ("language/en-GB.com_gallery.ini", "COM_GALLERY=\"Gallery\""),
            (
                "admin/language/en-GB.com_gallery.sys.ini",
                "COM_GALLERY=\"Gallery\"",
            ),
        ],
    );

    let result = sandbox.install(manifest).await.expect("install");
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let paths = sandbox.paths("com_gallery");
    // No destination declared, so media lands under the element
    let media = paths.media_root().join("com_gallery");
    let site_language = paths
        .language_root(ClientScope::Site)
        .join("en-GB/en-GB.com_gallery.ini");
    let admin_language = paths
        .language_root(ClientScope::Administrator)
        .join("en-GB/en-GB.com_gallery.sys.ini");
    assert!(media.join("app.js").is_file());
    assert!(media.join("css/gallery.css").is_file());
    assert!(site_language.is_file());
    assert!(admin_language.is_file());

    let removed = sandbox
        .installer
        .uninstall(UninstallContext::new().with_extension_id(result.extension_id))
        .await
        .expect("uninstall");
    assert!(removed.success, "{:?}", removed.failures);
    assert!(!media.exists());
    assert!(!site_language.exists());
    assert!(!admin_language.exists());
}

#[tokio::test]
async fn unknown_extension_id_is_reported() {
    let sandbox = Sandbox::new().await;
    let err = sandbox
        .installer
        .uninstall(UninstallContext::new().with_extension_id(4242))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::ExtensionNotFound { id: 4242 })
    ));
}

struct Scripted {
    refuse_install: bool,
}

#[async_trait]
impl InstallerScript for Scripted {
    async fn install(&self, ctx: &mut ScriptContext) -> HookOutcome {
        if self.refuse_install {
            ctx.echo("install refused");
            return HookOutcome::Abort;
        }
        HookOutcome::Continue
    }

    async fn postflight(&self, route: Route, ctx: &mut ScriptContext) -> HookOutcome {
        ctx.echo(format!("postflight {} for {:?}", route.as_str(), ctx.extension_id()));
        HookOutcome::Continue
    }
}

const SCRIPTED: &str = r#"
name = "Scripted"
scriptfile = "script.php"

[files]
folder = "site"
files = ["scripted.php"]

[administration.files]
folder = "admin"
files = ["scripted.php"]

[administration.menu]
title = "COM_SCRIPTED"
"#;

async fn scripted_sandbox(refuse_install: bool) -> (Sandbox, PathBuf) {
    let mut scripts = ScriptRegistry::new();
    scripts.register(
        &ElementId::normalize("com_scripted").unwrap(),
        Arc::new(Scripted { refuse_install }),
    );
    let sandbox = Sandbox::with_scripts(scripts).await;
    let manifest = sandbox.package(
        "scripted",
        "scripted.toml",
        SCRIPTED,
        &[
            ("script.php", "<?php"),
            ("site/scripted.php", "<?php"),
            ("admin/scripted.php", "<?php"),
        ],
    );
    (sandbox, manifest)
}

#[tokio::test]
async fn hook_output_is_returned() {
    let (sandbox, manifest) = scripted_sandbox(false).await;
    let result = sandbox.install(manifest).await.expect("install");
    assert!(result.messages.contains("postflight install"));
    assert!(sandbox.paths("com_scripted").admin.join("script.php").is_file());
}

struct Updating;

#[async_trait]
impl InstallerScript for Updating {
    async fn update(&self, ctx: &mut ScriptContext) -> HookOutcome {
        ctx.echo("update hook ran");
        HookOutcome::Continue
    }

    fn handles_update(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn script_with_update_hook_routes_reinstall_to_update() {
    let mut scripts = ScriptRegistry::new();
    scripts.register(
        &ElementId::normalize("com_scripted").unwrap(),
        Arc::new(Updating),
    );
    let sandbox = Sandbox::with_scripts(scripts).await;
    let manifest = sandbox.package(
        "scripted",
        "scripted.toml",
        SCRIPTED,
        &[
            ("script.php", "<?php"),
            ("site/scripted.php", "<?php"),
            ("admin/scripted.php", "<?php"),
        ],
    );

    let first = sandbox.install(manifest.clone()).await.expect("install");
    assert_eq!(first.route, Route::Install);

    let second = sandbox.install(manifest).await.expect("reinstall");
    assert_eq!(second.route, Route::Update);
    assert_eq!(second.extension_id, first.extension_id);
    assert!(second.messages.contains("update hook ran"));
}

#[tokio::test]
async fn script_without_update_hook_keeps_directory_check() {
    let (sandbox, manifest) = scripted_sandbox(false).await;
    sandbox.install(manifest.clone()).await.expect("install");

    let err = sandbox.install(manifest).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::DirectoryExists { .. })
    ));
}

#[tokio::test]
async fn aborting_hook_rolls_back() {
    let (sandbox, manifest) = scripted_sandbox(true).await;
    let err = sandbox.install(manifest).await.unwrap_err();
    match err {
        Error::Install(InstallError::HookFailed { hook, route }) => {
            assert_eq!(hook, "install");
            assert_eq!(route, "install");
        }
        other => panic!("unexpected error: {other}"),
    }
    let paths = sandbox.paths("com_scripted");
    assert!(!paths.site.exists());
    assert!(!paths.admin.exists());
    assert!(sandbox.state().list_extensions().await.unwrap().is_empty());
}

const FOUND: &str = r#"
name = "Found"
version = "2.0.0"

[administration.files]
files = ["found.php"]

[administration.menu]
title = "COM_FOUND"
"#;

#[tokio::test]
async fn discovered_component_can_be_installed_in_place() {
    let sandbox = Sandbox::new().await;
    let paths = sandbox.paths("com_found");
    write(&paths.admin.join("found.toml"), FOUND);
    write(&paths.admin.join("found.php"), "<?php");
    write(&paths.site.join("found.toml"), FOUND);

    // descriptor naming another component is skipped
    let stray = sandbox.paths("com_stray");
    write(&stray.admin.join("stray.toml"), FOUND);

    let candidates = sandbox.installer.discover(None).await.expect("discover");
    assert_eq!(candidates.len(), 1);
    let candidate = candidates.into_iter().next().unwrap();
    assert_eq!(candidate.element.as_str(), "com_found");
    assert_eq!(candidate.extension.state, -1);
    assert!(!candidate.extension.enabled);
    assert_eq!(candidate.summary().version.as_deref(), Some("2.0.0"));

    let result = sandbox
        .installer
        .discover_install(candidate, None)
        .await
        .expect("discover install");
    assert_eq!(result.route, Route::DiscoverInstall);

    let record = sandbox
        .state()
        .get_extension(result.extension_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.state, 0);
    assert!(record.enabled);
    assert_eq!(record.name, "Found");
    assert_eq!(sandbox.menu_signature(result.extension_id).await.len(), 1);
    assert!(sandbox.installer.discover(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn discover_install_without_admin_section_leaves_no_record() {
    let sandbox = Sandbox::new().await;
    let paths = sandbox.paths("com_bare");
    write(&paths.site.join("bare.toml"), "name = \"Bare\"\n");

    let candidates = sandbox.installer.discover(None).await.unwrap();
    let candidate = candidates.into_iter().next().expect("candidate");
    let err = sandbox
        .installer
        .discover_install(candidate, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::MissingAdminSection { .. })
    ));
    assert!(sandbox.state().list_extensions().await.unwrap().is_empty());
}

#[tokio::test]
async fn refresh_rereads_installed_descriptor() {
    let sandbox = Sandbox::new().await;
    let result = sandbox.install(sandbox.blog_v1()).await.expect("install");
    let installed = sandbox.paths("com_blog").admin.join("blog.toml");
    let edited = std::fs::read_to_string(&installed)
        .unwrap()
        .replace("version = \"1.0.0\"", "version = \"1.0.1\"");
    std::fs::write(&installed, edited).unwrap();

    let record = sandbox
        .installer
        .refresh_manifest_cache(result.extension_id)
        .await
        .expect("refresh");
    assert!(record.manifest_cache.contains("1.0.1"));
    assert_eq!(record.name, "Blog");
    assert_eq!(record.schema_version.as_deref(), Some("1.0.0"));
}
