//! State manager implementation

use crate::{
    models::{AssetNode, ExtensionRecord, MenuNode, NewExtension, NewMenuNode, PendingUpdate},
    queries::{self, TreeTable},
};
use extman_errors::{Error, StorageError};
use extman_events::{AppEvent, EventEmitter, EventSender, StateEvent};
use sqlx::{query, Pool, Row, Sqlite};
use std::path::Path;

/// Owner of the registry database
///
/// Each method runs in its own transaction. Multi-step installer operations
/// compensate through their own rollback log instead of holding one long
/// transaction across filesystem work.
#[derive(Clone)]
pub struct StateManager {
    pool: Pool<Sqlite>,
    tx: Option<EventSender>,
}

impl EventEmitter for StateManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl StateManager {
    /// Open (creating if needed) the database at `db_path` and migrate it
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// connection fails or a migration fails.
    pub async fn open(db_path: &Path, tx: Option<EventSender>) -> Result<Self, Error> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
            }
        }

        let pool = crate::create_pool(db_path).await?;
        crate::run_migrations(&pool).await?;

        let manager = Self { pool, tx };
        manager.emit(AppEvent::State(StateEvent::DatabaseReady {
            path: db_path.display().to_string(),
        }));
        Ok(manager)
    }

    /// Wrap an already migrated pool
    #[must_use]
    pub fn with_pool(pool: Pool<Sqlite>, tx: Option<EventSender>) -> Self {
        Self { pool, tx }
    }

    /// Underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Load one extension by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_extension(&self, extension_id: i64) -> Result<Option<ExtensionRecord>, Error> {
        let mut tx = self.pool.begin().await?;
        let record = queries::get_extension(&mut tx, extension_id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Find a component by element
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_extension(
        &self,
        element: &str,
        extension_type: &str,
    ) -> Result<Option<ExtensionRecord>, Error> {
        let mut tx = self.pool.begin().await?;
        let record = queries::find_by_element(&mut tx, element, extension_type).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// All registered extensions
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_extensions(&self) -> Result<Vec<ExtensionRecord>, Error> {
        let mut tx = self.pool.begin().await?;
        let records = queries::list_extensions(&mut tx).await?;
        tx.commit().await?;
        Ok(records)
    }

    /// Insert an extension row and return its id
    ///
    /// # Errors
    ///
    /// Returns `StateError::UniqueViolation` if the identity is already
    /// registered, or another error if the insert fails.
    pub async fn register_extension(&self, ext: &NewExtension) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_extension(&mut tx, ext).await?;
        tx.commit().await?;

        self.emit(AppEvent::State(StateEvent::ExtensionRegistered {
            extension_id: id,
            element: ext.element.clone(),
        }));
        Ok(id)
    }

    /// Rewrite an extension row in place
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the update fails.
    pub async fn update_extension(&self, extension_id: i64, ext: &NewExtension) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        queries::update_extension(&mut tx, extension_id, ext).await?;
        tx.commit().await?;

        self.emit(AppEvent::State(StateEvent::ExtensionUpdated {
            extension_id,
            element: ext.element.clone(),
        }));
        Ok(())
    }

    /// Replace only the cached manifest and display name
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_manifest_cache(
        &self,
        extension_id: i64,
        name: &str,
        manifest_cache: &str,
    ) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;
        let updated = queries::update_manifest_cache(&mut tx, extension_id, name, manifest_cache).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete an extension row
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove_extension(&self, extension_id: i64, element: &str) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_extension(&mut tx, extension_id).await?;
        tx.commit().await?;

        if removed {
            self.emit(AppEvent::State(StateEvent::ExtensionRemoved {
                extension_id,
                element: element.to_string(),
            }));
        }
        Ok(removed)
    }

    /// Applied schema version of an extension
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn schema_version(&self, extension_id: i64) -> Result<Option<String>, Error> {
        let mut tx = self.pool.begin().await?;
        let version = queries::schema_version(&mut tx, extension_id).await?;
        tx.commit().await?;
        Ok(version)
    }

    /// Record the applied schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_schema_version(&self, extension_id: i64, version: &str) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        queries::set_schema_version(&mut tx, extension_id, version).await?;
        tx.commit().await?;

        self.emit(AppEvent::State(StateEvent::SchemaVersionRecorded {
            extension_id,
            version: version.to_string(),
        }));
        Ok(())
    }

    /// Forget the schema version of an extension
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_schema_version(&self, extension_id: i64) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_schema_version(&mut tx, extension_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Pending update rows for an element
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_updates(&self, element: &str) -> Result<Vec<PendingUpdate>, Error> {
        let mut tx = self.pool.begin().await?;
        let rows = queries::pending_updates(&mut tx, element).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Queue an update row
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn queue_pending_update(&self, update: &PendingUpdate) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_pending_update(&mut tx, update).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Drop pending updates matching the extension's identity
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear_pending_updates(
        &self,
        element: &str,
        extension_type: &str,
        client_id: i64,
        folder: &str,
    ) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed =
            queries::delete_pending_updates(&mut tx, element, extension_type, client_id, folder)
                .await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Create a category owned by `extension`
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn add_category(&self, extension: &str, title: &str, alias: &str) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_category(&mut tx, extension, title, alias).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Count categories of an element and its sub-sections
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_categories(&self, element: &str) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let n = queries::count_categories(&mut tx, element).await?;
        tx.commit().await?;
        Ok(n)
    }

    /// Delete categories of an element and its sub-sections
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_categories(&self, element: &str) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_categories(&mut tx, element).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Append a menu node under its parent, returning the new id
    ///
    /// # Errors
    ///
    /// Returns `StateError::UniqueViolation` when the alias is already taken
    /// under that parent, or another error if the insert fails.
    pub async fn add_menu_node(&self, node: &NewMenuNode) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_menu_node(&mut tx, node).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Root menu node of a component
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn component_root_menu(
        &self,
        component_id: i64,
        client_id: i64,
    ) -> Result<Option<MenuNode>, Error> {
        let mut tx = self.pool.begin().await?;
        let node = queries::find_component_root(&mut tx, component_id, client_id).await?;
        tx.commit().await?;
        Ok(node)
    }

    /// Component-type node under `parent_id` that carries `link`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_menu_by_link(
        &self,
        link: &str,
        parent_id: i64,
        client_id: i64,
    ) -> Result<Option<MenuNode>, Error> {
        let mut tx = self.pool.begin().await?;
        let node = queries::find_by_link(&mut tx, link, parent_id, client_id).await?;
        tx.commit().await?;
        Ok(node)
    }

    /// Every menu node of a component in tree order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn component_menus(
        &self,
        component_id: i64,
        client_id: i64,
    ) -> Result<Vec<MenuNode>, Error> {
        let mut tx = self.pool.begin().await?;
        let nodes = queries::component_nodes(&mut tx, component_id, client_id).await?;
        tx.commit().await?;
        Ok(nodes)
    }

    /// Delete one menu node with its children
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove_menu_node(&self, id: i64) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_menu_subtree(&mut tx, id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Delete every menu node of a component and renumber the tree once
    ///
    /// # Errors
    ///
    /// Returns an error if a delete or the rebuild fails.
    pub async fn remove_component_menus(&self, component_id: i64, client_id: i64) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_component_nodes(&mut tx, component_id, client_id).await?;
        let nodes = queries::rebuild(&mut tx, TreeTable::Menu).await?;
        tx.commit().await?;

        self.emit(AppEvent::State(StateEvent::TreeRebuilt {
            table: TreeTable::Menu.name().to_string(),
            nodes,
        }));
        Ok(removed)
    }

    /// Asset by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_asset(&self, name: &str) -> Result<Option<AssetNode>, Error> {
        let mut tx = self.pool.begin().await?;
        let asset = queries::find_asset(&mut tx, name).await?;
        tx.commit().await?;
        Ok(asset)
    }

    /// Register an asset directly under the root asset
    ///
    /// # Errors
    ///
    /// Returns an error if the asset table is unavailable or the insert fails.
    pub async fn register_asset(&self, name: &str, title: &str, rules: &str) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_asset(&mut tx, queries::ROOT_ID, name, title, rules).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Delete an asset subtree by name and renumber the asset tree
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or the rebuild fails.
    pub async fn remove_asset(&self, name: &str) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_asset(&mut tx, name).await?;
        let nodes = queries::rebuild(&mut tx, TreeTable::Assets).await?;
        tx.commit().await?;

        self.emit(AppEvent::State(StateEvent::TreeRebuilt {
            table: TreeTable::Assets.name().to_string(),
            nodes,
        }));
        Ok(removed)
    }

    /// Execute one raw statement from an extension's SQL file
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn execute_sql(&self, statement: &str) -> Result<u64, Error> {
        let result = sqlx::raw_sql(statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Whether a table exists in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub async fn table_exists(&self, name: &str) -> Result<bool, Error> {
        let row = query("SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}
