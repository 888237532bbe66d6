//! Schema versions, pending updates and categories

use crate::models::PendingUpdate;
use extman_errors::Error;
use sqlx::{query, query_as, Row, Sqlite, Transaction};

/// Applied schema version of an extension
pub async fn schema_version(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
) -> Result<Option<String>, Error> {
    let row = query("SELECT version_id FROM schemas WHERE extension_id = ?1")
        .bind(extension_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| r.get("version_id")))
}

/// Record `version` as the applied schema version
pub async fn set_schema_version(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
    version: &str,
) -> Result<(), Error> {
    query("DELETE FROM schemas WHERE extension_id = ?1")
        .bind(extension_id)
        .execute(&mut **tx)
        .await?;
    query("INSERT INTO schemas (extension_id, version_id) VALUES (?1, ?2)")
        .bind(extension_id)
        .bind(version)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Forget the schema version of an extension
pub async fn delete_schema_version(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
) -> Result<u64, Error> {
    let result = query("DELETE FROM schemas WHERE extension_id = ?1")
        .bind(extension_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Pending update rows for an element
pub async fn pending_updates(
    tx: &mut Transaction<'_, Sqlite>,
    element: &str,
) -> Result<Vec<PendingUpdate>, Error> {
    let rows = query_as::<_, PendingUpdate>(
        "SELECT update_id, extension_id, name, element, type, folder, client_id, version \
         FROM updates WHERE element = ?1 ORDER BY update_id",
    )
    .bind(element)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

/// Queue an update row
pub async fn insert_pending_update(
    tx: &mut Transaction<'_, Sqlite>,
    update: &PendingUpdate,
) -> Result<i64, Error> {
    let result = query(
        "INSERT INTO updates (extension_id, name, element, type, folder, client_id, version) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(update.extension_id)
    .bind(&update.name)
    .bind(&update.element)
    .bind(&update.extension_type)
    .bind(&update.folder)
    .bind(update.client_id)
    .bind(&update.version)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Clear pending update rows matching the extension's identity
pub async fn delete_pending_updates(
    tx: &mut Transaction<'_, Sqlite>,
    element: &str,
    extension_type: &str,
    client_id: i64,
    folder: &str,
) -> Result<u64, Error> {
    let result = query(
        "DELETE FROM updates WHERE element = ?1 AND type = ?2 AND client_id = ?3 AND folder = ?4",
    )
    .bind(element)
    .bind(extension_type)
    .bind(client_id)
    .bind(folder)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

/// Create a category owned by `extension`
pub async fn insert_category(
    tx: &mut Transaction<'_, Sqlite>,
    extension: &str,
    title: &str,
    alias: &str,
) -> Result<i64, Error> {
    let result = query("INSERT INTO categories (extension, title, alias) VALUES (?1, ?2, ?3)")
        .bind(extension)
        .bind(title)
        .bind(alias)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Delete categories of `element` and of its sub-sections (`element.*`)
pub async fn delete_categories(
    tx: &mut Transaction<'_, Sqlite>,
    element: &str,
) -> Result<u64, Error> {
    let result = query(
        "DELETE FROM categories WHERE extension = ?1 \
         OR substr(extension, 1, length(?1) + 1) = ?1 || '.'",
    )
    .bind(element)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

/// Number of categories owned by `element` or its sub-sections
pub async fn count_categories(
    tx: &mut Transaction<'_, Sqlite>,
    element: &str,
) -> Result<i64, Error> {
    let row = query(
        "SELECT COUNT(*) AS n FROM categories WHERE extension = ?1 \
         OR substr(extension, 1, length(?1) + 1) = ?1 || '.'",
    )
    .bind(element)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("n"))
}
