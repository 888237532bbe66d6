//! Extension registry queries

use crate::models::{ExtensionRecord, NewExtension};
use extman_errors::{Error, StateError};
use sqlx::{query, query_as, Sqlite, Transaction};

const SELECT_EXTENSION: &str = "SELECT e.extension_id, e.name, e.type, e.element, e.folder, \
     e.client_id, e.enabled, e.access, e.protected, e.manifest_cache, e.params, e.state, \
     s.version_id AS schema_version \
     FROM extensions e LEFT JOIN schemas s ON s.extension_id = e.extension_id";

/// Load one extension by id
pub async fn get_extension(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
) -> Result<Option<ExtensionRecord>, Error> {
    let record = query_as::<_, ExtensionRecord>(&format!(
        "{SELECT_EXTENSION} WHERE e.extension_id = ?1"
    ))
    .bind(extension_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(record)
}

/// Find an extension by element and type; administrator rows win over site rows
pub async fn find_by_element(
    tx: &mut Transaction<'_, Sqlite>,
    element: &str,
    extension_type: &str,
) -> Result<Option<ExtensionRecord>, Error> {
    let record = query_as::<_, ExtensionRecord>(&format!(
        "{SELECT_EXTENSION} WHERE e.element = ?1 AND e.type = ?2 \
         ORDER BY e.client_id DESC, e.extension_id LIMIT 1"
    ))
    .bind(element)
    .bind(extension_type)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(record)
}

/// All registered extensions ordered by element
pub async fn list_extensions(
    tx: &mut Transaction<'_, Sqlite>,
) -> Result<Vec<ExtensionRecord>, Error> {
    let records = query_as::<_, ExtensionRecord>(&format!(
        "{SELECT_EXTENSION} ORDER BY e.element, e.client_id"
    ))
    .fetch_all(&mut **tx)
    .await?;
    Ok(records)
}

/// Insert a row, returning its id
pub async fn insert_extension(
    tx: &mut Transaction<'_, Sqlite>,
    ext: &NewExtension,
) -> Result<i64, Error> {
    let result = query(
        "INSERT INTO extensions (name, type, element, folder, client_id, enabled, access, \
         protected, manifest_cache, params, state) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&ext.name)
    .bind(&ext.extension_type)
    .bind(&ext.element)
    .bind(&ext.folder)
    .bind(ext.client_id)
    .bind(ext.enabled)
    .bind(ext.access)
    .bind(ext.protected)
    .bind(&ext.manifest_cache)
    .bind(&ext.params)
    .bind(ext.state)
    .execute(&mut **tx)
    .await
    .map_err(|e| StateError::from_insert("extensions", &e))?;

    Ok(result.last_insert_rowid())
}

/// Overwrite every column of an existing row
pub async fn update_extension(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
    ext: &NewExtension,
) -> Result<(), Error> {
    let result = query(
        "UPDATE extensions SET name = ?1, type = ?2, element = ?3, folder = ?4, client_id = ?5, \
         enabled = ?6, access = ?7, protected = ?8, manifest_cache = ?9, params = ?10, state = ?11 \
         WHERE extension_id = ?12",
    )
    .bind(&ext.name)
    .bind(&ext.extension_type)
    .bind(&ext.element)
    .bind(&ext.folder)
    .bind(ext.client_id)
    .bind(ext.enabled)
    .bind(ext.access)
    .bind(ext.protected)
    .bind(&ext.manifest_cache)
    .bind(&ext.params)
    .bind(ext.state)
    .bind(extension_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| StateError::from_insert("extensions", &e))?;

    if result.rows_affected() == 0 {
        return Err(StateError::NotFound {
            entity: "extension".to_string(),
            id: extension_id.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Replace only the manifest cache and name
pub async fn update_manifest_cache(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
    name: &str,
    manifest_cache: &str,
) -> Result<bool, Error> {
    let result =
        query("UPDATE extensions SET name = ?1, manifest_cache = ?2 WHERE extension_id = ?3")
            .bind(name)
            .bind(manifest_cache)
            .bind(extension_id)
            .execute(&mut **tx)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a row; `false` when it did not exist
pub async fn delete_extension(
    tx: &mut Transaction<'_, Sqlite>,
    extension_id: i64,
) -> Result<bool, Error> {
    let result = query("DELETE FROM extensions WHERE extension_id = ?1")
        .bind(extension_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}
