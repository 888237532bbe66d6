//! Asset tree queries

use super::nested::{self, TreeTable};
use crate::models::AssetNode;
use extman_errors::{Error, StateError};
use sqlx::{query, query_as, Sqlite, Transaction};

/// Asset by its unique name
pub async fn find_asset(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Option<AssetNode>, Error> {
    let asset = query_as::<_, AssetNode>(
        "SELECT id, parent_id, lft, rgt, level, name, title, rules FROM assets WHERE name = ?1",
    )
    .bind(name)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(asset)
}

/// Insert an asset as the last child of `parent_id`, returning its id
pub async fn insert_asset(
    tx: &mut Transaction<'_, Sqlite>,
    parent_id: i64,
    name: &str,
    title: &str,
    rules: &str,
) -> Result<i64, Error> {
    let (lft, level) = nested::make_room(tx, TreeTable::Assets, parent_id).await?;

    let result = query(
        "INSERT INTO assets (parent_id, lft, rgt, level, name, title, rules) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(parent_id)
    .bind(lft)
    .bind(lft + 1)
    .bind(level)
    .bind(name)
    .bind(title)
    .bind(rules)
    .execute(&mut **tx)
    .await
    .map_err(|e| StateError::from_insert("assets", &e))?;

    Ok(result.last_insert_rowid())
}

/// Delete an asset and its children by name; returns rows removed
pub async fn delete_asset(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<u64, Error> {
    match find_asset(tx, name).await? {
        Some(asset) => nested::delete_subtree(tx, TreeTable::Assets, asset.id).await,
        None => Ok(0),
    }
}
