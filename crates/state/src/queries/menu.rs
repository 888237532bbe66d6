//! Menu tree queries

use super::nested::{self, TreeTable};
use crate::models::{MenuNode, NewMenuNode};
use extman_errors::{Error, StateError};
use sqlx::{query, query_as, Row, Sqlite, Transaction};

const SELECT_MENU: &str = "SELECT id, menutype, title, alias, link, type, published, parent_id, \
     level, component_id, client_id, img, home, lft, rgt FROM menu";

/// Insert `node` as the last child of its parent, returning the new id
pub async fn insert_menu_node(
    tx: &mut Transaction<'_, Sqlite>,
    node: &NewMenuNode,
) -> Result<i64, Error> {
    let (lft, level) = nested::make_room(tx, TreeTable::Menu, node.parent_id).await?;

    let result = query(
        "INSERT INTO menu (menutype, title, alias, link, type, published, parent_id, level, \
         component_id, client_id, img, home, lft, rgt) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(&node.menutype)
    .bind(&node.title)
    .bind(&node.alias)
    .bind(&node.link)
    .bind(&node.node_type)
    .bind(node.published)
    .bind(node.parent_id)
    .bind(level)
    .bind(node.component_id)
    .bind(node.client_id)
    .bind(&node.img)
    .bind(node.home)
    .bind(lft)
    .bind(lft + 1)
    .execute(&mut **tx)
    .await
    .map_err(|e| StateError::from_insert("menu", &e))?;

    Ok(result.last_insert_rowid())
}

/// Root menu node of a component, if one exists
pub async fn find_component_root(
    tx: &mut Transaction<'_, Sqlite>,
    component_id: i64,
    client_id: i64,
) -> Result<Option<MenuNode>, Error> {
    let node = query_as::<_, MenuNode>(&format!(
        "{SELECT_MENU} WHERE parent_id = ?1 AND client_id = ?2 AND component_id = ?3 \
         ORDER BY lft LIMIT 1"
    ))
    .bind(nested::ROOT_ID)
    .bind(client_id)
    .bind(component_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(node)
}

/// Component node under `parent_id` that carries exactly `link`
pub async fn find_by_link(
    tx: &mut Transaction<'_, Sqlite>,
    link: &str,
    parent_id: i64,
    client_id: i64,
) -> Result<Option<MenuNode>, Error> {
    let node = query_as::<_, MenuNode>(&format!(
        "{SELECT_MENU} WHERE menutype = 'main' AND type = 'component' AND home = 0 \
         AND link = ?1 AND parent_id = ?2 AND client_id = ?3 ORDER BY id LIMIT 1"
    ))
    .bind(link)
    .bind(parent_id)
    .bind(client_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(node)
}

/// Every node of a component in tree order
pub async fn component_nodes(
    tx: &mut Transaction<'_, Sqlite>,
    component_id: i64,
    client_id: i64,
) -> Result<Vec<MenuNode>, Error> {
    let nodes = query_as::<_, MenuNode>(&format!(
        "{SELECT_MENU} WHERE component_id = ?1 AND client_id = ?2 ORDER BY lft"
    ))
    .bind(component_id)
    .bind(client_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(nodes)
}

/// Delete every node of a component; returns rows removed
pub async fn delete_component_nodes(
    tx: &mut Transaction<'_, Sqlite>,
    component_id: i64,
    client_id: i64,
) -> Result<u64, Error> {
    let ids: Vec<i64> =
        query("SELECT id FROM menu WHERE component_id = ?1 AND client_id = ?2 ORDER BY lft")
            .bind(component_id)
            .bind(client_id)
            .fetch_all(&mut **tx)
            .await?
            .iter()
            .map(|r| r.get("id"))
            .collect();

    let mut removed = 0;
    for id in ids {
        // Children may already be gone with their parent
        removed += nested::delete_subtree(tx, TreeTable::Menu, id).await?;
    }
    Ok(removed)
}

/// Delete a single node together with its children
pub async fn delete_menu_subtree(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
) -> Result<u64, Error> {
    nested::delete_subtree(tx, TreeTable::Menu, id).await
}
