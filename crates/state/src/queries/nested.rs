//! Nested-set maintenance shared by the menu and asset trees
//!
//! Both tables store `parent_id`, `lft`, `rgt` and `level`. Inserts always
//! append a last child; deletes remove a whole subtree and close the gap;
//! [`rebuild`] renumbers everything from the parent links.

use extman_errors::{Error, StateError};
use sqlx::{query, Row, Sqlite, Transaction};
use std::collections::HashMap;

/// Root node id in every tree table
pub const ROOT_ID: i64 = 1;

/// Tables organised as nested sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeTable {
    Menu,
    Assets,
}

impl TreeTable {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Assets => "assets",
        }
    }
}

/// Open a slot for a new last child of `parent_id`.
///
/// Returns the `lft` and `level` the new node must use; its `rgt` is
/// `lft + 1`.
pub(crate) async fn make_room(
    tx: &mut Transaction<'_, Sqlite>,
    table: TreeTable,
    parent_id: i64,
) -> Result<(i64, i64), Error> {
    let t = table.name();
    let row = query(&format!("SELECT rgt, level FROM {t} WHERE id = ?1"))
        .bind(parent_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(row) = row else {
        return Err(StateError::NestedSetCorrupted {
            table: t.to_string(),
            message: format!("parent node {parent_id} does not exist"),
        }
        .into());
    };
    let parent_rgt: i64 = row.get("rgt");
    let parent_level: i64 = row.get("level");

    query(&format!("UPDATE {t} SET rgt = rgt + 2 WHERE rgt >= ?1"))
        .bind(parent_rgt)
        .execute(&mut **tx)
        .await?;
    query(&format!("UPDATE {t} SET lft = lft + 2 WHERE lft > ?1"))
        .bind(parent_rgt)
        .execute(&mut **tx)
        .await?;

    Ok((parent_rgt, parent_level + 1))
}

/// Delete node `id` and its descendants, closing the gap they leave.
///
/// Returns the number of rows removed; a missing node removes nothing.
pub(crate) async fn delete_subtree(
    tx: &mut Transaction<'_, Sqlite>,
    table: TreeTable,
    id: i64,
) -> Result<u64, Error> {
    if id == ROOT_ID {
        return Err(StateError::NestedSetCorrupted {
            table: table.name().to_string(),
            message: "refusing to delete the root node".to_string(),
        }
        .into());
    }

    let t = table.name();
    let row = query(&format!("SELECT lft, rgt FROM {t} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    let Some(row) = row else {
        return Ok(0);
    };
    let lft: i64 = row.get("lft");
    let rgt: i64 = row.get("rgt");
    let width = rgt - lft + 1;

    let removed = query(&format!(
        "DELETE FROM {t} WHERE id = ?1 OR (lft > ?2 AND rgt < ?3)"
    ))
    .bind(id)
    .bind(lft)
    .bind(rgt)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    query(&format!("UPDATE {t} SET lft = lft - ?1 WHERE lft > ?2"))
        .bind(width)
        .bind(rgt)
        .execute(&mut **tx)
        .await?;
    query(&format!("UPDATE {t} SET rgt = rgt - ?1 WHERE rgt > ?2"))
        .bind(width)
        .bind(rgt)
        .execute(&mut **tx)
        .await?;

    Ok(removed)
}

/// Renumber the whole tree from its parent links.
///
/// Siblings keep their current relative order. Returns the number of nodes
/// reachable from the root.
pub async fn rebuild(tx: &mut Transaction<'_, Sqlite>, table: TreeTable) -> Result<usize, Error> {
    let t = table.name();
    let rows = query(&format!("SELECT id, parent_id FROM {t} ORDER BY parent_id, lft, id"))
        .fetch_all(&mut **tx)
        .await?;
    let links: Vec<(i64, i64)> = rows
        .iter()
        .map(|r| (r.get("id"), r.get("parent_id")))
        .collect();

    let numbered = number_tree(ROOT_ID, &links);
    for node in &numbered {
        query(&format!(
            "UPDATE {t} SET lft = ?1, rgt = ?2, level = ?3 WHERE id = ?4"
        ))
        .bind(node.lft)
        .bind(node.rgt)
        .bind(node.level)
        .bind(node.id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(numbered.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Numbered {
    pub id: i64,
    pub lft: i64,
    pub rgt: i64,
    pub level: i64,
}

/// Depth-first numbering of `(id, parent_id)` links starting at `root`.
/// Children are visited in the order they appear in `links`.
pub(crate) fn number_tree(root: i64, links: &[(i64, i64)]) -> Vec<Numbered> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for &(id, parent) in links {
        if id != root && id != parent {
            children.entry(parent).or_default().push(id);
        }
    }

    let mut out = Vec::with_capacity(links.len());
    let mut counter = 0;
    visit(root, 0, &children, &mut counter, &mut out);
    out
}

fn visit(
    id: i64,
    level: i64,
    children: &HashMap<i64, Vec<i64>>,
    counter: &mut i64,
    out: &mut Vec<Numbered>,
) {
    let index = out.len();
    out.push(Numbered {
        id,
        lft: *counter,
        rgt: 0,
        level,
    });
    *counter += 1;

    if let Some(kids) = children.get(&id) {
        for &kid in kids {
            visit(kid, level + 1, children, counter, out);
        }
    }

    out[index].rgt = *counter;
    *counter += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_children_in_link_order() {
        // root(1) -> 2 -> 4, root -> 3
        let links = [(1, 0), (2, 1), (3, 1), (4, 2)];
        let numbered = number_tree(1, &links);
        let by_id: HashMap<i64, Numbered> = numbered.iter().map(|n| (n.id, *n)).collect();

        assert_eq!((by_id[&1].lft, by_id[&1].rgt, by_id[&1].level), (0, 7, 0));
        assert_eq!((by_id[&2].lft, by_id[&2].rgt, by_id[&2].level), (1, 4, 1));
        assert_eq!((by_id[&4].lft, by_id[&4].rgt, by_id[&4].level), (2, 3, 2));
        assert_eq!((by_id[&3].lft, by_id[&3].rgt, by_id[&3].level), (5, 6, 1));
    }

    #[test]
    fn orphans_are_left_out() {
        let links = [(1, 0), (2, 1), (9, 42)];
        let numbered = number_tree(1, &links);
        assert_eq!(numbered.len(), 2);
        assert!(numbered.iter().all(|n| n.id != 9));
    }
}
