//! Database models for the extension registry

use extman_errors::ManifestError;
use extman_types::{ClientScope, ElementId, ExtensionSummary};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Registered extension, joined with its schema version
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub extension_id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub extension_type: String,
    pub element: String,
    pub folder: String,
    pub client_id: i64,
    pub enabled: bool,
    pub access: i64,
    pub protected: bool,
    pub manifest_cache: String,
    pub params: String,
    /// -1 discovered, 0 installed
    pub state: i64,
    pub schema_version: Option<String>,
}

impl ExtensionRecord {
    /// Client scope, `None` for ids the installer does not know
    #[must_use]
    pub fn client_scope(&self) -> Option<ClientScope> {
        ClientScope::from_client_id(self.client_id)
    }

    /// Element as a typed id
    ///
    /// # Errors
    ///
    /// Returns an error if the stored element is not a valid component element.
    pub fn element_id(&self) -> Result<ElementId, ManifestError> {
        ElementId::normalize(&self.element)
    }

    /// Summary row for listings
    #[must_use]
    pub fn summary(&self, version: Option<String>) -> ExtensionSummary {
        ExtensionSummary {
            extension_id: self.extension_id,
            element: self.element.clone(),
            name: self.name.clone(),
            client: self.client_scope().unwrap_or(ClientScope::Administrator),
            enabled: self.enabled,
            protected: self.protected,
            version,
            schema_version: self.schema_version.clone(),
        }
    }
}

/// Values for a new or rewritten extension row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExtension {
    pub name: String,
    pub extension_type: String,
    pub element: String,
    pub folder: String,
    pub client_id: i64,
    pub enabled: bool,
    pub access: i64,
    pub protected: bool,
    pub manifest_cache: String,
    pub params: String,
    pub state: i64,
}

impl From<&ExtensionRecord> for NewExtension {
    fn from(record: &ExtensionRecord) -> Self {
        Self {
            name: record.name.clone(),
            extension_type: record.extension_type.clone(),
            element: record.element.clone(),
            folder: record.folder.clone(),
            client_id: record.client_id,
            enabled: record.enabled,
            access: record.access,
            protected: record.protected,
            manifest_cache: record.manifest_cache.clone(),
            params: record.params.clone(),
            state: record.state,
        }
    }
}

/// Administrator or site menu node
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: i64,
    pub menutype: String,
    pub title: String,
    pub alias: String,
    pub link: String,
    #[sqlx(rename = "type")]
    pub node_type: String,
    pub published: bool,
    pub parent_id: i64,
    pub level: i64,
    pub component_id: i64,
    pub client_id: i64,
    pub img: String,
    pub home: bool,
    pub lft: i64,
    pub rgt: i64,
}

/// Values for a menu node about to be inserted as the last child of `parent_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuNode {
    pub menutype: String,
    pub title: String,
    pub alias: String,
    pub link: String,
    pub node_type: String,
    pub published: bool,
    pub parent_id: i64,
    pub component_id: i64,
    pub client_id: i64,
    pub img: String,
    pub home: bool,
}

/// Access-control asset node
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AssetNode {
    pub id: i64,
    pub parent_id: i64,
    pub lft: i64,
    pub rgt: i64,
    pub level: i64,
    pub name: String,
    pub title: String,
    pub rules: String,
}

/// Update-site entry waiting to be applied
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub update_id: i64,
    pub extension_id: i64,
    pub name: String,
    pub element: String,
    #[sqlx(rename = "type")]
    pub extension_type: String,
    pub folder: String,
    pub client_id: i64,
    pub version: String,
}
