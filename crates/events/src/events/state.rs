use serde::{Deserialize, Serialize};

/// Persistence events for the extension registry and its trees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// Database opened and migrated
    DatabaseReady { path: String },

    /// Extension record inserted
    ExtensionRegistered { extension_id: i64, element: String },

    /// Extension record updated in place
    ExtensionUpdated { extension_id: i64, element: String },

    /// Extension record deleted
    ExtensionRemoved { extension_id: i64, element: String },

    /// Schema version stamped for an extension
    SchemaVersionRecorded { extension_id: i64, version: String },

    /// Nested-set tree renumbered
    TreeRebuilt { table: String, nodes: usize },
}
