use extman_errors::{Error, ManifestError};
use serde::{Deserialize, Serialize};

use crate::ExtensionManifest;

/// JSON snapshot of manifest metadata kept on the extension record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCache {
    pub name: String,
    #[serde(rename = "type")]
    pub extension_type: String,
    pub creation_date: String,
    pub author: String,
    pub copyright: String,
    pub author_email: String,
    pub author_url: String,
    pub version: String,
    pub description: String,
    pub group: String,
    pub filename: String,
}

impl ManifestCache {
    pub(crate) fn from_manifest(manifest: &ExtensionManifest) -> Result<Self, ManifestError> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(Self {
            name: manifest.display_name().to_string(),
            extension_type: manifest.extension_type.to_ascii_lowercase(),
            creation_date: text(&manifest.creation_date),
            author: text(&manifest.author),
            copyright: text(&manifest.copyright),
            author_email: text(&manifest.author_email),
            author_url: text(&manifest.author_url),
            version: text(&manifest.version),
            description: text(&manifest.description),
            group: String::new(),
            filename: manifest.element()?.short_name().to_string(),
        })
    }

    /// Encode for storage
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the stored text is not a manifest cache.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}
