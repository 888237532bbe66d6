#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Extension manifest handling for extman
//!
//! This crate defines the TOML descriptor shipped with every component and
//! the JSON manifest-cache snapshot stored with its registry record.
//!
//! ```toml
//! name = "Blog"
//! version = "1.2.0"
//! scriptfile = "script.php"
//!
//! [files]
//! folder = "site"
//! files = ["blog.php"]
//! folders = ["views"]
//!
//! [administration]
//! files = { folder = "admin", files = ["blog.php"] }
//! menu = { title = "COM_BLOG" }
//!
//! [[administration.submenu]]
//! title = "COM_BLOG_POSTS"
//! view = "posts"
//! ```

mod cache;
pub mod sections;

pub use cache::ManifestCache;
pub use sections::{
    Administration, FileEntry, FileSet, LanguageFile, LanguageSet, MediaSet, MenuSpec, SchemaPath,
    Schemas, SqlFile, SqlFiles, SqlSection, SubmenuSpec, UpdateSection,
};

use extman_errors::{Error, ManifestError};
use extman_types::{ElementId, ExtensionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sections::driver_matches;

/// Parsed extension descriptor
///
/// Immutable once parsed: operations read it, nothing writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    #[serde(rename = "type", default = "default_type")]
    pub extension_type: String,
    /// `"upgrade"` asks install to update an existing copy in place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub name: String,
    /// Explicit element; derived from `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lifecycle script shipped with the package, copied to the admin tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptfile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FileSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<LanguageSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<Administration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<SqlSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall: Option<SqlSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<UpdateSection>,

    /// Default parameter values stored on the record
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
}

fn default_type() -> String {
    ExtensionType::Component.as_str().to_string()
}

impl ExtensionManifest {
    /// Load manifest from TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or if the manifest
    /// fails [`ExtensionManifest::validate`].
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let manifest: Self = toml::from_str(content).map_err(|e| ManifestError::Invalid {
            message: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate manifest fields
    ///
    /// # Errors
    ///
    /// Returns an error for non-component manifests, an empty name, or a
    /// name that does not yield a usable element.
    pub fn validate(&self) -> Result<(), Error> {
        if !self
            .extension_type
            .eq_ignore_ascii_case(ExtensionType::Component.as_str())
        {
            return Err(ManifestError::UnsupportedType {
                found: self.extension_type.clone(),
            }
            .into());
        }

        if self.name.trim().is_empty() {
            return Err(ManifestError::Invalid {
                message: "extension name cannot be empty".to_string(),
            }
            .into());
        }

        self.element()?;
        Ok(())
    }

    /// Normalized element id
    ///
    /// # Errors
    ///
    /// Returns an error if nothing usable remains after normalization.
    pub fn element(&self) -> Result<ElementId, ManifestError> {
        ElementId::normalize(self.element.as_deref().unwrap_or(&self.name))
    }

    /// Display name, trimmed
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    /// `method = "upgrade"` was declared
    #[must_use]
    pub fn requests_upgrade(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("upgrade"))
    }

    /// An `[update]` table is present
    #[must_use]
    pub fn has_update_section(&self) -> bool {
        self.update.is_some()
    }

    #[must_use]
    pub fn site_files(&self) -> Option<&FileSet> {
        self.files.as_ref()
    }

    #[must_use]
    pub fn admin_files(&self) -> Option<&FileSet> {
        self.administration.as_ref().and_then(|a| a.files.as_ref())
    }

    #[must_use]
    pub fn admin_languages(&self) -> Option<&LanguageSet> {
        self.administration
            .as_ref()
            .and_then(|a| a.languages.as_ref())
    }

    #[must_use]
    pub fn admin_menu(&self) -> Option<&MenuSpec> {
        self.administration.as_ref().and_then(|a| a.menu.as_ref())
    }

    #[must_use]
    pub fn submenus(&self) -> &[SubmenuSpec] {
        self.administration
            .as_ref()
            .map_or(&[], |a| a.submenu.as_slice())
    }

    /// Install SQL scripts declared for `driver`, in declaration order
    #[must_use]
    pub fn install_sql_files(&self, driver: &str) -> Vec<&str> {
        sql_files(self.install.as_ref(), driver)
    }

    /// Uninstall SQL scripts declared for `driver`, in declaration order
    #[must_use]
    pub fn uninstall_sql_files(&self, driver: &str) -> Vec<&str> {
        sql_files(self.uninstall.as_ref(), driver)
    }

    /// Directories of versioned update scripts for `driver`
    #[must_use]
    pub fn schema_paths(&self, driver: &str) -> Vec<&str> {
        self.update
            .as_ref()
            .and_then(|u| u.schemas.as_ref())
            .map(|s| {
                s.schemapath
                    .iter()
                    .filter(|p| driver_matches(Some(&p.driver), driver))
                    .map(|p| p.path.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Default parameters serialized for the extension record
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter value cannot be encoded as JSON.
    pub fn params_json(&self) -> Result<String, Error> {
        if self.params.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(serde_json::to_string(&self.params)?)
    }

    /// Snapshot stored as the record's manifest cache
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be derived.
    pub fn cache(&self) -> Result<ManifestCache, Error> {
        Ok(ManifestCache::from_manifest(self)?)
    }
}

fn sql_files<'a>(section: Option<&'a SqlSection>, driver: &str) -> Vec<&'a str> {
    section
        .and_then(|s| s.sql.as_ref())
        .map(|sql| {
            sql.files
                .iter()
                .filter(|f| driver_matches(f.driver.as_deref(), driver))
                .map(|f| f.path.as_str())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Blog"
method = "upgrade"
version = "1.2.0"
author = "Jane"
scriptfile = "script.php"

[files]
folder = "site"
files = ["blog.php", "router.php"]
folders = ["views"]

[media]
destination = "com_blog"
folder = "media"
folders = ["css"]

[administration.files]
folder = "admin"
files = ["blog.php"]

[administration.menu]
title = " COM_BLOG "
img = "class:blog"

[[administration.submenu]]
title = "COM_BLOG_POSTS"
view = "posts"
layout = "default"

[[install.sql.file]]
driver = "sqlite"
path = "sql/install.sqlite.sql"

[[install.sql.file]]
driver = "mysql"
path = "sql/install.mysql.sql"

[[update.schemas.schemapath]]
type = "sqlite"
path = "sql/updates/sqlite"

[params]
show_title = true
list_limit = 20
"#;

    #[test]
    fn parses_every_section() {
        let manifest = ExtensionManifest::from_toml(FULL).unwrap();
        assert_eq!(manifest.element().unwrap().as_str(), "com_blog");
        assert!(manifest.requests_upgrade());
        assert!(manifest.has_update_section());
        assert_eq!(manifest.site_files().unwrap().files.len(), 2);
        assert_eq!(manifest.admin_files().unwrap().folder.as_deref(), Some("admin"));
        assert_eq!(manifest.admin_menu().unwrap().title, " COM_BLOG ");
        assert_eq!(manifest.submenus()[0].view.as_deref(), Some("posts"));
        assert_eq!(manifest.install_sql_files("sqlite"), vec!["sql/install.sqlite.sql"]);
        assert_eq!(manifest.schema_paths("sqlite"), vec!["sql/updates/sqlite"]);
        assert!(manifest.schema_paths("mysql").is_empty());
        assert_eq!(
            manifest.media.as_ref().unwrap().files.folders,
            vec!["css".to_string()]
        );
    }

    #[test]
    fn params_serialize_as_json_object() {
        let manifest = ExtensionManifest::from_toml(FULL).unwrap();
        let params: serde_json::Value =
            serde_json::from_str(&manifest.params_json().unwrap()).unwrap();
        assert_eq!(params["list_limit"], 20);
        assert_eq!(params["show_title"], true);
    }

    #[test]
    fn minimal_manifest_has_empty_defaults() {
        let manifest = ExtensionManifest::from_toml("name = \"Tiny\"\n[administration]\n").unwrap();
        assert_eq!(manifest.params_json().unwrap(), "{}");
        assert!(manifest.admin_menu().is_none());
        assert!(manifest.submenus().is_empty());
        assert!(!manifest.requests_upgrade());
    }

    #[test]
    fn rejects_other_extension_types() {
        let err = ExtensionManifest::from_toml("type = \"plugin\"\nname = \"x\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Manifest(ManifestError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn element_override_wins_over_name() {
        let manifest =
            ExtensionManifest::from_toml("name = \"My Blog\"\nelement = \"com_blogger\"").unwrap();
        assert_eq!(manifest.element().unwrap().as_str(), "com_blogger");
    }
}
