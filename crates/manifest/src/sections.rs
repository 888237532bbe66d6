//! Manifest sections
//!
//! Each struct mirrors one table of the descriptor. Everything is optional
//! unless the installer cannot work without it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A list of files and folders copied from one source folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    /// Folder inside the install package holding the entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<String>,
}

impl FileSet {
    /// All entries, files first, as declared
    pub fn entries(&self) -> impl Iterator<Item = FileEntry<'_>> {
        self.files
            .iter()
            .map(|name| FileEntry::File(name.as_str()))
            .chain(self.folders.iter().map(|name| FileEntry::Folder(name.as_str())))
    }

    /// Entry names, used to diff an old list against a new one
    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        self.entries().map(FileEntry::name).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

/// One entry of a [`FileSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileEntry<'a> {
    File(&'a str),
    Folder(&'a str),
}

impl<'a> FileEntry<'a> {
    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::File(name) | Self::Folder(name) => name,
        }
    }

    #[must_use]
    pub fn is_folder(self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Media files copied below `<site>/media/<destination>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSet {
    /// Subdirectory of the media root; defaults to the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(flatten)]
    pub files: FileSet,
}

/// Language files copied below `<root>/language/<tag>/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, rename = "language", skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<LanguageFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageFile {
    /// Language tag, e.g. `en-GB`
    pub tag: String,
    /// Path of the file relative to the set's folder
    pub file: String,
}

/// The `[administration]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Administration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FileSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<LanguageSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submenu: Vec<SubmenuSpec>,
}

/// Root administrator menu entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSpec {
    /// Menu text; also the default alias
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    /// Query string appended to `index.php?`, replaces the default link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Suppresses menu creation entirely
    #[serde(default)]
    pub hidden: bool,
}

/// Child of the root menu entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl SubmenuSpec {
    /// Query parameters in the order they are appended to the link
    #[must_use]
    pub fn query_params(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("act", self.act.as_deref()),
            ("task", self.task.as_deref()),
            ("controller", self.controller.as_deref()),
            ("view", self.view.as_deref()),
            ("layout", self.layout.as_deref()),
            ("sub", self.sub.as_deref()),
        ]
    }
}

/// `[install.sql]` / `[uninstall.sql]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<SqlFiles>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFiles {
    #[serde(default, rename = "file", skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SqlFile>,
}

/// One SQL script reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFile {
    /// Database driver the script targets; absent means any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    pub path: String,
}

/// `[update]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Schemas>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schemas {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemapath: Vec<SchemaPath>,
}

/// Directory of versioned update scripts for one driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPath {
    #[serde(rename = "type")]
    pub driver: String,
    pub path: String,
}

pub(crate) fn driver_matches(declared: Option<&str>, driver: &str) -> bool {
    declared.is_none_or(|d| d.eq_ignore_ascii_case(driver))
}
