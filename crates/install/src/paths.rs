//! Canonical install locations of a component

use crate::InstallConfig;
use extman_config::constants::{COMPONENTS_DIR, LANGUAGE_DIR, MEDIA_DIR};
use extman_types::{ClientScope, ElementId};
use std::path::{Path, PathBuf};

/// Site and administrator directories for one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPaths {
    pub site_root: PathBuf,
    pub admin_root: PathBuf,
    /// `<site>/components/<element>`
    pub site: PathBuf,
    /// `<admin>/components/<element>`
    pub admin: PathBuf,
}

impl ExtensionPaths {
    #[must_use]
    pub fn resolve(config: &InstallConfig, element: &ElementId) -> Self {
        Self {
            site_root: config.site_root.clone(),
            admin_root: config.admin_root.clone(),
            site: components_dir(&config.site_root).join(element.as_str()),
            admin: components_dir(&config.admin_root).join(element.as_str()),
        }
    }

    /// Install directory of a scope
    #[must_use]
    pub fn dir(&self, scope: ClientScope) -> &Path {
        match scope {
            ClientScope::Site => &self.site,
            ClientScope::Administrator => &self.admin,
        }
    }

    /// Where the descriptor is kept after install
    #[must_use]
    pub fn installed_manifest(&self, element: &ElementId) -> PathBuf {
        self.admin.join(element.manifest_file_name())
    }

    /// Descriptor locations searched on update, administrator first
    #[must_use]
    pub fn manifest_candidates(&self, element: &ElementId) -> [PathBuf; 2] {
        let name = element.manifest_file_name();
        [self.admin.join(&name), self.site.join(name)]
    }

    /// Shared media directory of the site
    #[must_use]
    pub fn media_root(&self) -> PathBuf {
        self.site_root.join(MEDIA_DIR)
    }

    /// Language directory of a scope
    #[must_use]
    pub fn language_root(&self, scope: ClientScope) -> PathBuf {
        match scope {
            ClientScope::Site => self.site_root.join(LANGUAGE_DIR),
            ClientScope::Administrator => self.admin_root.join(LANGUAGE_DIR),
        }
    }
}

/// `<root>/components`, scanned by discovery
#[must_use]
pub fn components_dir(root: &Path) -> PathBuf {
    root.join(COMPONENTS_DIR)
}
