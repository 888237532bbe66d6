use extman_config::Config;
use std::path::PathBuf;

/// Installer configuration
#[derive(Clone, Debug)]
pub struct InstallConfig {
    /// Public site root; site trees live under `components/`
    pub site_root: PathBuf,
    /// Administrator root; admin trees live under `components/`
    pub admin_root: PathBuf,
    /// Replace existing files on a fresh install
    pub overwrite: bool,
    /// Substituted for `#__` in extension SQL
    pub table_prefix: String,
    /// Only SQL declared for this driver runs
    pub database_driver: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl InstallConfig {
    /// Installer settings from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            site_root: config.site_root(),
            admin_root: config.admin_root(),
            overwrite: config.installer.overwrite,
            table_prefix: config.installer.table_prefix.clone(),
            database_driver: config.installer.database_driver.clone(),
        }
    }

    /// Set both roots
    #[must_use]
    pub fn with_roots(mut self, site_root: PathBuf, admin_root: PathBuf) -> Self {
        self.site_root = site_root;
        self.admin_root = admin_root;
        self
    }

    /// Enable/disable overwriting on install
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the table prefix
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}
