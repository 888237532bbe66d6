#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for extman
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/extman/config.toml)
//! - Environment variables
//! - CLI flags

pub mod constants;

use extman_errors::{ConfigError, Error};
use extman_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub installer: InstallerConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Where the site lives on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub site_root: Option<PathBuf>,
    pub admin_root: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

/// Installer behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Allow installing over an existing extension directory
    #[serde(default)]
    pub overwrite: bool,
    /// Replaces `#__` in extension SQL files
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// Only SQL files declared for this driver are executed
    #[serde(default = "default_database_driver")]
    pub database_driver: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            table_prefix: default_table_prefix(),
            database_driver: default_database_driver(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_table_prefix() -> String {
    constants::DEFAULT_TABLE_PREFIX.to_string()
}

fn default_database_driver() -> String {
    constants::DEFAULT_DATABASE_DRIVER.to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("extman").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // EXTMAN_OUTPUT
        if let Ok(output) = std::env::var("EXTMAN_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "EXTMAN_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // EXTMAN_COLOR
        if let Ok(color) = std::env::var("EXTMAN_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "EXTMAN_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Ok(root) = std::env::var("EXTMAN_SITE_ROOT") {
            self.paths.site_root = Some(non_empty_path("EXTMAN_SITE_ROOT", root)?);
        }

        if let Ok(root) = std::env::var("EXTMAN_ADMIN_ROOT") {
            self.paths.admin_root = Some(non_empty_path("EXTMAN_ADMIN_ROOT", root)?);
        }

        if let Ok(db) = std::env::var("EXTMAN_DATABASE") {
            self.paths.database = Some(non_empty_path("EXTMAN_DATABASE", db)?);
        }

        // EXTMAN_OVERWRITE
        if let Ok(overwrite) = std::env::var("EXTMAN_OVERWRITE") {
            self.installer.overwrite = match overwrite.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "EXTMAN_OVERWRITE".to_string(),
                        value: overwrite,
                    }
                    .into())
                }
            };
        }

        if let Ok(prefix) = std::env::var("EXTMAN_TABLE_PREFIX") {
            if !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(ConfigError::InvalidValue {
                    field: "EXTMAN_TABLE_PREFIX".to_string(),
                    value: prefix,
                }
                .into());
            }
            self.installer.table_prefix = prefix;
        }

        Ok(())
    }

    /// Site root (with default)
    #[must_use]
    pub fn site_root(&self) -> PathBuf {
        self.paths
            .site_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_SITE_ROOT))
    }

    /// Administrator root (with default)
    ///
    /// When only the site root is configured the administrator tree is
    /// assumed to live in its `administrator` subdirectory.
    #[must_use]
    pub fn admin_root(&self) -> PathBuf {
        match (&self.paths.admin_root, &self.paths.site_root) {
            (Some(admin), _) => admin.clone(),
            (None, Some(site)) => site.join("administrator"),
            (None, None) => PathBuf::from(constants::DEFAULT_ADMIN_ROOT),
        }
    }

    /// Get the database path
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .database
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_DB_PATH))
    }
}

fn non_empty_path(field: &str, value: String) -> Result<PathBuf, Error> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into());
    }
    Ok(PathBuf::from(value))
}
