//! Client scopes, extension types and lifecycle routes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which application tree an extension record or menu node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientScope {
    Site,
    Administrator,
}

impl ClientScope {
    /// Numeric client id as stored in the database
    #[must_use]
    pub fn client_id(self) -> i64 {
        match self {
            Self::Site => 0,
            Self::Administrator => 1,
        }
    }

    /// Inverse of [`ClientScope::client_id`]; unknown ids map to `None`
    #[must_use]
    pub fn from_client_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::Site),
            1 => Some(Self::Administrator),
            _ => None,
        }
    }
}

impl fmt::Display for ClientScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Site => write!(f, "site"),
            Self::Administrator => write!(f, "administrator"),
        }
    }
}

/// Extension kinds handled by the installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    #[default]
    Component,
}

impl ExtensionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
        }
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle route passed to hooks so they know which operation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Install,
    Update,
    Uninstall,
    DiscoverInstall,
}

impl Route {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Uninstall => "uninstall",
            Self::DiscoverInstall => "discover_install",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
