//! Element identifiers
//!
//! Every component is addressed by its element: a lower-case identifier
//! restricted to command characters and always carrying the `com_` prefix.

use std::fmt;

use extman_errors::ManifestError;
use serde::{Deserialize, Serialize};

/// Prefix forced onto every component element
pub const COMPONENT_PREFIX: &str = "com_";

/// Normalized component element, e.g. `com_content`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementId(String);

impl ElementId {
    /// Normalize a raw name into an element id.
    ///
    /// Characters outside `[A-Za-z0-9_.-]` are dropped, leading dots are
    /// stripped, the result is lower-cased and `com_` is prepended when
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::InvalidElement` when nothing usable remains.
    pub fn normalize(raw: &str) -> Result<Self, ManifestError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            .collect::<String>()
            .trim_start_matches('.')
            .to_ascii_lowercase();

        let element = if cleaned.starts_with(COMPONENT_PREFIX) {
            cleaned
        } else {
            format!("{COMPONENT_PREFIX}{cleaned}")
        };

        if element.len() == COMPONENT_PREFIX.len() {
            return Err(ManifestError::InvalidElement {
                element: raw.to_string(),
            });
        }
        Ok(Self(element))
    }

    /// Full element, `com_content`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element without the component prefix, `content`
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0
            .strip_prefix(COMPONENT_PREFIX)
            .unwrap_or(self.0.as_str())
    }

    /// File name of the descriptor stored inside the install tree
    #[must_use]
    pub fn manifest_file_name(&self) -> String {
        format!("{}.toml", self.short_name())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ElementId {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<ElementId> for String {
    fn from(value: ElementId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_forced() {
        let element = ElementId::normalize("Banners").unwrap();
        assert_eq!(element.as_str(), "com_banners");
        assert_eq!(element.short_name(), "banners");
        assert_eq!(element.manifest_file_name(), "banners.toml");
    }

    #[test]
    fn existing_prefix_is_kept_once() {
        let element = ElementId::normalize("COM_Weblinks").unwrap();
        assert_eq!(element.as_str(), "com_weblinks");
    }

    #[test]
    fn non_command_characters_are_dropped() {
        let element = ElementId::normalize("../My Blog!").unwrap();
        assert_eq!(element.as_str(), "com_myblog");
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(ElementId::normalize("!!!").is_err());
        assert!(ElementId::normalize("com_").is_err());
    }
}
