//! Types for operations and results

use extman_errors::{Error, OpsError};
use extman_state::{ExtensionRecord, StateManager};
use extman_types::{ElementId, ExtensionType};
use std::fmt;

/// How a command names an installed extension: registry id or element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtensionTarget {
    Id(i64),
    Element(ElementId),
}

impl ExtensionTarget {
    /// Numbers are ids, anything else is normalized as an element
    ///
    /// # Errors
    ///
    /// Returns an error if the text is neither an id nor a usable element.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = text.trim();
        if let Ok(id) = text.parse::<i64>() {
            return Ok(Self::Id(id));
        }
        Ok(Self::Element(ElementId::normalize(text)?))
    }

    /// Registry row the target names
    ///
    /// # Errors
    ///
    /// Returns `OpsError::ExtensionNotRegistered` when nothing matches.
    pub async fn resolve(&self, state: &StateManager) -> Result<ExtensionRecord, Error> {
        let record = match self {
            Self::Id(id) => state.get_extension(*id).await?,
            Self::Element(element) => {
                state
                    .find_extension(element.as_str(), ExtensionType::Component.as_str())
                    .await?
            }
        };
        record.ok_or_else(|| {
            OpsError::ExtensionNotRegistered {
                target: self.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Display for ExtensionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Element(element) => write!(f, "{element}"),
        }
    }
}
