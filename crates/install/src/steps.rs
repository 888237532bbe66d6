//! Reversible side effects recorded while an operation runs

use std::path::PathBuf;

/// One action the rollback path knows how to undo
///
/// Steps are pushed as side effects happen and undone in reverse order.
/// They live only as long as the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationStep {
    /// Directory that did not exist before the operation
    CreatedDirectory(PathBuf),
    /// File whose destination did not exist before the copy
    CopiedFile(PathBuf),
    /// Folder whose destination did not exist before the copy
    CopiedFolder(PathBuf),
    /// Administrator menu node
    CreatedMenuNode { id: i64 },
    /// Extension registry row
    RegisteredExtension { id: i64 },
    /// Access-control asset
    RegisteredAsset { name: String },
}

impl InstallationStep {
    /// Short label for logs
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreatedDirectory(path) => format!("created directory {}", path.display()),
            Self::CopiedFile(path) => format!("copied file {}", path.display()),
            Self::CopiedFolder(path) => format!("copied folder {}", path.display()),
            Self::CreatedMenuNode { id } => format!("menu node {id}"),
            Self::RegisteredExtension { id } => format!("extension record {id}"),
            Self::RegisteredAsset { name } => format!("asset {name}"),
        }
    }
}
