#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction for the filesystem side of extension installs.
//!
//! The installer never touches `std::fs` or `tokio::fs` directly: it talks to
//! a [`FilesystemOperations`] implementation so that failure paths (rollback,
//! partial uninstall) can be exercised with injected faults.

pub mod filesystem;
pub mod fs;

pub use filesystem::{FilesystemOperations, LocalFilesystem};
