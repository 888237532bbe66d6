//! Runtime SQL queries
//!
//! Every function takes the caller's transaction so related writes commit
//! or roll back together.

pub mod assets;
pub mod bookkeeping;
pub mod extensions;
pub mod menu;
pub mod nested;

pub use assets::*;
pub use bookkeeping::*;
pub use extensions::*;
pub use menu::*;
pub use nested::{rebuild, TreeTable, ROOT_ID};
