//! Fixed layout of a site installation
//!
//! The directory names below the site and administrator roots are part of
//! the CMS layout and are not configurable; only the roots are.

pub const DEFAULT_SITE_ROOT: &str = "/var/www/html";
pub const DEFAULT_ADMIN_ROOT: &str = "/var/www/html/administrator";

pub const DEFAULT_DB_PATH: &str = "/var/lib/extman/state.sqlite";
pub const LOGS_DIR: &str = "/var/log/extman";

pub const COMPONENTS_DIR: &str = "components";
pub const MEDIA_DIR: &str = "media";
pub const LANGUAGE_DIR: &str = "language";

pub const DEFAULT_TABLE_PREFIX: &str = "ext_";
pub const DEFAULT_DATABASE_DRIVER: &str = "sqlite";
