//! Command line interface definition

use clap::{Parser, Subcommand};
use extman_types::ColorChoice;
use std::path::PathBuf;

/// extman - component installer for CMS site trees
#[derive(Parser)]
#[command(name = "extman")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install, update and remove CMS components")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to /var/log/extman/
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Site root directory (overrides config)
    #[arg(long, global = true, value_name = "DIR", env = "EXTMAN_SITE_ROOT")]
    pub site_root: Option<PathBuf>,

    /// Administrator root directory; defaults to `<site-root>/administrator`
    #[arg(long, global = true, value_name = "DIR", env = "EXTMAN_ADMIN_ROOT")]
    pub admin_root: Option<PathBuf>,

    /// Registry database (overrides config)
    #[arg(long, global = true, value_name = "PATH", env = "EXTMAN_DATABASE")]
    pub database: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install a component from an unpacked package
    #[command(alias = "i")]
    Install {
        /// Path to the package's descriptor file
        manifest: PathBuf,

        /// Replace files of a component that is already on disk
        #[arg(long)]
        overwrite: bool,

        /// Treat the install as an update when the component exists
        #[arg(long)]
        upgrade: bool,
    },

    /// Update an installed component from an unpacked package
    #[command(alias = "up")]
    Update {
        /// Path to the package's descriptor file
        manifest: PathBuf,
    },

    /// Uninstall a component
    #[command(alias = "rm")]
    Uninstall {
        /// Extension id or element (e.g. com_blog or blog)
        target: String,
    },

    /// List components present on disk but not registered
    Discover,

    /// Register a discovered component
    DiscoverInstall {
        /// Element of the discovered component
        element: String,
    },

    /// Re-read an installed component's descriptor into the registry
    RefreshCache {
        /// Extension id or element
        target: String,
    },

    /// List registered extensions
    #[command(alias = "ls")]
    List,
}

impl Commands {
    /// Whether the command writes to the site tree or registry
    pub fn mutates(&self) -> bool {
        !matches!(self, Commands::Discover | Commands::List)
    }
}
