//! extman - component installer for CMS site trees
//!
//! This is the main CLI application that drives install, update, uninstall
//! and discovery through the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use extman_config::{constants, Config};
use extman_errors::OpsError;
use extman_events::EventReceiver;
use extman_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use extman_state::StateManager;
use extman_types::{ColorChoice, OutputFormat};
use std::process;
use tokio::select;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting extman v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: file (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let json_mode = cli.global.json || config.general.default_output == OutputFormat::Json;
    let color = cli.global.color.unwrap_or(config.general.color);

    let (event_sender, event_receiver) = extman_events::channel();

    let state = StateManager::open(&config.db_path(), Some(event_sender.clone())).await?;
    debug!(
        database = %config.db_path().display(),
        site_root = %config.site_root().display(),
        mutating = cli.command.mutates(),
        "Opened registry"
    );

    let ops_ctx = OpsContextBuilder::new()
        .with_state(state)
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    let renderer = OutputRenderer::new(json_mode, color);

    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_mode);

    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    // Leftovers are rendered above; the exit status still reports them
    if let OperationResult::UninstallReport(report) = &result {
        if !report.success {
            return Err(CliError::Ops(
                OpsError::UninstallIncomplete {
                    element: report.element.clone(),
                    failures: report.failures.len(),
                }
                .into(),
            ));
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Install {
            manifest,
            overwrite,
            upgrade,
        } => {
            let report = extman_ops::install(&ctx, &manifest, overwrite, upgrade).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Update { manifest } => {
            let report = extman_ops::update(&ctx, &manifest).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Uninstall { target } => {
            let report = extman_ops::uninstall(&ctx, &target).await?;
            Ok(OperationResult::UninstallReport(report))
        }

        Commands::Discover => {
            let report = extman_ops::discover(&ctx).await?;
            Ok(OperationResult::DiscoveryReport(report))
        }

        Commands::DiscoverInstall { element } => {
            let report = extman_ops::discover_install(&ctx, &element).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::RefreshCache { target } => {
            let summary = extman_ops::refresh_cache(&ctx, &target).await?;
            Ok(OperationResult::Extension(summary))
        }

        Commands::List => {
            let extensions = extman_ops::list_extensions(&ctx).await?;
            Ok(OperationResult::ExtensionList(extensions))
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
    if let Some(site_root) = &global.site_root {
        config.paths.site_root = Some(site_root.clone());
        // The configured administrator tree belongs to the old site root
        config.paths.admin_root = None;
    }
    if let Some(admin_root) = &global.admin_root {
        config.paths.admin_root = Some(admin_root.clone());
    }
    if let Some(database) = &global.database {
        config.paths.database = Some(database.clone());
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Some(file) = open_log_file(json_mode) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(
                            "info,extman=debug,extman_ops=info,extman_install=debug",
                        )
                    }),
                )
                .init();
            return;
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: the event handler already prints extman's own events
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter("warn,extman=off")
            .init();
    }
}

fn open_log_file(json_mode: bool) -> Option<std::fs::File> {
    let log_dir = std::path::Path::new(constants::LOGS_DIR);
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        if !json_mode {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        return None;
    }

    let log_file = log_dir.join(format!(
        "extman-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));

    match std::fs::File::create(&log_file) {
        Ok(file) => {
            if !json_mode {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Some(file)
        }
        Err(e) => {
            if !json_mode {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn configured() -> Config {
        let mut config = Config::default();
        config.paths.site_root = Some(PathBuf::from("/srv/old"));
        config.paths.admin_root = Some(PathBuf::from("/srv/old/admin"));
        config
    }

    #[test]
    fn site_root_flag_rederives_admin_root() {
        let cli = Cli::try_parse_from(["extman", "--site-root", "/srv/new", "list"]).unwrap();
        let mut config = configured();
        apply_cli_config(&mut config, &cli.global);

        assert_eq!(config.site_root(), PathBuf::from("/srv/new"));
        assert_eq!(config.admin_root(), PathBuf::from("/srv/new/administrator"));
    }

    #[test]
    fn admin_root_flag_wins() {
        let cli = Cli::try_parse_from([
            "extman",
            "--site-root",
            "/srv/new",
            "--admin-root",
            "/srv/backend",
            "list",
        ])
        .unwrap();
        let mut config = configured();
        apply_cli_config(&mut config, &cli.global);

        assert_eq!(config.admin_root(), PathBuf::from("/srv/backend"));
    }

    #[test]
    fn config_roots_survive_without_flags() {
        let cli = Cli::try_parse_from(["extman", "list"]).unwrap();
        let mut config = configured();
        apply_cli_config(&mut config, &cli.global);

        assert_eq!(config.admin_root(), PathBuf::from("/srv/old/admin"));
    }
}
