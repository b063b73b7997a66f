//! Packwright - frontend bundle build coordinator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use packwright::cli::{Cli, Commands};
use packwright::config::{ConfigManager, ConfigOverrides};
use packwright::error::{PackwrightError, PackwrightResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PackwrightResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions { shell } = cli.command {
        packwright::cli::commands::completions(shell);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| PackwrightError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?
        .with_overrides(ConfigOverrides {
            static_root: cli.static_root.clone(),
            static_url: cli.static_url.clone(),
            config_dirs: cli.config_dirs.clone(),
            build_server_url: cli.build_server.clone(),
            manifest_path: cli.manifest.clone(),
            cache_dir: cli.cache_dir.clone(),
        });

    init_logging(cli.verbose, config.general.verbose, &config.general.log_format);

    if let Some(ref path) = local_config_path {
        debug!("Merged local config: {}", path.display());
    }

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Build(args) => packwright::cli::commands::build(args, &config).await,
        Commands::Key(args) => packwright::cli::commands::key(args, &config).await,
        Commands::Manifest(args) => packwright::cli::commands::manifest(args, &config).await,
        Commands::Config(args) => {
            packwright::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one `-v`
fn init_logging(verbosity: u8, config_verbose: bool, format: &str) {
    let level = verbosity.max(u8::from(config_verbose));
    let filter = match level {
        0 => EnvFilter::new("packwright=warn"),
        1 => EnvFilter::new("packwright=info"),
        _ => EnvFilter::new("packwright=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
