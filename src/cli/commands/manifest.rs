//! Manifest command - populate or inspect the precomputed manifest

use crate::cli::args::{ManifestAction, ManifestArgs, OutputFormat};
use crate::compiler::Compiler;
use crate::config::Config;
use crate::error::PackwrightResult;
use crate::manifest::{populate_manifest_file_with_progress, read_manifest};
use crate::ui::{self, ManifestProgress, UiContext};
use std::path::PathBuf;

/// Execute the manifest command
pub async fn execute(args: ManifestArgs, config: &Config) -> PackwrightResult<()> {
    match args.action {
        ManifestAction::Populate { output } => populate(config, output).await,
        ManifestAction::Show { path, format } => show(config, path, format).await,
    }
}

async fn populate(config: &Config, output: Option<PathBuf>) -> PackwrightResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();
    if let Some(output) = output {
        config.manifest.path = Some(output);
    }

    let total = config.manifest.entries.len();
    if total == 0 {
        ui::step_warn_hint(
            &ctx,
            "No manifest entries configured",
            "Set manifest.entries in your config",
        );
    }

    let compiler = Compiler::from_config(config)?;
    let progress = ManifestProgress::new(&ctx, total as u64);

    let result = populate_manifest_file_with_progress(&compiler, &|key| progress.built(key)).await;
    progress.finish();
    let (path, count) = result?;

    ui::step_ok_detail(
        &ctx,
        &format!("Wrote {} manifest entries", count),
        &path.display().to_string(),
    );
    Ok(())
}

async fn show(config: &Config, path: Option<PathBuf>, format: OutputFormat) -> PackwrightResult<()> {
    let path = match path {
        Some(path) => path,
        None => config.manifest_path()?.clone(),
    };
    let manifest = read_manifest(&path).await?;

    match format {
        OutputFormat::Json => {
            let keys: Vec<&String> = manifest.keys().collect();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        OutputFormat::Text => {
            for key in manifest.keys() {
                println!("{}", key);
            }
        }
    }
    Ok(())
}
