//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{PackwrightError, PackwrightResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;
use toml_edit::{value, Array, DocumentMut, Item, Table};

/// Keys accepted by `config set`
const SETTABLE_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "environment.static_root",
    "environment.static_url",
    "environment.output_dir",
    "environment.config_dirs",
    "build_server.url",
    "build_server.connect_timeout_secs",
    "build_server.timeout_secs",
    "watch.watch_config_files",
    "watch.watch_source_files",
    "watch.aggregate_timeout_ms",
    "watch.poll_ms",
    "watch.hmr",
    "cache.enabled",
    "cache.use_cache_file",
    "cache.cache_dir",
    "cache.file_name",
    "manifest.enabled",
    "manifest.path",
];

/// Keys stored as arrays; values are comma-separated
const LIST_KEYS: &[&str] = &["environment.config_dirs"];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> PackwrightResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            let path = if local {
                std::env::current_dir()
                    .map_err(|e| PackwrightError::io("getting current directory", e))?
                    .join(LOCAL_CONFIG_FILE)
            } else {
                manager.ensure_config_dir().await?;
                manager.path().to_path_buf()
            };
            set_value(&path, &key, &value).await?
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> PackwrightResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> PackwrightResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Set a key in a config file, keeping its comments and layout
async fn set_value(path: &Path, key: &str, raw: &str) -> PackwrightResult<()> {
    let ctx = UiContext::detect();

    if !SETTABLE_KEYS.contains(&key) {
        return Err(PackwrightError::User(format!(
            "Unknown config key: {}. Valid keys: {}",
            key,
            SETTABLE_KEYS.join(", ")
        )));
    }

    let content = if path.exists() {
        fs::read_to_string(path)
            .await
            .map_err(|e| PackwrightError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };

    let updated = edit_document(&content, key, raw).map_err(|reason| {
        PackwrightError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        }
    })?;

    fs::write(path, updated)
        .await
        .map_err(|e| PackwrightError::io(format!("writing {}", path.display()), e))?;

    ui::step_ok(
        &ctx,
        &format!("Set {} = {} in {}", key, raw, path.display()),
    );
    Ok(())
}

/// Apply `key = raw` to a TOML document, validating the result
fn edit_document(content: &str, key: &str, raw: &str) -> Result<String, String> {
    let mut doc: DocumentMut = content.parse().map_err(|e| format!("{}", e))?;

    let (sections, leaf) = match key.rsplit_once('.') {
        Some((sections, leaf)) => (sections.split('.').collect::<Vec<_>>(), leaf),
        None => (vec![], key),
    };

    let mut table = doc.as_table_mut();
    for section in sections {
        let item = table.entry(section).or_insert(Item::Table(Table::new()));
        table = item
            .as_table_mut()
            .ok_or_else(|| format!("expected a table at {}", section))?;
    }
    table.insert(leaf, parse_item(key, raw));

    let updated = doc.to_string();
    toml::from_str::<Config>(&updated).map_err(|e| format!("{} = {}: {}", key, raw, e))?;
    Ok(updated)
}

fn parse_item(key: &str, raw: &str) -> Item {
    if LIST_KEYS.contains(&key) {
        let items: Array = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        return value(items);
    }

    match raw {
        "true" => value(true),
        "false" => value(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => value(n),
            Err(_) => value(raw),
        },
    }
}
