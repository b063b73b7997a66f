//! CLI argument definitions using clap derive

use crate::cache::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Packwright - frontend bundle build coordinator
///
/// Builds bundles through a long-running build server, with a live cache
/// for development and a precomputed manifest for production.
#[derive(Parser, Debug)]
#[command(name = "packwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PACKWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .packwright.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Override environment.static_root
    #[arg(long, global = true, env = "PACKWRIGHT_STATIC_ROOT")]
    pub static_root: Option<PathBuf>,

    /// Override environment.static_url
    #[arg(long, global = true, env = "PACKWRIGHT_STATIC_URL")]
    pub static_url: Option<String>,

    /// Override build_server.url
    #[arg(long, global = true, env = "PACKWRIGHT_BUILD_SERVER")]
    pub build_server: Option<String>,

    /// Override environment.config_dirs (repeatable)
    #[arg(long = "config-dir", global = true, value_name = "DIR")]
    pub config_dirs: Vec<PathBuf>,

    /// Override manifest.path
    #[arg(long, global = true, env = "PACKWRIGHT_MANIFEST", value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Override cache.cache_dir
    #[arg(long, global = true, env = "PACKWRIGHT_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a config file and print its assets
    Build(BuildArgs),

    /// Print the cache key for a config file
    Key(KeyArgs),

    /// Generate or inspect the precomputed manifest
    Manifest(ManifestArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Config file, absolute or relative to a config directory
    pub config_file: String,

    /// Rebuild when source files change
    #[arg(long)]
    pub watch: bool,

    /// Rebuild when the config file changes
    #[arg(long)]
    pub watch_config: bool,

    /// Build context entries (KEY=VALUE)
    #[arg(short = 'x', long = "context", value_parser = parse_context_pair)]
    pub context: Vec<(String, String)>,

    /// Serve from the live cache file when it has an entry
    #[arg(long, conflicts_with = "use_manifest")]
    pub use_cache_file: bool,

    /// Serve from the precomputed manifest
    #[arg(long)]
    pub use_manifest: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Config file, absolute or relative to a config directory
    pub config_file: String,

    /// Build context entries (KEY=VALUE)
    #[arg(short = 'x', long = "context", value_parser = parse_context_pair)]
    pub context: Vec<(String, String)>,
}

/// Arguments for the manifest command
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Subcommand for manifest
    #[command(subcommand)]
    pub action: ManifestAction,
}

/// Manifest subcommands
#[derive(Subcommand, Debug)]
pub enum ManifestAction {
    /// Build every configured entry and write the manifest
    Populate {
        /// Write to this path instead of manifest.path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the keys of the manifest
    Show {
        /// Read this manifest instead of manifest.path
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., environment.static_url)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .packwright.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Output format for build and manifest output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Parse a context entry in KEY=VALUE format
fn parse_context_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Collect context pairs into a build context
///
/// Values that parse as JSON scalars keep their type (`debug=true` is a
/// boolean); everything else is a string.
pub fn context_from_pairs(pairs: &[(String, String)]) -> Option<Context> {
    if pairs.is_empty() {
        return None;
    }

    let context = pairs
        .iter()
        .map(|(key, value)| {
            let value = match serde_json::from_str::<serde_json::Value>(value) {
                Ok(parsed) if !parsed.is_object() && !parsed.is_array() => parsed,
                _ => serde_json::Value::String(value.clone()),
            };
            (key.clone(), value)
        })
        .collect();
    Some(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_context_pair_valid() {
        let (k, v) = parse_context_pair("foo=bar").unwrap();
        assert_eq!(k, "foo");
        assert_eq!(v, "bar");
    }

    #[test]
    fn parse_context_pair_with_equals() {
        let (k, v) = parse_context_pair("query=a=b").unwrap();
        assert_eq!(k, "query");
        assert_eq!(v, "a=b");
    }

    #[test]
    fn parse_context_pair_invalid() {
        assert!(parse_context_pair("foo").is_err());
        assert!(parse_context_pair("=bar").is_err());
    }

    #[test]
    fn context_keeps_scalar_types() {
        let pairs = vec![
            ("debug".to_string(), "true".to_string()),
            ("level".to_string(), "3".to_string()),
            ("env".to_string(), "prod".to_string()),
            ("list".to_string(), "[1]".to_string()),
        ];
        let context = context_from_pairs(&pairs).unwrap();
        assert_eq!(context["debug"], json!(true));
        assert_eq!(context["level"], json!(3));
        assert_eq!(context["env"], json!("prod"));
        assert_eq!(context["list"], json!("[1]"));
    }

    #[test]
    fn no_pairs_is_no_context() {
        assert!(context_from_pairs(&[]).is_none());
    }

    #[test]
    fn cli_parses_build() {
        let cli = Cli::parse_from([
            "packwright",
            "build",
            "basic/webpack.config.js",
            "--watch",
            "-x",
            "foo=bar",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.config_file, "basic/webpack.config.js");
                assert!(args.watch);
                assert!(!args.watch_config);
                assert_eq!(args.context, vec![("foo".to_string(), "bar".to_string())]);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn cli_rejects_cache_file_with_manifest() {
        let result = Cli::try_parse_from([
            "packwright",
            "build",
            "a.js",
            "--use-cache-file",
            "--use-manifest",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_manifest_populate() {
        let cli = Cli::parse_from(["packwright", "manifest", "populate", "-o", "out.json"]);
        match cli.command {
            Commands::Manifest(ManifestArgs {
                action: ManifestAction::Populate { output },
            }) => assert_eq!(output, Some(PathBuf::from("out.json"))),
            _ => panic!("expected Manifest populate"),
        }
    }

    #[test]
    fn cli_global_overrides() {
        let cli = Cli::parse_from([
            "packwright",
            "key",
            "a.js",
            "--static-root",
            "/srv/static",
            "--static-url",
            "/static/",
        ]);
        assert_eq!(cli.static_root, Some(PathBuf::from("/srv/static")));
        assert_eq!(cli.static_url.as_deref(), Some("/static/"));
    }

    #[test]
    fn cli_path_overrides() {
        let cli = Cli::parse_from([
            "packwright",
            "--config-dir",
            "configs",
            "--config-dir",
            "/srv/more",
            "manifest",
            "show",
            "--manifest",
            "dist/manifest.json",
            "--cache-dir",
            ".cache",
        ]);
        assert_eq!(
            cli.config_dirs,
            vec![PathBuf::from("configs"), PathBuf::from("/srv/more")]
        );
        assert_eq!(cli.manifest, Some(PathBuf::from("dist/manifest.json")));
        assert_eq!(cli.cache_dir, Some(PathBuf::from(".cache")));
    }

    #[test]
    #[serial_test::serial]
    fn cli_manifest_from_environment() {
        std::env::set_var("PACKWRIGHT_MANIFEST", "/srv/manifest.json");
        let cli = Cli::parse_from(["packwright", "manifest", "show"]);
        std::env::remove_var("PACKWRIGHT_MANIFEST");

        assert_eq!(cli.manifest, Some(PathBuf::from("/srv/manifest.json")));
    }

    #[test]
    #[serial_test::serial]
    fn cli_overrides_from_environment() {
        std::env::set_var("PACKWRIGHT_STATIC_URL", "/assets/");
        let cli = Cli::parse_from(["packwright", "config", "show"]);
        std::env::remove_var("PACKWRIGHT_STATIC_URL");

        assert_eq!(cli.static_url.as_deref(), Some("/assets/"));
    }

    #[test]
    #[serial_test::serial]
    fn cli_flag_beats_environment() {
        std::env::set_var("PACKWRIGHT_STATIC_URL", "/assets/");
        let cli = Cli::parse_from(["packwright", "--static-url", "/static/", "config", "show"]);
        std::env::remove_var("PACKWRIGHT_STATIC_URL");

        assert_eq!(cli.static_url.as_deref(), Some("/static/"));
    }

    #[test]
    fn cli_no_local_flag() {
        let cli = Cli::parse_from(["packwright", "--no-local", "config", "show"]);
        assert!(cli.no_local);
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["packwright", "config"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["packwright", "-v", "config"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["packwright", "-vv", "config"]);
        assert_eq!(cli.verbose, 2);
    }
}
