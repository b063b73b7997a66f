//! Configuration schema for Packwright
//!
//! Configuration is stored at `~/.config/packwright/config.toml`, with an
//! optional project-local `.packwright.toml` merged on top.

use crate::cache::{absolute_path, Context};
use crate::error::{PackwrightError, PackwrightResult};
use crate::manifest::ManifestSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Static root, public URL and config lookup
    pub environment: EnvironmentConfig,

    /// Build server connection
    pub build_server: BuildServerConfig,

    /// Watch and polling defaults
    pub watch: WatchConfig,

    /// Live cache settings
    pub cache: CacheConfig,

    /// Precomputed manifest settings
    pub manifest: ManifestConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Where bundles are written and served from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Absolute directory static files are collected into
    pub static_root: Option<PathBuf>,

    /// URL prefix static files are served under
    pub static_url: Option<String>,

    /// Bundle directory, relative to `static_root`
    pub output_dir: String,

    /// Directories searched for relative config paths, in order
    pub config_dirs: Vec<PathBuf>,

    /// Context merged under every per-build context
    pub context: Context,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            static_root: None,
            static_url: None,
            output_dir: "webpack_assets".to_string(),
            config_dirs: vec![],
            context: Context::new(),
        }
    }
}

/// Build server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildServerConfig {
    /// Base URL of the build server
    pub url: String,

    /// Seconds to wait for a connection
    pub connect_timeout_secs: u64,

    /// Seconds to wait for a whole build request
    pub timeout_secs: u64,
}

impl Default for BuildServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9009".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 300,
        }
    }
}

/// Watch-mode defaults passed through to the build server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Rebuild when the config file changes
    pub watch_config_files: bool,

    /// Rebuild when source files change
    pub watch_source_files: bool,

    /// Debounce window for aggregated rebuilds
    pub aggregate_timeout_ms: u64,

    /// Polling interval; unset means filesystem events
    pub poll_ms: Option<u64>,

    /// Enable hot module replacement
    pub hmr: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch_config_files: false,
            watch_source_files: false,
            aggregate_timeout_ms: 200,
            poll_ms: None,
            hmr: false,
        }
    }
}

/// Live cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Send a cache file to the build server (default: true)
    pub enabled: bool,

    /// Serve from the cache file without contacting the build server
    pub use_cache_file: bool,

    /// Directory holding the cache file (default: `<static_root>/.packwright`)
    pub cache_dir: Option<PathBuf>,

    /// Cache file name
    pub file_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_cache_file: false,
            cache_dir: None,
            file_name: "webpack-cache.json".to_string(),
        }
    }
}

/// Precomputed manifest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Serve every build from the manifest
    pub enabled: bool,

    /// Manifest file location
    pub path: Option<PathBuf>,

    /// Config files (and contexts) to precompute
    pub entries: ManifestSpec,
}

/// Explicit overrides applied on top of loaded configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub static_root: Option<PathBuf>,
    pub static_url: Option<String>,
    pub config_dirs: Vec<PathBuf>,
    pub build_server_url: Option<String>,
    pub manifest_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Apply explicit overrides, returning the new configuration
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(root) = overrides.static_root {
            self.environment.static_root = Some(root);
        }
        if let Some(url) = overrides.static_url {
            self.environment.static_url = Some(url);
        }
        if !overrides.config_dirs.is_empty() {
            self.environment.config_dirs = overrides.config_dirs;
        }
        if let Some(url) = overrides.build_server_url {
            self.build_server.url = url;
        }
        if let Some(path) = overrides.manifest_path {
            self.manifest.path = Some(path);
        }
        if let Some(dir) = overrides.cache_dir {
            self.cache.cache_dir = Some(dir);
        }
        self
    }

    /// Make every configured path absolute and lexically normalized
    ///
    /// Relative paths are taken against the working directory.
    pub fn absolutized(mut self) -> PackwrightResult<Self> {
        let env = &mut self.environment;
        if let Some(root) = &env.static_root {
            env.static_root = Some(absolute_path(root)?);
        }
        env.config_dirs = env
            .config_dirs
            .iter()
            .map(|dir| absolute_path(dir))
            .collect::<PackwrightResult<_>>()?;
        if let Some(dir) = &self.cache.cache_dir {
            self.cache.cache_dir = Some(absolute_path(dir)?);
        }
        if let Some(path) = &self.manifest.path {
            self.manifest.path = Some(absolute_path(path)?);
        }
        Ok(self)
    }

    /// Static root and URL, failing if either is unset
    pub fn require_environment(&self) -> PackwrightResult<(&PathBuf, &str)> {
        let root = self.environment.static_root.as_ref().ok_or_else(|| {
            PackwrightError::configuration("environment.static_root has not been defined")
        })?;
        let url = self
            .environment
            .static_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                PackwrightError::configuration("environment.static_url has not been defined")
            })?;
        Ok((root, url))
    }

    /// Directory bundles are emitted into
    pub fn output_path(&self) -> PackwrightResult<PathBuf> {
        let (root, _) = self.require_environment()?;
        Ok(root.join(&self.environment.output_dir))
    }

    /// URL prefix bundles are served under
    pub fn public_path(&self) -> PackwrightResult<String> {
        let (_, url) = self.require_environment()?;
        Ok(format!(
            "{}/{}",
            url.trim_end_matches('/'),
            self.environment.output_dir
        ))
    }

    /// Default live cache file, if caching is enabled
    pub fn cache_file(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        let dir = match (&self.cache.cache_dir, &self.environment.static_root) {
            (Some(dir), _) => dir.clone(),
            (None, Some(root)) => root.join(".packwright"),
            (None, None) => return None,
        };
        Some(dir.join(&self.cache.file_name))
    }

    /// Manifest location, failing if unset
    pub fn manifest_path(&self) -> PackwrightResult<&PathBuf> {
        self.manifest
            .path
            .as_ref()
            .ok_or_else(|| PackwrightError::configuration("manifest.path has not been defined"))
    }
}
