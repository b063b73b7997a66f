//! Build coordination
//!
//! Every build resolves its config file, then takes exactly one of three
//! paths:
//!
//! | Mode | Source | Build server contacted |
//! |------|--------|------------------------|
//! | Manifest | precomputed manifest | never |
//! | Live cache | cache file entry | only on a miss |
//! | Remote | build server | always |
//!
//! A manifest miss under manifest mode is an error, never a silent rebuild.

mod finder;
mod server;

pub use finder::{DirectoryFinder, StaticFinder};
pub use server::{BuildOutcome, BuildRequest, BuildServer, HttpBuildServer};

use crate::bundle::BundleResult;
use crate::cache::{absolute_path, Context, KeyGenerator, LiveCache};
use crate::config::Config;
use crate::error::{PackwrightError, PackwrightResult};
use crate::manifest::{read_manifest, Manifest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Per-build overrides; `None` falls back to configuration
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Rebuild when the config file changes
    pub watch_config: Option<bool>,

    /// Rebuild when source files change
    pub watch_source: Option<bool>,

    /// Live cache file to use instead of the configured one
    pub cache_file: Option<PathBuf>,

    /// Serve from the live cache without contacting the build server
    pub use_cache_file: Option<bool>,

    /// Serve from the manifest
    pub use_manifest: Option<bool>,

    /// Build context, part of the cache key
    pub context: Option<Context>,
}

/// Coordinates builds against the manifest, the live cache and the build server
pub struct Compiler {
    config: Config,
    keys: KeyGenerator,
    finder: Arc<dyn StaticFinder>,
    server: Arc<dyn BuildServer>,
    manifest: OnceCell<Arc<Manifest>>,
}

impl Compiler {
    /// Create a compiler with explicit collaborators
    ///
    /// Configured paths are made absolute first.
    pub fn new(
        config: Config,
        finder: Arc<dyn StaticFinder>,
        server: Arc<dyn BuildServer>,
    ) -> PackwrightResult<Self> {
        let config = config.absolutized()?;
        Ok(Self {
            keys: KeyGenerator::new(&config),
            config,
            finder,
            server,
            manifest: OnceCell::new(),
        })
    }

    /// Create a compiler using directory lookup and the HTTP build server
    pub fn from_config(config: Config) -> PackwrightResult<Self> {
        let config = config.absolutized()?;
        let finder = Arc::new(DirectoryFinder::from_config(&config));
        let server = Arc::new(HttpBuildServer::new(&config.build_server));
        Self::new(config, finder, server)
    }

    /// Configuration this compiler was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a config path to an existing, absolute and normalized file
    pub fn resolve_config(&self, config_file: &str) -> PackwrightResult<PathBuf> {
        let path = Path::new(config_file);

        let found = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.finder
                .find(path)
                .ok_or_else(|| PackwrightError::ConfigNotFound(config_file.to_string()))?
        };
        let resolved = absolute_path(&found)?;

        if !resolved.is_file() {
            return Err(PackwrightError::ConfigNotFound(
                resolved.display().to_string(),
            ));
        }

        Ok(resolved)
    }

    /// Cache key for a resolved config path
    pub fn key(&self, config_path: &Path, context: Option<&Context>) -> PackwrightResult<String> {
        self.keys.key(config_path, context)
    }

    /// Build a config file
    pub async fn build(
        &self,
        config_file: &str,
        options: BuildOptions,
    ) -> PackwrightResult<BundleResult> {
        self.config.require_environment()?;

        let config_path = self.resolve_config(config_file)?;
        let context = options.context.as_ref();
        let key = self.key(&config_path, context)?;

        if options.use_manifest.unwrap_or(self.config.manifest.enabled) {
            return self.build_from_manifest(&key).await;
        }

        let cache_file = options.cache_file.clone().or_else(|| self.config.cache_file());

        if options
            .use_cache_file
            .unwrap_or(self.config.cache.use_cache_file)
        {
            match &cache_file {
                Some(path) => {
                    if let Some(entry) = LiveCache::new(path).get(&key).await? {
                        debug!("Serving {} from live cache", key);
                        return Ok(BundleResult::new(entry.stats));
                    }
                }
                None => debug!("Live cache requested but caching is disabled"),
            }
        }

        let request = self.request(
            &config_path,
            context,
            options.watch_config,
            options.watch_source,
            cache_file.clone(),
        )?;
        let bundle = self.send(request).await?;

        if let Some(path) = cache_file {
            LiveCache::new(path).record(&key, bundle.data()).await?;
        }

        info!("Built {}", key);
        Ok(bundle)
    }

    /// Build through the build server, bypassing the manifest and live cache
    pub(crate) async fn build_remote(
        &self,
        config_path: &Path,
        key: &str,
        context: Option<&Context>,
    ) -> PackwrightResult<BundleResult> {
        self.config.require_environment()?;
        let request = self.request(config_path, context, None, None, None)?;
        let bundle = self.send(request).await?;
        debug!("Built {} without caches", key);
        Ok(bundle)
    }

    async fn build_from_manifest(&self, key: &str) -> PackwrightResult<BundleResult> {
        let manifest = self.manifest().await?;

        match manifest.get(key) {
            Some(stats) => {
                debug!("Serving {} from manifest", key);
                Ok(BundleResult::new(stats.clone()))
            }
            None => Err(PackwrightError::ManifestMiss {
                key: key.to_string(),
                manifest: self.config.manifest_path()?.clone(),
            }),
        }
    }

    /// Load the manifest once and share it between builds
    async fn manifest(&self) -> PackwrightResult<Arc<Manifest>> {
        let path = self.config.manifest_path()?;
        let manifest = self
            .manifest
            .get_or_try_init(|| async {
                debug!("Loading manifest {}", path.display());
                read_manifest(path).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(manifest))
    }

    fn request(
        &self,
        config_path: &Path,
        context: Option<&Context>,
        watch_config: Option<bool>,
        watch_source: Option<bool>,
        cache_file: Option<PathBuf>,
    ) -> PackwrightResult<BuildRequest> {
        let (static_root, static_url) = self.config.require_environment()?;
        let watch = &self.config.watch;

        let mut merged = self.config.environment.context.clone();
        if let Some(context) = context {
            merged.extend(context.clone());
        }

        Ok(BuildRequest {
            config: config_path.to_path_buf(),
            watch: watch_source.unwrap_or(watch.watch_source_files),
            watch_config: watch_config.unwrap_or(watch.watch_config_files),
            cache_file,
            output_path: self.config.output_path()?,
            static_root: static_root.clone(),
            static_url: static_url.to_string(),
            public_path: self.config.public_path()?,
            aggregate_timeout: watch.aggregate_timeout_ms,
            poll: watch.poll_ms,
            hmr: watch.hmr,
            context: merged,
            cache_ttl: false,
        })
    }

    async fn send(&self, request: BuildRequest) -> PackwrightResult<BundleResult> {
        let config = request.config.display().to_string();
        debug!("Requesting build of {} from {}", config, self.server.endpoint());

        match self.server.build(&request).await {
            BuildOutcome::Success(stats) => {
                let bundle = BundleResult::new(stats);
                for warning in bundle.warnings() {
                    warn!("{}: {}", config, warning);
                }
                Ok(bundle)
            }
            BuildOutcome::BuildFailure { errors, .. } => {
                Err(PackwrightError::bundling(config, errors.join("\n\n")))
            }
            BuildOutcome::TransportFailure(detail) => {
                Err(PackwrightError::bundling(config, detail))
            }
        }
    }
}
