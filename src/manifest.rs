//! Precomputed build manifests
//!
//! A manifest maps cache keys to the stats of a successful build. It is
//! generated once (typically at deploy time) from the configured entries
//! and then served read-only, so no request ever reaches the build server.

use crate::bundle::Stats;
use crate::cache::{write_json_atomic, Context};
use crate::compiler::Compiler;
use crate::error::{PackwrightError, PackwrightResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Flat mapping of cache key to build stats
pub type Manifest = BTreeMap<String, Stats>;

/// Config files to precompute
///
/// Either a list of config paths, or a mapping of config path to the
/// contexts to build it with. An empty context list still builds the
/// config once without context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestSpec {
    Configs(Vec<String>),
    Contexts(BTreeMap<String, Vec<Context>>),
}

impl Default for ManifestSpec {
    fn default() -> Self {
        Self::Configs(vec![])
    }
}

impl ManifestSpec {
    /// Every (config, context) pair to build, in order
    pub fn entries(&self) -> Vec<(&str, Option<&Context>)> {
        match self {
            Self::Configs(configs) => configs.iter().map(|c| (c.as_str(), None)).collect(),
            Self::Contexts(map) => map
                .iter()
                .flat_map(|(config, contexts)| {
                    if contexts.is_empty() {
                        vec![(config.as_str(), None)]
                    } else {
                        contexts.iter().map(|ctx| (config.as_str(), Some(ctx))).collect()
                    }
                })
                .collect(),
        }
    }

    /// Number of builds the spec describes
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the spec describes no builds
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build every entry of `spec` through the build server
///
/// Caches are bypassed. A key appearing twice keeps the later result.
/// `on_entry` is called with each key after it is built.
pub async fn generate_manifest_with_progress(
    compiler: &Compiler,
    spec: &ManifestSpec,
    on_entry: &(dyn Fn(&str) + Send + Sync),
) -> PackwrightResult<Manifest> {
    let mut manifest = Manifest::new();

    for (config, context) in spec.entries() {
        let config_path = compiler.resolve_config(config)?;
        let key = compiler.key(&config_path, context)?;
        debug!("Building manifest entry {}", key);

        let bundle = compiler.build_remote(&config_path, &key, context).await?;
        on_entry(&key);
        manifest.insert(key, bundle.into_data());
    }

    Ok(manifest)
}

/// Build every entry of `spec` through the build server
pub async fn generate_manifest(
    compiler: &Compiler,
    spec: &ManifestSpec,
) -> PackwrightResult<Manifest> {
    generate_manifest_with_progress(compiler, spec, &|_| {}).await
}

/// Write a manifest as a JSON object, creating parent directories
pub async fn write_manifest(path: &Path, manifest: &Manifest) -> PackwrightResult<()> {
    write_json_atomic(path, manifest).await?;
    info!("Wrote {} manifest entries to {}", manifest.len(), path.display());
    Ok(())
}

/// Read a manifest written by [`write_manifest`]
pub async fn read_manifest(path: &Path) -> PackwrightResult<Manifest> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| PackwrightError::io(format!("reading manifest {}", path.display()), e))?;

    serde_json::from_str(&content).map_err(|e| PackwrightError::MalformedManifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Generate the configured manifest and write it to the configured path
///
/// Returns the path written and the number of entries.
pub async fn populate_manifest_file(compiler: &Compiler) -> PackwrightResult<(PathBuf, usize)> {
    populate_manifest_file_with_progress(compiler, &|_| {}).await
}

/// [`populate_manifest_file`] reporting each built key
pub async fn populate_manifest_file_with_progress(
    compiler: &Compiler,
    on_entry: &(dyn Fn(&str) + Send + Sync),
) -> PackwrightResult<(PathBuf, usize)> {
    let config = compiler.config();
    let path = config.manifest_path()?.clone();

    let manifest =
        generate_manifest_with_progress(compiler, &config.manifest.entries, on_entry).await?;
    write_manifest(&path, &manifest).await?;

    Ok((path, manifest.len()))
}
