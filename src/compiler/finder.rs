//! Static file lookup for relative config paths

use crate::config::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a relative path to an existing absolute file
pub trait StaticFinder: Send + Sync {
    /// Absolute path of the first match, if any
    fn find(&self, relative: &Path) -> Option<PathBuf>;
}

/// Searches the configured config directories, then the static root
#[derive(Debug, Clone)]
pub struct DirectoryFinder {
    dirs: Vec<PathBuf>,
}

impl DirectoryFinder {
    /// Search `dirs` in order
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Finder over `environment.config_dirs` followed by `environment.static_root`
    pub fn from_config(config: &Config) -> Self {
        let mut dirs = config.environment.config_dirs.clone();
        dirs.extend(config.environment.static_root.clone());
        Self::new(dirs)
    }
}

impl StaticFinder for DirectoryFinder {
    fn find(&self, relative: &Path) -> Option<PathBuf> {
        let found = self
            .dirs
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file());

        if found.is_none() {
            debug!(
                "{} not found in {} search directories",
                relative.display(),
                self.dirs.len()
            );
        }
        found
    }
}
