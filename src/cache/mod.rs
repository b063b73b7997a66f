//! Build result caching
//!
//! Two tiers sit in front of the build server:
//!
//! | Tier | Keyed by | Expiry | Written by |
//! |------|----------|--------|------------|
//! | Manifest | cache key | never | `packwright manifest populate` |
//! | Live cache | cache key | judged by the build server | every successful build |
//!
//! Both are flat JSON objects on disk. Writers always replace the whole file
//! through a temporary sibling and a rename, so readers never observe a
//! partially written file.

pub mod key;
pub mod live;

pub use key::{
    absolute_path, generate_key, hash_context, normalize_path, Context, KeyGenerator,
    CONTEXT_SEPARATOR,
};
pub use live::{CacheEntry, LiveCache};

use crate::error::{PackwrightError, PackwrightResult};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serialize `value` as pretty JSON and atomically replace `path` with it
///
/// Each call writes its own uniquely named temporary sibling, so
/// concurrent writers never clobber each other's temporary file.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PackwrightResult<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).await.map_err(|e| {
        PackwrightError::io(format!("creating directory {}", parent.display()), e)
    })?;

    let content = serde_json::to_vec_pretty(value)?;
    let target = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| {
            PackwrightError::io(format!("creating temporary file in {}", parent.display()), e)
        })?;
        tmp.write_all(&content)
            .map_err(|e| PackwrightError::io(format!("writing {}", tmp.path().display()), e))?;
        tmp.persist(&target).map_err(|e| {
            PackwrightError::io(format!("replacing {}", target.display()), e.error)
        })?;
        Ok(())
    })
    .await
    .map_err(|e| PackwrightError::User(format!("file write task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_json_atomic(&path, &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["a"], 1);
        let leftovers = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_all_succeed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let writes: Vec<_> = (0..16)
            .map(|i| {
                let path = path.clone();
                tokio::spawn(async move { write_json_atomic(&path, &serde_json::json!({"n": i})).await })
            })
            .collect();
        for write in writes {
            write.await.unwrap().unwrap();
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed["n"].is_u64());
    }
}
