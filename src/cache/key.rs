//! Cache key derivation for config identities
//!
//! A config identity is a config file path plus an optional context. Its key
//! is the path relative to a known root, joined with `/` on every platform,
//! followed by `__<digest>` when a non-empty context is supplied. Same path
//! and same context value = same key, regardless of context key order.

use crate::config::Config;
use crate::error::{PackwrightError, PackwrightResult};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Build context passed to the build server alongside a config file
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Separator between the path portion of a key and the context digest
pub const CONTEXT_SEPARATOR: &str = "__";

/// Number of digest bytes kept for the context hash (128 bits)
const CONTEXT_DIGEST_BYTES: usize = 16;

/// Rebuild a value with every object's keys in sorted order
///
/// `Map` only sorts on its own while serde_json's `preserve_order` feature
/// is off, and any crate in the graph may turn it on.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Hash a context's canonical JSON encoding, returning 32 hex chars
pub fn hash_context(context: &Context) -> PackwrightResult<String> {
    let canonical = serde_json::to_vec(&canonicalize(&serde_json::Value::Object(
        context.clone(),
    )))?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let result = hasher.finalize();

    Ok(hex::encode(&result[..CONTEXT_DIGEST_BYTES]))
}

/// Lexically normalize a path: drop `.` and fold `name/..` pairs
///
/// Leading `..` components of a relative path are kept. Symlinks are not
/// resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute, lexically normalized form of `path`, relative to the working directory
pub fn absolute_path(path: &Path) -> PackwrightResult<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| PackwrightError::io(format!("resolving {}", path.display()), e))?;
    Ok(normalize_path(&absolute))
}

/// Join a normalized path's components with `/`
fn join_components(path: &Path) -> PackwrightResult<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir => parts.push(String::new()),
            Component::ParentDir => {
                return Err(PackwrightError::User(format!(
                    "{} escapes its key root",
                    path.display()
                )))
            }
            Component::CurDir | Component::Prefix(_) => {}
        }
    }
    Ok(parts.join("/"))
}

/// Generate the cache key for a resolved config path under `root`
///
/// Fails if `config_path` does not live under `root`.
pub fn generate_key(
    root: &Path,
    config_path: &Path,
    context: Option<&Context>,
) -> PackwrightResult<String> {
    let root = normalize_path(root);
    let config_path = normalize_path(config_path);
    let relative = config_path.strip_prefix(&root).map_err(|_| {
        PackwrightError::User(format!(
            "{} is not inside {}",
            config_path.display(),
            root.display()
        ))
    })?;

    with_context(join_components(relative)?, context)
}

fn with_context(mut key: String, context: Option<&Context>) -> PackwrightResult<String> {
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        key.push_str(CONTEXT_SEPARATOR);
        key.push_str(&hash_context(context)?);
    }
    Ok(key)
}

/// Derives cache keys using the configured key roots
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    roots: Vec<PathBuf>,
}

impl KeyGenerator {
    /// Roots are the config directories, then the static root
    ///
    /// Expects a config whose paths went through [`Config::absolutized`].
    pub fn new(config: &Config) -> Self {
        let mut roots = config.environment.config_dirs.clone();
        roots.extend(config.environment.static_root.clone());
        Self {
            roots: roots.iter().map(|root| normalize_path(root)).collect(),
        }
    }

    /// Key for an absolute config path
    ///
    /// Paths outside every root keep their full normalized path.
    pub fn key(&self, config_path: &Path, context: Option<&Context>) -> PackwrightResult<String> {
        let config_path = normalize_path(config_path);
        for root in &self.roots {
            if config_path.starts_with(root) {
                return generate_key(root, &config_path, context);
            }
        }

        debug!(
            "{} is outside every key root, using the full path",
            config_path.display()
        );
        with_context(join_components(&config_path)?, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use serde_json::json;

    fn context(value: serde_json::Value) -> Context {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn key_is_relative_to_root() {
        let key = generate_key(
            Path::new("configs"),
            Path::new("configs/basic/webpack.config.js"),
            None,
        )
        .unwrap();
        assert_eq!(key, "basic/webpack.config.js");
    }

    #[test]
    fn empty_context_matches_no_context() {
        let root = Path::new("/app/configs");
        let path = Path::new("/app/configs/basic/webpack.config.js");
        assert_eq!(
            generate_key(root, path, Some(&Context::new())).unwrap(),
            generate_key(root, path, None).unwrap()
        );
    }

    #[test]
    fn key_contains_context_digest() {
        let root = Path::new("/app/configs");
        let path = Path::new("/app/configs/basic/webpack.config.js");
        let ctx = context(json!({"foo": "bar"}));

        let key = generate_key(root, path, Some(&ctx)).unwrap();
        let (base, digest) = key.split_once(CONTEXT_SEPARATOR).unwrap();

        assert_eq!(base, "basic/webpack.config.js");
        assert_eq!(digest.len(), 32);
        assert_eq!(digest, hash_context(&ctx).unwrap());
    }

    #[test]
    fn key_ignores_context_insertion_order() {
        let root = Path::new("/app");
        let path = Path::new("/app/webpack.config.js");

        let mut first = Context::new();
        first.insert("a".into(), json!(1));
        first.insert("b".into(), json!({"y": true, "x": [1, 2]}));

        let mut second = Context::new();
        second.insert("b".into(), json!({"x": [1, 2], "y": true}));
        second.insert("a".into(), json!(1));

        assert_eq!(
            generate_key(root, path, Some(&first)).unwrap(),
            generate_key(root, path, Some(&second)).unwrap()
        );
    }

    #[test]
    fn different_contexts_give_different_keys() {
        let root = Path::new("/app");
        let path = Path::new("/app/webpack.config.js");
        let keys: Vec<String> = [
            json!({"foo": "bar"}),
            json!({"foo": "baz"}),
            json!({"woz": "bar"}),
            json!({"foo": "bar", "woz": "woo"}),
            json!({"foo": 1}),
            json!({"foo": "1"}),
        ]
        .into_iter()
        .map(|value| generate_key(root, path, Some(&context(value))).unwrap())
        .collect();

        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn path_outside_root_is_rejected() {
        let result = generate_key(
            Path::new("/app/configs"),
            Path::new("/elsewhere/webpack.config.js"),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn generator_prefers_config_dirs() {
        let config = Config::default().with_overrides(ConfigOverrides {
            static_root: Some(PathBuf::from("/app")),
            config_dirs: vec![PathBuf::from("/app/configs")],
            ..Default::default()
        });
        let keys = KeyGenerator::new(&config);

        assert_eq!(
            keys.key(Path::new("/app/configs/basic/webpack.config.js"), None)
                .unwrap(),
            "basic/webpack.config.js"
        );
        assert_eq!(
            keys.key(Path::new("/app/other/webpack.config.js"), None)
                .unwrap(),
            "other/webpack.config.js"
        );
    }

    #[test]
    fn generator_falls_back_to_full_path() {
        let keys = KeyGenerator::new(&Config::default());
        let ctx = context(json!({"foo": "bar"}));
        let key = keys
            .key(Path::new("/srv/webpack.config.js"), Some(&ctx))
            .unwrap();
        assert!(key.starts_with("/srv/webpack.config.js__"));
    }

    #[test]
    fn normalize_folds_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/app/configs/../other/./webpack.config.js")),
            PathBuf::from("/app/other/webpack.config.js")
        );
        assert_eq!(normalize_path(Path::new("/../app")), PathBuf::from("/app"));
        assert_eq!(
            normalize_path(Path::new("../configs/./basic")),
            PathBuf::from("../configs/basic")
        );
    }

    #[test]
    fn parent_components_do_not_alias_keys() {
        let root = Path::new("/app/configs");
        let escaped = generate_key(root, Path::new("/app/configs/../other/webpack.config.js"), None);
        assert!(escaped.is_err());

        let inside = generate_key(root, Path::new("/app/configs/other/webpack.config.js"), None);
        assert_eq!(inside.unwrap(), "other/webpack.config.js");
    }

    #[test]
    fn generator_keys_equal_spellings_alike() {
        let config = Config::default().with_overrides(ConfigOverrides {
            static_root: Some(PathBuf::from("/app/static")),
            config_dirs: vec![PathBuf::from("/app/configs/")],
            ..Default::default()
        });
        let keys = KeyGenerator::new(&config);

        let plain = keys
            .key(Path::new("/app/configs/basic/webpack.config.js"), None)
            .unwrap();
        let dotted = keys
            .key(Path::new("/app/configs/./library/../basic/webpack.config.js"), None)
            .unwrap();
        assert_eq!(plain, "basic/webpack.config.js");
        assert_eq!(dotted, plain);

        let sibling = keys
            .key(Path::new("/app/configs/../other/webpack.config.js"), None)
            .unwrap();
        assert_eq!(sibling, "/app/other/webpack.config.js");
    }

    #[test]
    fn absolute_path_is_absolute_and_normalized() {
        let path = absolute_path(Path::new("configs/../basic/webpack.config.js")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("basic/webpack.config.js"));
        assert!(!path.components().any(|c| c == Component::ParentDir));
    }
}
