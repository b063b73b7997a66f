//! Bundle results returned by builds
//!
//! Wraps the statistics object produced by the build server. Fields beyond
//! `errors`, `warnings`, `assets` and `urlsToAssets` are passed through
//! untouched in [`BundleResult::data`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw build statistics as returned by the build server
pub type Stats = serde_json::Map<String, serde_json::Value>;

/// An emitted asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Output file name
    pub name: String,

    /// Public URL, when the build server reports one
    #[serde(default)]
    pub url: Option<String>,

    /// Absolute path on disk, when the build server reports one
    #[serde(default)]
    pub path: Option<String>,
}

/// Result of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BundleResult {
    data: Stats,
}

impl BundleResult {
    /// Wrap build statistics
    pub fn new(data: Stats) -> Self {
        Self { data }
    }

    /// The full statistics object
    pub fn data(&self) -> &Stats {
        &self.data
    }

    /// Consume the result, returning the statistics object
    pub fn into_data(self) -> Stats {
        self.data
    }

    /// Build errors reported by the build server
    pub fn errors(&self) -> Vec<String> {
        string_list(&self.data, "errors")
    }

    /// Build warnings reported by the build server
    pub fn warnings(&self) -> Vec<String> {
        string_list(&self.data, "warnings")
    }

    /// Emitted assets; malformed descriptors are skipped
    pub fn assets(&self) -> Vec<AssetDescriptor> {
        self.data
            .get("assets")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Public URLs grouped by entry name
    pub fn urls(&self) -> BTreeMap<String, Vec<String>> {
        let Some(entries) = self.data.get("urlsToAssets").and_then(|v| v.as_object()) else {
            return BTreeMap::new();
        };

        entries
            .iter()
            .map(|(entry, urls)| {
                let urls = urls
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|u| u.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                (entry.clone(), urls)
            })
            .collect()
    }

    /// `<script>` tags for every `.js` URL
    pub fn render_js(&self) -> String {
        self.urls_with_extension(".js")
            .map(|url| format!(r#"<script src="{}"></script>"#, escape_attr(&url)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `<link>` tags for every `.css` URL
    pub fn render_css(&self) -> String {
        self.urls_with_extension(".css")
            .map(|url| format!(r#"<link rel="stylesheet" href="{}">"#, escape_attr(&url)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn urls_with_extension(&self, extension: &'static str) -> impl Iterator<Item = String> {
        self.urls()
            .into_values()
            .flatten()
            .filter(move |url| url.ends_with(extension))
    }
}

/// Escape a value for a double-quoted HTML attribute
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Read a list of strings, stringifying non-string items
pub(crate) fn string_list(data: &Stats, field: &str) -> Vec<String> {
    data.get(field)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| match item.as_str() {
                    Some(s) => s.to_string(),
                    None => item.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
