//! Build server client
//!
//! The build server is a long-running process reached over HTTP. It is
//! never started from here: an unreachable server is reported as a
//! transport failure once the configured timeouts elapse.

use crate::bundle::{string_list, Stats};
use crate::cache::Context;
use crate::config::schema::BuildServerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Max number of response bytes quoted in transport failures.
const ERROR_BODY_LIMIT: usize = 2000;

/// Job description sent to the build server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Absolute config file path
    pub config: PathBuf,

    /// Rebuild on source changes
    pub watch: bool,

    /// Rebuild on config changes
    pub watch_config: bool,

    /// Live cache file shared with the build server
    pub cache_file: Option<PathBuf>,

    /// Directory bundles are emitted into
    pub output_path: PathBuf,

    pub static_root: PathBuf,
    pub static_url: String,

    /// URL prefix bundles are served under
    pub public_path: String,

    /// Debounce window in milliseconds
    pub aggregate_timeout: u64,

    /// Polling interval in milliseconds
    pub poll: Option<u64>,

    pub hmr: bool,

    pub context: Context,

    /// Always false: entries for this build never expire server-side
    #[serde(rename = "cacheTTL")]
    pub cache_ttl: bool,
}

/// What came back from a build request
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Stats with no errors (warnings allowed)
    Success(Stats),

    /// The server could not be reached or answered with garbage
    TransportFailure(String),

    /// The server built the config and reported errors
    BuildFailure {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

impl BuildOutcome {
    /// Classify a stats payload by its `errors` field
    ///
    /// `errors` and `warnings` must be present, each a list of messages or
    /// a single message string.
    pub fn from_stats(stats: Stats) -> Self {
        let (errors, warnings) = match (messages(&stats, "errors"), messages(&stats, "warnings")) {
            (Ok(errors), Ok(warnings)) => (errors, warnings),
            (Err(reason), _) | (_, Err(reason)) => return Self::TransportFailure(reason),
        };

        if errors.is_empty() {
            Self::Success(stats)
        } else {
            Self::BuildFailure { errors, warnings }
        }
    }

    /// Parse a raw response body
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(stats)) => Self::from_stats(stats),
            Ok(other) => Self::TransportFailure(format!(
                "expected a JSON object from the build server, got: {}",
                truncate(&other.to_string())
            )),
            Err(e) => Self::TransportFailure(format!(
                "invalid JSON from the build server: {}: {}",
                e,
                truncate(body)
            )),
        }
    }
}

/// Read a message field; an empty string counts as no messages
fn messages(stats: &Stats, field: &str) -> Result<Vec<String>, String> {
    match stats.get(field) {
        Some(serde_json::Value::Array(_)) => Ok(string_list(stats, field)),
        Some(serde_json::Value::String(message)) if message.is_empty() => Ok(vec![]),
        Some(serde_json::Value::String(message)) => Ok(vec![message.clone()]),
        Some(other) => Err(format!(
            "build server returned a non-list `{}` field: {}",
            field,
            truncate(&other.to_string())
        )),
        None => Err(format!("build server response has no `{}` field", field)),
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= ERROR_BODY_LIMIT {
        return text.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Abstract build server interface
///
/// Each call issues exactly one request and waits for it to finish.
#[async_trait]
pub trait BuildServer: Send + Sync {
    /// Ask the server to build (or return cached stats for) a config
    async fn build(&self, request: &BuildRequest) -> BuildOutcome;

    /// Human-readable endpoint for diagnostics
    fn endpoint(&self) -> String;
}

/// Build server reached over HTTP
#[derive(Clone)]
pub struct HttpBuildServer {
    agent: ureq::Agent,
    url: String,
}

impl HttpBuildServer {
    /// Create a client from connection settings
    pub fn new(config: &BuildServerConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            url: format!("{}/build", config.url.trim_end_matches('/')),
        }
    }

    /// Blocking request; run off the async runtime
    fn send(&self, request: &BuildRequest) -> BuildOutcome {
        debug!("POST {} for {}", self.url, request.config.display());

        let mut response = match self.agent.post(&self.url).send_json(request) {
            Ok(response) => response,
            Err(e) => {
                return BuildOutcome::TransportFailure(format!(
                    "could not reach build server at {}: {}",
                    self.url, e
                ))
            }
        };

        let status = response.status();
        let body = match response.body_mut().read_to_string() {
            Ok(body) => body,
            Err(e) => {
                return BuildOutcome::TransportFailure(format!(
                    "failed to read build server response: {}",
                    e
                ))
            }
        };

        if !status.is_success() {
            return BuildOutcome::TransportFailure(format!(
                "build server responded with {}: {}",
                status,
                truncate(&body)
            ));
        }

        BuildOutcome::from_body(&body)
    }
}

#[async_trait]
impl BuildServer for HttpBuildServer {
    async fn build(&self, request: &BuildRequest) -> BuildOutcome {
        let client = self.clone();
        let request = request.clone();

        match tokio::task::spawn_blocking(move || client.send(&request)).await {
            Ok(outcome) => outcome,
            Err(e) => BuildOutcome::TransportFailure(format!("build request task failed: {}", e)),
        }
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}
