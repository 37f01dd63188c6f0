use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use types::ActionRequest;

/// Options for the bridge's action endpoint.
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:80".to_string(),
            timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("action endpoint returned status {status}")]
    Status { status: u16 },
}

/// Derive the action URL from the entity identifier: the first `-`-separated
/// segment is the domain, the remaining segments rejoined with `-` form the
/// entity path.
pub fn action_url(base_url: &str, request: &ActionRequest) -> String {
    let mut segments = request.entity_id.split('-');
    let domain = segments.next().unwrap_or_default();
    let entity = segments.collect::<Vec<_>>().join("-");
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        domain,
        entity,
        request.action.path_segment()
    )
}

/// Issues device actions. Callers treat sends as fire-and-forget: a failure
/// is logged, never retried, and the real outcome shows up on the push
/// stream.
#[derive(Debug, Clone)]
pub struct ActionClient {
    config: ActionConfig,
    http: reqwest::Client,
}

impl ActionClient {
    pub fn new(config: ActionConfig) -> Result<Self, ActionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn send(&self, request: &ActionRequest) -> Result<(), ActionError> {
        let url = action_url(&self.config.base_url, request);

        // The endpoint expects the literal body "true" for every action.
        let response = self.http.post(&url).body("true").send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::Status {
                status: status.as_u16(),
            });
        }

        debug!(url = %url, "action accepted");
        Ok(())
    }
}
