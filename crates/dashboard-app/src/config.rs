use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use action_client::ActionConfig;
use sse_client::StreamConfig;

const DEFAULT_FAMILY: &str = "b2500";
const DEFAULT_LISTEN: &str = "127.0.0.1:8090";
const DEFAULT_SLOT: &str = "1";
const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_ACTION_TIMEOUT_MS: u64 = 3_000;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Family tag this gateway routes; anything else on the stream is
    /// ignored.
    pub family: String,
    pub stream: StreamConfig,
    /// Device slots to attach a view for.
    pub slots: Vec<String>,
    pub listen: String,
    pub metrics_listen: Option<String>,
    pub action_base_url: Option<String>,
    pub action_timeout_ms: u64,
    pub channel_capacity: usize,
}

impl DashboardConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(config_path: Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_config) = load_file_config(config_path.as_deref())? {
            apply_file_config(&mut config, file_config);
        }

        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Action endpoint options; the base URL falls back to the stream host
    /// and port when not configured.
    pub fn actions(&self) -> ActionConfig {
        let base_url = self.action_base_url.clone().unwrap_or_else(|| {
            format!("http://{}:{}", self.stream.host, self.stream.port)
        });
        ActionConfig {
            base_url,
            timeout_ms: self.action_timeout_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.family.trim().is_empty() {
            anyhow::bail!("family must be non-empty");
        }
        if self.slots.is_empty() {
            anyhow::bail!("at least one view slot must be configured");
        }
        for slot in &self.slots {
            if slot.is_empty() || !slot.bytes().all(|byte| byte.is_ascii_digit()) {
                anyhow::bail!("view slot '{slot}' must be one or more digits");
            }
        }
        let mut seen = self.slots.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.slots.len() {
            anyhow::bail!("view slots must be unique");
        }
        if self.stream.port == 0 {
            anyhow::bail!("stream.port must be between 1 and 65535");
        }
        if !self.stream.events_path.starts_with('/') {
            anyhow::bail!("stream.events_path must start with '/'");
        }
        if self.stream.retry_backoff_ms == 0 {
            anyhow::bail!("stream.retry_backoff_ms must be >= 1");
        }
        if self.stream.retry_max_backoff_ms == 0 {
            anyhow::bail!("stream.retry_max_backoff_ms must be >= 1");
        }
        validate_listen(&self.listen, "server.listen")?;
        if let Some(ref listen) = self.metrics_listen {
            validate_listen(listen, "metrics.listen")?;
        }
        if let Some(ref base_url) = self.action_base_url {
            if base_url.trim().is_empty() {
                anyhow::bail!("actions.base_url must be non-empty when set");
            }
        }
        if self.action_timeout_ms == 0 {
            anyhow::bail!("actions.timeout_ms must be >= 1");
        }
        if self.channel_capacity == 0 {
            anyhow::bail!("channel_capacity must be >= 1");
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            stream: StreamConfig::default(),
            slots: vec![DEFAULT_SLOT.to_string()],
            listen: DEFAULT_LISTEN.to_string(),
            metrics_listen: None,
            action_base_url: None,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn apply_env_overrides(config: &mut DashboardConfig) {
    if let Ok(value) = env::var("B2500_FAMILY") {
        config.family = value;
    }

    if let Ok(value) = env::var("B2500_HOST") {
        config.stream.host = value;
    }

    if let Some(port) = parse_env_u16("B2500_PORT") {
        config.stream.port = port;
    }

    if let Ok(value) = env::var("B2500_EVENTS_PATH") {
        config.stream.events_path = value;
    }

    if let Some(backoff_ms) = parse_env_u64("B2500_RETRY_BACKOFF_MS") {
        config.stream.retry_backoff_ms = backoff_ms;
    }

    if let Some(backoff_ms) = parse_env_u64("B2500_RETRY_MAX_BACKOFF_MS") {
        config.stream.retry_max_backoff_ms = backoff_ms;
    }

    if let Ok(value) = env::var("B2500_SLOTS") {
        config.slots = parse_slot_list(&value);
    }

    if let Ok(value) = env::var("B2500_LISTEN") {
        config.listen = value;
    }

    config.metrics_listen = env::var("B2500_METRICS_LISTEN")
        .ok()
        .or(config.metrics_listen.take());
    config.action_base_url = env::var("B2500_ACTION_BASE_URL")
        .ok()
        .or(config.action_base_url.take());
    config.action_timeout_ms =
        parse_env_u64("B2500_ACTION_TIMEOUT_MS").unwrap_or(config.action_timeout_ms);
    config.channel_capacity =
        parse_env_usize("B2500_CHANNEL_CAPACITY").unwrap_or(config.channel_capacity);
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    family: Option<String>,
    channel_capacity: Option<usize>,
    stream: Option<FileStreamConfig>,
    actions: Option<FileActionConfig>,
    server: Option<FileServerConfig>,
    metrics: Option<FileMetricsConfig>,
    views: Option<Vec<FileViewConfig>>,
}

#[derive(Debug, Deserialize)]
struct FileStreamConfig {
    host: Option<String>,
    port: Option<u16>,
    events_path: Option<String>,
    retry_backoff_ms: Option<u64>,
    retry_max_backoff_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileActionConfig {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileServerConfig {
    listen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileMetricsConfig {
    listen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileViewConfig {
    slot: String,
}

fn load_file_config(config_path: Option<&str>) -> Result<Option<FileConfig>> {
    let path = match config_path {
        Some(path) => path.to_string(),
        None => match env::var("B2500_CONFIG") {
            Ok(value) => value,
            Err(_) => return Ok(None),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("read config file {path}"))?;
    let ext = Path::new(&path).extension().and_then(|value| value.to_str());

    let config = match ext {
        Some("json") => serde_json::from_str(&content).context("parse json config")?,
        _ => toml::from_str(&content).context("parse toml config")?,
    };

    Ok(Some(config))
}

fn apply_file_config(config: &mut DashboardConfig, file: FileConfig) {
    if let Some(family) = file.family {
        config.family = family;
    }
    if let Some(capacity) = file.channel_capacity {
        config.channel_capacity = capacity;
    }

    if let Some(stream) = file.stream {
        if let Some(host) = stream.host {
            config.stream.host = host;
        }
        if let Some(port) = stream.port {
            config.stream.port = port;
        }
        if let Some(events_path) = stream.events_path {
            config.stream.events_path = events_path;
        }
        if let Some(backoff_ms) = stream.retry_backoff_ms {
            config.stream.retry_backoff_ms = backoff_ms;
        }
        if let Some(backoff_ms) = stream.retry_max_backoff_ms {
            config.stream.retry_max_backoff_ms = backoff_ms;
        }
    }

    if let Some(actions) = file.actions {
        if let Some(base_url) = actions.base_url {
            config.action_base_url = Some(base_url);
        }
        if let Some(timeout_ms) = actions.timeout_ms {
            config.action_timeout_ms = timeout_ms;
        }
    }

    if let Some(server) = file.server {
        if let Some(listen) = server.listen {
            config.listen = listen;
        }
    }

    if let Some(metrics) = file.metrics {
        if let Some(listen) = metrics.listen {
            config.metrics_listen = Some(listen);
        }
    }

    if let Some(views) = file.views {
        config.slots = views.into_iter().map(|view| view.slot).collect();
    }
}

fn parse_env_u16(key: &str) -> Option<u16> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

fn parse_env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

fn parse_env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

fn parse_slot_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_listen(value: &str, key: &str) -> Result<()> {
    value
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("{key} must be a socket address (e.g. 127.0.0.1:8090)"))
}
