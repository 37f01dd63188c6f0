use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use types::StateEvent;

/// Connection options for the bridge's push-event endpoint.
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub host: String,
    pub port: u16,
    /// Path of the server-sent-events endpoint.
    pub events_path: String,
    /// Base delay between reconnect attempts in milliseconds (exponential
    /// backoff).
    pub retry_backoff_ms: u64,
    /// Upper bound for reconnect backoff delay in milliseconds.
    pub retry_max_backoff_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 80,
            events_path: "/events".to_string(),
            retry_backoff_ms: 1_000,
            retry_max_backoff_ms: 30_000,
        }
    }
}

impl StreamConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.events_path)
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("event stream request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental SSE wire decoder. Accepts raw byte chunks as they arrive and
/// yields complete frames; lines split across chunks and CRLF endings are
/// handled, comment lines and fields other than `event`/`data` are dropped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl FrameDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.feed_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn feed_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Lines starting with a colon are keep-alive comments.
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self
            .event
            .take()
            .unwrap_or_else(|| "message".to_string());
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

/// Why one streaming connection came to an end.
enum StreamEnd {
    Shutdown,
    ReceiverGone,
    Disconnected,
}

/// A lightweight task owning the push-stream subscription for one bridge.
/// Decoded `state` events go out over the channel; everything else on the
/// stream (pings, logs) is ignored.
pub struct EventStream {
    config: StreamConfig,
    sender: mpsc::Sender<StateEvent>,
    shutdown: watch::Receiver<bool>,
}

impl EventStream {
    pub fn new(
        config: StreamConfig,
        sender: mpsc::Sender<StateEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            sender,
            shutdown,
        }
    }

    /// Connect, stream, reconnect with capped backoff. Returns once shutdown
    /// is requested or every consumer is gone.
    pub async fn run(self) {
        let EventStream {
            config,
            sender,
            mut shutdown,
        } = self;

        let client = reqwest::Client::new();
        let url = config.url();
        let mut failures = 0u32;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match stream_once(&client, &url, &sender, &mut shutdown).await {
                Ok(StreamEnd::Shutdown) => break,
                Ok(StreamEnd::ReceiverGone) => {
                    info!(url = %url, "event consumers gone, stopping stream");
                    break;
                }
                Ok(StreamEnd::Disconnected) => {
                    failures = 0;
                    info!(url = %url, "event stream ended, reconnecting");
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(url = %url, error = %err, failures, "event stream failed");
                }
            }

            counter!("stream_reconnects_total").increment(1);
            let delay = retry_delay(
                config.retry_backoff_ms,
                config.retry_max_backoff_ms,
                failures,
            );
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(url = %url, "event stream stopped");
    }
}

async fn stream_once(
    client: &reqwest::Client,
    url: &str,
    sender: &mpsc::Sender<StateEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<StreamEnd, StreamError> {
    let mut response = client.get(url).send().await?.error_for_status()?;
    info!(url = %url, "event stream connected");

    let mut decoder = FrameDecoder::default();
    loop {
        tokio::select! {
            chunk = response.chunk() => {
                match chunk? {
                    Some(bytes) => {
                        for frame in decoder.push(&bytes) {
                            if !forward(sender, frame).await {
                                return Ok(StreamEnd::ReceiverGone);
                            }
                        }
                    }
                    None => return Ok(StreamEnd::Disconnected),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return Ok(StreamEnd::Shutdown);
                }
            }
        }
    }
}

/// Returns false once the receiving side has hung up.
async fn forward(sender: &mpsc::Sender<StateEvent>, frame: SseFrame) -> bool {
    if frame.event != "state" {
        debug!(event = %frame.event, "ignoring non-state frame");
        return true;
    }

    match serde_json::from_str::<StateEvent>(&frame.data) {
        Ok(event) => {
            counter!("stream_events_forwarded_total").increment(1);
            sender.send(event).await.is_ok()
        }
        Err(err) => {
            // One bad message must never stop the stream.
            counter!("stream_events_undecodable_total").increment(1);
            warn!(error = %err, "undecodable state event");
            true
        }
    }
}

fn retry_delay(base_ms: u64, max_ms: u64, failures: u32) -> Duration {
    if failures == 0 {
        return Duration::from_millis(base_ms);
    }
    let shift = failures.saturating_sub(1).min(31);
    let factor = 1u64 << shift;
    let delay = base_ms.max(1).saturating_mul(factor);
    Duration::from_millis(delay.min(max_ms.max(base_ms)))
}
