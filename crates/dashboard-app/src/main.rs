use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use action_client::ActionClient;
use dashboard_app::config::DashboardConfig;
use dashboard_app::hub::{forward_events, EventHub};
use dashboard_app::server::{self, AppState};
use dashboard_app::view::ViewRuntime;
use entity_router::EntityRouter;
use sse_client::EventStream;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = parse_config_arg();
    let config = DashboardConfig::load_with_path(config_path).context("load config failed")?;
    config.validate().context("config validation failed")?;

    if let Some(ref listen) = config.metrics_listen {
        install_metrics_exporter(listen)?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let hub = EventHub::new(config.channel_capacity);
    let router = Arc::new(EntityRouter::new(config.family.clone()));
    let actions = ActionClient::new(config.actions()).context("action client init failed")?;

    // Views subscribe before the stream starts so no early message is lost
    // to an empty hub.
    let mut join_set = JoinSet::new();
    let mut views = HashMap::new();
    for slot in &config.slots {
        let runtime = ViewRuntime::new(
            slot.clone(),
            Arc::clone(&router),
            hub.subscribe(),
            shutdown_rx.clone(),
        );
        views.insert(slot.clone(), runtime.state());
        join_set.spawn(runtime.run());
    }

    join_set.spawn(forward_events(rx, hub.clone(), shutdown_rx.clone()));
    join_set.spawn(EventStream::new(config.stream.clone(), tx, shutdown_rx.clone()).run());

    let app_state = AppState::new(views, actions);
    let server_handle = tokio::spawn(server::serve(
        config.listen.clone(),
        app_state,
        shutdown_rx.clone(),
    ));

    notify_ready();
    info!(
        family = %config.family,
        views = config.slots.len(),
        stream = %config.stream.url(),
        "storage dashboard gateway up"
    );

    tokio::signal::ctrl_c()
        .await
        .context("ctrl-c handler failed")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    while let Some(result) = join_set.join_next().await {
        if let Err(err) = result {
            warn!(error = %err, "task join failed");
        }
    }

    match server_handle.await {
        Ok(result) => result?,
        Err(err) => warn!(error = %err, "http task join failed"),
    }

    Ok(())
}

fn parse_config_arg() -> Option<String> {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

fn install_metrics_exporter(listen: &str) -> Result<()> {
    let addr: std::net::SocketAddr = listen
        .parse()
        .context("metrics listen address invalid")?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("metrics exporter install failed")
}

#[cfg(target_os = "linux")]
fn notify_ready() {
    if let Err(err) = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]) {
        warn!(error = %err, "systemd ready notify failed");
    }
}

#[cfg(not(target_os = "linux"))]
fn notify_ready() {}
