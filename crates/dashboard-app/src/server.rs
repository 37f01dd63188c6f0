use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use action_client::ActionClient;
use device_state::{InfoField, OutputChannel, StorageView};
use types::ActionRequest;

use crate::view::ViewHandle;

/// State behind the HTTP surface: the per-slot view handles plus the action
/// client interactions are dispatched through. The surface only ever reads
/// view-state fields; identifiers are never parsed here.
#[derive(Clone)]
pub struct AppState {
    views: Arc<HashMap<String, ViewHandle>>,
    actions: Arc<ActionClient>,
}

impl AppState {
    pub fn new(views: HashMap<String, ViewHandle>, actions: ActionClient) -> Self {
        Self {
            views: Arc::new(views),
            actions: Arc::new(actions),
        }
    }

    fn view(&self, slot: &str) -> Result<&ViewHandle, StatusCode> {
        self.views.get(slot).ok_or(StatusCode::NOT_FOUND)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/views", get(list_views))
        .route("/views/:slot", get(view_snapshot))
        .route("/views/:slot/outputs/:channel/toggle", post(toggle_output))
        .route("/views/:slot/dod", post(set_dod))
        .route("/views/:slot/discharge-threshold", post(set_discharge_threshold))
        .route("/views/:slot/info/advance", post(advance_info))
        .route("/views/:slot/modals/:modal", post(set_modal))
        .with_state(state)
}

pub async fn serve(
    listen: String,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("bind http listener on {listen}"))?;
    info!(listen = %listen, "http surface listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("http server failed")
}

/// Everything the rendering layer needs for one view, in one read.
#[derive(Debug, Serialize)]
struct ViewSnapshot {
    #[serde(flatten)]
    view: StorageView,
    /// Metadata value under the info cursor.
    info_value: Option<String>,
    battery_alert: bool,
    toggle_output1_bound: bool,
    toggle_output2_bound: bool,
    set_dod_bound: bool,
    set_discharge_threshold_bound: bool,
}

#[derive(Debug, Serialize)]
struct DispatchOutcome {
    dispatched: bool,
}

#[derive(Debug, Deserialize)]
struct SetValueBody {
    value: f64,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    field: InfoField,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModalBody {
    open: bool,
}

async fn list_views(State(state): State<AppState>) -> Json<Vec<String>> {
    let mut slots: Vec<String> = state.views.keys().cloned().collect();
    slots.sort();
    Json(slots)
}

async fn view_snapshot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Json<ViewSnapshot>, StatusCode> {
    let handle = state.view(&slot)?;
    let view = handle.read().await;

    Ok(Json(ViewSnapshot {
        info_value: view.selected_info().map(str::to_string),
        battery_alert: view.battery_alert(),
        toggle_output1_bound: view.toggle_output1.is_some(),
        toggle_output2_bound: view.toggle_output2.is_some(),
        set_dod_bound: view.set_dod.is_some(),
        set_discharge_threshold_bound: view.set_discharge_threshold.is_some(),
        view: view.clone(),
    }))
}

async fn toggle_output(
    State(state): State<AppState>,
    Path((slot, channel)): Path<(String, String)>,
) -> Result<Json<DispatchOutcome>, StatusCode> {
    let channel = match channel.as_str() {
        "1" => OutputChannel::One,
        "2" => OutputChannel::Two,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let handle = state.view(&slot)?;

    let request = handle.read().await.toggle_output(channel);
    Ok(Json(dispatch(&state, request, "output toggle")))
}

async fn set_dod(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(body): Json<SetValueBody>,
) -> Result<Json<DispatchOutcome>, StatusCode> {
    let handle = state.view(&slot)?;

    let request = {
        let mut view = handle.write().await;
        view.dod_modal_open = false;
        view.set_dod(body.value)
    };
    Ok(Json(dispatch(&state, request, "dod setter")))
}

async fn set_discharge_threshold(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(body): Json<SetValueBody>,
) -> Result<Json<DispatchOutcome>, StatusCode> {
    let handle = state.view(&slot)?;

    let request = {
        let mut view = handle.write().await;
        view.discharge_threshold_modal_open = false;
        view.set_discharge_threshold(body.value)
    };
    Ok(Json(dispatch(&state, request, "discharge threshold setter")))
}

async fn advance_info(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Json<InfoResponse>, StatusCode> {
    let handle = state.view(&slot)?;

    let mut view = handle.write().await;
    let field = view.advance_info();
    Ok(Json(InfoResponse {
        field,
        value: view.selected_info().map(str::to_string),
    }))
}

async fn set_modal(
    State(state): State<AppState>,
    Path((slot, modal)): Path<(String, String)>,
    Json(body): Json<ModalBody>,
) -> Result<StatusCode, StatusCode> {
    let handle = state.view(&slot)?;

    let mut view = handle.write().await;
    match modal.as_str() {
        "dod" => view.dod_modal_open = body.open,
        "discharge-threshold" => view.discharge_threshold_modal_open = body.open,
        _ => return Err(StatusCode::NOT_FOUND),
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Fire-and-forget: the action goes out on its own task and the next push
/// event carries the real outcome. Interactions on a control with no bound
/// command are guarded no-ops.
fn dispatch(state: &AppState, request: Option<ActionRequest>, control: &str) -> DispatchOutcome {
    match request {
        Some(request) => {
            let actions = Arc::clone(&state.actions);
            tokio::spawn(async move {
                if let Err(err) = actions.send(&request).await {
                    warn!(error = %err, entity = %request.entity_id, "action request failed");
                }
            });
            DispatchOutcome { dispatched: true }
        }
        None => {
            debug!(control = %control, "control not bound, ignoring interaction");
            DispatchOutcome { dispatched: false }
        }
    }
}
