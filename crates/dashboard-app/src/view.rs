use std::sync::Arc;

use metrics::counter;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{info, warn};

use device_state::StorageView;
use entity_router::EntityRouter;
use types::StateEvent;

/// Shared read handle onto one view's state. The runtime task is the only
/// writer; the HTTP surface reads snapshots.
pub type ViewHandle = Arc<RwLock<StorageView>>;

/// One task per configured device slot. All views share the same stream and
/// the same router; each applies only the messages carrying its own slot.
pub struct ViewRuntime {
    slot: String,
    router: Arc<EntityRouter>,
    state: ViewHandle,
    events: broadcast::Receiver<StateEvent>,
    shutdown: watch::Receiver<bool>,
}

impl ViewRuntime {
    pub fn new(
        slot: impl Into<String>,
        router: Arc<EntityRouter>,
        events: broadcast::Receiver<StateEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let slot = slot.into();
        let state = Arc::new(RwLock::new(StorageView::new(slot.clone())));
        Self {
            slot,
            router,
            state,
            events,
            shutdown,
        }
    }

    pub fn state(&self) -> ViewHandle {
        Arc::clone(&self.state)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                received = self.events.recv() => {
                    match received {
                        Ok(event) => self.handle(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(slot = %self.slot, skipped, "view lagged behind the stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(slot = %self.slot, "view detached");
    }

    async fn handle(&self, event: StateEvent) {
        let Some(matched) = self.router.route(&event.id) else {
            counter!("view_events_ignored_total").increment(1);
            return;
        };
        if matched.slot != self.slot {
            counter!("view_events_ignored_total").increment(1);
            return;
        }

        self.state
            .write()
            .await
            .apply_event(matched.attribute, &event);
        counter!("view_events_applied_total").increment(1);
    }
}
