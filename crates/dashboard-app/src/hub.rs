use metrics::counter;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::info;

use types::StateEvent;

/// Fan-out point between the single push stream and any number of device
/// views. Subscribing hands back an independent receiver over the shared
/// stream; dropping the receiver ends the subscription.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<StateEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: StateEvent) {
        counter!("hub_events_published_total").increment(1);
        // Err only means nobody is subscribed right now.
        let _ = self.tx.send(event);
    }
}

/// Pump decoded stream events into the hub until the stream side closes or
/// shutdown is requested.
pub async fn forward_events(
    mut rx: mpsc::Receiver<StateEvent>,
    hub: EventHub,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => hub.publish(event),
                    None => break,
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("hub shutdown requested");
                    break;
                }
            }
        }
    }
}
