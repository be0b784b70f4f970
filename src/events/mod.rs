use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events emitted by the checkout and order pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A fresh order was persisted
    OrderCreated(Uuid),
    /// A retried submission was collapsed onto an existing order
    DuplicateCheckoutReplayed { order_id: Uuid },
    /// Stock was decremented for a purchased line
    StockDecremented { product_id: Uuid, quantity: i32 },
    /// Post-commit cart clear succeeded
    CartCleared { buyer_id: Uuid, items_removed: u64 },
    /// Post-commit cart clear failed; the order still stands
    CartClearFailed { buyer_id: Uuid, order_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is never allowed to fail a checkout.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Consumes events from the channel and reacts to them. Spawned once at
/// startup; runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "Order created");
            }
            Event::DuplicateCheckoutReplayed { order_id } => {
                info!(order_id = %order_id, "Duplicate checkout replayed to existing order");
            }
            Event::StockDecremented {
                product_id,
                quantity,
            } => {
                info!(product_id = %product_id, quantity = quantity, "Stock decremented");
            }
            Event::CartCleared {
                buyer_id,
                items_removed,
            } => {
                info!(buyer_id = %buyer_id, items_removed = items_removed, "Cart cleared");
            }
            Event::CartClearFailed { buyer_id, order_id } => {
                // The order of record exists; this only flags cleanup debt.
                error!(
                    buyer_id = %buyer_id,
                    order_id = %order_id,
                    "Cart clear failed after successful order"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();

        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender
            .send_or_log(Event::CartCleared {
                buyer_id: Uuid::new_v4(),
                items_removed: 0,
            })
            .await;
    }
}
