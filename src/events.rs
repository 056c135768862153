use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ItemCategory;

/// Events emitted by the fulfillment pipeline for downstream consumers
/// (shipment persistence, notifications, reporting).
///
/// Stock events are emitted once per applied operation, including the
/// compensating increments of a rejected shipment, so a consumer replaying
/// them sees every movement of the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockDecremented {
        category: ItemCategory,
        branch_id: Option<String>,
        item_id: String,
        amount: i64,
    },
    StockIncremented {
        category: ItemCategory,
        branch_id: Option<String>,
        item_id: String,
        amount: i64,
    },
    ShipmentFulfilled {
        shipment_id: Uuid,
        to_branch_id: String,
        total_quantity: i64,
    },
    ShipmentRejected {
        shipment_id: Uuid,
        category: ItemCategory,
        item_id: String,
        shortage: i64,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
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
}

/// Drains the event channel and logs each event. The embedding application
/// replaces or wraps this loop to fan events out to real consumers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockDecremented {
                category,
                item_id,
                amount,
                ..
            } => {
                info!(%category, %item_id, amount, "stock decremented");
            }
            Event::StockIncremented {
                category,
                item_id,
                amount,
                ..
            } => {
                info!(%category, %item_id, amount, "stock incremented");
            }
            Event::ShipmentFulfilled {
                shipment_id,
                to_branch_id,
                total_quantity,
            } => {
                info!(
                    %shipment_id,
                    %to_branch_id,
                    total_quantity,
                    "shipment fulfilled"
                );
            }
            Event::ShipmentRejected {
                shipment_id,
                category,
                item_id,
                shortage,
            } => {
                warn!(
                    %shipment_id,
                    %category,
                    %item_id,
                    shortage,
                    "shipment rejected for insufficient stock"
                );
            }
            Event::Generic { message, .. } => {
                info!(%message, "event");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_data_builds_a_generic_event() {
        let event = Event::with_data("stock audit complete".to_string());
        match event {
            Event::Generic {
                message, metadata, ..
            } => {
                assert_eq!(message, "stock audit complete");
                assert_eq!(metadata, serde_json::Value::Null);
            }
            other => panic!("expected generic event, got {:?}", other),
        }
    }
}
