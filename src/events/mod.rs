use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Events emitted by the services. Consumers (webhooks, audit log, a
/// future outbox) subscribe on the receiving end of the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order / payment events
    OrderCreated(i64),
    OrderUpdated(i64),
    OrderDeleted(i64),
    OrderPaymentProcessed {
        order_id: i64,
        payment_type: String,
    },
    OrderPaymentCancelled(i64),
    ProductionApproved {
        order_id: i64,
        approved_by: Option<String>,
        manufacturing_order_ids: Vec<i64>,
    },

    // Manufacturing lifecycle events
    ManufacturingOrderCreated {
        manufacturing_order_id: i64,
        product_id: i64,
        planned_quantity: i32,
    },
    ManufacturingOrderStarted(i64),
    ManufacturingOrderPaused(i64),
    ManufacturingOrderCompleted {
        manufacturing_order_id: i64,
        produced_quantity: i32,
    },
    ManufacturingOrderCancelled(i64),
    ManufacturingOrderDeleted(i64),
    SerialNumbersGenerated {
        manufacturing_order_id: i64,
        count: usize,
    },

    // Inventory events
    InventoryAdjusted {
        product_id: i64,
        warehouse_id: i64,
        old_quantity: i32,
        new_quantity: i32,
    },

    // Shipment events
    ShipmentCreated {
        shipment_id: i64,
        order_id: i64,
    },

    // CRM sync events
    SyncBatchProcessed {
        source: String,
        created: usize,
        updated: usize,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

/// Thin wrapper over the mpsc sender so services do not depend on channel
/// mechanics.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing the failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {}", e))
    }

    /// Sends an event; a full or closed channel is logged and swallowed.
    /// Business operations never fail because a consumer lagged.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "event delivery failed");
        }
    }
}
