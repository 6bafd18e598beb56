//! Domain events published after a store mutation has committed.
//!
//! Delivery is best-effort: a full or closed channel is logged and never turns
//! a committed request into a failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{AlertId, AlertKind, ConsumptionId, EntityRef, ProductId, ToolId};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sender plus the receiving end to hand to [`process_events`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// True once the processing loop has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends without waiting; drops the event with a warning when the channel
    /// is full or closed.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!(error = %e, "dropping domain event");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ConsumptionRecorded {
        consumption_id: ConsumptionId,
        tool_id: ToolId,
        product_id: ProductId,
        quantity: Decimal,
        daily_total: Option<Decimal>,
    },
    ConsumptionRejected {
        tool_id: ToolId,
        limit: Decimal,
        current: Decimal,
        requested: Decimal,
    },
    AlertRaised {
        alert_id: AlertId,
        kind: AlertKind,
        entity: EntityRef,
    },
    AlertResolved(AlertId),
    StockAdjusted {
        product_id: ProductId,
        old_stock: Decimal,
        new_stock: Decimal,
    },
}

/// Drains the channel until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ConsumptionRecorded {
                consumption_id,
                tool_id,
                product_id,
                quantity,
                daily_total,
            } => {
                info!(
                    %consumption_id,
                    %tool_id,
                    %product_id,
                    %quantity,
                    daily_total = ?daily_total,
                    "consumption recorded"
                );
            }
            Event::ConsumptionRejected {
                tool_id,
                limit,
                current,
                requested,
            } => {
                warn!(%tool_id, %limit, %current, %requested, "consumption rejected over daily cap");
            }
            Event::AlertRaised {
                alert_id,
                kind,
                entity,
            } => {
                info!(%alert_id, %kind, %entity, "alert raised");
            }
            Event::AlertResolved(alert_id) => {
                info!(%alert_id, "alert resolved");
            }
            Event::StockAdjusted {
                product_id,
                old_stock,
                new_stock,
            } => {
                info!(%product_id, %old_stock, %new_stock, "stock adjusted");
            }
        }
    }

    info!("Event processing loop stopped");
}
