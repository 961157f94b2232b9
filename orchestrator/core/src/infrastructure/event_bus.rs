// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Broadcast Sink — Pub/Sub for Project Events
//!
//! In-memory fan-out of [`ProjectEvent`]s over a tokio broadcast channel.
//! Feeds the SSE endpoint and any attached dashboard subscribers.
//!
//! Delivery is best-effort and at-most-once: publishing never fails, slow
//! subscribers lag and drop old events, and losing a dashboard update must
//! never abort a phase.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::ProjectEvent;
use crate::domain::ledger::ProjectId;

/// Event bus for publishing and subscribing to project events.
#[derive(Clone)]
pub struct ProjectEventBus {
    sender: Arc<broadcast::Sender<ProjectEvent>>,
}

impl ProjectEventBus {
    /// Create a bus with the given channel capacity. Capacity bounds how
    /// many events can buffer before old ones are dropped for laggards.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender: Arc::new(sender) }
    }

    /// Default capacity (1000).
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers. Fire-and-forget: a bus with no
    /// subscribers is not an error.
    pub fn publish(&self, event: ProjectEvent) {
        debug!(project_id = %event.project_id(), "Publishing project event");
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all project events.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver { receiver: self.sender.subscribe() }
    }

    /// Subscribe filtered to a single project channel.
    pub fn subscribe_project(&self, project_id: ProjectId) -> ProjectEventReceiver {
        ProjectEventReceiver { receiver: self.sender.subscribe(), project_id }
    }

    /// Raw receiver, for stream adapters (SSE).
    pub fn raw_subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiver for all project events.
pub struct EventReceiver {
    receiver: broadcast::Receiver<ProjectEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<ProjectEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver scoped to one project's channel.
pub struct ProjectEventReceiver {
    receiver: broadcast::Receiver<ProjectEvent>,
    project_id: ProjectId,
}

impl ProjectEventReceiver {
    /// Receive the next event for this project, skipping other channels.
    pub async fn recv(&mut self) -> Result<ProjectEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.project_id() == self.project_id => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::Closed),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event receiver lagged by {} events", n);
                    return Err(EventBusError::Lagged(n));
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("event bus closed")]
    Closed,
    #[error("receiver lagged by {0} events")]
    Lagged(u64),
}
