// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Project Broadcast Events
//!
//! Structured events fanned out to project dashboards through the broadcast
//! sink. Delivery is at-most-once, no acknowledgment; nothing in the system
//! may depend on an event having been observed.
//!
//! Wire shape: `{"event": "...", "project_id": ..., ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::board::TaskId;
use crate::domain::chat::MessageId;
use crate::domain::interrupt::InterruptId;
use crate::domain::ledger::ProjectId;
use crate::domain::phase::{Phase, PhaseStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProjectEvent {
    ProjectCreated {
        project_id: ProjectId,
        project_name: String,
        customer: String,
        created_at: DateTime<Utc>,
    },
    PhaseStatusChanged {
        project_id: ProjectId,
        phase: Phase,
        status: PhaseStatus,
        changed_at: DateTime<Utc>,
    },
    PhaseCompleted {
        project_id: ProjectId,
        phase: Phase,
        completed_at: DateTime<Utc>,
    },
    PhaseFailed {
        project_id: ProjectId,
        phase: Phase,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    LedgerAppended {
        project_id: ProjectId,
        section: String,
        total_entries: usize,
        appended_at: DateTime<Utc>,
    },
    DeliverablesUpdated {
        project_id: ProjectId,
        phase: Phase,
        count: usize,
        updated_at: DateTime<Utc>,
    },
    InterruptRaised {
        project_id: ProjectId,
        phase: Phase,
        interrupt_id: InterruptId,
        question: String,
        raised_at: DateTime<Utc>,
    },
    InterruptAnswered {
        project_id: ProjectId,
        interrupt_id: InterruptId,
        answered_at: DateTime<Utc>,
    },
    TaskCreated {
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
        title: String,
        assigned_to: Option<String>,
        created_at: DateTime<Utc>,
    },
    /// Carries only the caller-supplied fields, never internal timestamps.
    TaskUpdated {
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
        fields: serde_json::Value,
        updated_at: DateTime<Utc>,
    },
    ChatMessagePosted {
        project_id: ProjectId,
        message_id: MessageId,
        author: String,
        posted_at: DateTime<Utc>,
    },
}

impl ProjectEvent {
    /// The project channel this event belongs to.
    pub fn project_id(&self) -> ProjectId {
        match self {
            ProjectEvent::ProjectCreated { project_id, .. }
            | ProjectEvent::PhaseStatusChanged { project_id, .. }
            | ProjectEvent::PhaseCompleted { project_id, .. }
            | ProjectEvent::PhaseFailed { project_id, .. }
            | ProjectEvent::LedgerAppended { project_id, .. }
            | ProjectEvent::DeliverablesUpdated { project_id, .. }
            | ProjectEvent::InterruptRaised { project_id, .. }
            | ProjectEvent::InterruptAnswered { project_id, .. }
            | ProjectEvent::TaskCreated { project_id, .. }
            | ProjectEvent::TaskUpdated { project_id, .. }
            | ProjectEvent::ChatMessagePosted { project_id, .. } => *project_id,
        }
    }
}
