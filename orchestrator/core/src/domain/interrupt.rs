// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Interrupts
//!
//! A mid-phase pause where an agent needs information only the customer
//! can supply. The orchestrator persists the question, the customer answers
//! through the API, and the orchestrator polls until every question for the
//! pause is answered.
//!
//! State machine: `PENDING → ANSWERED`, one-way. Answering an already
//! answered interrupt overwrites the response (a correction) but must not
//! re-trigger a session resume downstream; the orchestrator only polls ids
//! it minted for the current pause.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::phase::Phase;

/// Unique identifier for an [`Interrupt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterruptId(pub Uuid);

impl InterruptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for InterruptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InterruptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterruptStatus {
    Pending,
    Answered,
}

/// A single customer question raised during a phase. Kept forever (audit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interrupt {
    pub id: InterruptId,
    pub phase: Phase,
    pub question: String,
    /// Empty until answered. Visibility is gated by `status`, not by this
    /// field being set: a partially-written response must never be observed.
    pub response: Option<String>,
    pub status: InterruptStatus,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Interrupt {
    pub fn new(id: InterruptId, phase: Phase, question: impl Into<String>) -> Self {
        Self {
            id,
            phase,
            question: question.into(),
            response: None,
            status: InterruptStatus::Pending,
            created_at: Utc::now(),
            answered_at: None,
        }
    }

    /// Record (or correct) the customer's answer and flip to ANSWERED.
    pub fn answer(&mut self, response: impl Into<String>) {
        self.response = Some(response.into());
        self.status = InterruptStatus::Answered;
        self.answered_at = Some(Utc::now());
    }

    /// The polling primitive: the response is visible only once the status
    /// says so.
    pub fn visible_response(&self) -> Option<&str> {
        match self.status {
            InterruptStatus::Answered => self.response.as_deref(),
            InterruptStatus::Pending => None,
        }
    }
}
