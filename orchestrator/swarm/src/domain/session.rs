// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Value Objects
//!
//! Configuration, statuses and results for a collaborative session. The
//! engine itself lives in `crate::application::session`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agent::TokenUsage;

/// Unique identifier for one session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Safety limits preventing runaway execution.
///
/// The repetitive-handoff window and threshold are empirically tuned per
/// phase; they are configuration, not semantic constants.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard ceiling on baton passes.
    pub max_handoffs: u32,
    /// Hard ceiling on agent turns (a `Continue` consumes one too).
    pub max_iterations: u32,
    /// Wall-clock budget for the whole run, cumulative across interrupt
    /// resumes (time spent waiting on the customer does not count).
    pub execution_timeout: Duration,
    /// Budget for a single agent turn.
    pub per_node_timeout: Duration,
    /// Size of the sliding window of recent active-node transitions.
    pub repetitive_handoff_window: usize,
    /// Minimum distinct agents that must appear in a full window; fewer
    /// means the session is ping-ponging and is failed fast.
    pub repetitive_handoff_min_unique: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_handoffs: 15,
            max_iterations: 40,
            execution_timeout: Duration::from_secs(1800),
            per_node_timeout: Duration::from_secs(300),
            repetitive_handoff_window: 8,
            repetitive_handoff_min_unique: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Ready,
    Running,
    Completed,
    Failed,
    /// Paused for customer input; resumable on the same instance.
    Interrupted,
}

/// One activation of a node (entry or handoff target).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTransition {
    pub node: String,
    pub at: DateTime<Utc>,
}

/// Terminal (or paused) outcome of a `run` call.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub status: SessionStatus,
    /// The final agent message (the completing turn's message for
    /// `Completed`).
    pub output: String,
    pub accumulated_usage: TokenUsage,
    pub node_history: Vec<NodeTransition>,
    /// Set iff status is `Failed`.
    pub failure_reason: Option<String>,
    /// Set iff status is `Interrupted`: the questions awaiting the customer.
    pub pending_questions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has no nodes")]
    NoNodes,
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),
    #[error("unknown entry node '{0}'")]
    UnknownEntryNode(String),
    #[error("session is not runnable from status {0:?}")]
    NotResumable(SessionStatus),
}
