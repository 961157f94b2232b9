// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Tasks
//!
//! Human-visible kanban tracking, independent of the ledger. Optimized for
//! frequent small updates (status moves, comments), each of which triggers
//! a broadcast to project dashboards.
//!
//! The backlog → in_progress → review → done ordering is intended use, not
//! an enforced state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::phase::Phase;

/// Unique identifier for a [`BoardTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardTaskStatus {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl std::str::FromStr for BoardTaskStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(BoardTaskStatus::Backlog),
            "in_progress" => Ok(BoardTaskStatus::InProgress),
            "review" => Ok(BoardTaskStatus::Review),
            "done" => Ok(BoardTaskStatus::Done),
            other => Err(BoardError::InvalidStatus(other.to_string())),
        }
    }
}

/// Append-only comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskComment {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One work item on the project board. Retained permanently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardTask {
    pub id: TaskId,
    pub phase: Phase,
    pub title: String,
    pub description: String,
    pub status: BoardTaskStatus,
    pub assigned_to: Option<String>,
    pub artifact_path: Option<String>,
    pub comments: Vec<TaskComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardTask {
    pub fn new(
        phase: Phase,
        title: impl Into<String>,
        description: impl Into<String>,
        assigned_to: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            phase,
            title: title.into(),
            description: description.into(),
            status: BoardTaskStatus::Backlog,
            assigned_to,
            artifact_path: None,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("invalid task status: {0}")]
    InvalidStatus(String),
    #[error("field '{field}' has an invalid value: {reason}")]
    InvalidField { field: String, reason: String },
}

/// The fixed allow-list of updatable task fields.
///
/// Built from a caller-supplied field map: unknown fields are silently
/// dropped (forward-compatible callers), known fields with malformed values
/// are rejected.
#[derive(Debug, Clone, Default)]
pub struct BoardTaskUpdate {
    pub status: Option<BoardTaskStatus>,
    pub assigned_to: Option<String>,
    pub artifact_path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl BoardTaskUpdate {
    /// Parse a raw field map. Returns the typed update plus the accepted
    /// field names (the only fields a broadcast may carry).
    pub fn from_fields(
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(Self, Vec<String>), BoardError> {
        let mut update = BoardTaskUpdate::default();
        let mut accepted = Vec::new();
        for (key, value) in fields {
            match key.as_str() {
                "status" => {
                    let raw = value.as_str().ok_or_else(|| BoardError::InvalidField {
                        field: "status".into(),
                        reason: "expected a string".into(),
                    })?;
                    update.status = Some(raw.parse()?);
                }
                "assigned_to" => update.assigned_to = Some(expect_string(key, value)?),
                "artifact_path" => update.artifact_path = Some(expect_string(key, value)?),
                "title" => update.title = Some(expect_string(key, value)?),
                "description" => update.description = Some(expect_string(key, value)?),
                // Unknown fields are dropped, not errored.
                _ => continue,
            }
            accepted.push(key.clone());
        }
        Ok((update, accepted))
    }

    /// Apply to a task, stamping `updated_at`.
    pub fn apply(self, task: &mut BoardTask) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = Some(assigned_to);
        }
        if let Some(artifact_path) = self.artifact_path {
            task.artifact_path = Some(artifact_path);
        }
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        task.updated_at = Utc::now();
    }
}

fn expect_string(field: &str, value: &serde_json::Value) -> Result<String, BoardError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BoardError::InvalidField {
            field: field.to_string(),
            reason: "expected a string".into(),
        })
}
