// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Approval Tokens
//!
//! When a phase reaches `AWAITING_APPROVAL`, the external workflow driver
//! parks on a resume token. The token is stored per (project, phase) and
//! redeemed exactly once by the customer's approve/revise action; redeeming
//! deletes it. A missing token on redemption is a client error, not a retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque resume handle issued by the external workflow engine.
///
/// At most one live token exists per (project, phase) at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalToken {
    pub task_token: String,
    pub created_at: DateTime<Utc>,
}

impl ApprovalToken {
    pub fn new(task_token: impl Into<String>) -> Self {
        Self {
            task_token: task_token.into(),
            created_at: Utc::now(),
        }
    }
}

/// The customer's verdict on a phase submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Revise,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approve",
            ApprovalAction::Revise => "revise",
        }
    }
}
