// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Engagement Phases
//!
//! The delivery lifecycle of an engagement is a fixed sequence of phases.
//! Phase sequencing itself is owned by the external workflow driver; this
//! module only defines the vocabulary shared by the ledger, the project
//! store and the phase orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named stage of the engagement. Each phase has its own agent roster
/// and acceptance gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Discovery,
    Architecture,
    Poc,
    Production,
    Handoff,
}

impl Phase {
    /// Canonical wire/store spelling, also used in composite sort keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "DISCOVERY",
            Phase::Architecture => "ARCHITECTURE",
            Phase::Poc => "POC",
            Phase::Production => "PRODUCTION",
            Phase::Handoff => "HANDOFF",
        }
    }

    /// All phases in delivery order.
    pub fn all() -> [Phase; 5] {
        [
            Phase::Discovery,
            Phase::Architecture,
            Phase::Poc,
            Phase::Production,
            Phase::Handoff,
        ]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DISCOVERY" => Ok(Phase::Discovery),
            "ARCHITECTURE" => Ok(Phase::Architecture),
            "POC" => Ok(Phase::Poc),
            "PRODUCTION" => Ok(Phase::Production),
            "HANDOFF" => Ok(Phase::Handoff),
            other => Err(PhaseParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown phase: {0}")]
pub struct PhaseParseError(pub String);

/// Customer-visible status of the project's current phase.
///
/// Transitions are driven by three actors: phase workers move
/// `InProgress` ↔ `Blocked` and terminally to `AwaitingApproval` or
/// `Failed`; the customer moves `AwaitingApproval` to `Approved`
/// (or back to `InProgress` via a revision request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    InProgress,
    AwaitingApproval,
    Approved,
    Blocked,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::InProgress => "IN_PROGRESS",
            PhaseStatus::AwaitingApproval => "AWAITING_APPROVAL",
            PhaseStatus::Approved => "APPROVED",
            PhaseStatus::Blocked => "BLOCKED",
            PhaseStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
