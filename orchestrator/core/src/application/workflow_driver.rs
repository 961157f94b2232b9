// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Workflow Driver Interface
//!
//! The external workflow engine launches a phase worker and parks on an
//! opaque resume token. The worker reports the phase outcome back through
//! this interface — exactly once per `execute` call, regardless of how many
//! internal retries happened.

use async_trait::async_trait;

/// Upper bound on the failure cause carried back to the workflow engine.
pub const MAX_FAILURE_CAUSE_BYTES: usize = 32_768;

/// Failure taxonomy reported to the workflow engine. Operators must be able
/// to distinguish "the customer went silent" from "the agents are broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// All retry attempts exhausted without a completed session.
    PhaseExecutionFailed,
    /// The customer did not answer a raised interrupt within the poll
    /// timeout. Fatal, never retried.
    InterruptTimeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PhaseExecutionFailed => "PhaseExecutionFailed",
            FailureKind::InterruptTimeout => "InterruptTimeout",
        }
    }
}

/// Outcome reporting surface of the external workflow engine.
#[async_trait]
pub trait WorkflowDriver: Send + Sync {
    async fn report_success(
        &self,
        task_token: &str,
        payload: serde_json::Value,
    ) -> anyhow::Result<()>;

    async fn report_failure(
        &self,
        task_token: &str,
        kind: FailureKind,
        cause: &str,
    ) -> anyhow::Result<()>;
}

/// Truncate a failure cause to the transport limit on a char boundary.
pub fn truncate_cause(cause: &str) -> &str {
    if cause.len() <= MAX_FAILURE_CAUSE_BYTES {
        return cause;
    }
    let mut end = MAX_FAILURE_CAUSE_BYTES;
    while !cause.is_char_boundary(end) {
        end -= 1;
    }
    &cause[..end]
}
