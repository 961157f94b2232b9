// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer (`cadence-core`)
//!
//! Use-case services over the domain repositories. Each mutating service
//! persists first, then broadcasts to the project event channel; broadcast
//! is fire-and-forget and can never fail a mutation.

pub mod approval_service;
pub mod board_service;
pub mod interrupt_service;
pub mod ledger_service;
pub mod workflow_driver;

use thiserror::Error;

use crate::domain::board::{BoardError, TaskId};
use crate::domain::interrupt::InterruptId;
use crate::domain::ledger::LedgerError;
use crate::domain::phase::Phase;
use crate::domain::repository::RepositoryError;

pub use approval_service::ApprovalService;
pub use board_service::BoardService;
pub use interrupt_service::InterruptService;
pub use ledger_service::LedgerService;
pub use workflow_driver::{FailureKind, WorkflowDriver};

/// Errors surfaced by application services. Client-misuse variants are
/// rejected at the API boundary; repository variants indicate store faults.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("task {0} not found in phase {1}")]
    TaskNotFound(TaskId, Phase),
    #[error("interrupt {0} not found")]
    InterruptNotFound(InterruptId),
}

impl ServiceError {
    /// Whether this error is the caller's fault (reject, never retry).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Ledger(_) | ServiceError::Board(_) => true,
            ServiceError::TaskNotFound(..) | ServiceError::InterruptNotFound(_) => true,
            ServiceError::Repository(RepositoryError::NotFound(_)) => true,
            ServiceError::Repository(_) => false,
        }
    }
}
