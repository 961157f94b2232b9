// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate, following the Repository
//! pattern: one trait per aggregate, interface in the domain layer,
//! implementations in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `LedgerRepository` | `TaskLedger` | `InMemoryLedgerRepository`, `SledProjectStore` |
//! | `ApprovalTokenRepository` | `ApprovalToken` | `InMemoryApprovalTokenRepository`, `SledProjectStore` |
//! | `InterruptRepository` | `Interrupt` | `InMemoryInterruptRepository`, `SledProjectStore` |
//! | `BoardTaskRepository` | `BoardTask` | `InMemoryBoardTaskRepository`, `SledProjectStore` |
//! | `ChatRepository` | `ChatMessage` | `InMemoryChatRepository`, `SledProjectStore` |
//!
//! Every operation is a single atomic action against the backing store; no
//! long-held locks. Concrete backends are selected at startup via
//! [`StorageBackend`]: in-memory for development and tests, the embedded
//! sled store for production.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::approval::ApprovalToken;
use crate::domain::board::{BoardTask, TaskId};
use crate::domain::chat::ChatMessage;
use crate::domain::interrupt::{Interrupt, InterruptId};
use crate::domain::ledger::{ProjectId, TaskLedger};
use crate::domain::phase::Phase;

/// Storage backend selected at orchestrator startup.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    Sled(PathBuf),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Repository for the single-writer task ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Read the whole ledger. A project with nothing stored yet yields a
    /// default-initialized ledger — absence is a valid initial state, never
    /// an error.
    async fn read(&self, project_id: ProjectId) -> Result<TaskLedger, RepositoryError>;

    /// Full overwrite, last-writer-wins. Callers read-before-write; this is
    /// safe because exactly one role (the PM) writes the ledger.
    async fn write(&self, ledger: &TaskLedger) -> Result<(), RepositoryError>;

    /// Whether a ledger has ever been written for this project.
    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError>;
}

/// Repository for workflow resume tokens, one per (project, phase).
#[async_trait]
pub trait ApprovalTokenRepository: Send + Sync {
    async fn store(
        &self,
        project_id: ProjectId,
        phase: Phase,
        token: &ApprovalToken,
    ) -> Result<(), RepositoryError>;

    /// Absent tokens are `None`, not an error: "no pending approval".
    async fn fetch(
        &self,
        project_id: ProjectId,
        phase: Phase,
    ) -> Result<Option<ApprovalToken>, RepositoryError>;

    async fn delete(&self, project_id: ProjectId, phase: Phase) -> Result<(), RepositoryError>;
}

/// Repository for mid-phase customer interrupts.
#[async_trait]
pub trait InterruptRepository: Send + Sync {
    async fn create(
        &self,
        project_id: ProjectId,
        interrupt: &Interrupt,
    ) -> Result<(), RepositoryError>;

    /// Record the customer's answer, flipping PENDING → ANSWERED. Answering
    /// an already answered interrupt overwrites (correction). Returns the
    /// updated record.
    async fn answer(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
        response: &str,
    ) -> Result<Interrupt, RepositoryError>;

    /// The polling primitive: `None` unless status is ANSWERED, even if a
    /// response field happens to be set.
    async fn fetch_response(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<String>, RepositoryError>;

    async fn get(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<Interrupt>, RepositoryError>;

    async fn list(&self, project_id: ProjectId) -> Result<Vec<Interrupt>, RepositoryError>;
}

/// Repository for board tasks.
#[async_trait]
pub trait BoardTaskRepository: Send + Sync {
    /// Save (create or update) one task.
    async fn save(&self, project_id: ProjectId, task: &BoardTask) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
    ) -> Result<Option<BoardTask>, RepositoryError>;

    /// Tasks ordered by `created_at` ascending, optionally scoped to one
    /// phase.
    async fn list(
        &self,
        project_id: ProjectId,
        phase: Option<Phase>,
    ) -> Result<Vec<BoardTask>, RepositoryError>;
}

/// Repository for the time-ordered project chat log.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn append(
        &self,
        project_id: ProjectId,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError>;

    async fn list(&self, project_id: ProjectId) -> Result<Vec<ChatMessage>, RepositoryError>;
}
