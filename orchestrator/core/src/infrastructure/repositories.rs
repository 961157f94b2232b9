// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # In-Memory Repositories and the Project Store Bundle
//!
//! In-memory implementations of every repository trait, used in development
//! and tests. Production deployments select the embedded sled backend via
//! [`ProjectStores::open`].

pub mod sled_store;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::approval::ApprovalToken;
use crate::domain::board::{BoardTask, TaskId};
use crate::domain::chat::ChatMessage;
use crate::domain::interrupt::{Interrupt, InterruptId};
use crate::domain::ledger::{ProjectId, TaskLedger};
use crate::domain::phase::Phase;
use crate::domain::repository::{
    ApprovalTokenRepository, BoardTaskRepository, ChatRepository, InterruptRepository,
    LedgerRepository, RepositoryError, StorageBackend,
};

use self::sled_store::SledProjectStore;

fn poisoned() -> RepositoryError {
    RepositoryError::Backend("mutex poisoned".to_string())
}

/// One handle per aggregate, wired from a single [`StorageBackend`] choice.
#[derive(Clone)]
pub struct ProjectStores {
    pub ledgers: Arc<dyn LedgerRepository>,
    pub approvals: Arc<dyn ApprovalTokenRepository>,
    pub interrupts: Arc<dyn InterruptRepository>,
    pub board: Arc<dyn BoardTaskRepository>,
    pub chat: Arc<dyn ChatRepository>,
}

impl ProjectStores {
    pub fn in_memory() -> Self {
        Self {
            ledgers: Arc::new(InMemoryLedgerRepository::new()),
            approvals: Arc::new(InMemoryApprovalTokenRepository::new()),
            interrupts: Arc::new(InMemoryInterruptRepository::new()),
            board: Arc::new(InMemoryBoardTaskRepository::new()),
            chat: Arc::new(InMemoryChatRepository::new()),
        }
    }

    pub fn open(backend: &StorageBackend) -> Result<Self, RepositoryError> {
        match backend {
            StorageBackend::InMemory => Ok(Self::in_memory()),
            StorageBackend::Sled(path) => {
                let store = Arc::new(SledProjectStore::open(path)?);
                Ok(Self {
                    ledgers: store.clone(),
                    approvals: store.clone(),
                    interrupts: store.clone(),
                    board: store.clone(),
                    chat: store,
                })
            }
        }
    }
}

#[derive(Clone)]
pub struct InMemoryLedgerRepository {
    ledgers: Arc<Mutex<HashMap<ProjectId, TaskLedger>>>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self { ledgers: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn read(&self, project_id: ProjectId) -> Result<TaskLedger, RepositoryError> {
        let ledgers = self.ledgers.lock().map_err(|_| poisoned())?;
        Ok(ledgers
            .get(&project_id)
            .cloned()
            .unwrap_or_else(|| TaskLedger::empty(project_id)))
    }

    async fn write(&self, ledger: &TaskLedger) -> Result<(), RepositoryError> {
        let mut ledgers = self.ledgers.lock().map_err(|_| poisoned())?;
        ledgers.insert(ledger.project_id, ledger.clone());
        Ok(())
    }

    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError> {
        let ledgers = self.ledgers.lock().map_err(|_| poisoned())?;
        Ok(ledgers.contains_key(&project_id))
    }
}

#[derive(Clone)]
pub struct InMemoryApprovalTokenRepository {
    tokens: Arc<Mutex<HashMap<(ProjectId, Phase), ApprovalToken>>>,
}

impl InMemoryApprovalTokenRepository {
    pub fn new() -> Self {
        Self { tokens: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryApprovalTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApprovalTokenRepository for InMemoryApprovalTokenRepository {
    async fn store(
        &self,
        project_id: ProjectId,
        phase: Phase,
        token: &ApprovalToken,
    ) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().map_err(|_| poisoned())?;
        tokens.insert((project_id, phase), token.clone());
        Ok(())
    }

    async fn fetch(
        &self,
        project_id: ProjectId,
        phase: Phase,
    ) -> Result<Option<ApprovalToken>, RepositoryError> {
        let tokens = self.tokens.lock().map_err(|_| poisoned())?;
        Ok(tokens.get(&(project_id, phase)).cloned())
    }

    async fn delete(&self, project_id: ProjectId, phase: Phase) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().map_err(|_| poisoned())?;
        tokens.remove(&(project_id, phase));
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryInterruptRepository {
    interrupts: Arc<Mutex<HashMap<(ProjectId, InterruptId), Interrupt>>>,
}

impl InMemoryInterruptRepository {
    pub fn new() -> Self {
        Self { interrupts: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryInterruptRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterruptRepository for InMemoryInterruptRepository {
    async fn create(
        &self,
        project_id: ProjectId,
        interrupt: &Interrupt,
    ) -> Result<(), RepositoryError> {
        let mut interrupts = self.interrupts.lock().map_err(|_| poisoned())?;
        interrupts.insert((project_id, interrupt.id), interrupt.clone());
        Ok(())
    }

    async fn answer(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
        response: &str,
    ) -> Result<Interrupt, RepositoryError> {
        let mut interrupts = self.interrupts.lock().map_err(|_| poisoned())?;
        let interrupt = interrupts
            .get_mut(&(project_id, interrupt_id))
            .ok_or_else(|| RepositoryError::NotFound(format!("interrupt {}", interrupt_id)))?;
        interrupt.answer(response);
        Ok(interrupt.clone())
    }

    async fn fetch_response(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<String>, RepositoryError> {
        let interrupts = self.interrupts.lock().map_err(|_| poisoned())?;
        Ok(interrupts
            .get(&(project_id, interrupt_id))
            .and_then(|i| i.visible_response().map(str::to_string)))
    }

    async fn get(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<Interrupt>, RepositoryError> {
        let interrupts = self.interrupts.lock().map_err(|_| poisoned())?;
        Ok(interrupts.get(&(project_id, interrupt_id)).cloned())
    }

    async fn list(&self, project_id: ProjectId) -> Result<Vec<Interrupt>, RepositoryError> {
        let interrupts = self.interrupts.lock().map_err(|_| poisoned())?;
        let mut found: Vec<Interrupt> = interrupts
            .iter()
            .filter(|((pid, _), _)| *pid == project_id)
            .map(|(_, i)| i.clone())
            .collect();
        found.sort_by_key(|i| i.created_at);
        Ok(found)
    }
}

#[derive(Clone)]
pub struct InMemoryBoardTaskRepository {
    tasks: Arc<Mutex<HashMap<(ProjectId, Phase, TaskId), BoardTask>>>,
}

impl InMemoryBoardTaskRepository {
    pub fn new() -> Self {
        Self { tasks: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryBoardTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoardTaskRepository for InMemoryBoardTaskRepository {
    async fn save(&self, project_id: ProjectId, task: &BoardTask) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.lock().map_err(|_| poisoned())?;
        tasks.insert((project_id, task.phase, task.id), task.clone());
        Ok(())
    }

    async fn get(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
    ) -> Result<Option<BoardTask>, RepositoryError> {
        let tasks = self.tasks.lock().map_err(|_| poisoned())?;
        Ok(tasks.get(&(project_id, phase, task_id)).cloned())
    }

    async fn list(
        &self,
        project_id: ProjectId,
        phase: Option<Phase>,
    ) -> Result<Vec<BoardTask>, RepositoryError> {
        let tasks = self.tasks.lock().map_err(|_| poisoned())?;
        let mut found: Vec<BoardTask> = tasks
            .iter()
            .filter(|((pid, p, _), _)| *pid == project_id && phase.map_or(true, |want| *p == want))
            .map(|(_, t)| t.clone())
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }
}

#[derive(Clone)]
pub struct InMemoryChatRepository {
    messages: Arc<Mutex<HashMap<ProjectId, Vec<ChatMessage>>>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self { messages: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn append(
        &self,
        project_id: ProjectId,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().map_err(|_| poisoned())?;
        messages.entry(project_id).or_default().push(message.clone());
        Ok(())
    }

    async fn list(&self, project_id: ProjectId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().map_err(|_| poisoned())?;
        Ok(messages.get(&project_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phase::Phase;

    #[tokio::test]
    async fn ledger_read_defaults_for_unknown_project() {
        let repo = InMemoryLedgerRepository::new();
        let project_id = ProjectId::new();
        let ledger = repo.read(project_id).await.unwrap();
        assert_eq!(ledger.project_id, project_id);
        assert!(ledger.facts.is_empty());
        assert!(ledger.deliverables.is_empty());
        assert!(!repo.exists(project_id).await.unwrap());
    }

    #[tokio::test]
    async fn token_is_single_consumption() {
        let repo = InMemoryApprovalTokenRepository::new();
        let project_id = ProjectId::new();
        let token = ApprovalToken::new("tok-123");

        repo.store(project_id, Phase::Discovery, &token).await.unwrap();
        let fetched = repo.fetch(project_id, Phase::Discovery).await.unwrap().unwrap();
        assert_eq!(fetched.task_token, "tok-123");
        repo.delete(project_id, Phase::Discovery).await.unwrap();
        assert!(repo.fetch(project_id, Phase::Discovery).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn interrupt_polling_is_status_gated() {
        let repo = InMemoryInterruptRepository::new();
        let project_id = ProjectId::new();
        let interrupt = Interrupt::new(InterruptId::new(), Phase::Poc, "Budget ceiling?");
        repo.create(project_id, &interrupt).await.unwrap();

        for _ in 0..3 {
            assert!(repo.fetch_response(project_id, interrupt.id).await.unwrap().is_none());
        }
        repo.answer(project_id, interrupt.id, "$8000/month").await.unwrap();
        assert_eq!(
            repo.fetch_response(project_id, interrupt.id).await.unwrap().as_deref(),
            Some("$8000/month")
        );
    }

    #[tokio::test]
    async fn board_list_orders_by_creation() {
        let repo = InMemoryBoardTaskRepository::new();
        let project_id = ProjectId::new();
        let first = BoardTask::new(Phase::Poc, "first", "", None);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = BoardTask::new(Phase::Poc, "second", "", None);
        // Insert out of order.
        repo.save(project_id, &second).await.unwrap();
        repo.save(project_id, &first).await.unwrap();

        let listed = repo.list(project_id, Some(Phase::Poc)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "first");
        assert!(repo.list(project_id, Some(Phase::Handoff)).await.unwrap().is_empty());
    }
}
