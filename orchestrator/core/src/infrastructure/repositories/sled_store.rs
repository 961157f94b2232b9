// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Embedded Project Store (sled)
//!
//! Single-tree, composite-key persistence for all project aggregates.
//! Every item lives under `(project partition, item sort key)`:
//!
//! | Item | Key |
//! |------|-----|
//! | Task ledger | `{project}#LEDGER` |
//! | Approval token | `{project}#TOKEN#{phase}` |
//! | Interrupt | `{project}#INTERRUPT#{id}` |
//! | Board task | `{project}#TASK#{phase}#{id}` |
//! | Chat message | `{project}#CHAT#{timestamp}#{id}` |
//!
//! The layout supports "all items for a project" and "all items of a kind
//! for a project" as prefix range scans, with no secondary indexes. Chat
//! keys embed a fixed-width RFC 3339 timestamp so lexicographic key order
//! is time order.
//!
//! Values are serde_json documents. Every mutation is a single key write
//! followed by an async flush.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::approval::ApprovalToken;
use crate::domain::board::{BoardTask, TaskId};
use crate::domain::chat::ChatMessage;
use crate::domain::interrupt::{Interrupt, InterruptId};
use crate::domain::ledger::{ProjectId, TaskLedger};
use crate::domain::phase::Phase;
use crate::domain::repository::{
    ApprovalTokenRepository, BoardTaskRepository, ChatRepository, InterruptRepository,
    LedgerRepository, RepositoryError,
};

/// Fixed-width timestamp for sortable chat keys.
const KEY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Clone)]
pub struct SledProjectStore {
    db: sled::Db,
}

impl SledProjectStore {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let db = sled::open(path).map_err(backend)?;
        Ok(Self { db })
    }

    fn ledger_key(project_id: ProjectId) -> String {
        format!("{}#LEDGER", project_id)
    }

    fn token_key(project_id: ProjectId, phase: Phase) -> String {
        format!("{}#TOKEN#{}", project_id, phase.as_str())
    }

    fn interrupt_key(project_id: ProjectId, interrupt_id: InterruptId) -> String {
        format!("{}#INTERRUPT#{}", project_id, interrupt_id)
    }

    fn task_key(project_id: ProjectId, phase: Phase, task_id: TaskId) -> String {
        format!("{}#TASK#{}#{}", project_id, phase.as_str(), task_id)
    }

    fn chat_key(project_id: ProjectId, at: DateTime<Utc>, id: &str) -> String {
        format!("{}#CHAT#{}#{}", project_id, at.format(KEY_TIME_FORMAT), id)
    }

    fn put<T: Serialize>(&self, key: String, value: &T) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.db.insert(key.as_bytes(), bytes).map_err(backend)?;
        Ok(())
    }

    fn fetch_one<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        match self.db.get(key.as_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, RepositoryError> {
        let mut items = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = entry.map_err(backend)?;
            items.push(decode(&bytes)?);
        }
        Ok(items)
    }

    async fn flush(&self) -> Result<(), RepositoryError> {
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }
}

fn backend(e: sled::Error) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RepositoryError> {
    serde_json::from_slice(bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl LedgerRepository for SledProjectStore {
    async fn read(&self, project_id: ProjectId) -> Result<TaskLedger, RepositoryError> {
        Ok(self
            .fetch_one(&Self::ledger_key(project_id))?
            .unwrap_or_else(|| TaskLedger::empty(project_id)))
    }

    async fn write(&self, ledger: &TaskLedger) -> Result<(), RepositoryError> {
        self.put(Self::ledger_key(ledger.project_id), ledger)?;
        self.flush().await
    }

    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError> {
        self.db
            .contains_key(Self::ledger_key(project_id).as_bytes())
            .map_err(backend)
    }
}

#[async_trait]
impl ApprovalTokenRepository for SledProjectStore {
    async fn store(
        &self,
        project_id: ProjectId,
        phase: Phase,
        token: &ApprovalToken,
    ) -> Result<(), RepositoryError> {
        self.put(Self::token_key(project_id, phase), token)?;
        self.flush().await
    }

    async fn fetch(
        &self,
        project_id: ProjectId,
        phase: Phase,
    ) -> Result<Option<ApprovalToken>, RepositoryError> {
        self.fetch_one(&Self::token_key(project_id, phase))
    }

    async fn delete(&self, project_id: ProjectId, phase: Phase) -> Result<(), RepositoryError> {
        self.db
            .remove(Self::token_key(project_id, phase).as_bytes())
            .map_err(backend)?;
        self.flush().await
    }
}

#[async_trait]
impl InterruptRepository for SledProjectStore {
    async fn create(
        &self,
        project_id: ProjectId,
        interrupt: &Interrupt,
    ) -> Result<(), RepositoryError> {
        self.put(Self::interrupt_key(project_id, interrupt.id), interrupt)?;
        self.flush().await
    }

    async fn answer(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
        response: &str,
    ) -> Result<Interrupt, RepositoryError> {
        let key = Self::interrupt_key(project_id, interrupt_id);
        let mut interrupt: Interrupt = self
            .fetch_one(&key)?
            .ok_or_else(|| RepositoryError::NotFound(format!("interrupt {}", interrupt_id)))?;
        interrupt.answer(response);
        self.put(key, &interrupt)?;
        self.flush().await?;
        Ok(interrupt)
    }

    async fn fetch_response(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<String>, RepositoryError> {
        let interrupt: Option<Interrupt> =
            self.fetch_one(&Self::interrupt_key(project_id, interrupt_id))?;
        Ok(interrupt.and_then(|i| i.visible_response().map(str::to_string)))
    }

    async fn get(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<Interrupt>, RepositoryError> {
        self.fetch_one(&Self::interrupt_key(project_id, interrupt_id))
    }

    async fn list(&self, project_id: ProjectId) -> Result<Vec<Interrupt>, RepositoryError> {
        let mut interrupts: Vec<Interrupt> = self.scan(&format!("{}#INTERRUPT#", project_id))?;
        interrupts.sort_by_key(|i| i.created_at);
        Ok(interrupts)
    }
}

#[async_trait]
impl BoardTaskRepository for SledProjectStore {
    async fn save(&self, project_id: ProjectId, task: &BoardTask) -> Result<(), RepositoryError> {
        self.put(Self::task_key(project_id, task.phase, task.id), task)?;
        self.flush().await
    }

    async fn get(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
    ) -> Result<Option<BoardTask>, RepositoryError> {
        self.fetch_one(&Self::task_key(project_id, phase, task_id))
    }

    async fn list(
        &self,
        project_id: ProjectId,
        phase: Option<Phase>,
    ) -> Result<Vec<BoardTask>, RepositoryError> {
        let prefix = match phase {
            Some(phase) => format!("{}#TASK#{}#", project_id, phase.as_str()),
            None => format!("{}#TASK#", project_id),
        };
        let mut tasks: Vec<BoardTask> = self.scan(&prefix)?;
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }
}

#[async_trait]
impl ChatRepository for SledProjectStore {
    async fn append(
        &self,
        project_id: ProjectId,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let key = Self::chat_key(project_id, message.created_at, &message.id.to_string());
        self.put(key, message)?;
        self.flush().await
    }

    async fn list(&self, project_id: ProjectId) -> Result<Vec<ChatMessage>, RepositoryError> {
        // Key order is time order for chat.
        self.scan(&format!("{}#CHAT#", project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SledProjectStore) {
        let dir = TempDir::new().unwrap();
        let store = SledProjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn ledger_read_defaults_then_round_trips() {
        let (_dir, store) = store();
        let project_id = ProjectId::new();

        let ledger = store.read(project_id).await.unwrap();
        assert_eq!(ledger.project_id, project_id);
        assert!(!store.exists(project_id).await.unwrap());

        let written = TaskLedger::new(project_id, "data-lake", "acme", "owner-1");
        store.write(&written).await.unwrap();
        let read = store.read(project_id).await.unwrap();
        assert_eq!(read.project_name, "data-lake");
        assert_eq!(read.owner_id, "owner-1");
        assert!(store.exists(project_id).await.unwrap());
    }

    #[tokio::test]
    async fn token_store_fetch_delete_cycle() {
        let (_dir, store) = store();
        let project_id = ProjectId::new();
        let token = ApprovalToken::new("resume-token");

        store.store(project_id, Phase::Architecture, &token).await.unwrap();
        assert_eq!(
            store.fetch(project_id, Phase::Architecture).await.unwrap().unwrap().task_token,
            "resume-token"
        );
        // Different phase is a different item.
        assert!(store.fetch(project_id, Phase::Poc).await.unwrap().is_none());

        store.delete(project_id, Phase::Architecture).await.unwrap();
        assert!(store.fetch(project_id, Phase::Architecture).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn interrupt_answer_is_status_gated() {
        let (_dir, store) = store();
        let project_id = ProjectId::new();
        let interrupt = Interrupt::new(InterruptId::new(), Phase::Production, "Budget ceiling?");
        store.create(project_id, &interrupt).await.unwrap();

        assert!(store.fetch_response(project_id, interrupt.id).await.unwrap().is_none());
        let answered = store.answer(project_id, interrupt.id, "$8000/month").await.unwrap();
        assert!(answered.answered_at.is_some());
        assert_eq!(
            store.fetch_response(project_id, interrupt.id).await.unwrap().as_deref(),
            Some("$8000/month")
        );
    }

    #[tokio::test]
    async fn task_scans_are_phase_scoped() {
        let (_dir, store) = store();
        let project_id = ProjectId::new();
        store
            .save(project_id, &BoardTask::new(Phase::Poc, "poc work", "", None))
            .await
            .unwrap();
        store
            .save(project_id, &BoardTask::new(Phase::Production, "prod work", "", None))
            .await
            .unwrap();

        assert_eq!(BoardTaskRepository::list(&store, project_id, None).await.unwrap().len(), 2);
        let poc = BoardTaskRepository::list(&store, project_id, Some(Phase::Poc)).await.unwrap();
        assert_eq!(poc.len(), 1);
        assert_eq!(poc[0].title, "poc work");
        // Other projects see nothing.
        assert!(BoardTaskRepository::list(&store, ProjectId::new(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_listing_is_time_ordered() {
        let (_dir, store) = store();
        let project_id = ProjectId::new();
        for n in 0..3 {
            store
                .append(project_id, &ChatMessage::new("customer", format!("msg {}", n)))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let listed = ChatRepository::list(&store, project_id).await.unwrap();
        let contents: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 0", "msg 1", "msg 2"]);
    }
}
