// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Application Service
//!
//! Kanban operations over board tasks. Every mutation broadcasts to the
//! project channel; update broadcasts carry only the caller-supplied
//! fields, never internal timestamps.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::ServiceError;
use crate::domain::board::{BoardTask, BoardTaskUpdate, TaskComment, TaskId};
use crate::domain::events::ProjectEvent;
use crate::domain::ledger::ProjectId;
use crate::domain::phase::Phase;
use crate::domain::repository::BoardTaskRepository;
use crate::infrastructure::event_bus::ProjectEventBus;

#[derive(Clone)]
pub struct BoardService {
    board: Arc<dyn BoardTaskRepository>,
    events: ProjectEventBus,
}

impl BoardService {
    pub fn new(board: Arc<dyn BoardTaskRepository>, events: ProjectEventBus) -> Self {
        Self { board, events }
    }

    pub async fn create(
        &self,
        project_id: ProjectId,
        phase: Phase,
        title: &str,
        description: &str,
        assigned_to: Option<String>,
    ) -> Result<BoardTask, ServiceError> {
        let task = BoardTask::new(phase, title, description, assigned_to);
        self.board.save(project_id, &task).await?;

        info!(project_id = %project_id, task_id = %task.id, "Board task created");
        self.events.publish(ProjectEvent::TaskCreated {
            project_id,
            phase,
            task_id: task.id,
            title: task.title.clone(),
            assigned_to: task.assigned_to.clone(),
            created_at: task.created_at,
        });
        Ok(task)
    }

    /// Apply a raw field map to a task. Only the allow-listed fields are
    /// applied; unknown fields are dropped silently so forward-compatible
    /// callers keep working. The broadcast carries exactly the accepted
    /// caller-supplied fields.
    pub async fn update(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<BoardTask, ServiceError> {
        let (update, accepted) = BoardTaskUpdate::from_fields(fields)?;
        let mut task = self
            .board
            .get(project_id, phase, task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(task_id, phase))?;
        update.apply(&mut task);
        self.board.save(project_id, &task).await?;

        let broadcast_fields: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .filter(|(key, _)| accepted.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.events.publish(ProjectEvent::TaskUpdated {
            project_id,
            phase,
            task_id,
            fields: serde_json::Value::Object(broadcast_fields),
            updated_at: Utc::now(),
        });
        Ok(task)
    }

    /// Append a comment and broadcast it as a synthetic `comment_added`
    /// field update.
    pub async fn add_comment(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
        author: &str,
        content: &str,
    ) -> Result<BoardTask, ServiceError> {
        let mut task = self
            .board
            .get(project_id, phase, task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(task_id, phase))?;
        let comment = TaskComment {
            author: author.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        task.comments.push(comment.clone());
        task.updated_at = comment.created_at;
        self.board.save(project_id, &task).await?;

        self.events.publish(ProjectEvent::TaskUpdated {
            project_id,
            phase,
            task_id,
            fields: serde_json::json!({
                "comment_added": { "author": comment.author, "content": comment.content },
            }),
            updated_at: comment.created_at,
        });
        Ok(task)
    }

    pub async fn list(
        &self,
        project_id: ProjectId,
        phase: Option<Phase>,
    ) -> Result<Vec<BoardTask>, ServiceError> {
        Ok(self.board.list(project_id, phase).await?)
    }

    pub async fn get(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_id: TaskId,
    ) -> Result<Option<BoardTask>, ServiceError> {
        Ok(self.board.get(project_id, phase, task_id).await?)
    }
}
