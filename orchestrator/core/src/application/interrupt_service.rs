// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Interrupt Application Service
//!
//! The customer-question lifecycle: raise (persist + broadcast), answer
//! (persist + broadcast), poll. Persist-then-publish ordering throughout —
//! an event may be lost, a record may not.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::ServiceError;
use crate::domain::events::ProjectEvent;
use crate::domain::interrupt::{Interrupt, InterruptId};
use crate::domain::ledger::ProjectId;
use crate::domain::phase::Phase;
use crate::domain::repository::{InterruptRepository, RepositoryError};
use crate::infrastructure::event_bus::ProjectEventBus;

#[derive(Clone)]
pub struct InterruptService {
    interrupts: Arc<dyn InterruptRepository>,
    events: ProjectEventBus,
}

impl InterruptService {
    pub fn new(interrupts: Arc<dyn InterruptRepository>, events: ProjectEventBus) -> Self {
        Self { interrupts, events }
    }

    /// Persist a new PENDING question and broadcast it to the project
    /// channel. Returns the freshly minted interrupt id.
    pub async fn raise(
        &self,
        project_id: ProjectId,
        phase: Phase,
        question: &str,
    ) -> Result<InterruptId, ServiceError> {
        let interrupt = Interrupt::new(InterruptId::new(), phase, question);
        let interrupt_id = interrupt.id;
        self.interrupts.create(project_id, &interrupt).await?;

        info!(project_id = %project_id, interrupt_id = %interrupt_id, "Interrupt raised");
        self.events.publish(ProjectEvent::InterruptRaised {
            project_id,
            phase,
            interrupt_id,
            question: question.to_string(),
            raised_at: Utc::now(),
        });
        Ok(interrupt_id)
    }

    /// Record the customer's answer. Answering an already answered
    /// interrupt overwrites (a correction) and re-broadcasts; the
    /// orchestrator's pending-set guard ensures a correction never triggers
    /// a duplicate session resume.
    pub async fn answer(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
        response: &str,
    ) -> Result<Interrupt, ServiceError> {
        let interrupt = self
            .interrupts
            .answer(project_id, interrupt_id, response)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => ServiceError::InterruptNotFound(interrupt_id),
                other => ServiceError::Repository(other),
            })?;

        info!(project_id = %project_id, interrupt_id = %interrupt_id, "Interrupt answered");
        self.events.publish(ProjectEvent::InterruptAnswered {
            project_id,
            interrupt_id,
            answered_at: interrupt.answered_at.unwrap_or_else(Utc::now),
        });
        Ok(interrupt)
    }

    /// The orchestrator's polling primitive. `None` until the status flips
    /// to ANSWERED.
    pub async fn poll(
        &self,
        project_id: ProjectId,
        interrupt_id: InterruptId,
    ) -> Result<Option<String>, ServiceError> {
        Ok(self.interrupts.fetch_response(project_id, interrupt_id).await?)
    }

    pub async fn list(&self, project_id: ProjectId) -> Result<Vec<Interrupt>, ServiceError> {
        Ok(self.interrupts.list(project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryInterruptRepository;

    fn service() -> (InterruptService, ProjectEventBus) {
        let events = ProjectEventBus::with_default_capacity();
        (
            InterruptService::new(Arc::new(InMemoryInterruptRepository::new()), events.clone()),
            events,
        )
    }

    #[tokio::test]
    async fn raise_then_answer_round_trip() {
        let (service, events) = service();
        let project_id = ProjectId::new();
        let mut receiver = events.subscribe_project(project_id);

        let id = service.raise(project_id, Phase::Poc, "Budget ceiling?").await.unwrap();
        assert!(matches!(receiver.recv().await.unwrap(), ProjectEvent::InterruptRaised { .. }));

        assert!(service.poll(project_id, id).await.unwrap().is_none());
        service.answer(project_id, id, "$8000/month").await.unwrap();
        assert!(matches!(receiver.recv().await.unwrap(), ProjectEvent::InterruptAnswered { .. }));
        assert_eq!(service.poll(project_id, id).await.unwrap().as_deref(), Some("$8000/month"));
    }

    #[tokio::test]
    async fn answering_unknown_interrupt_is_client_error() {
        let (service, _) = service();
        let err = service
            .answer(ProjectId::new(), InterruptId::new(), "hello")
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
