// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Ledger Application Service
//!
//! Read-modify-write operations over the task ledger. The ledger has a
//! single logical writer (the PM role), so whole-object writes are safe;
//! this service is where that convention is exercised.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::ServiceError;
use crate::domain::events::ProjectEvent;
use crate::domain::ledger::{Deliverable, LedgerEntry, LedgerSection, ProjectId, TaskLedger};
use crate::domain::phase::{Phase, PhaseStatus};
use crate::domain::repository::LedgerRepository;
use crate::infrastructure::event_bus::ProjectEventBus;

#[derive(Clone)]
pub struct LedgerService {
    ledgers: Arc<dyn LedgerRepository>,
    events: ProjectEventBus,
}

impl LedgerService {
    pub fn new(ledgers: Arc<dyn LedgerRepository>, events: ProjectEventBus) -> Self {
        Self { ledgers, events }
    }

    pub async fn read(&self, project_id: ProjectId) -> Result<TaskLedger, ServiceError> {
        Ok(self.ledgers.read(project_id).await?)
    }

    pub async fn write(&self, ledger: &TaskLedger) -> Result<(), ServiceError> {
        Ok(self.ledgers.write(ledger).await?)
    }

    pub async fn exists(&self, project_id: ProjectId) -> Result<bool, ServiceError> {
        Ok(self.ledgers.exists(project_id).await?)
    }

    /// Append one validated entry to a named section. The section name is
    /// caller-supplied text; unknown names are rejected, as is an entry
    /// whose shape does not match the section. Returns the updated ledger
    /// so the caller can report current counts.
    pub async fn append_to_section(
        &self,
        project_id: ProjectId,
        section_name: &str,
        entry: LedgerEntry,
    ) -> Result<TaskLedger, ServiceError> {
        let section: LedgerSection = section_name.parse()?;
        let mut ledger = self.ledgers.read(project_id).await?;
        ledger.append(section, entry)?;
        self.ledgers.write(&ledger).await?;

        let total_entries = ledger.section_len(section);
        info!(project_id = %project_id, section = %section, total_entries, "Ledger section appended");
        self.events.publish(ProjectEvent::LedgerAppended {
            project_id,
            section: section.as_str().to_string(),
            total_entries,
            appended_at: Utc::now(),
        });
        Ok(ledger)
    }

    /// Replace (not merge) the deliverable list for one phase.
    pub async fn update_deliverables(
        &self,
        project_id: ProjectId,
        phase: Phase,
        items: Vec<Deliverable>,
    ) -> Result<TaskLedger, ServiceError> {
        let mut ledger = self.ledgers.read(project_id).await?;
        let count = items.len();
        ledger.set_deliverables(phase, items);
        self.ledgers.write(&ledger).await?;

        self.events.publish(ProjectEvent::DeliverablesUpdated {
            project_id,
            phase,
            count,
            updated_at: Utc::now(),
        });
        Ok(ledger)
    }

    /// Move the project to a phase/status pair and broadcast the change.
    pub async fn set_phase_status(
        &self,
        project_id: ProjectId,
        phase: Phase,
        status: PhaseStatus,
    ) -> Result<(), ServiceError> {
        let mut ledger = self.ledgers.read(project_id).await?;
        ledger.set_phase(phase, status);
        self.ledgers.write(&ledger).await?;

        info!(project_id = %project_id, phase = %phase, status = %status, "Phase status changed");
        self.events.publish(ProjectEvent::PhaseStatusChanged {
            project_id,
            phase,
            status,
            changed_at: Utc::now(),
        });
        Ok(())
    }

    /// Deterministic text briefing of the current ledger state, used to
    /// prime agents at the start of a phase.
    pub async fn format(&self, project_id: ProjectId) -> Result<String, ServiceError> {
        let ledger = self.ledgers.read(project_id).await?;
        Ok(ledger.render_briefing())
    }
}
