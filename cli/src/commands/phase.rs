// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `cadence phase` — execute one delivery phase as a worker and report the
//! outcome to the workflow driver through its resume token.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use cadence_core::application::{InterruptService, LedgerService};
use cadence_core::domain::ledger::ProjectId;
use cadence_core::domain::phase::Phase;
use cadence_core::domain::repository::StorageBackend;
use cadence_core::infrastructure::event_bus::ProjectEventBus;
use cadence_core::infrastructure::repositories::ProjectStores;
use cadence_core::infrastructure::workflow_client::HttpWorkflowDriver;
use cadence_swarm::application::orchestrator::PhaseOrchestrator;
use cadence_swarm::application::roster::RosterSessionFactory;
use cadence_swarm::infrastructure::http_agent::HttpAgentProvider;

use crate::config::CadenceConfig;

pub async fn run(
    config: &CadenceConfig,
    project_id: ProjectId,
    phase: Phase,
    task_token: &str,
    customer_feedback: Option<&str>,
) -> Result<()> {
    let backend = StorageBackend::Sled(config.data_dir.join("store"));
    let stores = ProjectStores::open(&backend).context("failed to open project store")?;
    let events = ProjectEventBus::with_default_capacity();
    let driver = Arc::new(HttpWorkflowDriver::new(&config.driver_endpoint));

    let provider = Arc::new(HttpAgentProvider::new(&config.agent_endpoint));
    let factory = Arc::new(RosterSessionFactory::new(provider));
    let orchestrator = PhaseOrchestrator::new(
        factory,
        driver,
        LedgerService::new(stores.ledgers.clone(), events.clone()),
        InterruptService::new(stores.interrupts.clone(), events.clone()),
        events,
        config.orchestrator_config(),
    );

    info!(project_id = %project_id, phase = %phase, "Phase worker starting");
    orchestrator
        .execute(project_id, phase, task_token, customer_feedback)
        .await
        .context("phase execution failed to report an outcome")?;
    Ok(())
}
