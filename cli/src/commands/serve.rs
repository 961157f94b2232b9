// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `cadence serve` — run the customer API server over the embedded
//! project store.

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;

use cadence_core::application::{ApprovalService, BoardService, InterruptService, LedgerService};
use cadence_core::domain::repository::StorageBackend;
use cadence_core::infrastructure::event_bus::ProjectEventBus;
use cadence_core::infrastructure::repositories::ProjectStores;
use cadence_core::infrastructure::workflow_client::HttpWorkflowDriver;
use cadence_core::presentation::api::{self, AppState};

use crate::config::CadenceConfig;

pub async fn run(config: &CadenceConfig) -> Result<()> {
    let backend = StorageBackend::Sled(config.data_dir.join("store"));
    let stores = ProjectStores::open(&backend).context("failed to open project store")?;
    let events = ProjectEventBus::with_default_capacity();
    let driver = Arc::new(HttpWorkflowDriver::new(&config.driver_endpoint));

    let state = Arc::new(AppState {
        ledgers: LedgerService::new(stores.ledgers.clone(), events.clone()),
        approvals: ApprovalService::new(stores.approvals.clone()),
        interrupts: InterruptService::new(stores.interrupts.clone(), events.clone()),
        board: BoardService::new(stores.board.clone(), events.clone()),
        chat: stores.chat.clone(),
        events,
        driver,
    });
    let app = api::app(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, data_dir = %config.data_dir.display(), "Customer API listening");
    axum::serve(listener, app).await.context("API server terminated")?;
    Ok(())
}
