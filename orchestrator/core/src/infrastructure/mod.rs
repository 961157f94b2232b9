// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod repositories;
pub mod workflow_client;

pub use event_bus::{EventBusError, ProjectEventBus};
pub use repositories::ProjectStores;
