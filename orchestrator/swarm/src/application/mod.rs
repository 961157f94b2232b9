// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod orchestrator;
pub mod roster;
pub mod session;

pub use orchestrator::{OrchestratorConfig, PhaseOrchestrator};
pub use roster::{
    roster_for, AgentProvider, AgentRole, PhaseRoster, RosterSessionFactory, SessionFactory,
};
pub use session::Session;
