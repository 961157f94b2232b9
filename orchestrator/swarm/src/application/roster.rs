// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Phase Rosters
//!
//! The static phase → agent-roster mapping and the per-phase session
//! limits. Two-agent phases run a tighter repetitive-handoff window than
//! multi-agent phases; both sets of values are tuning, not semantics, and
//! can be overridden through [`SessionConfig`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use cadence_core::domain::phase::Phase;

use crate::application::session::Session;
use crate::domain::agent::AgentNode;
use crate::domain::observer::SessionObserver;
use crate::domain::session::SessionConfig;

/// The specialist roles an engagement team is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    ProjectManager,
    SolutionsArchitect,
    Developer,
    Infra,
    Security,
    Qa,
    Data,
}

impl AgentRole {
    /// The node name this role registers under in a session.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentRole::ProjectManager => "pm",
            AgentRole::SolutionsArchitect => "solutions-architect",
            AgentRole::Developer => "developer",
            AgentRole::Infra => "infra",
            AgentRole::Security => "security",
            AgentRole::Qa => "qa",
            AgentRole::Data => "data",
        }
    }
}

/// The agent set, entry agent and tuned limits for one phase.
#[derive(Debug, Clone)]
pub struct PhaseRoster {
    pub roles: Vec<AgentRole>,
    pub entry: AgentRole,
    pub limits: SessionConfig,
}

fn two_agent_limits(execution_timeout: Duration) -> SessionConfig {
    SessionConfig {
        max_handoffs: 10,
        max_iterations: 24,
        execution_timeout,
        per_node_timeout: Duration::from_secs(180),
        repetitive_handoff_window: 6,
        repetitive_handoff_min_unique: 2,
    }
}

fn team_limits(max_handoffs: u32, execution_timeout: Duration) -> SessionConfig {
    SessionConfig {
        max_handoffs,
        max_iterations: 48,
        execution_timeout,
        per_node_timeout: Duration::from_secs(300),
        repetitive_handoff_window: 8,
        repetitive_handoff_min_unique: 3,
    }
}

/// The static roster for a phase.
pub fn roster_for(phase: Phase) -> PhaseRoster {
    use AgentRole::*;
    match phase {
        Phase::Discovery => PhaseRoster {
            roles: vec![ProjectManager, SolutionsArchitect],
            entry: ProjectManager,
            limits: two_agent_limits(Duration::from_secs(900)),
        },
        Phase::Architecture => PhaseRoster {
            roles: vec![SolutionsArchitect, Infra, Security],
            entry: SolutionsArchitect,
            limits: team_limits(15, Duration::from_secs(1800)),
        },
        Phase::Poc => PhaseRoster {
            roles: vec![Developer, Infra, Data, Security, SolutionsArchitect],
            entry: Developer,
            limits: team_limits(20, Duration::from_secs(2700)),
        },
        Phase::Production => PhaseRoster {
            roles: vec![Developer, Infra, Data, Security, Qa],
            entry: Developer,
            limits: team_limits(20, Duration::from_secs(3600)),
        },
        Phase::Handoff => PhaseRoster {
            roles: vec![ProjectManager, SolutionsArchitect],
            entry: ProjectManager,
            limits: two_agent_limits(Duration::from_secs(900)),
        },
    }
}

/// Supplies a concrete agent for a role. Tool wiring and model clients are
/// the provider's concern.
pub trait AgentProvider: Send + Sync {
    fn agent(&self, role: AgentRole) -> Result<Arc<dyn AgentNode>>;
}

/// Builds fresh session instances. The orchestrator constructs a brand-new
/// session per retry attempt — a failed session's conversation state is
/// never reused.
pub trait SessionFactory: Send + Sync {
    fn create(&self, phase: Phase) -> Result<Session>;
}

/// Roster-backed session factory.
pub struct RosterSessionFactory {
    provider: Arc<dyn AgentProvider>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl RosterSessionFactory {
    pub fn new(provider: Arc<dyn AgentProvider>) -> Self {
        Self { provider, observers: Vec::new() }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl SessionFactory for RosterSessionFactory {
    fn create(&self, phase: Phase) -> Result<Session> {
        let roster = roster_for(phase);
        let mut nodes = Vec::with_capacity(roster.roles.len());
        for role in &roster.roles {
            let node = self
                .provider
                .agent(*role)
                .with_context(|| format!("no agent available for role {:?}", role))?;
            nodes.push(node);
        }
        let mut session = Session::new(nodes, roster.entry.agent_name(), roster.limits)
            .context("failed to assemble session")?;
        for observer in &self.observers {
            session = session.with_observer(observer.clone());
        }
        Ok(session)
    }
}
