// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Capability Interface
//!
//! Every collaborator in a session is an opaque capability exposing
//! [`AgentNode::invoke`] and nothing else. Tool wiring, prompts and model
//! clients are constructor-time composition inside each concrete agent and
//! invisible to the session engine. Model clients are injected explicitly;
//! there are no shared mutable singletons.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flat key-value map carried through the session: project id, phase,
/// storage locations. The request-scoped context of a phase run.
pub type SharedContext = HashMap<String, String>;

/// Who produced a transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Task briefings and interrupt resume messages from the orchestrator.
    Orchestrator,
    /// A named agent's turn output.
    Agent(String),
}

/// One line of the running conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Utterance {
    pub fn orchestrator(content: impl Into<String>) -> Self {
        Self { speaker: Speaker::Orchestrator, content: content.into(), at: Utc::now() }
    }

    pub fn agent(name: &str, content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent(name.to_string()),
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Token accounting accumulated across a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Everything an agent sees when it takes the floor.
pub struct TurnInput<'a> {
    /// The task message for this run (initial briefing or interrupt
    /// resume message).
    pub task: &'a str,
    pub context: &'a SharedContext,
    /// The running conversation so far, oldest first.
    pub transcript: &'a [Utterance],
}

/// What an agent decided to do with its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The agent keeps the floor (more tool calls to make).
    Continue { message: String },
    /// Baton pass to another named agent in the same session.
    Handoff { to: String, message: String },
    /// The agent signals the collaboration is done.
    Complete { message: String },
    /// The agent needs customer input; the whole session pauses.
    Interrupt { questions: Vec<String> },
}

/// A completed turn: the outcome plus what it cost.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub outcome: TurnOutcome,
    pub usage: TokenUsage,
}

impl AgentTurn {
    pub fn new(outcome: TurnOutcome) -> Self {
        Self { outcome, usage: TokenUsage::default() }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent transport error: {0}")]
    Transport(String),
    #[error("agent returned a malformed turn: {0}")]
    Malformed(String),
}

/// A named, opaque agent capability.
#[async_trait]
pub trait AgentNode: Send + Sync {
    fn name(&self) -> &str;

    /// Take one turn. The host runtime owns transient LLM retries; an `Err`
    /// here is unrecoverable for the session.
    async fn invoke(&self, input: TurnInput<'_>) -> Result<AgentTurn, AgentError>;
}
