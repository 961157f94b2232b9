// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP Agent Client
//!
//! `AgentNode` backed by an external agent runtime service. The session
//! engine never sees the transport: a node is invoked with the task,
//! shared context and transcript, and the runtime's JSON reply maps onto a
//! turn outcome.
//!
//! # Reply Contract
//!
//! ```json
//! {
//!   "message": "...",
//!   "handoff_to": "security",        // optional
//!   "interrupt_questions": ["..."],  // optional, wins over handoff
//!   "done": false,
//!   "input_tokens": 0,
//!   "output_tokens": 0
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::roster::{AgentProvider, AgentRole};
use crate::domain::agent::{
    AgentError, AgentNode, AgentTurn, Speaker, TokenUsage, TurnInput, TurnOutcome,
};

use std::sync::Arc;

pub struct HttpAgentNode {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    agent: &'a str,
    task: &'a str,
    context: &'a std::collections::HashMap<String, String>,
    transcript: Vec<TranscriptLine<'a>>,
}

#[derive(Serialize)]
struct TranscriptLine<'a> {
    speaker: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    handoff_to: Option<String>,
    #[serde(default)]
    interrupt_questions: Vec<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl HttpAgentNode {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AgentNode for HttpAgentNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: TurnInput<'_>) -> Result<AgentTurn, AgentError> {
        let transcript: Vec<TranscriptLine<'_>> = input
            .transcript
            .iter()
            .map(|u| TranscriptLine {
                speaker: match &u.speaker {
                    Speaker::Orchestrator => "orchestrator",
                    Speaker::Agent(name) => name.as_str(),
                },
                content: &u.content,
            })
            .collect();
        let request = InvokeRequest {
            agent: &self.name,
            task: input.task,
            context: input.context,
            transcript,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        let reply: InvokeResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Malformed(e.to_string()))?;

        let outcome = if !reply.interrupt_questions.is_empty() {
            TurnOutcome::Interrupt { questions: reply.interrupt_questions }
        } else if let Some(to) = reply.handoff_to {
            TurnOutcome::Handoff { to, message: reply.message }
        } else if reply.done {
            TurnOutcome::Complete { message: reply.message }
        } else {
            TurnOutcome::Continue { message: reply.message }
        };
        Ok(AgentTurn {
            outcome,
            usage: TokenUsage {
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
            },
        })
    }
}

/// Provides one [`HttpAgentNode`] per roster role, all served by the same
/// agent runtime base endpoint.
pub struct HttpAgentProvider {
    base: String,
}

impl HttpAgentProvider {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into().trim_end_matches('/').to_string() }
    }
}

impl AgentProvider for HttpAgentProvider {
    fn agent(&self, role: AgentRole) -> anyhow::Result<Arc<dyn AgentNode>> {
        let name = role.agent_name();
        Ok(Arc::new(HttpAgentNode::new(
            name,
            format!("{}/agents/{}/invoke", self.base, name),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_wins_over_handoff_in_reply_mapping() {
        let reply = InvokeResponse {
            message: "need input".into(),
            handoff_to: Some("security".into()),
            interrupt_questions: vec!["Budget?".into()],
            done: false,
            input_tokens: 0,
            output_tokens: 0,
        };
        // Mirror of the mapping in `invoke`.
        let outcome = if !reply.interrupt_questions.is_empty() {
            TurnOutcome::Interrupt { questions: reply.interrupt_questions }
        } else if let Some(to) = reply.handoff_to {
            TurnOutcome::Handoff { to, message: reply.message }
        } else if reply.done {
            TurnOutcome::Complete { message: reply.message }
        } else {
            TurnOutcome::Continue { message: reply.message }
        };
        assert!(matches!(outcome, TurnOutcome::Interrupt { .. }));
    }

    #[test]
    fn provider_builds_role_scoped_endpoints() {
        let provider = HttpAgentProvider::new("http://runtime:9000/");
        let agent = provider.agent(AgentRole::Security).unwrap();
        assert_eq!(agent.name(), "security");
    }
}
