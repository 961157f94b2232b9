// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared test doubles: scripted agents, a recording workflow driver and a
//! counting session factory.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cadence_core::application::workflow_driver::{FailureKind, WorkflowDriver};
use cadence_core::domain::phase::Phase;
use cadence_orchestrator_swarm::application::roster::SessionFactory;
use cadence_orchestrator_swarm::application::session::Session;
use cadence_orchestrator_swarm::domain::agent::{
    AgentError, AgentNode, AgentTurn, TurnInput, TurnOutcome,
};

/// Order in which agents took turns, shared across a session's nodes.
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

/// Tasks each agent saw, run by run.
pub type TaskLog = Arc<Mutex<Vec<String>>>;

/// An agent that plays back a fixed script of turn outcomes, then keeps
/// completing. Records invocations and the task messages it was given.
pub struct ScriptedAgent {
    name: String,
    script: Mutex<VecDeque<TurnOutcome>>,
    invocations: Option<InvocationLog>,
    tasks: TaskLog,
}

impl ScriptedAgent {
    pub fn new(name: &str, script: Vec<TurnOutcome>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(script.into_iter().collect()),
            invocations: None,
            tasks: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn with_logs(name: &str, script: Vec<TurnOutcome>, invocations: InvocationLog, tasks: TaskLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(script.into_iter().collect()),
            invocations: Some(invocations),
            tasks,
        })
    }

    pub fn tasks_seen(&self) -> Vec<String> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentNode for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: TurnInput<'_>) -> Result<AgentTurn, AgentError> {
        if let Some(log) = &self.invocations {
            log.lock().unwrap().push(self.name.clone());
        }
        self.tasks.lock().unwrap().push(input.task.to_string());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TurnOutcome::Complete { message: "done".to_string() });
        Ok(AgentTurn::new(outcome))
    }
}

/// Always hands off to the same peer. Two of these ping-pong forever.
pub struct PingPongAgent {
    name: String,
    peer: String,
}

impl PingPongAgent {
    pub fn new(name: &str, peer: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), peer: peer.to_string() })
    }
}

#[async_trait]
impl AgentNode for PingPongAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _input: TurnInput<'_>) -> Result<AgentTurn, AgentError> {
        Ok(AgentTurn::new(TurnOutcome::Handoff {
            to: self.peer.clone(),
            message: format!("over to {}", self.peer),
        }))
    }
}

/// Fails every turn with a transport error. Records the tasks it was given
/// so recovery preambles can be asserted across attempts.
pub struct FailingAgent {
    name: String,
    tasks: TaskLog,
}

impl FailingAgent {
    pub fn new(name: &str, tasks: TaskLog) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), tasks })
    }
}

#[async_trait]
impl AgentNode for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: TurnInput<'_>) -> Result<AgentTurn, AgentError> {
        self.tasks.lock().unwrap().push(input.task.to_string());
        Err(AgentError::Transport("model endpoint unreachable".to_string()))
    }
}

/// Sleeps through its turn budget.
pub struct SleepyAgent {
    name: String,
    sleep: Duration,
}

impl SleepyAgent {
    pub fn new(name: &str, sleep: Duration) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), sleep })
    }
}

#[async_trait]
impl AgentNode for SleepyAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _input: TurnInput<'_>) -> Result<AgentTurn, AgentError> {
        tokio::time::sleep(self.sleep).await;
        Ok(AgentTurn::new(TurnOutcome::Continue { message: "still thinking".to_string() }))
    }
}

/// Records every outcome report made to the workflow driver.
#[derive(Default)]
pub struct RecordingDriver {
    pub successes: Mutex<Vec<(String, serde_json::Value)>>,
    pub failures: Mutex<Vec<(String, String, String)>>,
}

impl RecordingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}

#[async_trait]
impl WorkflowDriver for RecordingDriver {
    async fn report_success(
        &self,
        task_token: &str,
        payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        self.successes.lock().unwrap().push((task_token.to_string(), payload));
        Ok(())
    }

    async fn report_failure(
        &self,
        task_token: &str,
        kind: FailureKind,
        cause: &str,
    ) -> anyhow::Result<()> {
        self.failures
            .lock()
            .unwrap()
            .push((task_token.to_string(), kind.as_str().to_string(), cause.to_string()));
        Ok(())
    }
}

/// Session factory that counts constructions and delegates to a closure.
pub struct CountingFactory {
    build: Box<dyn Fn() -> anyhow::Result<Session> + Send + Sync>,
    pub constructions: AtomicU32,
}

impl CountingFactory {
    pub fn new(build: impl Fn() -> anyhow::Result<Session> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { build: Box::new(build), constructions: AtomicU32::new(0) })
    }

    pub fn construction_count(&self) -> u32 {
        self.constructions.load(Ordering::SeqCst)
    }
}

impl SessionFactory for CountingFactory {
    fn create(&self, _phase: Phase) -> anyhow::Result<Session> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        (self.build)()
    }
}
