// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Collaborative Session Engine
//!
//! Executes a bounded, handoff-driven conversation between agent nodes
//! toward a terminal status. Turns are strictly sequential: at most one
//! node is active at a time, and a handoff is a baton pass, never parallel
//! execution. The turn loop is an explicit iteration, never recursion.
//!
//! # Safety limits
//!
//! - `max_handoffs` / `max_iterations` hard ceilings,
//! - per-node and whole-run wall-clock timeouts,
//! - repetitive-handoff detection: a sliding window over the last N
//!   active-node transitions; when a full window contains fewer distinct
//!   agents than the configured minimum, the session is failed fast. Two
//!   agents can each behave correctly in isolation yet hand off to each
//!   other forever; the window catches that long before the hard ceiling,
//!   while still allowing legitimate validate-fix cycles shorter than the
//!   window.
//!
//! # Interrupts
//!
//! When a node raises an interrupt the whole session pauses in
//! `Interrupted` status, exposing the pending questions. The caller
//! supplies answers by invoking [`Session::run`] again on the *same*
//! instance with a follow-up task message; handoff count, node history and
//! transcript are preserved — a resume is not a fresh run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::agent::{AgentNode, AgentTurn, SharedContext, TokenUsage, TurnInput, TurnOutcome, Utterance};
use crate::domain::observer::SessionObserver;
use crate::domain::session::{
    NodeTransition, SessionConfig, SessionError, SessionId, SessionResult, SessionStatus,
};

pub struct Session {
    id: SessionId,
    nodes: HashMap<String, Arc<dyn AgentNode>>,
    entry: String,
    config: SessionConfig,
    observers: Vec<Arc<dyn SessionObserver>>,
    status: SessionStatus,
    active: String,
    transcript: Vec<Utterance>,
    node_history: Vec<NodeTransition>,
    /// Last `repetitive_handoff_window` handoff targets.
    transition_window: VecDeque<String>,
    /// Node name → its most recent turn message.
    last_turns: HashMap<String, String>,
    handoffs: u32,
    iterations: u32,
    /// Wall clock consumed by previous `run` calls (interrupt resumes).
    consumed: Duration,
    usage: TokenUsage,
    pending_questions: Vec<String>,
}

impl Session {
    /// Build a session from an ordered set of named nodes and a designated
    /// entry node. The session starts in `Ready` status.
    pub fn new(
        nodes: Vec<Arc<dyn AgentNode>>,
        entry: &str,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        if nodes.is_empty() {
            return Err(SessionError::NoNodes);
        }
        let mut by_name: HashMap<String, Arc<dyn AgentNode>> = HashMap::new();
        for node in nodes {
            let name = node.name().to_string();
            if by_name.insert(name.clone(), node).is_some() {
                return Err(SessionError::DuplicateNode(name));
            }
        }
        if !by_name.contains_key(entry) {
            return Err(SessionError::UnknownEntryNode(entry.to_string()));
        }
        Ok(Self {
            id: SessionId::new(),
            nodes: by_name,
            entry: entry.to_string(),
            config,
            observers: Vec::new(),
            status: SessionStatus::Ready,
            active: entry.to_string(),
            transcript: Vec::new(),
            node_history: Vec::new(),
            transition_window: VecDeque::new(),
            last_turns: HashMap::new(),
            handoffs: 0,
            iterations: 0,
            consumed: Duration::ZERO,
            usage: TokenUsage::default(),
            pending_questions: Vec::new(),
        })
    }

    /// Attach an observer. Observer failures never affect the session.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn handoff_count(&self) -> u32 {
        self.handoffs
    }

    pub fn iteration_count(&self) -> u32 {
        self.iterations
    }

    /// Questions awaiting the customer while `Interrupted`.
    pub fn pending_questions(&self) -> &[String] {
        &self.pending_questions
    }

    /// Most recent turn message per node.
    pub fn last_turn(&self, node: &str) -> Option<&str> {
        self.last_turns.get(node).map(String::as_str)
    }

    /// Drive the session until it completes, fails or pauses on an
    /// interrupt.
    ///
    /// Runnable from `Ready` (fresh run, starting at the entry node) and
    /// from `Interrupted` (resume at the node that paused, with `task`
    /// carrying the answered questions). Any other status is an error.
    pub async fn run(
        &mut self,
        task: &str,
        context: &SharedContext,
    ) -> Result<SessionResult, SessionError> {
        match self.status {
            SessionStatus::Ready => {
                self.active = self.entry.clone();
                self.node_history.push(NodeTransition { node: self.entry.clone(), at: Utc::now() });
            }
            SessionStatus::Interrupted => {
                self.pending_questions.clear();
            }
            other => return Err(SessionError::NotResumable(other)),
        }
        self.status = SessionStatus::Running;
        self.transcript.push(Utterance::orchestrator(task));
        info!(session_id = %self.id, entry = %self.active, "Session run started");

        let started = Instant::now();
        loop {
            let elapsed = self.consumed + started.elapsed();
            if elapsed >= self.config.execution_timeout {
                return Ok(self.finish_failed(
                    started,
                    format!("execution timeout exceeded ({:?})", self.config.execution_timeout),
                ));
            }
            if self.iterations >= self.config.max_iterations {
                return Ok(self.finish_failed(
                    started,
                    format!("iteration limit exceeded ({})", self.config.max_iterations),
                ));
            }

            let Some(node) = self.nodes.get(&self.active).cloned() else {
                return Ok(self.finish_failed(
                    started,
                    format!("active node '{}' is not part of this session", self.active),
                ));
            };

            let remaining = self.config.execution_timeout.saturating_sub(elapsed);
            let turn_budget = self.config.per_node_timeout.min(remaining);
            self.notify_node_start(&self.active);

            // Bind the awaited result before matching so the turn future's
            // borrow of the transcript ends here, not at the match's end.
            let invoked = {
                let input = TurnInput { task, context, transcript: &self.transcript };
                tokio::time::timeout(turn_budget, node.invoke(input)).await
            };
            let turn: AgentTurn = match invoked {
                Ok(Ok(turn)) => turn,
                Ok(Err(e)) => {
                    return Ok(self.finish_failed(
                        started,
                        format!("node '{}' failed: {}", self.active, e),
                    ));
                }
                Err(_) => {
                    let reason = if turn_budget < self.config.per_node_timeout {
                        format!(
                            "execution timeout exceeded while node '{}' was active",
                            self.active
                        )
                    } else {
                        format!(
                            "node '{}' timed out after {:?}",
                            self.active, self.config.per_node_timeout
                        )
                    };
                    return Ok(self.finish_failed(started, reason));
                }
            };

            self.iterations += 1;
            self.usage.add(&turn.usage);
            self.record_turn(&turn.outcome);
            self.notify_node_complete(&self.active, &turn.outcome);

            match turn.outcome {
                TurnOutcome::Continue { .. } => {
                    debug!(session_id = %self.id, node = %self.active, "Node keeps the floor");
                }
                TurnOutcome::Complete { message } => {
                    self.consumed += started.elapsed();
                    self.status = SessionStatus::Completed;
                    info!(session_id = %self.id, node = %self.active, "Session completed");
                    let result = self.result_with_output(message, None);
                    self.notify_session_complete(&result);
                    return Ok(result);
                }
                TurnOutcome::Interrupt { questions } => {
                    if questions.is_empty() {
                        return Ok(self.finish_failed(
                            started,
                            format!("node '{}' raised an interrupt with no questions", self.active),
                        ));
                    }
                    self.consumed += started.elapsed();
                    self.status = SessionStatus::Interrupted;
                    self.pending_questions = questions;
                    info!(
                        session_id = %self.id,
                        node = %self.active,
                        questions = self.pending_questions.len(),
                        "Session interrupted pending customer input"
                    );
                    return Ok(self.result_with_output(String::new(), None));
                }
                TurnOutcome::Handoff { to, .. } => {
                    if !self.nodes.contains_key(&to) {
                        return Ok(self.finish_failed(
                            started,
                            format!("handoff to unknown node '{}' from '{}'", to, self.active),
                        ));
                    }
                    self.handoffs += 1;
                    if self.handoffs > self.config.max_handoffs {
                        return Ok(self.finish_failed(
                            started,
                            format!("handoff limit exceeded ({})", self.config.max_handoffs),
                        ));
                    }
                    self.transition_window.push_back(to.clone());
                    while self.transition_window.len() > self.config.repetitive_handoff_window {
                        self.transition_window.pop_front();
                    }
                    if self.transition_window.len() == self.config.repetitive_handoff_window {
                        let distinct: HashSet<&String> = self.transition_window.iter().collect();
                        if distinct.len() < self.config.repetitive_handoff_min_unique {
                            return Ok(self.finish_failed(
                                started,
                                format!(
                                    "repetitive handoff loop detected: {} distinct agents in the last {} handoffs",
                                    distinct.len(),
                                    self.config.repetitive_handoff_window
                                ),
                            ));
                        }
                    }
                    debug!(session_id = %self.id, from = %self.active, to = %to, "Handoff");
                    self.node_history.push(NodeTransition { node: to.clone(), at: Utc::now() });
                    self.active = to;
                }
            }
        }
    }

    fn record_turn(&mut self, outcome: &TurnOutcome) {
        let content = match outcome {
            TurnOutcome::Continue { message }
            | TurnOutcome::Handoff { message, .. }
            | TurnOutcome::Complete { message } => message.clone(),
            TurnOutcome::Interrupt { questions } => {
                format!("requesting customer input: {}", questions.join("; "))
            }
        };
        self.last_turns.insert(self.active.clone(), content.clone());
        self.transcript.push(Utterance::agent(&self.active, content));
    }

    fn finish_failed(&mut self, started: Instant, reason: String) -> SessionResult {
        self.consumed += started.elapsed();
        self.status = SessionStatus::Failed;
        warn!(session_id = %self.id, node = %self.active, reason = %reason, "Session failed");
        let output = self.last_turns.get(&self.active).cloned().unwrap_or_default();
        let result = self.result_with_output(output, Some(reason));
        self.notify_session_complete(&result);
        result
    }

    fn result_with_output(&self, output: String, failure_reason: Option<String>) -> SessionResult {
        SessionResult {
            status: self.status,
            output,
            accumulated_usage: self.usage,
            node_history: self.node_history.clone(),
            failure_reason,
            pending_questions: self.pending_questions.clone(),
        }
    }

    fn notify_node_start(&self, node: &str) {
        for observer in &self.observers {
            if let Err(e) = observer.on_node_start(self.id, node) {
                warn!(session_id = %self.id, "Observer on_node_start failed: {:#}", e);
            }
        }
    }

    fn notify_node_complete(&self, node: &str, outcome: &TurnOutcome) {
        for observer in &self.observers {
            if let Err(e) = observer.on_node_complete(self.id, node, outcome) {
                warn!(session_id = %self.id, "Observer on_node_complete failed: {:#}", e);
            }
        }
    }

    fn notify_session_complete(&self, result: &SessionResult) {
        for observer in &self.observers {
            if let Err(e) = observer.on_session_complete(self.id, result) {
                warn!(session_id = %self.id, "Observer on_session_complete failed: {:#}", e);
            }
        }
    }
}
