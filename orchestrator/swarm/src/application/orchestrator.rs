// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Phase Orchestrator
//!
//! Turns a (project, phase, resume token) triple into exactly one outcome
//! report to the external workflow driver, applying retry and recovery
//! policy around the collaborative session:
//!
//! - a FAILED session (or a run error) is retried a bounded number of
//!   times, each attempt on a **brand-new** session instance with a
//!   recovery preamble telling agents to check persisted state before
//!   redoing work — a fresh session has no memory of the prior attempt;
//!   partial progress lives in the ledger and artifact storage;
//! - an INTERRUPTED session enters the interrupt sub-protocol (persist
//!   questions, broadcast, poll for answers, resume the **same** instance)
//!   and does not consume a retry;
//! - an interrupt poll timeout is fatal and reported distinctly: a silent
//!   customer is not a transient failure;
//! - mid-retry failures stay invisible to the customer; only the final
//!   outcome is reported.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tokio::time::Instant;
use tracing::{info, warn};

use cadence_core::application::workflow_driver::{truncate_cause, FailureKind, WorkflowDriver};
use cadence_core::application::{InterruptService, LedgerService, ServiceError};
use cadence_core::domain::events::ProjectEvent;
use cadence_core::domain::interrupt::InterruptId;
use cadence_core::domain::ledger::ProjectId;
use cadence_core::domain::phase::{Phase, PhaseStatus};
use cadence_core::infrastructure::event_bus::ProjectEventBus;

use crate::application::roster::SessionFactory;
use crate::domain::agent::SharedContext;
use crate::domain::session::SessionStatus;

/// Prepended to the task on every attempt after the first.
const RECOVERY_PREAMBLE: &str = "A previous attempt at this phase did not complete. Before doing \
any work, check the project ledger and stored artifacts for progress that already exists, and \
continue from there instead of redoing it.";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Extra attempts after the first (default 2: three sessions total).
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub interrupt_poll_interval: Duration,
    /// How long the customer gets to answer a pause before the phase is
    /// failed as `InterruptTimeout`.
    pub interrupt_poll_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff: Duration::from_secs(10),
            interrupt_poll_interval: Duration::from_secs(15),
            interrupt_poll_timeout: Duration::from_secs(3600),
        }
    }
}

pub struct PhaseOrchestrator {
    factory: Arc<dyn SessionFactory>,
    driver: Arc<dyn WorkflowDriver>,
    ledgers: LedgerService,
    interrupts: InterruptService,
    events: ProjectEventBus,
    config: OrchestratorConfig,
}

enum InterruptWaitError {
    /// The customer went silent past the poll timeout.
    TimedOut { unanswered: usize },
    /// The interrupt store itself failed (treated as transient).
    Store(ServiceError),
}

impl PhaseOrchestrator {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        driver: Arc<dyn WorkflowDriver>,
        ledgers: LedgerService,
        interrupts: InterruptService,
        events: ProjectEventBus,
        config: OrchestratorConfig,
    ) -> Self {
        Self { factory, driver, ledgers, interrupts, events, config }
    }

    /// Execute one phase to a terminal outcome and report it to the
    /// workflow driver — exactly once per call, regardless of internal
    /// retries.
    pub async fn execute(
        &self,
        project_id: ProjectId,
        phase: Phase,
        resume_token: &str,
        customer_feedback: Option<&str>,
    ) -> Result<()> {
        self.ledgers
            .set_phase_status(project_id, phase, PhaseStatus::InProgress)
            .await
            .context("failed to mark phase in progress")?;
        let briefing = self
            .ledgers
            .format(project_id)
            .await
            .context("failed to load ledger briefing")?;
        let base_task = build_phase_task(project_id, phase, &briefing, customer_feedback);

        let mut context: SharedContext = HashMap::new();
        context.insert("project_id".to_string(), project_id.to_string());
        context.insert("phase".to_string(), phase.as_str().to_string());

        let mut last_error = String::from("no attempts executed");
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
            let task = if attempt > 0 {
                format!("{}\n\n{}", RECOVERY_PREAMBLE, base_task)
            } else {
                base_task.clone()
            };

            // Never reuse a failed session: its conversation state may be
            // corrupted or inconsistent.
            let mut session = match self.factory.create(phase) {
                Ok(session) => session,
                Err(e) => {
                    last_error = format!("session construction failed: {:#}", e);
                    warn!(project_id = %project_id, attempt, error = %last_error, "Phase attempt failed");
                    continue;
                }
            };
            info!(
                project_id = %project_id,
                phase = %phase,
                session_id = %session.id(),
                attempt,
                "Phase attempt started"
            );

            let mut next_message = task;
            loop {
                let result = match session.run(&next_message, &context).await {
                    Ok(result) => result,
                    Err(e) => {
                        last_error = format!("session run error: {}", e);
                        break;
                    }
                };
                match result.status {
                    SessionStatus::Completed => {
                        self.events.publish(ProjectEvent::PhaseCompleted {
                            project_id,
                            phase,
                            completed_at: Utc::now(),
                        });
                        self.driver
                            .report_success(
                                resume_token,
                                json!({
                                    "project_id": project_id,
                                    "phase": phase,
                                    "output": result.output,
                                    "handoffs": session.handoff_count(),
                                    "usage": result.accumulated_usage,
                                }),
                            )
                            .await
                            .context("failed to report phase success")?;
                        info!(project_id = %project_id, phase = %phase, "Phase completed");
                        return Ok(());
                    }
                    SessionStatus::Interrupted => {
                        // Customer-visible: the phase is blocked on them,
                        // not broken.
                        self.mark_status(project_id, phase, PhaseStatus::Blocked).await;
                        match self
                            .collect_answers(project_id, phase, &result.pending_questions)
                            .await
                        {
                            Ok(resume_message) => {
                                // Same session instance, internal state intact.
                                self.mark_status(project_id, phase, PhaseStatus::InProgress).await;
                                next_message = resume_message;
                                continue;
                            }
                            Err(InterruptWaitError::TimedOut { unanswered }) => {
                                let cause = format!(
                                    "customer did not answer {} interrupt question(s) within {:?}",
                                    unanswered, self.config.interrupt_poll_timeout
                                );
                                self.mark_status(project_id, phase, PhaseStatus::Failed).await;
                                self.events.publish(ProjectEvent::PhaseFailed {
                                    project_id,
                                    phase,
                                    reason: cause.clone(),
                                    failed_at: Utc::now(),
                                });
                                self.driver
                                    .report_failure(resume_token, FailureKind::InterruptTimeout, &cause)
                                    .await
                                    .context("failed to report interrupt timeout")?;
                                warn!(project_id = %project_id, phase = %phase, "Interrupt poll timed out");
                                return Ok(());
                            }
                            Err(InterruptWaitError::Store(e)) => {
                                last_error = format!("interrupt store failure: {}", e);
                                break;
                            }
                        }
                    }
                    SessionStatus::Failed => {
                        last_error = result
                            .failure_reason
                            .unwrap_or_else(|| "session failed without a reason".to_string());
                        break;
                    }
                    other => {
                        last_error = format!("session ended in unexpected status {:?}", other);
                        break;
                    }
                }
            }
            warn!(project_id = %project_id, phase = %phase, attempt, error = %last_error, "Phase attempt failed");
        }

        self.mark_status(project_id, phase, PhaseStatus::Failed).await;
        self.events.publish(ProjectEvent::PhaseFailed {
            project_id,
            phase,
            reason: last_error.clone(),
            failed_at: Utc::now(),
        });
        self.driver
            .report_failure(
                resume_token,
                FailureKind::PhaseExecutionFailed,
                truncate_cause(&last_error),
            )
            .await
            .context("failed to report phase failure")?;
        Ok(())
    }

    /// Best-effort customer-visible status update. A dashboard-only status
    /// write must never change the phase outcome.
    async fn mark_status(&self, project_id: ProjectId, phase: Phase, status: PhaseStatus) {
        if let Err(e) = self.ledgers.set_phase_status(project_id, phase, status).await {
            warn!(project_id = %project_id, phase = %phase, "Failed to update phase status: {}", e);
        }
    }

    /// The interrupt sub-protocol: persist each question under a fresh id,
    /// broadcast it, then poll until every id is answered or the poll
    /// timeout elapses. Only ids minted here are polled, so a later
    /// correction to an answered interrupt can never trigger a second
    /// resume.
    async fn collect_answers(
        &self,
        project_id: ProjectId,
        phase: Phase,
        questions: &[String],
    ) -> Result<String, InterruptWaitError> {
        let mut raised: Vec<(InterruptId, String)> = Vec::with_capacity(questions.len());
        for question in questions {
            let interrupt_id = self
                .interrupts
                .raise(project_id, phase, question)
                .await
                .map_err(InterruptWaitError::Store)?;
            raised.push((interrupt_id, question.clone()));
        }

        let deadline = Instant::now() + self.config.interrupt_poll_timeout;
        let mut answers: HashMap<InterruptId, String> = HashMap::new();
        loop {
            for (interrupt_id, _) in &raised {
                if answers.contains_key(interrupt_id) {
                    continue;
                }
                if let Some(response) = self
                    .interrupts
                    .poll(project_id, *interrupt_id)
                    .await
                    .map_err(InterruptWaitError::Store)?
                {
                    answers.insert(*interrupt_id, response);
                }
            }
            if answers.len() == raised.len() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(InterruptWaitError::TimedOut {
                    unanswered: raised.len() - answers.len(),
                });
            }
            tokio::time::sleep(self.config.interrupt_poll_interval).await;
        }

        // Q/A pairs in the original question order.
        let mut message = String::from("The customer has answered the questions you raised:\n");
        for (interrupt_id, question) in &raised {
            message.push_str(&format!("Q: {}\nA: {}\n", question, answers[interrupt_id]));
        }
        message.push_str("\nContinue the phase from where you paused.");
        Ok(message)
    }
}

fn build_phase_task(
    project_id: ProjectId,
    phase: Phase,
    briefing: &str,
    customer_feedback: Option<&str>,
) -> String {
    let mut task = String::new();
    if let Some(feedback) = customer_feedback {
        task.push_str(&format!(
            "The customer reviewed the previous submission of this phase and requested revisions. \
Address this feedback explicitly:\n{}\n\n",
            feedback
        ));
    }
    task.push_str(&format!(
        "You are the {} phase team for project {}.\n\nCurrent project state:\n{}\n\
Drive this phase to completion. Record new facts, assumptions, decisions and blockers in the \
ledger as you establish them, track work on the project board, and register deliverables when \
artifacts are produced.",
        phase, project_id, briefing
    ));
    task
}
