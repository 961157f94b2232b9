// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! End-to-end phase orchestration: retry exhaustion, recovery preambles,
//! the interrupt sub-protocol and exactly-once outcome reporting.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cadence_core::application::{InterruptService, LedgerService};
use cadence_core::domain::ledger::{FactRecord, LedgerEntry, ProjectId};
use cadence_core::domain::phase::{Phase, PhaseStatus};
use cadence_core::domain::repository::LedgerRepository;
use cadence_core::infrastructure::event_bus::ProjectEventBus;
use cadence_core::infrastructure::repositories::ProjectStores;
use cadence_orchestrator_swarm::application::orchestrator::{OrchestratorConfig, PhaseOrchestrator};
use cadence_orchestrator_swarm::application::roster::{roster_for, SessionFactory};
use cadence_orchestrator_swarm::application::session::Session;
use cadence_orchestrator_swarm::domain::agent::TurnOutcome;

use support::{CountingFactory, FailingAgent, PingPongAgent, RecordingDriver, ScriptedAgent, TaskLog};

struct Harness {
    stores: ProjectStores,
    events: ProjectEventBus,
    driver: Arc<RecordingDriver>,
    ledgers: LedgerService,
    interrupts: InterruptService,
}

impl Harness {
    fn new() -> Self {
        let stores = ProjectStores::in_memory();
        let events = ProjectEventBus::with_default_capacity();
        Self {
            driver: RecordingDriver::new(),
            ledgers: LedgerService::new(stores.ledgers.clone(), events.clone()),
            interrupts: InterruptService::new(stores.interrupts.clone(), events.clone()),
            stores,
            events,
        }
    }

    fn orchestrator(&self, factory: Arc<dyn SessionFactory>, config: OrchestratorConfig) -> PhaseOrchestrator {
        PhaseOrchestrator::new(
            factory,
            self.driver.clone(),
            self.ledgers.clone(),
            self.interrupts.clone(),
            self.events.clone(),
            config,
        )
    }
}

fn fast_config(max_retries: u32) -> OrchestratorConfig {
    OrchestratorConfig {
        max_retries,
        retry_backoff: Duration::ZERO,
        interrupt_poll_interval: Duration::from_millis(10),
        interrupt_poll_timeout: Duration::from_millis(500),
    }
}

async fn seed_project(harness: &Harness, sow: &str) -> ProjectId {
    let project_id = ProjectId::new();
    let mut ledger =
        cadence_core::domain::ledger::TaskLedger::new(project_id, "data-lake", "acme", "owner-1");
    ledger
        .append(
            cadence_core::domain::ledger::LedgerSection::Facts,
            LedgerEntry::Fact(FactRecord {
                description: sow.to_string(),
                source: "statement-of-work".to_string(),
                recorded_at: chrono::Utc::now(),
            }),
        )
        .unwrap();
    harness.stores.ledgers.write(&ledger).await.unwrap();
    project_id
}

#[tokio::test]
async fn discovery_scenario_reports_success_exactly_once() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Build a data lake").await;

    let invocations = Arc::new(Mutex::new(Vec::new()));
    let invocations_for_factory = invocations.clone();
    let factory = CountingFactory::new(move || {
        let pm = ScriptedAgent::with_logs(
            "pm",
            vec![TurnOutcome::Handoff {
                to: "solutions-architect".into(),
                message: "requirements captured in the ledger".into(),
            }],
            invocations_for_factory.clone(),
            Arc::new(Mutex::new(Vec::new())),
        );
        let sa = ScriptedAgent::with_logs(
            "solutions-architect",
            vec![TurnOutcome::Complete { message: "discovery summary drafted".into() }],
            invocations_for_factory.clone(),
            Arc::new(Mutex::new(Vec::new())),
        );
        Ok(Session::new(vec![pm, sa], "pm", roster_for(Phase::Discovery).limits)?)
    });

    let orchestrator = harness.orchestrator(factory.clone(), fast_config(2));
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-discovery", None)
        .await
        .unwrap();

    // Entry agent first, then the handoff target.
    assert_eq!(*invocations.lock().unwrap(), vec!["pm".to_string(), "solutions-architect".to_string()]);
    assert_eq!(harness.driver.success_count(), 1);
    assert_eq!(harness.driver.failure_count(), 0);
    assert_eq!(factory.construction_count(), 1);

    let successes = harness.driver.successes.lock().unwrap();
    assert_eq!(successes[0].0, "tok-discovery");
    assert_eq!(successes[0].1["phase"], "DISCOVERY");
    assert_eq!(successes[0].1["output"], "discovery summary drafted");
}

#[tokio::test]
async fn architecture_ping_pong_fails_before_the_handoff_ceiling() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Modernize the platform").await;

    let factory = CountingFactory::new(|| {
        // SA kicks work to infra, then infra and security bounce forever.
        let sa = ScriptedAgent::new(
            "solutions-architect",
            vec![TurnOutcome::Handoff { to: "infra".into(), message: "draft the VPC design".into() }],
        );
        let infra = PingPongAgent::new("infra", "security");
        let security = PingPongAgent::new("security", "infra");
        let limits = roster_for(Phase::Architecture).limits;
        assert_eq!(limits.max_handoffs, 15);
        Ok(Session::new(vec![sa, infra, security], "solutions-architect", limits)?)
    });

    let orchestrator = harness.orchestrator(factory, fast_config(0));
    orchestrator
        .execute(project_id, Phase::Architecture, "tok-arch", None)
        .await
        .unwrap();

    assert_eq!(harness.driver.failure_count(), 1);
    let failures = harness.driver.failures.lock().unwrap();
    assert_eq!(failures[0].1, "PhaseExecutionFailed");
    // Repetitive-handoff detection fired, not the 15-handoff ceiling.
    assert!(failures[0].2.contains("repetitive handoff"));
}

#[tokio::test]
async fn retry_exhaustion_constructs_exactly_n_plus_one_sessions() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Anything").await;

    let factory = CountingFactory::new(|| {
        let broken = FailingAgent::new("pm", Arc::new(Mutex::new(Vec::new())));
        Ok(Session::new(vec![broken], "pm", roster_for(Phase::Discovery).limits)?)
    });

    let orchestrator = harness.orchestrator(factory.clone(), fast_config(2));
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-retry", None)
        .await
        .unwrap();

    assert_eq!(factory.construction_count(), 3);
    assert_eq!(harness.driver.success_count(), 0);
    assert_eq!(harness.driver.failure_count(), 1);
    let failures = harness.driver.failures.lock().unwrap();
    assert_eq!(failures[0].1, "PhaseExecutionFailed");
    assert!(failures[0].2.contains("model endpoint unreachable"));
}

#[tokio::test]
async fn retries_prepend_the_recovery_preamble() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Anything").await;

    let tasks: TaskLog = Arc::new(Mutex::new(Vec::new()));
    let tasks_for_factory = tasks.clone();
    let factory = CountingFactory::new(move || {
        let broken = FailingAgent::new("pm", tasks_for_factory.clone());
        Ok(Session::new(vec![broken], "pm", roster_for(Phase::Discovery).limits)?)
    });

    let orchestrator = harness.orchestrator(factory, fast_config(1));
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-preamble", None)
        .await
        .unwrap();

    let seen = tasks.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].contains("previous attempt"));
    assert!(seen[1].starts_with("A previous attempt at this phase did not complete"));
    // The briefing travels with every attempt.
    assert!(seen[1].contains("Anything"));
}

#[tokio::test]
async fn customer_feedback_is_addressed_first() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Build a data lake").await;

    let tasks: TaskLog = Arc::new(Mutex::new(Vec::new()));
    let tasks_for_factory = tasks.clone();
    let factory = CountingFactory::new(move || {
        let pm = ScriptedAgent::with_logs(
            "pm",
            vec![TurnOutcome::Complete { message: "revised".into() }],
            Arc::new(Mutex::new(Vec::new())),
            tasks_for_factory.clone(),
        );
        Ok(Session::new(vec![pm], "pm", roster_for(Phase::Discovery).limits)?)
    });

    let orchestrator = harness.orchestrator(factory, fast_config(0));
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-feedback", Some("use a lakehouse instead"))
        .await
        .unwrap();

    let seen = tasks.lock().unwrap();
    assert!(seen[0].starts_with("The customer reviewed the previous submission"));
    assert!(seen[0].contains("use a lakehouse instead"));
}

#[tokio::test]
async fn interrupt_subprotocol_persists_polls_and_resumes_verbatim() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Build a data lake").await;

    let tasks: TaskLog = Arc::new(Mutex::new(Vec::new()));
    let tasks_for_factory = tasks.clone();
    let factory = CountingFactory::new(move || {
        let pm = ScriptedAgent::with_logs(
            "pm",
            vec![
                TurnOutcome::Interrupt { questions: vec!["What is the budget ceiling?".into()] },
                TurnOutcome::Complete { message: "plan fits the budget".into() },
            ],
            Arc::new(Mutex::new(Vec::new())),
            tasks_for_factory.clone(),
        );
        Ok(Session::new(vec![pm], "pm", roster_for(Phase::Discovery).limits)?)
    });

    // Answer the question from "the customer" after a couple of empty poll
    // cycles.
    let interrupts = harness.interrupts.clone();
    let answerer = tokio::spawn({
        async move {
            tokio::time::sleep(Duration::from_millis(35)).await;
            let pending = interrupts.list(project_id).await.unwrap();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].question, "What is the budget ceiling?");
            interrupts
                .answer(project_id, pending[0].id, "$8000/month")
                .await
                .unwrap();
        }
    });

    let orchestrator = harness.orchestrator(factory.clone(), fast_config(0));
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-interrupt", None)
        .await
        .unwrap();
    answerer.await.unwrap();

    // The pause did not consume a retry: one session total.
    assert_eq!(factory.construction_count(), 1);
    assert_eq!(harness.driver.success_count(), 1);

    // The resume message carries question and answer verbatim, in order.
    let seen = tasks.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].contains("Q: What is the budget ceiling?"));
    assert!(seen[1].contains("A: $8000/month"));

    // The interrupt record is persisted and ANSWERED (audit trail).
    let stored = harness.interrupts.list(project_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].visible_response(), Some("$8000/month"));
}

#[tokio::test]
async fn silent_customer_is_fatal_and_distinct() {
    let harness = Harness::new();
    let project_id = seed_project(&harness, "Build a data lake").await;

    let factory = CountingFactory::new(|| {
        let pm = ScriptedAgent::new(
            "pm",
            vec![TurnOutcome::Interrupt { questions: vec!["Anyone home?".into()] }],
        );
        Ok(Session::new(vec![pm], "pm", roster_for(Phase::Discovery).limits)?)
    });

    let mut config = fast_config(2);
    config.interrupt_poll_timeout = Duration::from_millis(60);
    let orchestrator = harness.orchestrator(factory.clone(), config);
    orchestrator
        .execute(project_id, Phase::Discovery, "tok-silent", None)
        .await
        .unwrap();

    // Fatal: no retry attempts after the timeout, distinct failure kind.
    assert_eq!(factory.construction_count(), 1);
    assert_eq!(harness.driver.success_count(), 0);
    let failures = harness.driver.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].1, "InterruptTimeout");
    assert!(failures[0].2.contains("did not answer"));
    drop(failures);

    // The customer sees the phase as failed, not stuck.
    let ledger = harness.ledgers.read(project_id).await.unwrap();
    assert_eq!(ledger.phase_status, PhaseStatus::Failed);
}
