// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Ledger Aggregate
//!
//! The durable, single-writer record of everything the delivery team has
//! established about a project: facts, assumptions, decisions, blockers and
//! per-phase deliverables.
//!
//! # Invariants
//!
//! - One ledger per project; `project_id` and `owner_id` are set at creation
//!   and never change.
//! - Section lists are append-only; entries are never reordered or removed
//!   (audit trail).
//! - The ledger is read-modify-write under a single logical owner (the PM
//!   role). Callers read the whole ledger, mutate, and write the whole
//!   ledger back; there are no partial-field transactions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::phase::{Phase, PhaseStatus};

/// Unique identifier for a project (partition key of the project store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An established fact about the engagement, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub description: String,
    /// Where the fact came from (SOW, customer interview, discovery call).
    pub source: String,
    pub recorded_at: DateTime<Utc>,
}

/// A working assumption, carried until confirmed or invalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRecord {
    pub description: String,
    /// Free-text confidence qualifier ("high", "needs validation", ...).
    pub confidence: String,
    pub recorded_at: DateTime<Utc>,
}

/// A decision the team has committed to, with the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub description: String,
    pub rationale: String,
    pub recorded_at: DateTime<Utc>,
}

/// Something preventing progress, and who is on the hook to clear it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerRecord {
    pub description: String,
    pub assignee: String,
    pub recorded_at: DateTime<Utc>,
}

/// Review state of a deliverable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    Draft,
    Review,
    Final,
}

/// One artifact produced during a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub name: String,
    pub storage_path: String,
    pub version_status: DeliverableStatus,
}

/// The append-only sections of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSection {
    Facts,
    Assumptions,
    Decisions,
    Blockers,
}

impl LedgerSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSection::Facts => "facts",
            LedgerSection::Assumptions => "assumptions",
            LedgerSection::Decisions => "decisions",
            LedgerSection::Blockers => "blockers",
        }
    }
}

impl std::str::FromStr for LedgerSection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facts" => Ok(LedgerSection::Facts),
            "assumptions" => Ok(LedgerSection::Assumptions),
            "decisions" => Ok(LedgerSection::Decisions),
            "blockers" => Ok(LedgerSection::Blockers),
            other => Err(LedgerError::UnknownSection(other.to_string())),
        }
    }
}

impl std::fmt::Display for LedgerSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed entry destined for one specific ledger section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Fact(FactRecord),
    Assumption(AssumptionRecord),
    Decision(DecisionRecord),
    Blocker(BlockerRecord),
}

impl LedgerEntry {
    /// The only section this entry shape is valid for.
    pub fn section(&self) -> LedgerSection {
        match self {
            LedgerEntry::Fact(_) => LedgerSection::Facts,
            LedgerEntry::Assumption(_) => LedgerSection::Assumptions,
            LedgerEntry::Decision(_) => LedgerSection::Decisions,
            LedgerEntry::Blocker(_) => LedgerSection::Blockers,
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unknown ledger section: {0}")]
    UnknownSection(String),
    #[error("entry shape {entry} does not match section {section}")]
    SectionMismatch { section: LedgerSection, entry: LedgerSection },
}

/// Aggregate root for a project's delivery record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLedger {
    pub project_id: ProjectId,
    pub project_name: String,
    pub customer: String,
    /// Identity of the customer principal allowed to act on this project.
    pub owner_id: String,
    pub current_phase: Phase,
    pub phase_status: PhaseStatus,
    pub facts: Vec<FactRecord>,
    pub assumptions: Vec<AssumptionRecord>,
    pub decisions: Vec<DecisionRecord>,
    pub blockers: Vec<BlockerRecord>,
    /// Phase name → ordered deliverable list for that phase.
    pub deliverables: BTreeMap<Phase, Vec<Deliverable>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskLedger {
    /// A freshly created ledger for a new project.
    pub fn new(
        project_id: ProjectId,
        project_name: impl Into<String>,
        customer: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            project_id,
            project_name: project_name.into(),
            customer: customer.into(),
            owner_id: owner_id.into(),
            current_phase: Phase::Discovery,
            phase_status: PhaseStatus::InProgress,
            facts: Vec::new(),
            assumptions: Vec::new(),
            decisions: Vec::new(),
            blockers: Vec::new(),
            deliverables: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The default-initialized ledger returned when nothing is stored yet.
    /// Absence is a valid initial state, never an error.
    pub fn empty(project_id: ProjectId) -> Self {
        Self::new(project_id, "", "", "")
    }

    /// Append a validated entry to its section. Fails if `section` and the
    /// entry shape disagree.
    pub fn append(&mut self, section: LedgerSection, entry: LedgerEntry) -> Result<(), LedgerError> {
        if entry.section() != section {
            return Err(LedgerError::SectionMismatch { section, entry: entry.section() });
        }
        match entry {
            LedgerEntry::Fact(r) => self.facts.push(r),
            LedgerEntry::Assumption(r) => self.assumptions.push(r),
            LedgerEntry::Decision(r) => self.decisions.push(r),
            LedgerEntry::Blocker(r) => self.blockers.push(r),
        }
        self.touch();
        Ok(())
    }

    /// Number of entries currently in `section`.
    pub fn section_len(&self, section: LedgerSection) -> usize {
        match section {
            LedgerSection::Facts => self.facts.len(),
            LedgerSection::Assumptions => self.assumptions.len(),
            LedgerSection::Decisions => self.decisions.len(),
            LedgerSection::Blockers => self.blockers.len(),
        }
    }

    /// Replace (not merge) the deliverable list for one phase.
    pub fn set_deliverables(&mut self, phase: Phase, items: Vec<Deliverable>) {
        self.deliverables.insert(phase, items);
        self.touch();
    }

    pub fn set_phase(&mut self, phase: Phase, status: PhaseStatus) {
        self.current_phase = phase;
        self.phase_status = status;
        self.touch();
    }

    fn has_entries(&self) -> bool {
        !self.facts.is_empty()
            || !self.assumptions.is_empty()
            || !self.decisions.is_empty()
            || !self.blockers.is_empty()
            || self.deliverables.values().any(|d| !d.is_empty())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Deterministic textual rendering used to brief agents on current
    /// state. Sections are listed in insertion order.
    pub fn render_briefing(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Project: {} (customer: {})\nPhase: {} [{}]\n",
            self.project_name, self.customer, self.current_phase, self.phase_status
        ));
        if !self.has_entries() {
            out.push_str("no entries yet\n");
            return out;
        }
        if !self.facts.is_empty() {
            out.push_str("Facts:\n");
            for f in &self.facts {
                out.push_str(&format!("  - {} (source: {})\n", f.description, f.source));
            }
        }
        if !self.assumptions.is_empty() {
            out.push_str("Assumptions:\n");
            for a in &self.assumptions {
                out.push_str(&format!("  - {} (confidence: {})\n", a.description, a.confidence));
            }
        }
        if !self.decisions.is_empty() {
            out.push_str("Decisions:\n");
            for d in &self.decisions {
                out.push_str(&format!("  - {} (rationale: {})\n", d.description, d.rationale));
            }
        }
        if !self.blockers.is_empty() {
            out.push_str("Blockers:\n");
            for b in &self.blockers {
                out.push_str(&format!("  - {} (assignee: {})\n", b.description, b.assignee));
            }
        }
        for (phase, items) in &self.deliverables {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("Deliverables ({}):\n", phase));
            for d in items {
                out.push_str(&format!("  - {} at {} [{:?}]\n", d.name, d.storage_path, d.version_status));
            }
        }
        out
    }
}
