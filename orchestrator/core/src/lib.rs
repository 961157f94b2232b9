// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `cadence-core` — Engagement Delivery Domain and Project Store
//!
//! Core crate of the Cadence orchestrator: the task ledger, approval
//! tokens, interrupts, board tasks and chat for a customer engagement,
//! plus the stores, broadcast sink, workflow-driver client and customer
//! HTTP API built on them.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | Aggregates, events, repository contracts |
//! | [`application`] | Application | Use-case services, workflow-driver interface |
//! | [`infrastructure`] | Infrastructure | Event bus, in-memory + sled stores, HTTP driver client |
//! | [`presentation`] | Presentation | Customer HTTP/SSE API |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
