// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`cadence-core`)
//!
//! Pure domain types for engagement delivery. No I/O dependencies; the
//! repository traits here are contracts implemented in
//! `crate::infrastructure`.

pub mod approval;
pub mod board;
pub mod chat;
pub mod events;
pub mod interrupt;
pub mod ledger;
pub mod phase;
pub mod repository;
