// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure domain types for multi-agent collaboration. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `AgentNode`, `TurnOutcome`, `Utterance`, `TokenUsage` |
//! | [`session`] | `SessionConfig`, `SessionStatus`, `SessionResult` |
//! | [`observer`] | `SessionObserver` |

pub mod agent;
pub mod observer;
pub mod session;

pub use agent::*;
pub use observer::*;
pub use session::*;
