// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Observers
//!
//! An explicit observer list attached to a session at construction, for
//! logging and dashboard updates. Observer failures are caught individually
//! by the engine and never interrupt the session.

use crate::domain::agent::TurnOutcome;
use crate::domain::session::{SessionId, SessionResult};

/// Side-channel notifications of session progress. All methods default to
/// no-ops so observers implement only what they need.
pub trait SessionObserver: Send + Sync {
    fn on_node_start(&self, _session: SessionId, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_node_complete(
        &self,
        _session: SessionId,
        _node: &str,
        _outcome: &TurnOutcome,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_session_complete(&self, _session: SessionId, _result: &SessionResult) -> anyhow::Result<()> {
        Ok(())
    }
}
