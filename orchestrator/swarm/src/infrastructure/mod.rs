// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod http_agent;

pub use http_agent::{HttpAgentNode, HttpAgentProvider};
