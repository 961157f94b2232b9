// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`cadence-core`)
//!
//! HTTP surface that translates customer requests into application service
//! calls. **No business logic lives here** — all real work is delegated to
//! application services in `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP/SSE (Axum) | Customer endpoints + Server-Sent Events for project streaming |

pub mod api;
