// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Approval Token Application Service
//!
//! Stores and redeems the workflow engine's resume tokens. A token is
//! redeemed (fetched and deleted) exactly once; redemption of a missing
//! token means "no pending approval" and is the caller's error to surface.

use std::sync::Arc;

use tracing::info;

use crate::application::ServiceError;
use crate::domain::approval::ApprovalToken;
use crate::domain::ledger::ProjectId;
use crate::domain::phase::Phase;
use crate::domain::repository::ApprovalTokenRepository;

#[derive(Clone)]
pub struct ApprovalService {
    tokens: Arc<dyn ApprovalTokenRepository>,
}

impl ApprovalService {
    pub fn new(tokens: Arc<dyn ApprovalTokenRepository>) -> Self {
        Self { tokens }
    }

    /// Park the workflow engine's resume token when a phase reaches
    /// AWAITING_APPROVAL. Overwrites any stale token for the pair.
    pub async fn store(
        &self,
        project_id: ProjectId,
        phase: Phase,
        task_token: &str,
    ) -> Result<(), ServiceError> {
        let token = ApprovalToken::new(task_token);
        self.tokens.store(project_id, phase, &token).await?;
        info!(project_id = %project_id, phase = %phase, "Approval token stored");
        Ok(())
    }

    pub async fn fetch(
        &self,
        project_id: ProjectId,
        phase: Phase,
    ) -> Result<Option<ApprovalToken>, ServiceError> {
        Ok(self.tokens.fetch(project_id, phase).await?)
    }

    /// Consume the pending token: fetch then delete, so a second redemption
    /// finds nothing. `None` means no approval is pending.
    pub async fn redeem(
        &self,
        project_id: ProjectId,
        phase: Phase,
    ) -> Result<Option<ApprovalToken>, ServiceError> {
        let token = self.tokens.fetch(project_id, phase).await?;
        if token.is_some() {
            self.tokens.delete(project_id, phase).await?;
            info!(project_id = %project_id, phase = %phase, "Approval token redeemed");
        }
        Ok(token)
    }
}
