// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Workflow Driver HTTP Client
//!
//! Reports phase outcomes to the external workflow engine through its HTTP
//! callback endpoint, redeeming the opaque task token the engine issued
//! when it launched the phase worker.
//!
//! # Callback Contract
//!
//! ```json
//! POST {endpoint}/callbacks/success  {"task_token": "...", "payload": {...}}
//! POST {endpoint}/callbacks/failure  {"task_token": "...", "error": "...", "cause": "..."}
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::application::workflow_driver::{truncate_cause, FailureKind, WorkflowDriver};

#[derive(Clone)]
pub struct HttpWorkflowDriver {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SuccessCallback<'a> {
    task_token: &'a str,
    payload: &'a serde_json::Value,
}

#[derive(Serialize)]
struct FailureCallback<'a> {
    task_token: &'a str,
    error: &'a str,
    cause: &'a str,
}

impl HttpWorkflowDriver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WorkflowDriver for HttpWorkflowDriver {
    async fn report_success(&self, task_token: &str, payload: serde_json::Value) -> Result<()> {
        let url = format!("{}/callbacks/success", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&SuccessCallback { task_token, payload: &payload })
            .send()
            .await
            .context("Failed to reach workflow driver")?;
        response
            .error_for_status()
            .context("Workflow driver rejected success callback")?;
        info!("Reported phase success to workflow driver");
        Ok(())
    }

    async fn report_failure(&self, task_token: &str, kind: FailureKind, cause: &str) -> Result<()> {
        let url = format!("{}/callbacks/failure", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&FailureCallback {
                task_token,
                error: kind.as_str(),
                cause: truncate_cause(cause),
            })
            .send()
            .await
            .context("Failed to reach workflow driver")?;
        response
            .error_for_status()
            .context("Workflow driver rejected failure callback")?;
        info!(error_kind = kind.as_str(), "Reported phase failure to workflow driver");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_callback_posts_token_and_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/callbacks/success")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "task_token": "tok-1",
            })))
            .with_status(200)
            .create_async()
            .await;

        let driver = HttpWorkflowDriver::new(server.url());
        driver
            .report_success("tok-1", serde_json::json!({"phase": "DISCOVERY"}))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failure_callback_carries_error_kind() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/callbacks/failure")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "task_token": "tok-2",
                "error": "InterruptTimeout",
            })))
            .with_status(200)
            .create_async()
            .await;

        let driver = HttpWorkflowDriver::new(server.url());
        driver
            .report_failure("tok-2", FailureKind::InterruptTimeout, "customer went silent")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/callbacks/success")
            .with_status(500)
            .create_async()
            .await;

        let driver = HttpWorkflowDriver::new(server.url());
        let result = driver.report_success("tok-3", serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
