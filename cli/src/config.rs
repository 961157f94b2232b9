// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! CLI configuration: flags and environment take precedence, then an
//! optional `cadence-config.yaml`, then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use cadence_swarm::application::orchestrator::OrchestratorConfig;

pub const DEFAULT_CONFIG_FILE: &str = "cadence-config.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Directory for the embedded project store.
    pub data_dir: PathBuf,
    /// Customer API bind address.
    pub listen_addr: String,
    /// Workflow driver callback endpoint.
    pub driver_endpoint: String,
    /// Agent runtime base endpoint.
    pub agent_endpoint: String,
    pub orchestrator: OrchestratorSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
    pub interrupt_poll_interval_secs: u64,
    pub interrupt_poll_timeout_secs: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./cadence-data"),
            listen_addr: "127.0.0.1:8080".to_string(),
            driver_endpoint: "http://127.0.0.1:9090".to_string(),
            agent_endpoint: "http://127.0.0.1:9100".to_string(),
            orchestrator: OrchestratorSection::default(),
        }
    }
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            max_retries: defaults.max_retries,
            retry_backoff_secs: defaults.retry_backoff.as_secs(),
            interrupt_poll_interval_secs: defaults.interrupt_poll_interval.as_secs(),
            interrupt_poll_timeout_secs: defaults.interrupt_poll_timeout.as_secs(),
        }
    }
}

impl CadenceConfig {
    /// Load from an explicit path, else `cadence-config.yaml` in the
    /// working directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };
        match candidate {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("failed to parse config file {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_retries: self.orchestrator.max_retries,
            retry_backoff: Duration::from_secs(self.orchestrator.retry_backoff_secs),
            interrupt_poll_interval: Duration::from_secs(self.orchestrator.interrupt_poll_interval_secs),
            interrupt_poll_timeout: Duration::from_secs(self.orchestrator.interrupt_poll_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence-config.yaml");
        std::fs::write(
            &path,
            "listen_addr: 0.0.0.0:9000\norchestrator:\n  max_retries: 5\n",
        )
        .unwrap();

        let config = CadenceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.orchestrator.max_retries, 5);
        // Untouched fields keep defaults.
        assert_eq!(config.driver_endpoint, "http://127.0.0.1:9090");
        assert_eq!(config.orchestrator_config().interrupt_poll_interval.as_secs(), 15);
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let config = CadenceConfig::load(None).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }
}
