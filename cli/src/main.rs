// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Cadence Orchestrator CLI
//!
//! The `cadence` binary runs the two long-lived processes of an
//! installation:
//!
//! - `cadence serve` — the customer API server (projects, approvals,
//!   interrupt answers, chat, event stream) over the embedded project
//!   store.
//! - `cadence phase` — a single phase worker, launched by the external
//!   workflow driver with a resume token; it drives the agent session to a
//!   terminal outcome and reports back through the token.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cadence_core::domain::ledger::ProjectId;
use cadence_core::domain::phase::Phase;

mod commands;
mod config;

use config::CadenceConfig;

/// Cadence — multi-agent engagement delivery orchestrator
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CADENCE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the customer API server
    Serve,
    /// Execute one delivery phase as a worker
    Phase {
        /// Project id (UUID)
        #[arg(long)]
        project: String,
        /// Phase name (DISCOVERY, ARCHITECTURE, POC, PRODUCTION, HANDOFF)
        #[arg(long)]
        phase: String,
        /// Resume token issued by the workflow driver
        #[arg(long, env = "CADENCE_TASK_TOKEN")]
        task_token: String,
        /// Customer revision feedback from a rejected submission
        #[arg(long)]
        feedback: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = CadenceConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve => commands::serve::run(&config).await,
        Commands::Phase { project, phase, task_token, feedback } => {
            let project_id = ProjectId::from_string(&project).context("invalid project id")?;
            let phase: Phase = phase.parse().context("invalid phase name")?;
            commands::phase::run(&config, project_id, phase, &task_token, feedback.as_deref()).await
        }
    }
}
