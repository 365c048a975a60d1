/*
 * 5D Labs Agent Platform - TTL Sweeper
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! TTL Sweeper - one-shot cleanup job, usually run from a `CronJob`
//!
//! - Lists pods (and optionally jobs) across all namespaces
//! - Reads each object's TTL from the configured annotation
//! - Deletes objects older than their TTL, cascading job deletes to their pods
//! - Exits non-zero only on fatal errors; individual delete failures are logged

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use ttl_sweeper::telemetry::{init_tracing, LogFormat};
use ttl_sweeper::{KubeStore, RunSummary, SweepOrchestrator, SweeperConfig};

#[derive(Parser)]
#[command(name = "ttl-sweeper")]
#[command(about = "Delete pods and jobs that outlived their TTL annotation")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (e.g. a mounted ConfigMap)
    #[arg(short, long, env = "SWEEPER_CONFIG")]
    config: Option<String>,

    /// Annotation key holding the TTL in seconds
    #[arg(short, long, env = "ANNOTATION_KEY")]
    annotation_key: Option<String>,

    /// Sweep batch jobs after pods
    #[arg(long, env = "SWEEP_JOBS", action = clap::ArgAction::Set)]
    include_jobs: Option<bool>,

    /// Only delete expired jobs that still have active pods
    #[arg(long, env = "JOBS_REQUIRE_ACTIVE", action = clap::ArgAction::Set)]
    jobs_require_active: Option<bool>,

    /// Log decisions without deleting anything
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Objects requested per list page
    #[arg(long, env = "LIST_PAGE_SIZE")]
    page_size: Option<u32>,

    /// Log output format: text, json
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<SweeperConfig> {
        let mut config = match self.config.as_deref() {
            Some(path) => SweeperConfig::from_mounted_file(path)?,
            None => SweeperConfig::default(),
        };

        if let Some(key) = &self.annotation_key {
            config.annotation_key.clone_from(key);
        }
        if let Some(include_jobs) = self.include_jobs {
            config.include_jobs = include_jobs;
        }
        if let Some(require_active) = self.jobs_require_active {
            config.jobs.require_active = require_active;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        config.dry_run |= self.dry_run;

        config.validate()?;
        Ok(config)
    }
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.load_config()?;

    let now = Utc::now();
    info!("START ttl-sweeper run at {}", now.to_rfc3339());
    info!(
        annotation_key = %config.annotation_key,
        include_jobs = config.include_jobs,
        dry_run = config.dry_run,
        "Using annotation key={:?}",
        config.annotation_key
    );

    let client = kube::Client::try_default()
        .await
        .context("error creating Kubernetes client")?;
    let store = KubeStore::new(client).with_page_size(config.page_size);

    let orchestrator = SweepOrchestrator::new(store, config.rules(), config.include_jobs);
    let summary = orchestrator.run(now).await.context("error during cleanup")?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    match run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("FATAL ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "ttl-sweeper",
            "--annotation-key",
            "ttl.example.com/seconds",
            "--include-jobs",
            "false",
            "--page-size",
            "50",
            "--dry-run",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.annotation_key, "ttl.example.com/seconds");
        assert!(!config.include_jobs);
        assert_eq!(config.page_size, 50);
        assert!(config.dry_run);
    }

    #[test]
    fn cli_requires_annotation_key() {
        let cli = Cli::parse_from(["ttl-sweeper", "--annotation-key", ""]);
        assert!(cli.load_config().is_err());
    }
}
