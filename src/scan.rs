use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, warn};

use crate::cluster::ClusterReader;
use crate::discovery::discover;
use crate::error::ClusterError;
use crate::health::HealthEvaluator;
use crate::notify::{DispatchResult, DispatchSummary, Dispatcher, Notifier};
use crate::report::SweepReport;
use crate::types::{Config, FailedServiceRecord};

/// Drives discovery and evaluation for one sweep.
pub struct Scanner<'a, R: ClusterReader + ?Sized> {
    reader: &'a R,
    evaluator: HealthEvaluator,
    excluded_namespaces: HashSet<String>,
}

impl<'a, R: ClusterReader + ?Sized> Scanner<'a, R> {
    pub fn new(reader: &'a R, evaluator: HealthEvaluator, excluded_namespaces: HashSet<String>) -> Self {
        Self {
            reader,
            evaluator,
            excluded_namespaces,
        }
    }

    pub fn from_config(reader: &'a R, cfg: &Config) -> Self {
        Self::new(
            reader,
            HealthEvaluator::from_config(cfg),
            cfg.excluded_namespaces.iter().cloned().collect(),
        )
    }

    /// Evaluate every discovered workload in order.
    ///
    /// Only a discovery failure is returned as an error; evaluation errors are
    /// logged and counted in [`SweepReport::errored`].
    pub async fn run_sweep(&self) -> Result<SweepReport, ClusterError> {
        let started = Instant::now();
        let workloads = discover(self.reader, &self.excluded_namespaces).await?;
        info!("Discovered {} annotated workloads", workloads.len());

        let mut report = SweepReport {
            discovered: workloads.len(),
            ..Default::default()
        };

        for workload in workloads {
            match self.evaluator.evaluate(self.reader, &workload).await {
                Ok(verdict) if verdict.healthy => report.healthy += 1,
                Ok(verdict) => {
                    warn!(workload = %workload, reason = %verdict.reason, "Workload unhealthy");
                    report
                        .failed
                        .push(FailedServiceRecord::new(workload, verdict, Utc::now()));
                }
                Err(e) => {
                    warn!(workload = %workload, error = %e, "Error checking workload health, skipping");
                    report.errored += 1;
                }
            }
        }

        report.duration = started.elapsed();
        Ok(report)
    }
}

/// Outcome of [`run_health_check`].
#[derive(Debug)]
pub struct HealthCheckRun {
    pub report: SweepReport,
    /// Empty on dry runs and when nothing failed.
    pub dispatched: Vec<DispatchResult>,
}

impl HealthCheckRun {
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary::from_results(&self.dispatched)
    }
}

/// Sweep the cluster, then alert owners unless `dry_run` is set.
///
/// The sweep runs under `cfg.sweep_timeout` when one is configured; hitting it
/// aborts before any alert is sent. Without a notifier the run behaves like a
/// dry run.
pub async fn run_health_check<R, N>(
    reader: &R,
    notifier: Option<&N>,
    cfg: &Config,
    dry_run: bool,
) -> Result<HealthCheckRun>
where
    R: ClusterReader + ?Sized,
    N: Notifier + ?Sized,
{
    info!("Starting Kubernetes service health check");
    let scanner = Scanner::from_config(reader, cfg);

    let report = match cfg.sweep_timeout {
        Some(deadline) => tokio::time::timeout(deadline, scanner.run_sweep())
            .await
            .map_err(|_| anyhow!("Health sweep exceeded deadline of {:?}", deadline))?,
        None => scanner.run_sweep().await,
    }
    .context("Failed to scan workloads")?;

    let dry_run = dry_run || notifier.is_none();
    let mut run = HealthCheckRun {
        report,
        dispatched: Vec::new(),
    };
    if let Some(notifier) = notifier.filter(|_| !dry_run && run.report.has_issues()) {
        info!("Found {} unhealthy services, sending notifications", run.report.unhealthy());
        let dispatcher = Dispatcher::new(cfg.send_delay);
        run.dispatched = dispatcher.dispatch(notifier, &run.report.failed).await;

        let summary = run.summary();
        info!("Dispatch summary: {} sent, {} failed", summary.sent(), summary.failed());
    }

    info!("{}", run.report.outcome(dry_run));
    info!("Health check completed in {:?}", run.report.duration);

    Ok(run)
}
