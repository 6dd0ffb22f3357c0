use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Annotation carrying the individual service owner's email.
pub const OWNER_EMAIL_ANNOTATION: &str = "service_owner";
/// Annotation carrying the owning team's distribution-list email.
pub const OWNER_DL_ANNOTATION: &str = "owner_dl";

pub const DEFAULT_LOG_TAIL_LINES: i64 = 50;
/// Restart counts strictly above this are reported as a possible crash loop.
pub const DEFAULT_CRASH_LOOP_THRESHOLD: i32 = 3;
pub const DEFAULT_SEND_DELAY_MS: u64 = 100;
pub const DEFAULT_SMTP_PORT: u16 = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub smtp: SmtpConfig,
    pub excluded_namespaces: Vec<String>,
    pub log_tail_lines: i64,
    pub crash_loop_restart_threshold: i32,
    pub send_delay: Duration,
    pub sweep_timeout: Option<Duration>,
    pub cluster_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub no_auth: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub operations_mailbox: String,
}

/// A namespace as returned by the cluster reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
}

/// A workload (deployment) as returned by the cluster reader, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}

/// A workload that carries both ownership annotations and will be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadRef {
    pub name: String,
    pub namespace: String,
    pub owner_email: String,
    pub owner_dl_email: String,
    pub annotations: BTreeMap<String, String>,
}

impl WorkloadRef {
    /// Label selector matching the workload's pods.
    pub fn pod_selector(&self) -> String {
        format!("app={}", self.name)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Waiting { reason: String },
    Terminated { reason: String, exit_code: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub reason: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
    pub last_termination: Option<Termination>,
}

/// Read-only view of one pod, fetched fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub phase: PodPhase,
    /// First container in the pod spec; logs are tailed from it.
    pub primary_container: Option<String>,
    pub containers: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthVerdict {
    pub healthy: bool,
    pub reason: String,
    pub log_excerpt: String,
}

impl HealthVerdict {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            reason: String::new(),
            log_excerpt: String::new(),
        }
    }

    pub fn unhealthy(reason: impl Into<String>, log_excerpt: impl Into<String>) -> Self {
        Self {
            healthy: false,
            reason: reason.into(),
            log_excerpt: log_excerpt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedServiceRecord {
    pub workload: WorkloadRef,
    pub reason: String,
    pub log_excerpt: String,
    pub detected_at: DateTime<Utc>,
}

impl FailedServiceRecord {
    pub fn new(workload: WorkloadRef, verdict: HealthVerdict, detected_at: DateTime<Utc>) -> Self {
        Self {
            workload,
            reason: verdict.reason,
            log_excerpt: verdict.log_excerpt,
            detected_at,
        }
    }
}
