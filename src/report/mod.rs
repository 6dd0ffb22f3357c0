use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::types::FailedServiceRecord;

/// Result of one sweep: the failed services plus per-outcome tallies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub failed: Vec<FailedServiceRecord>,
    pub discovered: usize,
    pub healthy: usize,
    /// Workloads whose evaluation errored; counted neither healthy nor unhealthy.
    pub errored: usize,
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
}

impl SweepReport {
    pub fn unhealthy(&self) -> usize {
        self.failed.len()
    }

    pub fn has_issues(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn outcome(&self, dry_run: bool) -> SweepOutcome {
        if dry_run {
            SweepOutcome::DryRun(self.unhealthy())
        } else if self.has_issues() {
            SweepOutcome::Unhealthy(self.unhealthy())
        } else {
            SweepOutcome::AllHealthy
        }
    }
}

/// Terminal outcome; its `Display` is the end-of-sweep summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    AllHealthy,
    Unhealthy(usize),
    DryRun(usize),
}

impl fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepOutcome::AllHealthy => write!(f, "All services are healthy"),
            SweepOutcome::Unhealthy(n) => write!(f, "{} failed services found", n),
            SweepOutcome::DryRun(n) => write!(f, "Dry run: found {} unhealthy services (no emails sent)", n),
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HealthVerdict, WorkloadRef};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(name: &str) -> FailedServiceRecord {
        FailedServiceRecord::new(
            WorkloadRef {
                name: name.to_string(),
                namespace: "prod".to_string(),
                owner_email: "alice@corp.example".to_string(),
                owner_dl_email: "payments@corp.example".to_string(),
                annotations: BTreeMap::new(),
            },
            HealthVerdict::unhealthy("No pods found for deployment", ""),
            Utc::now(),
        )
    }

    #[test]
    fn test_outcomes() {
        let mut report = SweepReport::default();
        assert!(!report.has_issues());
        assert_eq!(report.outcome(false), SweepOutcome::AllHealthy);
        assert_eq!(report.outcome(true), SweepOutcome::DryRun(0));

        report.failed.push(record("billing"));
        report.failed.push(record("ledger"));
        assert!(report.has_issues());
        assert_eq!(report.unhealthy(), 2);
        assert_eq!(report.outcome(false), SweepOutcome::Unhealthy(2));
        assert_eq!(report.outcome(false).to_string(), "2 failed services found");
        assert_eq!(
            report.outcome(true).to_string(),
            "Dry run: found 2 unhealthy services (no emails sent)"
        );
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = SweepReport {
            failed: vec![record("billing")],
            discovered: 3,
            healthy: 1,
            errored: 1,
            duration: Duration::from_millis(1500),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["discovered"], 3);
        assert_eq!(value["duration_ms"], 1500);
        assert_eq!(value["failed"][0]["workload"]["name"], "billing");
        assert_eq!(value["failed"][0]["reason"], "No pods found for deployment");
    }
}
