// Alert delivery
pub mod email;
pub mod template;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::types::{FailedServiceRecord, WorkloadRef};

/// Delivers one alert for a failed service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, record: &FailedServiceRecord) -> Result<(), NotifyError>;
}

/// Outcome of alerting for one record.
#[derive(Debug)]
pub struct DispatchResult {
    pub workload: WorkloadRef,
    pub error: Option<NotifyError>,
}

impl DispatchResult {
    pub fn is_sent(&self) -> bool {
        self.error.is_none()
    }
}

/// Sent/failed tally over a batch of [`DispatchResult`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    sent: usize,
    failed: usize,
}

impl DispatchSummary {
    pub fn from_results(results: &[DispatchResult]) -> Self {
        let sent = results.iter().filter(|r| r.is_sent()).count();
        Self {
            sent,
            failed: results.len() - sent,
        }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// Sends alerts one at a time, pausing between sends. Failed sends are not retried.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    send_delay: Duration,
}

impl Dispatcher {
    pub fn new(send_delay: Duration) -> Self {
        Self { send_delay }
    }

    pub async fn dispatch<N: Notifier + ?Sized>(
        &self,
        notifier: &N,
        records: &[FailedServiceRecord],
    ) -> Vec<DispatchResult> {
        let mut results = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }

            let error = match notifier.send(record).await {
                Ok(()) => {
                    info!(workload = %record.workload, "Notification sent");
                    None
                }
                Err(e) => {
                    warn!(workload = %record.workload, error = %e, "Failed to send notification");
                    Some(e)
                }
            };
            results.push(DispatchResult {
                workload: record.workload.clone(),
                error,
            });
        }

        let summary = DispatchSummary::from_results(&results);
        info!("Notifications sent: {}, failed: {}", summary.sent(), summary.failed());
        results
    }
}
