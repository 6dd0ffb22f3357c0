use tracing::debug;

use crate::cluster::ClusterReader;
use crate::error::EvaluationError;
use crate::types::{
    Config, ContainerState, HealthVerdict, PodPhase, PodSnapshot, WorkloadRef, DEFAULT_CRASH_LOOP_THRESHOLD,
    DEFAULT_LOG_TAIL_LINES,
};

/// Derives a [`HealthVerdict`] from a workload's live pods.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    log_tail_lines: i64,
    crash_loop_threshold: i32,
}

/// First failing condition found while inspecting a pod set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFailure<'a> {
    pub pod: &'a PodSnapshot,
    pub reason: String,
}

impl Default for HealthEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TAIL_LINES, DEFAULT_CRASH_LOOP_THRESHOLD)
    }
}

impl HealthEvaluator {
    pub fn new(log_tail_lines: i64, crash_loop_threshold: i32) -> Self {
        Self {
            log_tail_lines,
            crash_loop_threshold,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.log_tail_lines, cfg.crash_loop_restart_threshold)
    }

    pub fn log_tail_lines(&self) -> i64 {
        self.log_tail_lines
    }

    pub fn crash_loop_threshold(&self) -> i32 {
        self.crash_loop_threshold
    }

    /// Evaluate one workload against its current pods.
    ///
    /// A pod listing failure is the only error; its verdict is available via
    /// [`EvaluationError::verdict`].
    pub async fn evaluate<R: ClusterReader + ?Sized>(
        &self,
        reader: &R,
        workload: &WorkloadRef,
    ) -> Result<HealthVerdict, EvaluationError> {
        let pods = reader
            .list_pods(&workload.namespace, &workload.pod_selector())
            .await
            .map_err(|source| EvaluationError::ListPods {
                namespace: workload.namespace.clone(),
                workload: workload.name.clone(),
                source,
            })?;

        if pods.is_empty() {
            return Ok(HealthVerdict::unhealthy("No pods found for deployment", ""));
        }

        match self.inspect(&pods) {
            Some(failure) => {
                debug!(workload = %workload, pod = %failure.pod.name, reason = %failure.reason, "Workload unhealthy");
                let excerpt = self.log_excerpt(reader, failure.pod).await;
                Ok(HealthVerdict::unhealthy(failure.reason, excerpt))
            }
            None => Ok(HealthVerdict::healthy()),
        }
    }

    /// Returns the first failing condition across `pods`, in order.
    ///
    /// Per pod: phase, then each container's waiting / terminated / ready
    /// state, then restart counts across all containers.
    pub fn inspect<'a>(&self, pods: &'a [PodSnapshot]) -> Option<PodFailure<'a>> {
        pods.iter().find_map(|pod| {
            self.inspect_pod(pod)
                .map(|reason| PodFailure { pod, reason })
        })
    }

    fn inspect_pod(&self, pod: &PodSnapshot) -> Option<String> {
        if pod.phase != PodPhase::Running {
            return Some(format!("Pod {} is not running (status: {})", pod.name, pod.phase));
        }

        for cs in &pod.containers {
            match &cs.state {
                ContainerState::Waiting { reason } => {
                    return Some(format!("Container {} is waiting: {}", cs.name, reason));
                }
                ContainerState::Terminated { reason, exit_code } => {
                    return Some(format!(
                        "Container {} terminated: {} (exit code: {})",
                        cs.name, reason, exit_code
                    ));
                }
                ContainerState::Running => {}
            }

            if !cs.ready {
                return Some(match &cs.last_termination {
                    Some(last) => format!("Container {} not ready (last termination: {})", cs.name, last.reason),
                    None => format!("Container {} not ready", cs.name),
                });
            }
        }

        pod.containers
            .iter()
            .find(|cs| cs.restart_count > self.crash_loop_threshold)
            .map(|cs| {
                format!(
                    "Container {} restarted {} times (possible crash loop)",
                    cs.name, cs.restart_count
                )
            })
    }

    // Best effort: a failure becomes the excerpt text, never an error.
    async fn log_excerpt<R: ClusterReader + ?Sized>(&self, reader: &R, pod: &PodSnapshot) -> String {
        let Some(container) = pod.primary_container.as_deref() else {
            return "No containers in pod".to_string();
        };
        match reader
            .get_logs(&pod.namespace, &pod.name, container, self.log_tail_lines)
            .await
        {
            Ok(logs) => logs,
            Err(e) => format!("Failed to get logs: {}", e),
        }
    }
}
