use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ClusterReader;
use crate::error::ClusterError;
use crate::types::{Namespace, PodSnapshot, Workload};

/// Snapshot-backed [`ClusterReader`] with injectable failures.
///
/// Namespaces and workloads are returned in insertion order. Pods are keyed by
/// namespace and label selector, logs by namespace, pod and container.
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    namespaces: Vec<String>,
    workloads: HashMap<String, Vec<Workload>>,
    pods: HashMap<(String, String), Vec<PodSnapshot>>,
    logs: HashMap<(String, String, String), String>,
    fail_namespace_listing: bool,
    failing_workload_namespaces: HashSet<String>,
    failing_pod_selectors: HashSet<(String, String)>,
    fail_logs: bool,
    workload_list_calls: AtomicUsize,
    pod_list_calls: AtomicUsize,
    log_calls: AtomicUsize,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        if !self.namespaces.iter().any(|n| n == namespace) {
            self.namespaces.push(namespace.to_string());
        }
        self
    }

    /// Adds a deployment with the given annotations; also registers the namespace.
    pub fn with_workload(mut self, namespace: &str, name: &str, annotations: &[(&str, &str)]) -> Self {
        self = self.with_namespace(namespace);
        let annotations: BTreeMap<String, String> = annotations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.workloads
            .entry(namespace.to_string())
            .or_default()
            .push(Workload {
                name: name.to_string(),
                annotations,
            });
        self
    }

    pub fn with_pods(mut self, namespace: &str, selector: &str, pods: Vec<PodSnapshot>) -> Self {
        self.pods
            .entry((namespace.to_string(), selector.to_string()))
            .or_default()
            .extend(pods);
        self
    }

    pub fn with_logs(mut self, namespace: &str, pod: &str, container: &str, logs: &str) -> Self {
        self.logs.insert(
            (namespace.to_string(), pod.to_string(), container.to_string()),
            logs.to_string(),
        );
        self
    }

    pub fn failing_namespace_listing(mut self) -> Self {
        self.fail_namespace_listing = true;
        self
    }

    pub fn failing_workload_listing(mut self, namespace: &str) -> Self {
        self.failing_workload_namespaces.insert(namespace.to_string());
        self
    }

    pub fn failing_pod_listing(mut self, namespace: &str, selector: &str) -> Self {
        self.failing_pod_selectors
            .insert((namespace.to_string(), selector.to_string()));
        self
    }

    pub fn failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    pub fn workload_list_calls(&self) -> usize {
        self.workload_list_calls.load(Ordering::SeqCst)
    }

    pub fn pod_list_calls(&self) -> usize {
        self.pod_list_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterReader for InMemoryCluster {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        if self.fail_namespace_listing {
            return Err(ClusterError::Unavailable("namespaces are forbidden".to_string()));
        }
        Ok(self
            .namespaces
            .iter()
            .map(|name| Namespace { name: name.clone() })
            .collect())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        self.workload_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_workload_namespaces.contains(namespace) {
            return Err(ClusterError::Unavailable(format!(
                "deployments in {} are forbidden",
                namespace
            )));
        }
        Ok(self.workloads.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<PodSnapshot>, ClusterError> {
        self.pod_list_calls.fetch_add(1, Ordering::SeqCst);
        let key = (namespace.to_string(), selector.to_string());
        if self.failing_pod_selectors.contains(&key) {
            return Err(ClusterError::Unavailable(format!(
                "pods matching {} in {} are forbidden",
                selector, namespace
            )));
        }
        Ok(self.pods.get(&key).cloned().unwrap_or_default())
    }

    async fn get_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logs {
            return Err(ClusterError::Unavailable("log stream closed".to_string()));
        }
        let key = (namespace.to_string(), pod.to_string(), container.to_string());
        let logs = self.logs.get(&key).map(String::as_str).unwrap_or("");
        let lines: Vec<&str> = logs.lines().collect();
        let keep = usize::try_from(tail_lines).unwrap_or(0).min(lines.len());
        Ok(lines[lines.len() - keep..].join("\n"))
    }
}
