// Cluster access capability
pub mod memory;

use async_trait::async_trait;

use crate::error::ClusterError;
use crate::types::{Namespace, PodSnapshot, Workload};

/// Read-only view of a cluster used by discovery and evaluation.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError>;

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError>;

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<PodSnapshot>, ClusterError>;

    /// Tail of one container's log.
    async fn get_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError>;
}
