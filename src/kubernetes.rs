use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ContainerState as K8sContainerState, ContainerStatus as K8sContainerStatus, Namespace as K8sNamespace, Pod,
};
use kube::api::{ListParams, LogParams};
use kube::{Api, Client};

use crate::cluster::ClusterReader;
use crate::error::ClusterError;
use crate::types::{ContainerState, ContainerStatus, Namespace, PodPhase, PodSnapshot, Termination, Workload};

/// [`ClusterReader`] backed by the Kubernetes API.
pub struct KubeClusterReader {
    client: Client,
}

impl KubeClusterReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// In-cluster config first, then the local kubeconfig.
    pub async fn try_default() -> Result<Self, ClusterError> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        let api: Api<K8sNamespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .map(|name| Namespace { name })
            .collect())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|dep| {
                let name = dep.metadata.name?;
                Some(Workload {
                    name,
                    annotations: dep.metadata.annotations.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<PodSnapshot>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default().labels(selector)).await?;
        Ok(list
            .items
            .iter()
            .filter_map(|pod| pod_snapshot(namespace, pod))
            .collect())
    }

    async fn get_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        Ok(api.logs(pod, &params).await?)
    }
}

/// Converts an API pod into a snapshot; pods without a name are skipped.
pub fn pod_snapshot(namespace: &str, pod: &Pod) -> Option<PodSnapshot> {
    let name = pod.metadata.name.clone()?;
    let status = pod.status.as_ref();

    let phase = PodPhase::parse(status.and_then(|s| s.phase.as_deref()));
    let primary_container = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.containers.first())
        .map(|c| c.name.clone());
    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(container_status).collect())
        .unwrap_or_default();

    Some(PodSnapshot {
        name,
        namespace: pod
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| namespace.to_string()),
        phase,
        primary_container,
        containers,
    })
}

fn container_status(cs: &K8sContainerStatus) -> ContainerStatus {
    ContainerStatus {
        name: cs.name.clone(),
        ready: cs.ready,
        restart_count: cs.restart_count,
        state: current_state(cs.state.as_ref()),
        last_termination: cs
            .last_state
            .as_ref()
            .and_then(|s| s.terminated.as_ref())
            .map(|t| Termination {
                reason: t.reason.clone().unwrap_or_default(),
                exit_code: t.exit_code,
            }),
    }
}

// Waiting wins over terminated; an absent or running state counts as running.
fn current_state(state: Option<&K8sContainerState>) -> ContainerState {
    let Some(state) = state else {
        return ContainerState::Running;
    };
    if let Some(waiting) = state.waiting.as_ref() {
        return ContainerState::Waiting {
            reason: waiting.reason.clone().unwrap_or_default(),
        };
    }
    if let Some(term) = state.terminated.as_ref() {
        return ContainerState::Terminated {
            reason: term.reason.clone().unwrap_or_default(),
            exit_code: term.exit_code,
        };
    }
    ContainerState::Running
}
