use std::collections::HashSet;
use tracing::{debug, warn};

use crate::cluster::ClusterReader;
use crate::error::ClusterError;
use crate::types::{Workload, WorkloadRef, OWNER_DL_ANNOTATION, OWNER_EMAIL_ANNOTATION};

/// Lists every annotated workload outside the excluded namespaces.
///
/// A failing namespace listing is returned as an error; a failing workload
/// listing only skips that namespace.
pub async fn discover<R: ClusterReader + ?Sized>(
    reader: &R,
    excluded_namespaces: &HashSet<String>,
) -> Result<Vec<WorkloadRef>, ClusterError> {
    let namespaces = reader.list_namespaces().await?;
    let mut workloads = Vec::new();

    for ns in namespaces {
        if excluded_namespaces.contains(&ns.name) {
            debug!(namespace = %ns.name, "Skipping excluded namespace");
            continue;
        }

        let items = match reader.list_workloads(&ns.name).await {
            Ok(items) => items,
            Err(e) => {
                warn!(namespace = %ns.name, error = %e, "Failed to list workloads, skipping namespace");
                continue;
            }
        };

        workloads.extend(items.into_iter().filter_map(|w| workload_ref(&ns.name, w)));
    }

    Ok(workloads)
}

/// Builds a [`WorkloadRef`] when both ownership annotations are non-empty.
pub fn workload_ref(namespace: &str, workload: Workload) -> Option<WorkloadRef> {
    let owner_email = annotation(&workload, OWNER_EMAIL_ANNOTATION);
    let owner_dl_email = annotation(&workload, OWNER_DL_ANNOTATION);

    match (owner_email, owner_dl_email) {
        (Some(owner_email), Some(owner_dl_email)) => Some(WorkloadRef {
            name: workload.name,
            namespace: namespace.to_string(),
            owner_email,
            owner_dl_email,
            annotations: workload.annotations,
        }),
        (owner, dl) => {
            warn!(
                namespace = %namespace,
                workload = %workload.name,
                has_owner = owner.is_some(),
                has_dl = dl.is_some(),
                "Workload missing owner annotations, skipping"
            );
            None
        }
    }
}

fn annotation(workload: &Workload, key: &str) -> Option<String> {
    workload
        .annotations
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::InMemoryCluster;

    fn owners() -> [(&'static str, &'static str); 2] {
        [
            (OWNER_EMAIL_ANNOTATION, "alice@corp.example"),
            (OWNER_DL_ANNOTATION, "payments@corp.example"),
        ]
    }

    fn excluded(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_discover_filters_annotations() {
        let cluster = InMemoryCluster::new()
            .with_workload("prod", "billing", &owners())
            .with_workload("prod", "reports", &[(OWNER_EMAIL_ANNOTATION, "bob@corp.example")])
            .with_workload("prod", "untagged", &[]);

        let found = discover(&cluster, &HashSet::new()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "billing");
        assert_eq!(found[0].namespace, "prod");
        assert_eq!(found[0].owner_email, "alice@corp.example");
        assert_eq!(found[0].owner_dl_email, "payments@corp.example");
    }

    #[tokio::test]
    async fn test_discover_keeps_whitespace_values_verbatim() {
        let cluster = InMemoryCluster::new().with_workload(
            "prod",
            "ledger",
            &[(OWNER_EMAIL_ANNOTATION, " bob@corp.example"), (OWNER_DL_ANNOTATION, " ")],
        );

        let found = discover(&cluster, &HashSet::new()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ledger");
        assert_eq!(found[0].owner_email, " bob@corp.example");
        assert_eq!(found[0].owner_dl_email, " ");
    }

    #[tokio::test]
    async fn test_discover_skips_excluded_namespaces() {
        let cluster = InMemoryCluster::new()
            .with_workload("kube-system", "coredns", &owners())
            .with_workload("Kube-System", "odd", &owners())
            .with_workload("prod", "billing", &owners());

        let found = discover(&cluster, &excluded(&["kube-system"])).await.unwrap();
        let names: Vec<&str> = found.iter().map(|w| w.name.as_str()).collect();
        // exact, case-sensitive match
        assert_eq!(names, vec!["odd", "billing"]);
        assert_eq!(cluster.workload_list_calls(), 2);
    }

    #[tokio::test]
    async fn test_discover_survives_namespace_failure() {
        let cluster = InMemoryCluster::new()
            .with_workload("a", "one", &owners())
            .with_workload("b", "two", &owners())
            .with_workload("c", "three", &owners())
            .failing_workload_listing("b");

        let found = discover(&cluster, &HashSet::new()).await.unwrap();
        let names: Vec<&str> = found.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_discover_fails_fast_on_namespace_listing() {
        let cluster = InMemoryCluster::new()
            .with_workload("prod", "billing", &owners())
            .failing_namespace_listing();

        let result = discover(&cluster, &HashSet::new()).await;
        assert!(result.is_err());
        assert_eq!(cluster.workload_list_calls(), 0);
    }

    #[tokio::test]
    async fn test_discover_keeps_source_order_and_annotations() {
        let cluster = InMemoryCluster::new()
            .with_workload("prod", "zeta", &[owners()[0], owners()[1], ("team", "payments")])
            .with_workload("prod", "alpha", &owners());

        let found = discover(&cluster, &HashSet::new()).await.unwrap();
        assert_eq!(found[0].name, "zeta");
        assert_eq!(found[1].name, "alpha");
        assert_eq!(found[0].annotations.get("team").map(String::as_str), Some("payments"));
    }
}
