use thiserror::Error;

use crate::types::HealthVerdict;

/// Errors returned by a [`ClusterReader`](crate::cluster::ClusterReader).
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// Per-workload evaluation failure. Never aborts a sweep.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("failed to list pods for {namespace}/{workload}: {source}")]
    ListPods {
        namespace: String,
        workload: String,
        #[source]
        source: ClusterError,
    },
}

impl EvaluationError {
    /// Verdict reported alongside the error.
    pub fn verdict(&self) -> HealthVerdict {
        match self {
            EvaluationError::ListPods { .. } => HealthVerdict::unhealthy("Failed to list pods", ""),
        }
    }
}

/// Errors raised while rendering or delivering an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to render alert: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("{0}")]
    Other(String),
}
