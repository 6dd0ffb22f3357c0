// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod cluster;
pub mod kubernetes;
pub mod discovery;
pub mod health;
pub mod scan;
pub mod report;
pub mod notify;

// Re-export commonly used items
pub use types::*;
pub use error::{ClusterError, EvaluationError, NotifyError};
pub use config::{load_config, load_config_with_env, parse_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use cluster::{memory::InMemoryCluster, ClusterReader};
pub use kubernetes::KubeClusterReader;
pub use discovery::discover;
pub use health::{HealthEvaluator, PodFailure};
pub use scan::{run_health_check, HealthCheckRun, Scanner};
pub use report::{SweepOutcome, SweepReport};
pub use notify::{email::EmailNotifier, DispatchResult, DispatchSummary, Dispatcher, Notifier};
