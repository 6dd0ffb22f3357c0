use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use kube_health_notifier::{load_config, run_health_check, EmailNotifier, KubeClusterReader};

/// Sweep cluster workloads and email owners about unhealthy services.
#[derive(Parser)]
#[command(name = "kube-health-notifier", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "HEALTH_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// Evaluate everything but send no emails
    #[arg(long)]
    dry_run: bool,

    /// Print the sweep report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = load_config(&cli.config)?;
    info!("excluded namespaces = {:?}", cfg.excluded_namespaces);

    let reader = KubeClusterReader::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    // dry runs never send, so SMTP settings are not validated
    let notifier = if cli.dry_run {
        None
    } else {
        Some(EmailNotifier::from_config(&cfg)?)
    };

    let run = run_health_check(&reader, notifier.as_ref(), &cfg, cli.dry_run).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run.report)?);
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}
