use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};

use cluster_log_collector::cli::Args;
use cluster_log_collector::collectors::collector::Collector;
use cluster_log_collector::config::{load_or_create_config, CollectionConfig};
use cluster_log_collector::exec::{CommandRunner, ProcessRunner};
use cluster_log_collector::logging::initialize_logging;
use cluster_log_collector::nodes::{list_nodes, Node};

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    let config = load_config(&args)?;
    let output_dir = resolve_output_dir(&args, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let failed = runtime.block_on(export_logs(&args, config, &output_dir))?;

    // the output location is the one thing printed on stdout
    println!("{}", output_dir.display());

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Load the configuration file and apply command-line overrides
fn load_config(args: &Args) -> Result<CollectionConfig> {
    let mut config = load_or_create_config(args.config.as_deref())?;
    if let Some(name) = &args.name {
        config.cluster = name.clone();
    }
    if let Some(provider) = &args.provider {
        config.provider = provider.clone();
    }
    Ok(config)
}

fn resolve_output_dir(args: &Args, config: &CollectionConfig) -> PathBuf {
    match &args.output {
        Some(path) => path.clone(),
        None => {
            let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
            env::temp_dir().join(format!("{}-logs-{}", config.cluster, timestamp))
        }
    }
}

/// Run the collection; returns whether anything failed
async fn export_logs(args: &Args, config: CollectionConfig, output_dir: &Path) -> Result<bool> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(config.provider.clone()));

    let nodes = if args.nodes.is_empty() {
        list_nodes(runner.as_ref(), &config.provider, &config.cluster).await?
    } else {
        args.nodes.iter().map(Node::new).collect()
    };
    if nodes.is_empty() {
        return Err(anyhow!("no nodes found for cluster {:?}", config.cluster));
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    info!(
        "Exporting logs for cluster {:?} ({} node(s)) to: {}",
        config.cluster,
        nodes.len(),
        output_dir.display()
    );

    let collector = Collector::new(runner, config);
    let report = collector.collect(&nodes, output_dir).await;

    for failure in report.failures() {
        error!("{:#}", failure);
    }
    info!("{}", report);

    Ok(!report.is_empty())
}
