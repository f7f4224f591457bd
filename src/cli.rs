use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the log collector.
///
/// Values given here take precedence over the configuration file.
#[derive(Parser, Debug)]
#[clap(name = "cluster-logs", about = "Export diagnostic logs from cluster nodes")]
pub struct Args {
    /// Output directory (default: <tmp>/<cluster>-logs-<timestamp>)
    pub output: Option<PathBuf>,

    /// Cluster name used to discover node containers
    #[clap(short, long)]
    pub name: Option<String>,

    /// Explicit node names (comma-separated); skips discovery
    #[clap(long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Container runtime binary used to reach nodes (docker, podman)
    #[clap(long)]
    pub provider: Option<String>,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["cluster-logs"]);
        assert!(args.output.is_none());
        assert!(args.nodes.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_node_list() {
        let args = Args::parse_from([
            "cluster-logs",
            "/tmp/out",
            "--nodes",
            "kind-control-plane,kind-worker",
            "--provider",
            "podman",
            "-v",
        ]);
        assert_eq!(args.output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.nodes, vec!["kind-control-plane", "kind-worker"]);
        assert_eq!(args.provider.as_deref(), Some("podman"));
        assert!(args.verbose);
    }
}
