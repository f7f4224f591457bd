use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use log::info;

use crate::collectors::aggregate::{aggregate_concurrent, Action};
use crate::collectors::snapshot::DirSnapshotter;
use crate::collectors::untar::TarUnpacker;
use crate::config::CollectionConfig;
use crate::constants::{
    CONTAINERD_LOG_FILE, CONTAINERD_UNIT, HOST_INFO_FILE, INSPECT_FILE, JOURNAL_FILE,
    KUBELET_LOG_FILE, KUBELET_UNIT, SERIAL_LOG_FILE, VERSION_FILE,
};
use crate::error::AggregateError;
use crate::exec::{Command, CommandRunner};
use crate::nodes::Node;

/// Outcome of a collection run: every failure, empty when all actions succeeded.
#[derive(Debug, Default)]
pub struct CollectionReport {
    failures: Vec<anyhow::Error>,
}

impl CollectionReport {
    fn from_errors(errors: Vec<anyhow::Error>) -> Self {
        let failures = AggregateError::from_errors(errors)
            .map(AggregateError::into_errors)
            .unwrap_or_default();
        Self { failures }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[anyhow::Error] {
        &self.failures
    }

    /// Convert into a single aggregate error, `Ok` when nothing failed.
    pub fn into_result(self) -> Result<(), AggregateError> {
        match AggregateError::from_errors(self.failures) {
            Some(agg) => Err(agg),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "all collection actions succeeded");
        }
        write!(f, "{} collection action(s) failed", self.failures.len())
    }
}

/// Collects host and node diagnostics into a directory tree.
pub struct Collector {
    runner: Arc<dyn CommandRunner>,
    snapshotter: DirSnapshotter,
    config: CollectionConfig,
}

impl Collector {
    pub fn new(runner: Arc<dyn CommandRunner>, config: CollectionConfig) -> Self {
        Self::with_unpacker(runner, config, TarUnpacker::default())
    }

    pub fn with_unpacker(runner: Arc<dyn CommandRunner>, config: CollectionConfig, unpacker: TarUnpacker) -> Self {
        let snapshotter = DirSnapshotter::new(Arc::clone(&runner), unpacker);
        Self { runner, snapshotter, config }
    }

    /// Collect everything reachable from `nodes` and the host into `dir`.
    ///
    /// Never stops early: every planned action runs, and every failure ends
    /// up in the returned report.
    pub async fn collect(&self, nodes: &[Node], dir: &Path) -> CollectionReport {
        let provider = self.config.provider.as_str();

        let mut actions: Vec<Action> = vec![self.exec_to_path(
            Command::host(provider, ["info"]),
            dir.join(HOST_INFO_FILE),
        )];

        let mut errors = Vec::new();
        for node in nodes {
            let node_dir = dir.join(node.name());
            if let Err(e) = self
                .snapshotter
                .dump_dir(node, &self.config.remote_log_dir, &node_dir)
                .await
            {
                errors.push(e.context(format!(
                    "Failed to copy {} from {}",
                    self.config.remote_log_dir, node
                )));
            }
            actions.push(self.node_bundle(node, &node_dir));
        }

        info!("Running {} collection action(s)", actions.len());
        if let Err(agg) = aggregate_concurrent(actions).await {
            errors.push(anyhow::Error::new(agg));
        }

        CollectionReport::from_errors(errors)
    }

    /// All per-node captures, run concurrently with each other.
    fn node_bundle(&self, node: &Node, node_dir: &Path) -> Action {
        let provider = self.config.provider.as_str();
        let name = node.name();
        let journal = |extra: &[&str]| {
            let mut args = vec!["--no-pager"];
            args.extend_from_slice(extra);
            node.command("journalctl", args)
        };

        let captures = vec![
            self.exec_to_path(
                Command::host(provider, ["inspect", name]),
                node_dir.join(INSPECT_FILE),
            ),
            self.exec_to_path(
                Command::host(provider, ["logs", name]),
                node_dir.join(SERIAL_LOG_FILE),
            ),
            self.exec_to_path(
                node.command("cat", [self.config.version_file.as_str()]),
                node_dir.join(VERSION_FILE),
            ),
            self.exec_to_path(journal(&[]), node_dir.join(JOURNAL_FILE)),
            self.exec_to_path(journal(&["-u", KUBELET_UNIT]), node_dir.join(KUBELET_LOG_FILE)),
            self.exec_to_path(journal(&["-u", CONTAINERD_UNIT]), node_dir.join(CONTAINERD_LOG_FILE)),
        ];

        async move { aggregate_concurrent(captures).await.map_err(anyhow::Error::new) }.boxed()
    }

    /// Defer running `cmd` with its combined output written to `path`.
    fn exec_to_path(&self, cmd: Command, path: PathBuf) -> Action {
        let runner = Arc::clone(&self.runner);
        async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            let file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?
                .into_std()
                .await;

            runner.run(&cmd, Some(&file)).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ArchiveFixture, RecordingSink, ScriptedRunner};
    use std::fs;
    use tempfile::TempDir;

    fn collector(runner: &ScriptedRunner) -> Collector {
        Collector::with_unpacker(
            Arc::new(runner.clone()),
            CollectionConfig::default(),
            TarUnpacker::new(Arc::new(RecordingSink::default())),
        )
    }

    #[tokio::test]
    async fn test_no_nodes_collects_host_info() {
        let dest = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().with_output("docker info", b"Server Version: 24\n".to_vec());

        let report = collector(&runner).collect(&[], dest.path()).await;

        assert!(report.is_empty(), "{}", report);
        assert_eq!(
            fs::read_to_string(dest.path().join(HOST_INFO_FILE)).unwrap(),
            "Server Version: 24\n"
        );
    }

    #[tokio::test]
    async fn test_node_captures_land_in_node_dir() {
        let dest = TempDir::new().unwrap();
        let archive = ArchiveFixture::new()
            .dir("./", 0o755)
            .file("./syslog", 0o644, b"boot\n")
            .into_bytes();
        let runner = ScriptedRunner::new()
            .with_lines("mktemp", vec!["/tmp/stage"])
            .with_output("tar --hard-dereference", archive);

        let report = collector(&runner)
            .collect(&[Node::new("kind-control-plane")], dest.path())
            .await;
        assert!(report.is_empty(), "{}", report);

        let node_dir = dest.path().join("kind-control-plane");
        assert_eq!(fs::read_to_string(node_dir.join("syslog")).unwrap(), "boot\n");
        assert_eq!(
            fs::read_to_string(node_dir.join(KUBELET_LOG_FILE)).unwrap(),
            "[kind-control-plane] journalctl --no-pager -u kubelet.service\n"
        );
        assert_eq!(
            fs::read_to_string(node_dir.join(INSPECT_FILE)).unwrap(),
            "docker inspect kind-control-plane\n"
        );
        assert_eq!(
            fs::read_to_string(node_dir.join(VERSION_FILE)).unwrap(),
            "[kind-control-plane] cat /kind/version\n"
        );
    }

    #[tokio::test]
    async fn test_dump_failure_does_not_skip_captures() {
        let dest = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().failing("mktemp", "node unreachable");

        let report = collector(&runner)
            .collect(&[Node::new("a"), Node::new("b")], dest.path())
            .await;

        assert_eq!(report.len(), 2);
        for node in ["a", "b"] {
            assert!(dest.path().join(node).join(JOURNAL_FILE).exists());
            assert!(dest.path().join(node).join(CONTAINERD_LOG_FILE).exists());
        }
        assert!(report.into_result().is_err());
    }

    #[tokio::test]
    async fn test_dump_failure_names_node_and_dir() {
        let dest = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().failing("mktemp", "node unreachable");

        let report = collector(&runner).collect(&[Node::new("kind-worker")], dest.path()).await;

        assert_eq!(report.len(), 1);
        let failure = format!("{:#}", report.failures()[0]);
        assert!(failure.starts_with("Failed to copy /var/log from kind-worker"), "{}", failure);
        assert!(failure.contains("node unreachable"), "{}", failure);
    }

    #[tokio::test]
    async fn test_provider_and_log_dir_come_from_config() {
        let dest = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().with_lines("mktemp", vec!["/tmp/x"]);
        let config = CollectionConfig {
            provider: "podman".to_string(),
            remote_log_dir: "/var/log/pods".to_string(),
            ..CollectionConfig::default()
        };
        let collector = Collector::with_unpacker(
            Arc::new(runner.clone()),
            config,
            TarUnpacker::new(Arc::new(RecordingSink::default())),
        );

        let report = collector.collect(&[Node::new("n1")], dest.path()).await;
        assert!(report.is_empty(), "{}", report);

        assert_eq!(runner.count("podman info"), 1);
        assert_eq!(runner.count("podman logs n1"), 1);
        assert_eq!(runner.count("rsync --archive /var/log/pods/ /tmp/x"), 1);
        assert_eq!(runner.count("docker"), 0);
    }
}
