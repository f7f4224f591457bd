//! Cluster nodes and their discovery.

use std::fmt;

use anyhow::{Context, Result};
use log::debug;

use crate::constants::CLUSTER_LABEL_KEY;
use crate::exec::{Command, CommandRunner, Target};

/// One node container of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    name: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Stable node name, also used as the node's output subdirectory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A command that runs inside this node.
    pub fn command<I, S>(&self, program: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::new(Target::Node(self.name.clone()), program, args)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// List the node containers belonging to `cluster`, sorted by name.
pub async fn list_nodes(runner: &dyn CommandRunner, provider: &str, cluster: &str) -> Result<Vec<Node>> {
    let filter = format!("label={}={}", CLUSTER_LABEL_KEY, cluster);
    let cmd = Command::host(
        provider,
        ["ps", "-a", "--filter", filter.as_str(), "--format", "{{.Names}}"],
    );

    let lines = runner
        .output_lines(&cmd)
        .await
        .with_context(|| format!("Failed to list nodes for cluster {:?}", cluster))?;

    let mut nodes: Vec<Node> = lines.into_iter().map(Node::new).collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} node(s) for cluster {:?}", nodes.len(), cluster);
    Ok(nodes)
}
