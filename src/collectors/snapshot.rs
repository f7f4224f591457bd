//! Point-in-time copies of node directories.
//!
//! A node directory is first synchronized into a private staging directory on
//! the node and then streamed to the host as a tar archive. Taking the
//! archive from the staging copy avoids reading files that keep changing
//! while the transfer runs.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::collectors::untar::TarUnpacker;
use crate::error::{keep_first_error, CollectError};
use crate::exec::CommandRunner;
use crate::nodes::Node;

/// Copies directories from nodes to the host.
#[derive(Clone)]
pub struct DirSnapshotter {
    runner: Arc<dyn CommandRunner>,
    unpacker: TarUnpacker,
}

impl DirSnapshotter {
    pub fn new(runner: Arc<dyn CommandRunner>, unpacker: TarUnpacker) -> Self {
        Self { runner, unpacker }
    }

    /// Copy `node_dir` on `node` into `host_dir`.
    ///
    /// The staging directory created on the node is removed before this
    /// returns, whether or not the transfer succeeded. A removal failure is
    /// only reported when nothing else failed.
    pub async fn dump_dir(&self, node: &Node, node_dir: &str, host_dir: &Path) -> Result<()> {
        let tmp = self.mktemp(node).await?;
        debug!("Staging {}:{} in {}", node, node_dir, tmp);

        let transferred = self.transfer(node, node_dir, &tmp, host_dir).await;
        let removed = self.runner.run(&node.command("rm", ["-rf", tmp.as_str()]), None).await;

        keep_first_error(transferred, removed)?;
        info!("Copied {}:{} to {}", node, node_dir, host_dir.display());
        Ok(())
    }

    async fn mktemp(&self, node: &Node) -> Result<String> {
        let mut lines = self.runner.output_lines(&node.command("mktemp", ["-d"])).await?;
        if lines.len() != 1 {
            return Err(CollectError::InvalidMktempOutput { output: lines.join("\n") }.into());
        }
        Ok(lines.remove(0))
    }

    async fn transfer(&self, node: &Node, node_dir: &str, tmp: &str, host_dir: &Path) -> Result<()> {
        let source = format!("{}/", clean_node_path(node_dir));
        self.runner
            .run(&node.command("rsync", ["--archive", source.as_str(), tmp]), None)
            .await?;

        let unpacker = self.unpacker.clone();
        let host_dir: PathBuf = host_dir.to_path_buf();
        let node_dir = node_dir.to_string();
        let cmd = node.command("tar", ["--hard-dereference", "-C", tmp, "-chf", "-", "."]);

        self.runner
            .run_with_stdout_reader(
                &cmd,
                Box::new(move |reader: &mut dyn Read| {
                    unpacker
                        .unpack(reader, &host_dir)
                        .with_context(|| format!("Untarring {:?}", node_dir))
                }),
            )
            .await
    }
}

/// Lexically normalize a slash-separated node path.
///
/// Repeated and trailing separators and `.` segments are dropped and `..`
/// removes the preceding segment. An empty path becomes `.`.
pub fn clean_node_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
