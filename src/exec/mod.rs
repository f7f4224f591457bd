//! Command execution against the local host or a cluster node.
//!
//! Collection code never spawns processes directly. It describes what to run
//! with a [`Command`] and hands it to a [`CommandRunner`], which decides how a
//! command reaches its target. [`ProcessRunner`] is the production
//! implementation; tests substitute scripted runners.

use std::fmt;
use std::fs::File;
use std::io::Read;

use anyhow::Result;

mod process;

pub use process::ProcessRunner;

/// Blocking consumer handed the live stdout of a running command.
pub type StdoutConsumer = Box<dyn FnOnce(&mut dyn Read) -> Result<()> + Send>;

/// Where a command executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The machine running the collector.
    Host,
    /// Inside the named node.
    Node(String),
}

/// A program invocation bound to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub target: Target,
    pub program: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new<I, S>(target: Target, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target,
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A command that runs on the local host.
    pub fn host<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Target::Host, program, args)
    }

    /// Program followed by its arguments, space separated.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Host => write!(f, "{}", self.command_line()),
            Target::Node(name) => write!(f, "[{}] {}", name, self.command_line()),
        }
    }
}

/// Executes commands on behalf of the collectors.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` to completion. When `output` is given both stdout and stderr
    /// are written to it; otherwise they are discarded.
    async fn run(&self, cmd: &Command, output: Option<&File>) -> Result<()>;

    /// Run `cmd` and return its stdout as trimmed, non-empty lines.
    async fn output_lines(&self, cmd: &Command) -> Result<Vec<String>>;

    /// Run `cmd`, handing its stdout to `consumer` while the command executes.
    ///
    /// A consumer failure is reported in preference to the command's own exit
    /// status.
    async fn run_with_stdout_reader(&self, cmd: &Command, consumer: StdoutConsumer) -> Result<()>;
}

/// Split raw command output into trimmed, non-empty lines.
pub fn split_output_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
