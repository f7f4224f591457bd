use std::fs::File;
use std::process::{ExitStatus, Stdio};

use anyhow::{anyhow, Context, Result};
use log::debug;
use tokio::io::AsyncReadExt;
use tokio_util::io::SyncIoBridge;

use crate::error::CollectError;
use crate::exec::{split_output_lines, Command, CommandRunner, StdoutConsumer, Target};

/// Runs commands as local processes.
///
/// Node commands are routed through the container runtime, i.e.
/// `docker exec --privileged <node> <program> <args..>`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    provider: String,
}

impl ProcessRunner {
    /// Create a runner that reaches nodes through the `provider` binary (`docker`, `podman`).
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into() }
    }

    fn build(&self, cmd: &Command) -> tokio::process::Command {
        let mut process = match &cmd.target {
            Target::Host => {
                let mut process = tokio::process::Command::new(&cmd.program);
                process.args(&cmd.args);
                process
            }
            Target::Node(name) => {
                let mut process = tokio::process::Command::new(&self.provider);
                process
                    .arg("exec")
                    .arg("--privileged")
                    .arg(name)
                    .arg(&cmd.program)
                    .args(&cmd.args);
                process
            }
        };
        process.stdin(Stdio::null()).kill_on_drop(true);
        process
    }
}

fn check_status(cmd: &Command, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(CollectError::CommandFailed {
        command: cmd.to_string(),
        status,
        stderr: String::from_utf8_lossy(stderr).into_owned(),
    }
    .into())
}

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cmd: &Command, output: Option<&File>) -> Result<()> {
        debug!("Running: {}", cmd);
        let mut process = self.build(cmd);

        match output {
            Some(file) => {
                let stdout = file.try_clone().context("Failed to duplicate output file handle")?;
                let stderr = file.try_clone().context("Failed to duplicate output file handle")?;
                process.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));

                let status = process
                    .status()
                    .await
                    .with_context(|| format!("Failed to execute \"{}\"", cmd))?;
                check_status(cmd, status, &[])
            }
            None => {
                process.stdout(Stdio::null()).stderr(Stdio::piped());

                let out = process
                    .output()
                    .await
                    .with_context(|| format!("Failed to execute \"{}\"", cmd))?;
                check_status(cmd, out.status, &out.stderr)
            }
        }
    }

    async fn output_lines(&self, cmd: &Command) -> Result<Vec<String>> {
        debug!("Running: {}", cmd);
        let mut process = self.build(cmd);
        process.stdout(Stdio::piped()).stderr(Stdio::piped());

        let out = process
            .output()
            .await
            .with_context(|| format!("Failed to execute \"{}\"", cmd))?;
        check_status(cmd, out.status, &out.stderr)?;

        Ok(split_output_lines(&out.stdout))
    }

    async fn run_with_stdout_reader(&self, cmd: &Command, consumer: StdoutConsumer) -> Result<()> {
        debug!("Streaming stdout of: {}", cmd);
        let mut process = self.build(cmd);
        process.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = process
            .spawn()
            .with_context(|| format!("Failed to execute \"{}\"", cmd))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout of \"{}\" was not captured", cmd))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr of \"{}\" was not captured", cmd))?;

        // The bridge must be created on the runtime; it is then driven from a blocking thread.
        let mut reader = SyncIoBridge::new(stdout);
        let consumer_task = tokio::task::spawn_blocking(move || {
            let result = consumer(&mut reader);
            if result.is_ok() {
                // drain trailing record padding so the producer can exit
                let _ = std::io::copy(&mut reader, &mut std::io::sink());
            }
            result
        });

        let mut stderr_buf = Vec::new();
        let (status, stderr_read) = tokio::join!(child.wait(), stderr.read_to_end(&mut stderr_buf));

        consumer_task
            .await
            .with_context(|| format!("stdout consumer for \"{}\" panicked", cmd))??;

        let status = status.with_context(|| format!("Failed to wait for \"{}\"", cmd))?;
        stderr_read.with_context(|| format!("Failed to read stderr of \"{}\"", cmd))?;
        check_status(cmd, status, &stderr_buf)
    }
}
