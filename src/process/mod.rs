//! Interpreter process management (spawn, drain, exit status).

use std::{path::Path, process::Stdio, time::Duration};

use anyhow::{anyhow, Context, Result};
use tokio::{process::Command, time::timeout};
use tracing::{debug, error, info};

use crate::{config::Config, execution::ExecutionResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub timeout: Option<Duration>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self { program: "node".into(), timeout: Some(Duration::from_secs(60)) }
    }
}

impl Interpreter {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self { program: program.into(), timeout }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self { program: cfg.interpreter(), timeout: cfg.exec_timeout() }
    }

    /// Run `<program> <script>` to completion. The path is passed as a
    /// single argv entry, never through a shell.
    pub async fn run(&self, script: &Path) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program))?;

        // wait_with_output drains both pipes concurrently.
        let out = match self.timeout {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| anyhow!("{} timed out after {}s", self.program, limit.as_secs_f32()))??,
            None => child.wait_with_output().await?,
        };

        let result = ExecutionResult {
            exit_status: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        };

        info!("[{}] {} {}", result.exit_status, self.program, script.display());
        debug!("{}", result.stdout);
        if !result.stderr.is_empty() {
            error!("{}", result.stderr);
        }

        Ok(result)
    }
}
