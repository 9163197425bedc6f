use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use super::TerraformError;

/// One invocation of the Terraform CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub step: &'static str,
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam between the plan runner and process execution.
///
/// Implementations return `Ok` for any process that ran to completion,
/// whatever its exit code; only failures to start or finish are errors.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, TerraformError>;
}

/// Spawns real child processes through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, TerraformError> {
        let mut command = tokio::process::Command::new(&spec.binary);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            step = spec.step,
            binary = %spec.binary.display(),
            args = ?spec.args,
            "spawning terraform"
        );

        let child = command
            .spawn()
            .map_err(|source| TerraformError::Environment {
                binary: spec.binary.clone(),
                source,
            })?;

        let output = match spec.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| TerraformError::Timeout {
                    step: spec.step,
                    timeout,
                })??,
            None => child.wait_with_output().await?,
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
