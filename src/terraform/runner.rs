use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::command::{CommandExecutor, CommandOutput, CommandSpec, ProcessExecutor};
use super::{Options, PlanStruct, TerraformError};

// Stderr fragments Terraform prints when the module itself is at fault.
const CONFIGURATION_MARKERS: &[&str] = &[
    "problems with the configuration",
    "Unsupported argument",
    "Unsupported block type",
    "Argument or block definition required",
    "Missing required argument",
    "Invalid expression",
    "Reference to undeclared",
    "Module not installed",
    "Unreadable module directory",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerraformVersion {
    pub terraform_version: String,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Narrow adapter: plan one module directory and hand back the structured plan.
#[async_trait]
pub trait PlanModule: Send + Sync {
    async fn plan_module(&self, options: &Options) -> Result<PlanStruct, TerraformError>;
}

/// Drives `terraform init`, `plan` and `show -json` for an environment directory.
///
/// Never runs `apply`.
#[derive(Debug, Clone, Default)]
pub struct TerraformRunner<E = ProcessExecutor> {
    executor: E,
}

impl TerraformRunner<ProcessExecutor> {
    pub fn new() -> Self {
        Self::with_executor(ProcessExecutor)
    }
}

impl<E: CommandExecutor> TerraformRunner<E> {
    /// NOTE: Primarily used for testing with a scripted executor.
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub async fn version(&self, binary: &Path) -> Result<TerraformVersion, TerraformError> {
        let spec = CommandSpec {
            step: "version",
            binary: binary.to_path_buf(),
            args: vec!["version".to_string(), "-json".to_string()],
            working_dir: PathBuf::from("."),
            env: Default::default(),
            timeout: None,
        };
        let output = self.executor.execute(&spec).await?;
        if !output.success() {
            return Err(execution_error("version", output));
        }

        serde_json::from_str(&output.stdout).map_err(|e| TerraformError::Version {
            message: format!("Failed to parse version output: {}", e),
        })
    }

    pub async fn init(&self, options: &Options) -> Result<String, TerraformError> {
        check_terraform_dir(options.dir())?;
        self.run_init(options).await
    }

    pub async fn plan(&self, options: &Options, plan_file: &Path) -> Result<String, TerraformError> {
        check_terraform_dir(options.dir())?;
        self.run_plan(options, plan_file).await
    }

    pub async fn show(&self, options: &Options, plan_file: &Path) -> Result<String, TerraformError> {
        self.run_step("show", options, options.show_args(plan_file))
            .await
    }

    pub async fn init_and_plan(
        &self,
        options: &Options,
        plan_file: &Path,
    ) -> Result<String, TerraformError> {
        check_terraform_dir(options.dir())?;
        self.run_init(options).await?;
        self.run_plan(options, plan_file).await
    }

    pub async fn init_and_plan_and_show(&self, options: &Options) -> Result<String, TerraformError> {
        check_terraform_dir(options.dir())?;

        // Held until the end of this function so the scratch plan outlives `show`.
        let scratch;
        let plan_file = match &options.plan_file_path {
            Some(path) => path.clone(),
            None => {
                scratch = tempfile::Builder::new().prefix("tfsmoke-").tempdir()?;
                scratch.path().join("plan.tfplan")
            }
        };

        self.run_init(options).await?;
        self.run_plan(options, &plan_file).await?;
        self.show(options, &plan_file).await
    }

    pub async fn init_and_plan_and_show_with_struct(
        &self,
        options: &Options,
    ) -> Result<PlanStruct, TerraformError> {
        let json = self.init_and_plan_and_show(options).await?;
        let plan = PlanStruct::parse(&json)?;

        tracing::info!(
            dir = %options.dir().display(),
            resources = plan.resource_count(),
            changes = %plan.change_summary(),
            "plan complete"
        );

        Ok(plan)
    }

    // Callers have already validated the directory.
    async fn run_init(&self, options: &Options) -> Result<String, TerraformError> {
        self.run_step("init", options, options.init_args()).await
    }

    async fn run_plan(&self, options: &Options, plan_file: &Path) -> Result<String, TerraformError> {
        self.run_step("plan", options, options.plan_args(plan_file))
            .await
    }

    async fn run_step(
        &self,
        step: &'static str,
        options: &Options,
        args: Vec<String>,
    ) -> Result<String, TerraformError> {
        let spec = CommandSpec {
            step,
            binary: options.terraform_binary.clone(),
            args,
            working_dir: options.terraform_dir.clone(),
            env: options.child_env(),
            timeout: options.timeout,
        };

        tracing::info!(step, dir = %options.dir().display(), "running terraform");
        let output = self.executor.execute(&spec).await?;

        if output.success() {
            return Ok(output.stdout);
        }

        tracing::warn!(step, exit_code = ?output.exit_code, "terraform step failed");

        if step != "show" && is_configuration_error(&output.stderr) {
            return Err(TerraformError::Configuration {
                dir: options.terraform_dir.clone(),
                message: output.stderr,
            });
        }
        Err(execution_error(step, output))
    }
}

#[async_trait]
impl<E: CommandExecutor> PlanModule for TerraformRunner<E> {
    async fn plan_module(&self, options: &Options) -> Result<PlanStruct, TerraformError> {
        self.init_and_plan_and_show_with_struct(options).await
    }
}

/// Runs init, plan and show with the real `terraform` binary.
pub async fn init_and_plan_and_show_with_struct(
    options: &Options,
) -> Result<PlanStruct, TerraformError> {
    TerraformRunner::new()
        .init_and_plan_and_show_with_struct(options)
        .await
}

pub fn check_terraform_dir(dir: &Path) -> Result<(), TerraformError> {
    if !dir.exists() {
        return Err(TerraformError::Configuration {
            dir: dir.to_path_buf(),
            message: "directory does not exist".to_string(),
        });
    }
    if !dir.is_dir() {
        return Err(TerraformError::Configuration {
            dir: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let has_config = std::fs::read_dir(dir)?.filter_map(Result::ok).any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.ends_with(".tf") || name.ends_with(".tf.json")
    });
    if !has_config {
        return Err(TerraformError::Configuration {
            dir: dir.to_path_buf(),
            message: "no .tf or .tf.json files found".to_string(),
        });
    }

    Ok(())
}

fn is_configuration_error(stderr: &str) -> bool {
    CONFIGURATION_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

fn execution_error(step: &'static str, output: CommandOutput) -> TerraformError {
    TerraformError::Execution {
        step,
        exit_code: output.exit_code,
        stderr: output.stderr,
    }
}
