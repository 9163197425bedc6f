//! Terraform CLI adapter: options, process execution, and structured plans.

mod command;
mod error;
mod options;
mod plan;
mod runner;

pub use command::{CommandExecutor, CommandOutput, CommandSpec, ProcessExecutor};
pub use error::{ErrorKind, TerraformError};
pub use options::{DEFAULT_TERRAFORM_BINARY, Options, default_plugin_cache_dir};
pub use plan::{Action, Change, ChangeSummary, PlanStruct, PlannedResource, ResourceChange};
pub use runner::{
    PlanModule, TerraformRunner, TerraformVersion, check_terraform_dir,
    init_and_plan_and_show_with_struct,
};
