//! tfsmoke - Terraform plan smoke runner
//!
//! Drives `terraform init`, `plan` and `show -json` against an environment
//! directory and returns the structured plan, without ever applying it.

pub mod cli;
pub mod output;
pub mod smoke;
pub mod terraform;

mod error;

pub use error::TfSmokeError;
pub use smoke::{PlanOutcome, run_plans};
pub use terraform::{
    ErrorKind, Options, PlanModule, PlanStruct, TerraformError, TerraformRunner,
    init_and_plan_and_show_with_struct,
};
