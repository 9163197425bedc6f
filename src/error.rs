use thiserror::Error;

#[derive(Debug, Error)]
pub enum TfSmokeError {
    #[error(transparent)]
    Terraform(#[from] crate::terraform::TerraformError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("plan task did not complete: {0}")]
    Task(String),

    #[error("{failed} of {total} plan(s) failed")]
    PlansFailed { failed: usize, total: usize },
}
