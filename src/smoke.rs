//! Smoke runs over one or more environment directories.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::TfSmokeError;
use crate::terraform::{Options, PlanModule, PlanStruct, TerraformError};

#[derive(Debug)]
pub struct PlanOutcome {
    pub dir: PathBuf,
    pub result: Result<PlanStruct, TerraformError>,
}

impl PlanOutcome {
    /// A run passes when it produced a plan document.
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Rejects the same directory appearing twice in a concurrent run.
///
/// Terraform keeps `.terraform/` and the lock file per directory, so two
/// concurrent runs against one directory would interfere.
pub fn ensure_distinct_dirs(options: &[Options]) -> Result<(), TfSmokeError> {
    let mut seen = BTreeSet::new();
    for opts in options {
        let key = std::fs::canonicalize(opts.dir()).unwrap_or_else(|_| opts.dir().to_path_buf());
        if !seen.insert(key) {
            return Err(TfSmokeError::Config(format!(
                "directory '{}' listed more than once; parallel runs need distinct directories",
                opts.dir().display()
            )));
        }
    }
    Ok(())
}

/// Plans every directory and returns outcomes in input order.
///
/// Failures never abort the other runs; each outcome carries its own result.
pub async fn run_plans(
    planner: Arc<dyn PlanModule>,
    options: Vec<Options>,
    parallel: bool,
) -> Result<Vec<PlanOutcome>, TfSmokeError> {
    if !parallel {
        let mut outcomes = Vec::with_capacity(options.len());
        for opts in options {
            let result = planner.plan_module(&opts).await;
            log_outcome(&opts, &result);
            outcomes.push(PlanOutcome {
                dir: opts.terraform_dir,
                result,
            });
        }
        return Ok(outcomes);
    }

    ensure_distinct_dirs(&options)?;

    let mut set = JoinSet::new();
    for (index, opts) in options.into_iter().enumerate() {
        let planner = Arc::clone(&planner);
        set.spawn(async move {
            let result = planner.plan_module(&opts).await;
            log_outcome(&opts, &result);
            (
                index,
                PlanOutcome {
                    dir: opts.terraform_dir,
                    result,
                },
            )
        });
    }

    let mut indexed = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        let (index, outcome) = joined
            .map_err(|e| TfSmokeError::Task(e.to_string()))?;
        indexed.push((index, outcome));
    }
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
}

fn log_outcome(options: &Options, result: &Result<PlanStruct, TerraformError>) {
    match result {
        Ok(plan) => tracing::info!(
            dir = %options.dir().display(),
            resources = plan.resource_count(),
            "plan passed"
        ),
        Err(e) => tracing::error!(
            dir = %options.dir().display(),
            kind = ?e.kind(),
            error = %e,
            "plan failed"
        ),
    }
}
