use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use tfsmoke::cli::{Cli, Command, OutputFormat, PlanArgs};
use tfsmoke::terraform::{TerraformRunner, default_plugin_cache_dir};
use tfsmoke::{TfSmokeError, output, run_plans};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => plan(args).await?,
        Command::Doctor(args) => {
            let version = TerraformRunner::new().version(&args.terraform_bin).await?;
            println!(
                "terraform {} ({})",
                version.terraform_version,
                version.platform.as_deref().unwrap_or("unknown platform")
            );
        }
    }

    Ok(())
}

async fn plan(args: PlanArgs) -> Result<()> {
    let plugin_cache = if args.plugin_cache {
        let dir = default_plugin_cache_dir().ok_or_else(|| {
            TfSmokeError::Config("could not determine a user cache directory".to_string())
        })?;
        std::fs::create_dir_all(&dir).map_err(TfSmokeError::Io)?;
        Some(dir)
    } else {
        None
    };

    let options = args
        .dirs
        .iter()
        .map(|dir| args.options_for(dir.clone(), plugin_cache.as_ref()))
        .collect();

    let outcomes = run_plans(Arc::new(TerraformRunner::new()), options, args.parallel).await?;

    match args.format {
        OutputFormat::Table => println!("{}", output::outcome_table(&outcomes)),
        OutputFormat::Tree => {
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(plan) => {
                        println!("{}", output::plan_tree(&outcome.dir.display().to_string(), plan))
                    }
                    Err(e) => println!("{}\n└── FAIL: {}", outcome.dir.display(), e),
                }
            }
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&output::outcomes_json(&outcomes))?
        ),
    }

    let failed = outcomes.iter().filter(|o| !o.passed()).count();
    if failed > 0 {
        return Err(TfSmokeError::PlansFailed {
            failed,
            total: outcomes.len(),
        }
        .into());
    }

    tracing::info!(count = outcomes.len(), "all plans passed");
    Ok(())
}
