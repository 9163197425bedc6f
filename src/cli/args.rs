use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::terraform::{DEFAULT_TERRAFORM_BINARY, Options};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run init, plan and show -json for each environment directory
    Plan(PlanArgs),
    /// Check that the terraform binary can be started
    Doctor(DoctorArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Tree,
    Json,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    #[arg(
        long = "dir",
        env = "TFSMOKE_TERRAFORM_DIR",
        default_value = "envs/dev",
        value_delimiter = ','
    )]
    pub dirs: Vec<PathBuf>,

    #[arg(
        long,
        env = "TFSMOKE_NO_COLOR",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub no_color: bool,

    #[arg(long, env = "TFSMOKE_TERRAFORM_BIN", default_value = DEFAULT_TERRAFORM_BINARY)]
    pub terraform_bin: PathBuf,

    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    #[arg(long = "var-file")]
    pub var_files: Vec<PathBuf>,

    /// Plan all directories concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Per-step timeout in seconds
    #[arg(long, env = "TFSMOKE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Share downloaded providers through the user cache directory
    #[arg(long)]
    pub plugin_cache: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl PlanArgs {
    /// Terraform runs inside `dir`, so caller-relative paths are made absolute here.
    pub fn options_for(&self, dir: PathBuf, plugin_cache_dir: Option<&PathBuf>) -> Options {
        let mut options = Options::new(dir)
            .no_color(self.no_color)
            .terraform_binary(resolve_binary(&self.terraform_bin));
        for (key, value) in &self.vars {
            options = options.var(key.clone(), value.clone());
        }
        for file in &self.var_files {
            options = options.var_file(absolute(file));
        }
        if let Some(secs) = self.timeout {
            options = options.timeout(Duration::from_secs(secs));
        }
        if let Some(cache) = plugin_cache_dir {
            options = options.plugin_cache_dir(cache.clone());
        }
        options
    }
}

#[derive(clap::Args, Debug)]
pub struct DoctorArgs {
    #[arg(long, env = "TFSMOKE_TERRAFORM_BIN", default_value = DEFAULT_TERRAFORM_BINARY)]
    pub terraform_bin: PathBuf,
}

// A bare name like `terraform` is left for PATH lookup.
fn resolve_binary(binary: &Path) -> PathBuf {
    if binary.components().count() > 1 {
        absolute(binary)
    } else {
        binary.to_path_buf()
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
