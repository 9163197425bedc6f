use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";

/// Settings for a single Terraform run against one environment directory.
///
/// Built fresh per run and owned by the caller; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub terraform_dir: PathBuf,
    pub no_color: bool,
    pub terraform_binary: PathBuf,
    /// Where `plan -out` writes. `None` means a scratch file removed after the run.
    pub plan_file_path: Option<PathBuf>,
    pub vars: BTreeMap<String, String>,
    pub var_files: Vec<PathBuf>,
    pub env_vars: BTreeMap<String, String>,
    pub lock: bool,
    pub plugin_cache_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Options {
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            no_color: false,
            terraform_binary: PathBuf::from(DEFAULT_TERRAFORM_BINARY),
            plan_file_path: None,
            vars: BTreeMap::new(),
            var_files: Vec::new(),
            env_vars: BTreeMap::new(),
            lock: false,
            plugin_cache_dir: None,
            timeout: None,
        }
    }

    pub fn no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn terraform_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.terraform_binary = binary.into();
        self
    }

    pub fn plan_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file_path = Some(path.into());
        self
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn plugin_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_cache_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.terraform_dir
    }

    pub fn init_args(&self) -> Vec<String> {
        let mut args = vec![
            "init".to_string(),
            "-upgrade=false".to_string(),
            "-input=false".to_string(),
        ];
        self.push_no_color(&mut args);
        args
    }

    pub fn plan_args(&self, plan_file: &Path) -> Vec<String> {
        let mut args = vec![
            "plan".to_string(),
            "-input=false".to_string(),
            format!("-lock={}", self.lock),
            format!("-out={}", plan_file.display()),
        ];
        for (key, value) in &self.vars {
            args.push("-var".to_string());
            args.push(format!("{key}={value}"));
        }
        for file in &self.var_files {
            args.push("-var-file".to_string());
            args.push(file.display().to_string());
        }
        self.push_no_color(&mut args);
        args
    }

    pub fn show_args(&self, plan_file: &Path) -> Vec<String> {
        let mut args = vec!["show".to_string(), "-json".to_string()];
        self.push_no_color(&mut args);
        args.push(plan_file.display().to_string());
        args
    }

    /// Environment handed to every child process.
    pub fn child_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("TF_IN_AUTOMATION".to_string(), "1".to_string());
        if let Some(dir) = &self.plugin_cache_dir {
            env.insert(
                "TF_PLUGIN_CACHE_DIR".to_string(),
                dir.display().to_string(),
            );
        }
        env.extend(self.env_vars.clone());
        env
    }

    fn push_no_color(&self, args: &mut Vec<String>) {
        if self.no_color {
            args.push("-no-color".to_string());
        }
    }
}

/// Default plugin cache under the user's cache directory.
pub fn default_plugin_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|base| base.join("tfsmoke").join("plugin-cache"))
}
