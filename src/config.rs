use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "loader_check.toml";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("load {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = toml::from_str(raw).context("parse config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        fn check_non_empty(name: &str, v: &str) -> anyhow::Result<()> {
            if v.trim().is_empty() {
                anyhow::bail!("invalid {name}: must not be empty");
            }
            Ok(())
        }

        check_non_empty("runner.program", &self.runner.program)?;
        check_non_empty("runner.module", &self.runner.module)?;
        if self.runner.datasets_root.as_os_str().is_empty() {
            anyhow::bail!("invalid runner.datasets_root: must not be empty");
        }
        if let Some(dir) = &self.runner.working_dir {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("invalid runner.working_dir: must not be empty when set");
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunnerConfig {
    /// Interpreter used to launch the test module.
    #[serde(default = "default_program")]
    pub program: String,
    /// Module passed with `-m`.
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default = "default_datasets_root")]
    pub datasets_root: PathBuf,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            module: default_module(),
            datasets_root: default_datasets_root(),
            working_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Loader paths are resolved against the children's working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn default_program() -> String {
    "python".to_string()
}

fn default_module() -> String {
    "tests.test_seacrowd_source_only".to_string()
}

fn default_datasets_root() -> PathBuf {
    PathBuf::from("seacrowd/sea_datasets")
}

#[derive(Clone, Debug, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub fail_fast: bool,
    /// Exit non-zero when any invocation failed.
    #[serde(default)]
    pub propagate_status: bool,
    #[serde(default = "default_warn_missing_loader")]
    pub warn_missing_loader: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            propagate_status: false,
            warn_missing_loader: default_warn_missing_loader(),
        }
    }
}

fn default_warn_missing_loader() -> bool {
    true
}
