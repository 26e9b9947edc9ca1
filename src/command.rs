use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RunnerConfig;
use crate::request::{InvocationRequest, Mode, FLAG_DATA_DIR, FLAG_SUBSET_ID};

/// One fully-resolved call of the external test runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// Subset id passed with `--subset_id`, if any.
    pub subset_id: Option<String>,
}

impl TestCommand {
    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for TestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

pub fn loader_path(datasets_root: &Path, dataset: &str) -> PathBuf {
    datasets_root.join(dataset).join(format!("{dataset}.py"))
}

/// Expands a request into the runner calls it implies, in execution order.
pub fn build_invocations(runner: &RunnerConfig, req: &InvocationRequest) -> Vec<TestCommand> {
    let loader = loader_path(&runner.datasets_root, &req.dataset);
    let loader = loader.to_string_lossy().into_owned();

    let mk = |extra: Option<(&str, String)>| {
        let mut args = vec!["-m".to_string(), runner.module.clone(), loader.clone()];
        let mut subset_id = None;
        if let Some((flag, value)) = extra {
            if flag == FLAG_SUBSET_ID {
                subset_id = Some(value.clone());
            }
            args.push(flag.to_string());
            args.push(value);
        }
        TestCommand {
            program: runner.program.clone(),
            args,
            current_dir: runner.working_dir.clone(),
            subset_id,
        }
    };

    match &req.mode {
        Mode::Default => vec![mk(None)],
        Mode::Folds(_) | Mode::SubsetId(_) => req
            .mode
            .subset_ids(&req.dataset)
            .into_iter()
            .map(|id| mk(Some((FLAG_SUBSET_ID, id))))
            .collect(),
        Mode::DataDir(dir) => vec![mk(Some((
            FLAG_DATA_DIR,
            dir.to_string_lossy().into_owned(),
        )))],
    }
}
