use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub command: String,
    pub subset_id: Option<String>,
    /// Child exit code; `None` when killed by a signal or never spawned.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub dataset: String,
    pub mode: String,
    pub dry_run: bool,
    pub halted_early: bool,
    pub invocations: Vec<InvocationRecord>,
}

impl DispatchSummary {
    pub fn failed(&self) -> usize {
        self.invocations.iter().filter(|r| !r.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn write_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(self).context("serialize dispatch summary")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn read_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&raw).context("decode dispatch summary")
    }

    /// `key=value` lines printed at the end of a run.
    pub fn report_lines(&self) -> Vec<String> {
        let mut out = vec![
            format!("dataset={}", self.dataset),
            format!("mode={}", self.mode),
            format!("invocations={}", self.invocations.len()),
            format!("failed={}", self.failed()),
        ];
        if self.halted_early {
            out.push("halted_early=true".to_string());
        }
        for r in self.invocations.iter().filter(|r| !r.success) {
            let code = r
                .exit_code
                .map_or_else(|| "none".to_string(), |c| c.to_string());
            out.push(format!(
                "failed_invocation subset_id={} exit_code={code}",
                r.subset_id.as_deref().unwrap_or("-")
            ));
        }
        out
    }
}
