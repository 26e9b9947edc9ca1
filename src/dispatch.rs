use std::io::Write;
use std::time::Instant;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::command::TestCommand;
use crate::request::InvocationRequest;
use crate::summary::{DispatchSummary, InvocationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl Outcome {
    pub const fn ok() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
        }
    }

    pub const fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            success: code == 0,
        }
    }
}

/// Runs one test command to completion. `Err` means the command could not be started.
pub trait Executor {
    fn run(&mut self, cmd: &TestCommand) -> anyhow::Result<Outcome>;

    /// True when commands are only reported, never started.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Spawns the runner with inherited stdio and waits for it.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn run(&mut self, cmd: &TestCommand) -> anyhow::Result<Outcome> {
        let status = cmd
            .to_std()
            .status()
            .with_context(|| format!("spawn {}", cmd.program))?;
        Ok(Outcome {
            exit_code: status.code(),
            success: status.success(),
        })
    }
}

/// Prints each command line instead of running it.
#[derive(Debug)]
pub struct DryRunExecutor<W: Write> {
    out: W,
}

impl<W: Write> DryRunExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Executor for DryRunExecutor<W> {
    fn run(&mut self, cmd: &TestCommand) -> anyhow::Result<Outcome> {
        writeln!(self.out, "{cmd}").context("write dry-run command")?;
        Ok(Outcome::ok())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub fail_fast: bool,
}

/// Executes `commands` strictly in order, each to completion before the next.
/// Failures are recorded; only `fail_fast` stops the remaining invocations.
pub fn dispatch<E: Executor + ?Sized>(
    req: &InvocationRequest,
    commands: &[TestCommand],
    executor: &mut E,
    opts: DispatchOptions,
) -> DispatchSummary {
    let total = commands.len();
    let mut invocations: Vec<InvocationRecord> = Vec::with_capacity(total);
    let mut halted_early = false;

    for (i, cmd) in commands.iter().enumerate() {
        let subset_id = cmd.subset_id.as_deref().unwrap_or("-");
        info!(
            dataset = %req.dataset,
            subset_id,
            index = i + 1,
            total,
            command = %cmd,
            "invoking test runner"
        );

        let start = Instant::now();
        let result = executor.run(cmd);
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let record = match result {
            Ok(outcome) => InvocationRecord {
                command: cmd.to_string(),
                subset_id: cmd.subset_id.clone(),
                exit_code: outcome.exit_code,
                success: outcome.success,
                duration_ms,
                error: None,
            },
            Err(e) => InvocationRecord {
                command: cmd.to_string(),
                subset_id: cmd.subset_id.clone(),
                exit_code: None,
                success: false,
                duration_ms,
                error: Some(format!("{e:#}")),
            },
        };

        if record.success {
            info!(subset_id, duration_ms, "test runner finished");
        } else {
            warn!(
                subset_id,
                exit_code = ?record.exit_code,
                error = record.error.as_deref().unwrap_or(""),
                "test runner failed"
            );
        }

        let failed = !record.success;
        invocations.push(record);

        if failed && opts.fail_fast && i + 1 < total {
            warn!(skipped = total - i - 1, "fail-fast: halting remaining invocations");
            halted_early = true;
            break;
        }
    }

    DispatchSummary {
        dataset: req.dataset.clone(),
        mode: req.mode.as_str().to_string(),
        dry_run: executor.is_dry_run(),
        halted_early,
        invocations,
    }
}
