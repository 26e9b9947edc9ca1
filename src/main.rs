use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loader_check::command::{build_invocations, loader_path};
use loader_check::config::{Config, DEFAULT_CONFIG_PATH};
use loader_check::dispatch::{dispatch, DispatchOptions, DryRunExecutor, ProcessExecutor};
use loader_check::loader::{check_loader_exists, read_declared_subsets};
use loader_check::request::InvocationRequest;

#[derive(Parser, Debug)]
#[command(
    name = "loader_check",
    version,
    about = "Run the source-only test for a dataset loader",
    after_help = "Examples:\n  loader_check <dataset_name>\n  loader_check <dataset_name> --number_fold <N>\n  loader_check <dataset_name> --subset_id <subset_id>\n  loader_check <dataset_name> --data_dir <data_dir>"
)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the runner command lines without executing them.
    #[arg(long)]
    dry_run: bool,

    /// Stop at the first failing invocation.
    #[arg(long)]
    fail_fast: bool,

    /// Exit non-zero when any invocation failed.
    #[arg(long)]
    strict: bool,

    /// Print the literal subset ids declared by the loader and exit.
    #[arg(long)]
    list_subsets: bool,

    /// Write a JSON summary of all invocations to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// `<dataset_name> [--number_fold <N> | --subset_id <id> | --data_dir <dir>]`
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "DATASET_ARGS"
    )]
    request: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let req = match InvocationRequest::parse(&args.request) {
        Ok(req) => req,
        Err(usage) => {
            println!("{usage}");
            return Ok(());
        }
    };

    let cfg = Config::load(&args.config).context("load config")?;

    if args.list_subsets {
        let path = cfg
            .runner
            .resolve(&loader_path(&cfg.runner.datasets_root, &req.dataset));
        for subset in read_declared_subsets(&path)? {
            println!("{subset}");
        }
        return Ok(());
    }

    if cfg.dispatch.warn_missing_loader {
        check_loader_exists(&cfg.runner, &req.dataset);
    }

    let commands = build_invocations(&cfg.runner, &req);
    let opts = DispatchOptions {
        fail_fast: args.fail_fast || cfg.dispatch.fail_fast,
    };

    let summary = if args.dry_run {
        let mut exec = DryRunExecutor::new(std::io::stdout().lock());
        dispatch(&req, &commands, &mut exec, opts)
    } else {
        dispatch(&req, &commands, &mut ProcessExecutor, opts)
    };

    if let Some(path) = &args.summary_json {
        summary
            .write_to_path(path)
            .with_context(|| format!("write summary {}", path.display()))?;
        info!(path = %path.display(), "wrote summary");
    }

    if !summary.dry_run {
        for line in summary.report_lines() {
            println!("{line}");
        }
    }

    if (args.strict || cfg.dispatch.propagate_status) && !summary.all_succeeded() {
        anyhow::bail!(
            "{} of {} invocations failed",
            summary.failed(),
            summary.invocations.len()
        );
    }
    Ok(())
}
