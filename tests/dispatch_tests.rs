use std::path::PathBuf;

use loader_check::command::{build_invocations, TestCommand};
use loader_check::config::RunnerConfig;
use loader_check::dispatch::{dispatch, DispatchOptions, Executor, Outcome};
use loader_check::request::{InvocationRequest, Mode, UsageError, USAGE_BASE};

#[derive(Default)]
struct Recorder {
    calls: Vec<TestCommand>,
    exit_codes: Vec<i32>,
}

impl Executor for Recorder {
    fn run(&mut self, cmd: &TestCommand) -> anyhow::Result<Outcome> {
        let code = self.exit_codes.get(self.calls.len()).copied().unwrap_or(0);
        self.calls.push(cmd.clone());
        Ok(Outcome::exited(code))
    }
}

fn args(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn run(v: &[&str], rec: &mut Recorder, opts: DispatchOptions) -> Result<usize, UsageError> {
    let req = InvocationRequest::parse(&args(v))?;
    let cmds = build_invocations(&RunnerConfig::default(), &req);
    let summary = dispatch(&req, &cmds, rec, opts);
    Ok(summary.invocations.len())
}

fn tail(cmd: &TestCommand) -> Vec<&str> {
    cmd.args.iter().skip(3).map(String::as_str).collect()
}

#[test]
fn missing_dataset_prints_base_usage_and_runs_nothing() {
    let mut rec = Recorder::default();
    let err = run(&[], &mut rec, DispatchOptions::default()).expect_err("usage");
    assert_eq!(err, UsageError::MissingDataset);
    assert!(err.to_string().contains(USAGE_BASE));
    assert!(rec.calls.is_empty());
}

#[test]
fn number_fold_issues_one_call_per_fold_in_order() {
    let mut rec = Recorder::default();
    let n = run(&["X", "--number_fold", "3"], &mut rec, DispatchOptions::default()).expect("ok");
    assert_eq!(n, 3);
    let ids: Vec<Vec<&str>> = rec.calls.iter().map(tail).collect();
    assert_eq!(
        ids,
        vec![
            vec!["--subset_id", "X_fold0"],
            vec!["--subset_id", "X_fold1"],
            vec!["--subset_id", "X_fold2"],
        ]
    );
}

#[test]
fn number_fold_without_value_prints_fold_usage() {
    let mut rec = Recorder::default();
    let err = run(&["X", "--number_fold"], &mut rec, DispatchOptions::default())
        .expect_err("usage");
    assert_eq!(err, UsageError::MissingFoldCount);
    assert!(err.to_string().contains("--number_fold <N>"));
    assert!(rec.calls.is_empty());
}

#[test]
fn subset_and_data_dir_without_value_are_usage_errors() {
    let mut rec = Recorder::default();
    assert_eq!(
        run(&["X", "--subset_id"], &mut rec, DispatchOptions::default()),
        Err(UsageError::MissingSubsetId)
    );
    assert_eq!(
        run(&["X", "--data_dir"], &mut rec, DispatchOptions::default()),
        Err(UsageError::MissingDataDir)
    );
    assert!(rec.calls.is_empty());
}

#[test]
fn subset_id_is_passed_through_without_fold_suffix() {
    let mut rec = Recorder::default();
    let n = run(&["X", "--subset_id", "Y"], &mut rec, DispatchOptions::default()).expect("ok");
    assert_eq!(n, 1);
    assert_eq!(tail(&rec.calls[0]), vec!["--subset_id", "Y"]);
}

#[test]
fn data_dir_is_passed_through() {
    let mut rec = Recorder::default();
    let n = run(
        &["X", "--data_dir", "/tmp/data"],
        &mut rec,
        DispatchOptions::default(),
    )
    .expect("ok");
    assert_eq!(n, 1);
    assert_eq!(tail(&rec.calls[0]), vec!["--data_dir", "/tmp/data"]);
    assert_eq!(rec.calls[0].subset_id, None);
}

#[test]
fn dataset_only_issues_single_bare_call() {
    let mut rec = Recorder::default();
    let n = run(&["X"], &mut rec, DispatchOptions::default()).expect("ok");
    assert_eq!(n, 1);
    assert_eq!(rec.calls[0].program, "python");
    assert_eq!(
        rec.calls[0].args,
        args(&[
            "-m",
            "tests.test_seacrowd_source_only",
            "seacrowd/sea_datasets/X/X.py"
        ])
    );
}

#[test]
fn failing_fold_does_not_stop_later_folds_by_default() {
    let mut rec = Recorder {
        exit_codes: vec![0, 1, 0],
        ..Recorder::default()
    };
    let req = InvocationRequest {
        dataset: "X".to_string(),
        mode: Mode::Folds(3),
    };
    let cmds = build_invocations(&RunnerConfig::default(), &req);
    let summary = dispatch(&req, &cmds, &mut rec, DispatchOptions::default());
    assert_eq!(rec.calls.len(), 3);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.halted_early);
}

#[test]
fn fail_fast_halts_after_first_failure() {
    let mut rec = Recorder {
        exit_codes: vec![0, 2, 0],
        ..Recorder::default()
    };
    let req = InvocationRequest {
        dataset: "X".to_string(),
        mode: Mode::Folds(3),
    };
    let cmds = build_invocations(&RunnerConfig::default(), &req);
    let opts = DispatchOptions { fail_fast: true };
    let summary = dispatch(&req, &cmds, &mut rec, opts);
    assert_eq!(rec.calls.len(), 2);
    assert!(summary.halted_early);
    assert_eq!(summary.invocations[1].exit_code, Some(2));
    assert_eq!(summary.invocations[1].subset_id.as_deref(), Some("X_fold1"));
}

#[test]
fn zero_folds_issue_no_calls() {
    let mut rec = Recorder::default();
    let n = run(&["X", "--number_fold", "0"], &mut rec, DispatchOptions::default()).expect("ok");
    assert_eq!(n, 0);
    assert!(rec.calls.is_empty());
}

#[test]
fn custom_runner_config_shapes_the_command() {
    let runner = RunnerConfig {
        program: "python3".to_string(),
        module: "tests.test_other".to_string(),
        datasets_root: PathBuf::from("loaders"),
        working_dir: None,
    };
    let req = InvocationRequest {
        dataset: "qed".to_string(),
        mode: Mode::DataDir(PathBuf::from("raw")),
    };
    let cmds = build_invocations(&runner, &req);
    assert_eq!(
        cmds[0].to_string(),
        "python3 -m tests.test_other loaders/qed/qed.py --data_dir raw"
    );
}
