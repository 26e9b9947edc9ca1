use std::fmt;
use std::path::PathBuf;

pub const FLAG_NUMBER_FOLD: &str = "--number_fold";
pub const FLAG_SUBSET_ID: &str = "--subset_id";
pub const FLAG_DATA_DIR: &str = "--data_dir";

pub const USAGE_BASE: &str = "Usage: loader_check <dataset_name> [--number_fold <N> | --subset_id <subset_id> | --data_dir <data_dir>]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Default,
    Folds(u32),
    SubsetId(String),
    DataDir(PathBuf),
}

impl Mode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Folds(_) => "number_fold",
            Mode::SubsetId(_) => "subset_id",
            Mode::DataDir(_) => "data_dir",
        }
    }

    /// Subset ids passed to the runner, one per invocation. Empty for modes that
    /// do not pass `--subset_id`.
    pub fn subset_ids(&self, dataset: &str) -> Vec<String> {
        match self {
            Mode::Folds(n) => (0..*n).map(|i| fold_subset_id(dataset, i)).collect(),
            Mode::SubsetId(id) => vec![id.clone()],
            Mode::Default | Mode::DataDir(_) => Vec::new(),
        }
    }
}

pub fn fold_subset_id(dataset: &str, fold: u32) -> String {
    format!("{dataset}_fold{fold}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub dataset: String,
    pub mode: Mode,
}

impl InvocationRequest {
    /// Parses `<dataset> [<flag> <value>]`. Only the second argument selects a mode;
    /// anything past the mode value is ignored.
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        let dataset = match args.first() {
            Some(d) if !d.trim().is_empty() => d.clone(),
            _ => return Err(UsageError::MissingDataset),
        };

        let value = args.get(2).filter(|v| !v.is_empty());
        let mode = match args.get(1).map(String::as_str) {
            Some(FLAG_NUMBER_FOLD) => {
                let raw = value.ok_or(UsageError::MissingFoldCount)?;
                let n = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| UsageError::InvalidFoldCount(raw.clone()))?;
                Mode::Folds(n)
            }
            Some(FLAG_SUBSET_ID) => {
                Mode::SubsetId(value.ok_or(UsageError::MissingSubsetId)?.clone())
            }
            Some(FLAG_DATA_DIR) => {
                Mode::DataDir(PathBuf::from(value.ok_or(UsageError::MissingDataDir)?))
            }
            _ => Mode::Default,
        };

        Ok(Self { dataset, mode })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    MissingDataset,
    MissingFoldCount,
    InvalidFoldCount(String),
    MissingSubsetId,
    MissingDataDir,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::MissingDataset => {
                write!(f, "Error: dataset name is required.\n{USAGE_BASE}")
            }
            UsageError::MissingFoldCount => write!(
                f,
                "Error: {FLAG_NUMBER_FOLD} requires a fold count.\nUsage: loader_check <dataset_name> {FLAG_NUMBER_FOLD} <N>"
            ),
            UsageError::InvalidFoldCount(raw) => write!(
                f,
                "Error: fold count must be a non-negative integer, got {raw:?}.\nUsage: loader_check <dataset_name> {FLAG_NUMBER_FOLD} <N>"
            ),
            UsageError::MissingSubsetId => write!(
                f,
                "Error: {FLAG_SUBSET_ID} requires a subset id.\nUsage: loader_check <dataset_name> {FLAG_SUBSET_ID} <subset_id>"
            ),
            UsageError::MissingDataDir => write!(
                f,
                "Error: {FLAG_DATA_DIR} requires a directory.\nUsage: loader_check <dataset_name> {FLAG_DATA_DIR} <data_dir>"
            ),
        }
    }
}

impl std::error::Error for UsageError {}
