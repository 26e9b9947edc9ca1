use std::path::Path;

use anyhow::Context as _;
use tracing::warn;

use crate::command::loader_path;
use crate::config::RunnerConfig;

const DATASET_NAME_CONST: &str = "_DATASETNAME";

/// Literal `subset_id` keyword values declared in a loader's builder configs,
/// deduplicated in first-seen order.
///
/// Besides plain string literals, the module-level `_DATASETNAME` constant is resolved,
/// both as a bare name and as the only placeholder of an f-string. Anything computed
/// (other names, other placeholders, `.format(..)`, concatenation) is skipped.
pub fn scan_declared_subsets(source: &str) -> Vec<String> {
    const KEY: &str = "subset_id";

    let dataset_name = module_str_constant(source, DATASET_NAME_CONST);
    let bytes = source.as_bytes();
    let mut out: Vec<String> = Vec::new();
    let mut from = 0;

    while let Some(pos) = source[from..].find(KEY) {
        let start = from + pos;
        from = start + KEY.len();

        if start > 0 {
            let prev = bytes[start - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'.' {
                continue;
            }
        }

        let i = skip_ws(bytes, from);
        if bytes.get(i) != Some(&b'=') || bytes.get(i + 1) == Some(&b'=') {
            continue;
        }
        let i = skip_ws(bytes, i + 1);

        let Some((value, end)) = read_value(source, i, dataset_name.as_deref()) else {
            continue;
        };
        if !ends_expression(bytes, end) {
            continue;
        }
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }

    out
}

/// Reads the value expression starting at `i`. Returns the resolved string and the
/// index just past the expression.
fn read_value(source: &str, i: usize, dataset_name: Option<&str>) -> Option<(String, usize)> {
    let bytes = source.as_bytes();

    let ident_end = ident_end(bytes, i);
    if ident_end > i && matches!(bytes.get(ident_end).copied(), Some(b'"' | b'\'')) {
        // String prefix.
        let prefix = source[i..ident_end].to_ascii_lowercase();
        let is_fstring = match prefix.as_str() {
            "r" | "u" => false,
            "f" | "rf" | "fr" => true,
            _ => return None,
        };
        let (raw, end) = read_quoted(source, ident_end + 1, bytes[ident_end])?;
        let value = if is_fstring {
            expand_fstring(&raw, dataset_name)?
        } else {
            raw
        };
        return Some((value, end));
    }

    if ident_end > i {
        if source.get(i..ident_end) == Some(DATASET_NAME_CONST) {
            return Some((dataset_name?.to_string(), ident_end));
        }
        return None;
    }

    let quote = *bytes.get(i)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    read_quoted(source, i + 1, quote)
}

/// Substitutes `{_DATASETNAME}`; any other placeholder makes the value computed.
fn expand_fstring(raw: &str, dataset_name: Option<&str>) -> Option<String> {
    let placeholder = format!("{{{DATASET_NAME_CONST}}}");
    let expanded = if raw.contains(&placeholder) {
        raw.replace(&placeholder, dataset_name?)
    } else {
        raw.to_string()
    };
    if expanded.contains('{') || expanded.contains('}') {
        return None;
    }
    Some(expanded)
}

/// Value of a top-level `NAME = "literal"` assignment.
fn module_str_constant(source: &str, name: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let rest = line.strip_prefix(name)?;
        let rest = rest.trim_start().strip_prefix('=')?.trim_start();
        let quote = *rest.as_bytes().first()?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        read_quoted(rest, 1, quote).map(|(value, _)| value)
    })
}

/// A literal value must be the whole argument: only a separator, closing paren,
/// comment, or line end may follow it.
fn ends_expression(bytes: &[u8], end: usize) -> bool {
    matches!(
        bytes.get(skip_ws(bytes, end)).copied(),
        None | Some(b',' | b')' | b'\n' | b'\r' | b'#')
    )
}

fn ident_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    i
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

fn read_quoted(source: &str, start: usize, quote: u8) -> Option<(String, usize)> {
    let bytes = source.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some((source[start..i].to_string(), i + 1)),
            _ => i += 1,
        }
    }
    None
}

pub fn read_declared_subsets(loader: &Path) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read_to_string(loader)
        .with_context(|| format!("read loader {}", loader.display()))?;
    Ok(scan_declared_subsets(&source))
}

/// Logs a warning when the loader file is absent. The runner is still invoked; it owns
/// the authoritative error.
pub fn check_loader_exists(runner: &RunnerConfig, dataset: &str) -> bool {
    let path = runner.resolve(&loader_path(&runner.datasets_root, dataset));
    let exists = path.is_file();
    if !exists {
        warn!(dataset, loader = %path.display(), "loader file not found");
    }
    exists
}
