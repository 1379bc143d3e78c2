//! Locating the portfolio data file.
//!
//! Search order: an explicit path (e.g. `--data`), then `PORTFOLIO_DATA` if
//! it names an existing file, then `data.json` in the current directory or
//! any ancestor.

use anyhow::{Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_ENV: &str = "PORTFOLIO_DATA";
pub const DEFAULT_DATA_FILE: &str = "data.json";

fn data_file_from_hint(hint: &str) -> Option<PathBuf> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    let path = PathBuf::from(hint);
    if !path.is_file() {
        return None;
    }
    fs::canonicalize(path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        let candidate = dir.join(DEFAULT_DATA_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Resolve the data file to load.
///
/// An explicit path is returned as given, even if it does not exist, so the
/// load reports the precise failure. The environment hint is ignored when it
/// does not point at a file.
pub fn find_data_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(hint) = env::var(DATA_ENV) {
        if let Some(path) = data_file_from_hint(&hint) {
            return Ok(path);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = search_upwards(&cwd) {
            return Ok(path);
        }
    }

    bail!(
        "Unable to locate {DEFAULT_DATA_FILE}. Pass --data PATH or set {DATA_ENV} to the portfolio file."
    )
}
