#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn portfolio_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_portfolio"))
}

/// The five-project fixture shared by the integration tests.
pub fn sample_projects() -> Value {
    json!([
        {
            "project_no": 1,
            "project_name": "Pathfinder",
            "start_date": "2019-09-01",
            "end_date": "2019-12-20",
            "course_id": "TDP001",
            "course_name": "Programming Basics",
            "techniques_used": ["python", "algorithms"],
            "description": "A* search on grid maps",
            "long_description": "Route planning with heuristics.",
            "image": "pathfinder.png",
            "external_link": "https://example.org/pathfinder"
        },
        {
            "project_no": 2,
            "project_name": "Ledger",
            "start_date": "2020-01-15",
            "end_date": "2020-03-01",
            "course_id": "TDP002",
            "course_name": "Databases",
            "techniques_used": ["sql", "python"],
            "description": "Double-entry bookkeeping",
            "long_description": "Accounts and journals backed by SQLite.",
            "image": "ledger.png",
            "external_link": "https://example.org/ledger"
        },
        {
            "project_no": 3,
            "project_name": "Catwalk",
            "start_date": "2020-01-15",
            "end_date": "2020-05-30",
            "course_id": "TDP003",
            "course_name": "Web Programming",
            "techniques_used": ["html", "css", "python"],
            "description": "Fashion show scheduler",
            "long_description": "Flask front-end with templates.",
            "image": "catwalk.png",
            "external_link": "https://example.org/catwalk"
        },
        {
            "project_no": 4,
            "project_name": "Beacon",
            "start_date": "2021-02-01",
            "end_date": "2021-04-10",
            "course_id": "TDP004",
            "course_name": "Systems",
            "techniques_used": ["c", "algorithms"],
            "description": "Embedded CATALOG of sensors",
            "long_description": "Interrupt-driven firmware.",
            "image": "beacon.png",
            "external_link": "https://example.org/beacon"
        },
        {
            "project_no": 5,
            "project_name": "Atlas",
            "start_date": "2018-06-01",
            "end_date": "2018-08-30",
            "course_id": "TDP005",
            "course_name": "Graphics",
            "techniques_used": ["c", "opengl"],
            "description": "Terrain renderer",
            "long_description": "Height maps and shaders.",
            "image": "atlas.png",
            "external_link": "https://example.org/atlas"
        }
    ])
}

/// Write `document` as `data.json` inside a fresh temporary directory.
pub fn write_data_file(document: &Value) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new().context("failed to allocate temp dir")?;
    let path = dir.path().join("data.json");
    std::fs::write(&path, serde_json::to_vec_pretty(document)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok((dir, path))
}

/// Run the CLI against `data` and return its raw output, whatever the status.
pub fn run_portfolio(data: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(portfolio_binary());
    cmd.arg("--data").arg(data).args(args);
    cmd.env_remove("PORTFOLIO_DATA").env_remove("PORTFOLIO_SCHEMA");
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Run the CLI and parse stdout as JSON, failing on a non-zero exit.
pub fn run_json(data: &Path, args: &[&str]) -> Result<Value> {
    let output = run_portfolio(data, args)?;
    if !output.status.success() {
        bail!(
            "portfolio {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    serde_json::from_slice(&output.stdout).context("stdout was not JSON")
}

pub fn project_numbers(results: &Value) -> Vec<i64> {
    results
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("project_no").and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}
