//! Shared library for the portfolio query engine.
//!
//! The crate loads a JSON list of projects into an immutable [`Catalog`]
//! snapshot and answers read-only questions about it: how many projects
//! there are, which project has a given number, which techniques are used
//! and by whom, and combined technique-filter/search/sort queries. Delivery
//! layers (web front-ends, the `portfolio` CLI) call these functions with
//! plain data and render the results.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod query;
pub mod schema;

pub use cache::SnapshotCache;
pub use catalog::{
    Catalog, LoadError, Project, ProjectId, QueryError, TechniqueUse, load_catalog,
};
pub use config::find_data_file;
pub use query::{SearchQuery, SortOrder, sanitize_search_term};
pub use schema::{ProjectSchema, SchemaViolation};

/// Split comma- or whitespace-delimited lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
