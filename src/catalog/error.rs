//! Failure signals surfaced by the catalog and query engine.
//!
//! Load and query failures are kept as distinct types so delivery layers can
//! tell "could not read the portfolio" apart from "the request was malformed"
//! and both apart from an empty result.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
/// Why a portfolio document could not be turned into a snapshot.
pub enum LoadError {
    /// The path does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be read (permissions, invalid UTF-8, ...).
    Io { path: PathBuf, source: io::Error },
    /// The contents are not valid JSON.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Valid JSON, but not an array of objects.
    NotAnArray { path: PathBuf, found: &'static str },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound(path) => path,
            LoadError::Io { path, .. } => path,
            LoadError::Parse { path, .. } => path,
            LoadError::NotAnArray { path, .. } => path,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "portfolio file not found: {}", path.display()),
            LoadError::Io { path, source } => {
                write!(f, "unable to read {}: {source}", path.display())
            }
            LoadError::Parse { path, source } => {
                write!(f, "unable to parse {}: {source}", path.display())
            }
            LoadError::NotAnArray { path, found } => write!(
                f,
                "{} must contain a JSON array of project objects, found {found}",
                path.display()
            ),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Structural problems detected while answering a query.
///
/// None of these mean "no results"; an empty result is always `Ok`.
pub enum QueryError {
    /// `sort_by` is not a key of the first surviving project.
    UnknownSortField(String),
    /// `sort_order` was neither `asc` nor `desc`.
    InvalidSortOrder(String),
    /// A project the query touched has no such field.
    MissingField { index: usize, field: String },
    /// A mandatory field holds a value of the wrong JSON type.
    FieldType {
        index: usize,
        field: String,
        expected: &'static str,
    },
    /// Two values of the sort field have no natural ordering between them.
    IncomparableValues { field: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownSortField(field) => {
                write!(f, "cannot sort by '{field}': field not present on results")
            }
            QueryError::InvalidSortOrder(order) => {
                write!(f, "invalid sort order '{order}' (expected asc|desc)")
            }
            QueryError::MissingField { index, field } => {
                write!(f, "project at index {index} has no field '{field}'")
            }
            QueryError::FieldType {
                index,
                field,
                expected,
            } => write!(
                f,
                "project at index {index}: field '{field}' must be {expected}"
            ),
            QueryError::IncomparableValues { field } => {
                write!(f, "values of '{field}' cannot be ordered against each other")
            }
        }
    }
}

impl Error for QueryError {}
