//! Immutable snapshot of a portfolio document.
//!
//! A `Catalog` is created once per load and never changes afterwards. Records
//! live behind an `Arc<[Project]>`, so handing a snapshot to another request
//! is a pointer copy and a reload always produces a new allocation instead of
//! touching the one in-flight queries hold.

use crate::catalog::error::{LoadError, QueryError};
use crate::catalog::model::{Project, ProjectId, TechniqueUse};
use crate::query::{self, SearchQuery};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
/// Ordered, read-only collection of projects.
pub struct Catalog {
    projects: Arc<[Project]>,
}

impl Catalog {
    /// Read a UTF-8 JSON array of project objects from disk.
    ///
    /// No schema checks happen here; a project missing a mandatory field only
    /// fails the queries that touch it.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_json_str(&data).map_err(|err| match err {
            ParseFailure::Json(source) => LoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Shape(found) => LoadError::NotAnArray {
                path: path.to_path_buf(),
                found,
            },
        })
    }

    fn from_json_str(data: &str) -> Result<Self, ParseFailure> {
        let value: Value = serde_json::from_str(data).map_err(ParseFailure::Json)?;
        let items = match value {
            Value::Array(items) => items,
            other => return Err(ParseFailure::Shape(json_kind(&other))),
        };
        let mut projects = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(fields) => projects.push(Project::new(fields)),
                other => return Err(ParseFailure::Shape(element_kind(&other))),
            }
        }
        Ok(Self::from_projects(projects))
    }

    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: projects.into(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn count(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// First project whose `project_no` equals `id`.
    ///
    /// `Ok(None)` is the not-found signal. A project without `project_no`
    /// that is scanned before a match fails the lookup.
    pub fn get_by_id(&self, id: ProjectId) -> Result<Option<&Project>, QueryError> {
        for (index, project) in self.projects.iter().enumerate() {
            if project.id_matches(index, id)? {
                return Ok(Some(project));
            }
        }
        Ok(None)
    }

    /// Distinct technique names across all projects, ascending.
    pub fn list_techniques(&self) -> Result<Vec<String>, QueryError> {
        let mut names = BTreeSet::new();
        for (index, project) in self.projects.iter().enumerate() {
            for tech in project.require_techniques(index)? {
                names.insert(tech.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Map every technique to the projects that use it, sorted by name.
    ///
    /// Equal names keep their snapshot order (`sort_by` is stable).
    pub fn technique_stats(&self) -> Result<BTreeMap<String, Vec<TechniqueUse>>, QueryError> {
        let mut stats: BTreeMap<String, Vec<TechniqueUse>> = self
            .list_techniques()?
            .into_iter()
            .map(|tech| (tech, Vec::new()))
            .collect();

        for (index, project) in self.projects.iter().enumerate() {
            let techniques: BTreeSet<&str> =
                project.require_techniques(index)?.into_iter().collect();
            for tech in techniques {
                if let Some(entries) = stats.get_mut(tech) {
                    entries.push(TechniqueUse {
                        id: project.require_project_no(index)?,
                        name: project.require_project_name(index)?.to_string(),
                    });
                }
            }
        }

        for entries in stats.values_mut() {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(stats)
    }

    /// Filter, search, and sort the snapshot in one pass of the three stages.
    pub fn query(&self, params: &SearchQuery) -> Result<Vec<&Project>, QueryError> {
        query::run(&self.projects, params)
    }
}

impl From<Vec<Project>> for Catalog {
    fn from(projects: Vec<Project>) -> Self {
        Self::from_projects(projects)
    }
}

impl std::str::FromStr for Catalog {
    type Err = anyhow::Error;

    /// Parse an in-memory document; mostly useful for fixtures.
    fn from_str(data: &str) -> anyhow::Result<Self> {
        Self::from_json_str(data).map_err(|err| match err {
            ParseFailure::Json(source) => anyhow::Error::new(source),
            ParseFailure::Shape(found) => {
                anyhow::anyhow!("expected a JSON array of project objects, found {found}")
            }
        })
    }
}

/// Collapsed load contract: any failure becomes `None`.
pub fn load_catalog(path: &Path) -> Option<Catalog> {
    Catalog::load(path).ok()
}

enum ParseFailure {
    Json(serde_json::Error),
    Shape(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn element_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "an array containing null",
        Value::Bool(_) => "an array containing a boolean",
        Value::Number(_) => "an array containing a number",
        Value::String(_) => "an array containing a string",
        Value::Array(_) => "an array containing an array",
        Value::Object(_) => "an array containing an object",
    }
}
