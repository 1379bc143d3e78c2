//! Deserializable representation of one portfolio project.
//!
//! A project is an open JSON object: only `project_no`, `project_name`, and
//! `techniques_used` carry meaning for the engine, and even those are checked
//! lazily when a query touches them. Every other field is kept verbatim (in
//! source order) for delivery layers and for free-text search.

use crate::catalog::error::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FIELD_PROJECT_NO: &str = "project_no";
pub const FIELD_PROJECT_NAME: &str = "project_name";
pub const FIELD_TECHNIQUES_USED: &str = "techniques_used";

/// Numeric project identifier (`project_no`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// One project record exactly as it appeared in the source document.
pub struct Project(Map<String, Value>);

/// Entry of a technique statistics list: which project uses the technique.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TechniqueUse {
    pub id: ProjectId,
    pub name: String,
}

impl Project {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Field names in source order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// `project_no` when present and integral.
    pub fn project_no(&self) -> Option<ProjectId> {
        self.get(FIELD_PROJECT_NO)
            .and_then(Value::as_i64)
            .map(ProjectId)
    }

    pub fn project_name(&self) -> Option<&str> {
        self.get(FIELD_PROJECT_NAME).and_then(Value::as_str)
    }

    /// `techniques_used` when present and made only of strings.
    pub fn techniques(&self) -> Option<Vec<&str>> {
        self.get(FIELD_TECHNIQUES_USED)?
            .as_array()?
            .iter()
            .map(Value::as_str)
            .collect()
    }

    /// True when `project_no` is numerically equal to `id`.
    ///
    /// Non-numeric identifiers never match; they are not an error.
    pub(crate) fn id_matches(&self, index: usize, id: ProjectId) -> Result<bool, QueryError> {
        let value = self.require(index, FIELD_PROJECT_NO)?;
        Ok(match value {
            Value::Number(number) => match number.as_i64() {
                Some(n) => n == id.0,
                None => number.as_f64() == Some(id.0 as f64),
            },
            _ => false,
        })
    }

    pub(crate) fn require(&self, index: usize, field: &str) -> Result<&Value, QueryError> {
        self.get(field).ok_or_else(|| QueryError::MissingField {
            index,
            field: field.to_string(),
        })
    }

    pub(crate) fn require_project_no(&self, index: usize) -> Result<ProjectId, QueryError> {
        self.require(index, FIELD_PROJECT_NO)?
            .as_i64()
            .map(ProjectId)
            .ok_or_else(|| type_error(index, FIELD_PROJECT_NO, "an integer"))
    }

    pub(crate) fn require_project_name(&self, index: usize) -> Result<&str, QueryError> {
        self.require(index, FIELD_PROJECT_NAME)?
            .as_str()
            .ok_or_else(|| type_error(index, FIELD_PROJECT_NAME, "a string"))
    }

    pub(crate) fn require_techniques(&self, index: usize) -> Result<Vec<&str>, QueryError> {
        let expected = "an array of strings";
        self.require(index, FIELD_TECHNIQUES_USED)?
            .as_array()
            .ok_or_else(|| type_error(index, FIELD_TECHNIQUES_USED, expected))?
            .iter()
            .map(|tech| {
                tech.as_str()
                    .ok_or_else(|| type_error(index, FIELD_TECHNIQUES_USED, expected))
            })
            .collect()
    }
}

impl From<Map<String, Value>> for Project {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn type_error(index: usize, field: &str, expected: &'static str) -> QueryError {
    QueryError::FieldType {
        index,
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(value: Value) -> Project {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accessors_read_mandatory_fields() {
        let p = project(json!({
            "project_no": 7,
            "project_name": "Rover",
            "techniques_used": ["rust", "serde"]
        }));
        assert_eq!(p.project_no(), Some(ProjectId(7)));
        assert_eq!(p.project_name(), Some("Rover"));
        assert_eq!(p.techniques(), Some(vec!["rust", "serde"]));
    }

    #[test]
    fn field_order_follows_source_document() {
        let p: Project =
            serde_json::from_str(r#"{"zeta": 1, "project_no": 2, "alpha": 3}"#).unwrap();
        let names: Vec<&str> = p.field_names().collect();
        assert_eq!(names, vec!["zeta", "project_no", "alpha"]);
    }

    #[test]
    fn id_matching_is_numeric() {
        let float = project(json!({"project_no": 3.0}));
        assert!(float.id_matches(0, ProjectId(3)).unwrap());

        let text = project(json!({"project_no": "3"}));
        assert!(!text.id_matches(0, ProjectId(3)).unwrap());

        let missing = project(json!({"project_name": "x"}));
        assert_eq!(
            missing.id_matches(4, ProjectId(3)),
            Err(QueryError::MissingField {
                index: 4,
                field: "project_no".to_string()
            })
        );
    }

    #[test]
    fn techniques_must_be_strings() {
        let p = project(json!({"techniques_used": ["a", 1]}));
        assert!(p.techniques().is_none());
        assert!(matches!(
            p.require_techniques(0),
            Err(QueryError::FieldType { .. })
        ));
    }

    #[test]
    fn technique_use_serializes_as_id_and_name() {
        let entry = TechniqueUse {
            id: ProjectId(1),
            name: "Alpha".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"id": 1, "name": "Alpha"})
        );
    }
}
