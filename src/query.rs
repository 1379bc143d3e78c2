//! Combined technique filter, free-text search, and sort over a snapshot.
//!
//! `run` applies three stages in a fixed order, each to the output of the
//! previous one:
//!
//! 1. technique filter: keep projects whose `techniques_used` contains every
//!    requested technique (no-op when none are requested);
//! 2. search: case-insensitive substring match on the stringified value of
//!    any searched field (no-op when no search term is given);
//! 3. sort: stable sort on one field, ascending or descending.
//!
//! Stages build new vectors of references; the snapshot itself is never
//! reordered or mutated.

use crate::catalog::error::QueryError;
use crate::catalog::model::Project;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SORT_FIELD: &str = "start_date";
pub const DEFAULT_SORT_ORDER: &str = "desc";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(QueryError::InvalidSortOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`run`].
///
/// `sort_order` stays a raw string so an unrecognised value is reported by
/// the sort stage, after filtering and searching, like any other query
/// failure. `search_fields` distinguishes `None` (every field of the first
/// surviving project) from `Some(vec![])` (search nothing, return nothing).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchQuery {
    pub sort_by: String,
    pub sort_order: String,
    pub techniques: Option<Vec<String>>,
    pub search: Option<String>,
    pub search_fields: Option<Vec<String>>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            sort_order: DEFAULT_SORT_ORDER.to_string(),
            techniques: None,
            search: None,
            search_fields: None,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = field.into();
        self
    }

    pub fn sort_order(mut self, order: impl Into<String>) -> Self {
        self.sort_order = order.into();
        self
    }

    pub fn techniques<I, S>(mut self, techniques: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.techniques = Some(techniques.into_iter().map(Into::into).collect());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

// A project plus its position in the snapshot; the position names the record
// in errors and identifies it when deduplicating search hits. Dedup is by
// position, not by value: two identical records in the file are two projects
// and both stay in the result, matching what `count` and stage A report.
#[derive(Clone, Copy)]
struct Candidate<'a> {
    index: usize,
    project: &'a Project,
}

/// Run the filter, search, and sort stages over `projects`.
///
/// An empty result is `Ok(vec![])`; `Err` is reserved for structural
/// problems such as an unknown sort field or order.
pub fn run<'a>(
    projects: &'a [Project],
    params: &SearchQuery,
) -> Result<Vec<&'a Project>, QueryError> {
    let candidates: Vec<Candidate<'a>> = projects
        .iter()
        .enumerate()
        .map(|(index, project)| Candidate { index, project })
        .collect();

    let filtered = filter_by_techniques(candidates, params.techniques.as_deref())?;
    let searched = match params.search.as_deref() {
        Some(term) => search_candidates(filtered, term, params.search_fields.as_deref())?,
        None => filtered,
    };
    let sorted = sort_candidates(searched, &params.sort_by, &params.sort_order)?;

    Ok(sorted.into_iter().map(|c| c.project).collect())
}

fn filter_by_techniques<'a>(
    candidates: Vec<Candidate<'a>>,
    techniques: Option<&[String]>,
) -> Result<Vec<Candidate<'a>>, QueryError> {
    let required = match techniques {
        Some(required) if !required.is_empty() => required,
        _ => return Ok(candidates),
    };

    let mut kept = Vec::new();
    for candidate in candidates {
        let used = candidate.project.require_techniques(candidate.index)?;
        if required.iter().all(|tech| used.contains(&tech.as_str())) {
            kept.push(candidate);
        }
    }
    Ok(kept)
}

fn search_candidates<'a>(
    candidates: Vec<Candidate<'a>>,
    term: &str,
    fields: Option<&[String]>,
) -> Result<Vec<Candidate<'a>>, QueryError> {
    // Without explicit fields the scope is whatever the first survivor
    // carries; keys only present on later projects are not searched.
    let scope: Vec<&str> = match fields {
        Some([]) => return Ok(Vec::new()),
        Some(fields) => fields.iter().map(String::as_str).collect(),
        None => match candidates.first() {
            Some(first) => first.project.field_names().collect(),
            None => return Ok(Vec::new()),
        },
    };

    let needle = term.to_lowercase();
    let mut seen = BTreeSet::new();
    let mut hits = Vec::new();
    for field in scope {
        for candidate in &candidates {
            let value = candidate.project.require(candidate.index, field)?;
            if searchable_text(value).to_lowercase().contains(&needle)
                && seen.insert(candidate.index)
            {
                hits.push(*candidate);
            }
        }
    }
    Ok(hits)
}

fn sort_candidates<'a>(
    candidates: Vec<Candidate<'a>>,
    sort_by: &str,
    sort_order: &str,
) -> Result<Vec<Candidate<'a>>, QueryError> {
    let Some(first) = candidates.first() else {
        return Ok(candidates);
    };
    if !first.project.contains_field(sort_by) {
        return Err(QueryError::UnknownSortField(sort_by.to_string()));
    }
    let order: SortOrder = sort_order.parse()?;

    let mut keyed = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = candidate.project.require(candidate.index, sort_by)?;
        keyed.push((key, candidate));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = total_order(a, b);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    // `total_order` groups values by kind, so any pair without a natural
    // ordering ends up adjacent to something it cannot be compared with.
    if keyed
        .windows(2)
        .any(|pair| compare_values(pair[0].0, pair[1].0).is_none())
    {
        return Err(QueryError::IncomparableValues {
            field: sort_by.to_string(),
        });
    }

    Ok(keyed.into_iter().map(|(_, candidate)| candidate).collect())
}

/// Natural ordering of two JSON values, if they have one.
///
/// Numbers compare numerically, strings and booleans by value, arrays
/// element-wise then by length. Null, objects, and mixed kinds return `None`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(xs.len().cmp(&ys.len()))
        }
        _ => None,
    }
}

/// Total order used while sorting: kinds rank bool < number < string <
/// array < object < null, values compare naturally within a kind, and all
/// objects (and all nulls) tie.
fn total_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| total_order(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Text a field value is searched as.
///
/// Strings are used verbatim. Everything else is rendered the way the
/// portfolio's original web front-end printed values: `None`, `True`,
/// `False`, `['a', 'b']`, `{'k': 1}`.
pub fn searchable_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => {
            let mut out = String::new();
            write_display(other, &mut out);
            Cow::Owned(out)
        }
    }
}

fn write_display(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => write_quoted(text, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_display(item, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            out.push('{');
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_display(item, out);
            }
            out.push('}');
        }
    }
}

// Single quotes unless the text contains one and no double quote.
fn write_quoted(text: &str, out: &mut String) {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Strip a user-supplied search term down to ASCII letters, digits, and `.`.
///
/// Intended for form input before it reaches [`SearchQuery::search`]; `run`
/// never sanitises on its own.
pub fn sanitize_search_term(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}
