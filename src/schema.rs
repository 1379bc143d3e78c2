//! Optional strict check of a portfolio document against a JSON Schema.
//!
//! `Catalog::load` never validates; this is for tooling that wants to report
//! every malformed project up front instead of failing the first query that
//! touches one. The bundled schema only requires the three mandatory fields
//! and their types; `PORTFOLIO_SCHEMA` may point at a stricter one.

use crate::catalog::Catalog;
use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const SCHEMA_ENV: &str = "PORTFOLIO_SCHEMA";

const BUNDLED_SCHEMA: &str = include_str!("../schema/project.schema.json");

/// One schema violation, located by JSON Pointer into the document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaViolation {
    pub pointer: String,
    pub message: String,
}

pub struct ProjectSchema {
    compiled: JSONSchema,
}

impl ProjectSchema {
    /// The schema shipped with the crate.
    pub fn bundled() -> Result<Self> {
        let raw: Value =
            serde_json::from_str(BUNDLED_SCHEMA).context("parsing bundled project schema")?;
        Self::compile(&raw).context("compiling bundled project schema")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
        let raw: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::compile(&raw).with_context(|| format!("compiling schema {}", path.display()))
    }

    /// `PORTFOLIO_SCHEMA` when set and non-empty, otherwise the bundled schema.
    pub fn resolve() -> Result<Self> {
        match env::var(SCHEMA_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(Path::new(path.trim())),
            _ => Self::bundled(),
        }
    }

    fn compile(raw: &Value) -> Result<Self> {
        let compiled = JSONSchema::compile(raw).map_err(|err| anyhow!("{err}"))?;
        Ok(Self { compiled })
    }

    /// Every violation in `document`, in the order the validator reports them.
    pub fn validate_document(&self, document: &Value) -> Vec<SchemaViolation> {
        match self.compiled.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| SchemaViolation {
                    pointer: err.instance_path.to_string(),
                    message: err.to_string(),
                })
                .collect(),
        }
    }

    /// Validate an already loaded snapshot.
    pub fn validate_catalog(&self, catalog: &Catalog) -> Result<Vec<SchemaViolation>> {
        let document = serde_json::to_value(catalog.projects())
            .context("serializing catalog for validation")?;
        Ok(self.validate_document(&document))
    }

    /// Read `path` as raw JSON and validate it.
    ///
    /// Unlike `Catalog::load`, any JSON document is accepted here so a
    /// non-array top level shows up as a violation rather than a load error.
    pub fn validate_file(&self, path: &Path) -> Result<Vec<SchemaViolation>> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let document: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(self.validate_document(&document))
    }
}
