//! Portfolio catalog wiring.
//!
//! This module wraps a JSON project list so callers can load an immutable
//! snapshot and ask it for counts, lookups, and technique statistics. Types in
//! `model` mirror the record fields; `Catalog` is the snapshot handed to every
//! query.

pub mod error;
pub mod model;
pub mod snapshot;

pub use error::{LoadError, QueryError};
pub use model::{
    FIELD_PROJECT_NAME, FIELD_PROJECT_NO, FIELD_TECHNIQUES_USED, Project, ProjectId, TechniqueUse,
};
pub use snapshot::{Catalog, load_catalog};
