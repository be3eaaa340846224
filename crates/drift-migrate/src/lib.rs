//! # drift-migrate
//!
//! Library side of the `drift-migrate` command: loading JSON model
//! manifests into [`ModelSchema`](drift_core::ModelSchema)s.

pub mod manifest;

pub use manifest::{FieldSpec, Manifest, ManifestError, ModelSpec};
