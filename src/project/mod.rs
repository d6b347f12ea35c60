//! Project model: coordinates and module descriptors

pub mod coordinate;
pub mod manifest;

pub use coordinate::{Coordinate, is_snapshot};
pub use manifest::{ManifestReader, ModuleManifest, ParentReference, ProjectModel, ResolvedDependency};
