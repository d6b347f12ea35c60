//! Module tree and release-order analysis
//!
//! Arena-backed module forest plus petgraph for cycle detection.

pub mod cycles;
pub mod module_graph;

pub use cycles::ensure_acyclic;
pub use module_graph::{ModuleGraph, ModuleId};
