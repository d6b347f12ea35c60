//! Health checks and release preflight
//!
//! All checks implement the `Check` trait. `cascade doctor` runs every check;
//! `cascade release` reuses the same functions as hard preflight gates.
//!
//! # Built-in Checks
//!
//! - **programs**: configured build and VCS programs are executable
//! - **module-tree**: descriptors parse, coordinates are unique
//! - **release-cycles**: no snapshot dependency cycle between release units
//! - **parent-versions**: modules sharing a parent agree on its version
//! - **working-copy**: no local modifications

mod graph_cycles;
mod module_tree;
mod programs;
mod runner;
mod trait_def;
mod working_copy;

pub use programs::missing_programs;
pub use runner::create_default_runner;
pub use trait_def::{CheckContext, CheckResult, Severity};
pub use working_copy::ensure_clean_working_copy;
