//! CLI commands for cascade
//!
//! ## Setup & Inspection
//! - **init**: Write a default cascade.toml
//! - **doctor**: Run health checks and validation
//! - **modules**: Show the module tree and release units
//!
//! ## Releases
//! - **plan**: Dry-run a cascade and list the commands it would run
//! - **release**: Release a module and every snapshot it depends on
//!
//! `modules`, `plan` and `release` take the `ReleaseContext` built once in
//! `main.rs`; `init` and `doctor` work without a loadable module tree.

pub mod doctor;
pub mod init;
pub mod modules;
pub mod plan;
pub mod release;

pub use doctor::run_doctor;
pub use init::run_init;
pub use modules::run_modules;
pub use plan::run_plan;
pub use release::{ReleaseOptions, run_release};
