//! Cascading release engine
//!
//! # Core Invariants
//!
//! 1. **A module is released at most once per run**
//!    - The ledger is checked before anything else happens
//!    - Embedded modules are released (and recorded) with their releasable parent
//!
//! 2. **Prerequisites first**
//!    - A snapshot parent is released before its children
//!    - Snapshot dependencies are released (and propagated) before their dependents
//!
//! 3. **No partial start on unknown snapshots**
//!    - A snapshot dependency outside the module tree stops the cascade
//!      before any external command runs
//!
//! # Architecture
//!
//! - **resolver**: which modules must be released before a target
//! - **executor**: the per-module release state machine
//! - **propagate**: moves dependents onto freshly released versions
//! - **extract**: reads the released version from build output
//! - **ledger**: idempotency record and its persisted form
//! - **plan**: dry-run of a whole cascade

pub mod executor;
pub mod extract;
pub mod ledger;
pub mod plan;
pub mod propagate;
pub mod resolver;

pub use executor::ReleaseExecutor;
pub use ledger::ReleaseLedger;
pub use plan::ReleasePlan;
