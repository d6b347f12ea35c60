//! Runs a set of checks in registration order

use super::graph_cycles::GraphCyclesCheck;
use super::module_tree::{ModuleTreeCheck, ParentVersionsCheck};
use super::programs::ProgramsCheck;
use super::trait_def::{Check, CheckContext, CheckResult};
use super::working_copy::WorkingCopyCheck;
use tracing::debug;

#[derive(Default)]
pub struct CheckRunner {
  checks: Vec<Box<dyn Check>>,
}

impl CheckRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(mut self, check: impl Check + 'static) -> Self {
    self.checks.push(Box::new(check));
    self
  }

  /// Run every check; a check that errors out is reported as a failed result
  pub fn run_all(&self, ctx: &CheckContext) -> Vec<CheckResult> {
    self
      .checks
      .iter()
      .map(|check| {
        debug!(check = check.name(), "Running check: {}", check.description());
        check.run(ctx).unwrap_or_else(|e| {
          CheckResult::error(check.name(), e.to_string(), e.help_message())
        })
      })
      .collect()
  }
}

/// Runner with every built-in check
pub fn create_default_runner() -> CheckRunner {
  CheckRunner::new()
    .register(ProgramsCheck)
    .register(ModuleTreeCheck)
    .register(GraphCyclesCheck)
    .register(ParentVersionsCheck)
    .register(WorkingCopyCheck)
}
