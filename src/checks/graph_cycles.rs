//! Release cycle detection check
//!
//! Validates that snapshot dependencies between release units are acyclic
//! using Tarjan's SCC algorithm. A cycle would make a cascade recurse forever,
//! so this catches configuration issues before any command runs.

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::CascadeResult;
use crate::graph::ModuleGraph;
use crate::graph::cycles::find_release_cycles;

/// Check for snapshot dependency cycles between release units
pub struct GraphCyclesCheck;

impl Check for GraphCyclesCheck {
  fn name(&self) -> &'static str {
    "release-cycles"
  }

  fn description(&self) -> &'static str {
    "Detect snapshot dependency cycles between releasable modules"
  }

  fn run(&self, ctx: &CheckContext) -> CascadeResult<CheckResult> {
    let model = ctx.model();
    let graph = match ModuleGraph::load(&ctx.root, &model) {
      Ok(g) => g,
      Err(e) => {
        return Ok(CheckResult::error(
          self.name(),
          format!("Failed to load module tree: {}", e),
          Some("Run `cascade doctor` after fixing the module-tree check"),
        ));
      }
    };

    let cycles = match find_release_cycles(&graph, &model) {
      Ok(c) => c,
      Err(e) => {
        return Ok(CheckResult::error(
          self.name(),
          format!("Failed to resolve dependencies: {}", e),
          e.help_message(),
        ));
      }
    };

    if cycles.is_empty() {
      Ok(CheckResult::pass(self.name(), "No release cycles detected"))
    } else {
      let cycle_list: Vec<String> = cycles
        .iter()
        .enumerate()
        .map(|(i, cycle)| format!("Cycle {}: {}", i + 1, cycle.join(" → ")))
        .collect();

      Ok(
        CheckResult::error(
          self.name(),
          format!("Found {} release cycle(s) in the module tree", cycles.len()),
          Some("Release one module of each cycle manually, then point the others at the released version"),
        )
        .with_details(serde_json::json!({ "cycles": cycle_list })),
      )
    }
  }
}
