//! `cascade plan`: show what a release would do

use crate::core::context::ReleaseContext;
use crate::core::error::CascadeResult;
use crate::graph::ensure_acyclic;
use crate::release::{ReleaseLedger, ReleasePlan};

/// Run the plan command
pub fn run_plan(ctx: &ReleaseContext, target: &str, dependencies_only: bool, json: bool) -> CascadeResult<()> {
  let module = ctx.graph.find_by_name(target)?;
  ensure_acyclic(&ctx.graph, &ctx.model)?;

  let plan = ReleasePlan::build(
    &ctx.graph,
    &ctx.model,
    &ctx.config.commands(),
    &ReleaseLedger::new(),
    module,
    dependencies_only,
  )?;

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
  } else {
    print_plan(&plan);
  }
  Ok(())
}

fn print_plan(plan: &ReleasePlan) {
  let scope = if plan.dependencies_only {
    " (dependencies only)"
  } else {
    ""
  };
  println!("📦 Release plan for {}{}", plan.target, scope);
  println!();

  if plan.is_empty() {
    println!("✅ Nothing to release");
    return;
  }

  println!("  Releases ({}):", plan.releases.len());
  for (i, release) in plan.releases.iter().enumerate() {
    println!(
      "    {}. {}  {} → {}",
      i + 1,
      release.module,
      release.current_version,
      release.predicted_version
    );
  }
  println!();
  println!("  Commands ({}):", plan.commands.len());
  for command in &plan.commands {
    println!("    [{}] {}", command.dir, command.command);
  }
  println!();
  println!("🔍 Dry-run only; versions are predicted from the current snapshot versions");
}
