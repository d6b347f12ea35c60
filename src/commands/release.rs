//! `cascade release`: release a module and every snapshot it depends on
//!
//! Preflight (programs, cycles, a dry-run plan of the whole cascade, working
//! copy) runs before the first build or VCS command. The ledger is written
//! whether the cascade succeeds or not, so a failed run can be continued with
//! `--resume`.

use crate::checks::{ensure_clean_working_copy, missing_programs};
use crate::core::context::ReleaseContext;
use crate::core::error::{CascadeError, CascadeResult};
use crate::core::invoker::SystemInvokerFactory;
use crate::core::prompt::{BatchPrompter, ConsolePrompter, Prompter};
use crate::graph::ensure_acyclic;
use crate::release::{ReleaseExecutor, ReleaseLedger, ReleasePlan};
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for `cascade release`
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
  /// Module to release, as `group:artifact` or a unique artifact
  pub target: String,
  /// Release the snapshot dependencies of the target but not the target
  pub dependencies_only: bool,
  /// Never prompt
  pub batch: bool,
  /// Treat the last run recorded in the ledger as already released
  pub resume: bool,
  pub skip_workspace_check: bool,
  /// Ledger file overriding `workspace.ledger`
  pub ledger: Option<PathBuf>,
}

/// Run the release command
pub fn run_release(ctx: &mut ReleaseContext, opts: ReleaseOptions) -> CascadeResult<()> {
  let commands = ctx.config.commands();
  let ledger_path = opts
    .ledger
    .as_ref()
    .map(|p| ctx.config_dir.join(p))
    .or_else(|| ctx.ledger_path());

  if let Some(missing) = missing_programs(&ctx.config, &ctx.root).into_iter().next() {
    return Err(missing.into());
  }

  let target = ctx.graph.find_by_name(&opts.target)?;
  let unit = ctx.graph.release_unit(target);
  if unit != target {
    println!(
      "ℹ️  {} is released together with {}",
      ctx.graph.coordinate(target),
      ctx.graph.coordinate(unit)
    );
  }

  ensure_acyclic(&ctx.graph, &ctx.model)?;

  for (parent, versions) in ctx.graph.parent_version_conflicts(&ctx.model)? {
    let versions: Vec<_> = versions.into_iter().collect();
    warn!(parent = %parent, versions = ?versions, "Modules disagree on the parent version");
    println!("⚠️  Modules use different versions of parent {}: {}", parent, versions.join(", "));
  }

  let mut ledger = if opts.resume {
    resume_ledger(ctx, ledger_path.as_ref())?
  } else {
    ReleaseLedger::new()
  };
  let resumed: HashSet<_> = ledger.entries().iter().map(|e| e.coordinate.clone()).collect();

  // Dry run first: unknown snapshots and parents fail before any process starts
  let plan = ReleasePlan::build(&ctx.graph, &ctx.model, &commands, &ledger, unit, opts.dependencies_only)?;
  info!(
    releases = plan.releases.len(),
    commands = plan.commands.len(),
    "Cascade planned"
  );

  let invokers = SystemInvokerFactory::new(&ctx.root, ctx.config.release.echo_output);
  if ctx.config.release.check_workspace && !opts.skip_workspace_check {
    let ignored: Vec<String> = ledger_path
      .iter()
      .filter_map(|p| p.strip_prefix(&ctx.root).ok())
      .map(|p| p.to_string_lossy().replace('\\', "/"))
      .collect();
    ensure_clean_working_copy(&commands, &invokers, &ctx.root, &ignored)?;
  }

  let mut prompter: Box<dyn Prompter> = if opts.batch || ctx.config.release.batch {
    Box::new(BatchPrompter)
  } else {
    Box::new(ConsolePrompter)
  };

  let started = Utc::now();
  info!(module = %ctx.graph.coordinate(unit), dependencies_only = opts.dependencies_only, "Starting cascade");
  let result = {
    let mut executor = ReleaseExecutor::new(
      &mut ctx.graph,
      &mut ledger,
      &ctx.model,
      &invokers,
      prompter.as_mut(),
      &commands,
    );
    if opts.dependencies_only {
      executor.release_dependencies(unit).map(|_| ())
    } else {
      executor.release_module_and_update_dependencies(unit).map(|_| ())
    }
  };

  if let Some(path) = &ledger_path {
    match ledger.write_to_file(path, started) {
      Ok(true) => println!("📝 Ledger written to {}", path.display()),
      Ok(false) => {}
      Err(e) if result.is_ok() => return Err(e),
      Err(e) => warn!(error = %e, "Failed to write ledger"),
    }
  }

  print_summary(&ledger, &resumed, result.is_ok());
  result
}

fn resume_ledger(ctx: &mut ReleaseContext, path: Option<&PathBuf>) -> CascadeResult<ReleaseLedger> {
  let Some(path) = path else {
    return Err(CascadeError::with_help(
      "--resume needs a ledger file",
      "Set workspace.ledger in cascade.toml or pass --ledger",
    ));
  };
  if !path.exists() {
    warn!(path = %path.display(), "No ledger to resume from");
    return Ok(ReleaseLedger::new());
  }

  let ledger = ReleaseLedger::load_last_run(path)?;
  for entry in ledger.entries() {
    match ctx.graph.find(&entry.coordinate) {
      Some(id) => ctx.graph.set_released_version(id, &entry.new_version),
      None => warn!(module = %entry.coordinate, "Ledger entry is not in the module tree"),
    }
  }
  println!("⏩ Resuming: {} module(s) already released", ledger.len());
  Ok(ledger)
}

fn print_summary(ledger: &ReleaseLedger, resumed: &HashSet<crate::project::Coordinate>, succeeded: bool) {
  let released: Vec<_> = ledger
    .entries()
    .iter()
    .filter(|e| !resumed.contains(&e.coordinate))
    .collect();

  println!();
  if succeeded {
    println!("✅ Cascade complete: {} module(s) released", released.len());
  } else if released.is_empty() {
    println!("❌ Cascade stopped before any module was released");
    return;
  } else {
    println!("❌ Cascade stopped; released before the failure:");
  }
  for entry in released {
    println!("   {}", entry);
  }
}
