//! Release executor
//!
//! Releases one module at a time, depth-first:
//!
//! ```text
//! release_module(m)
//!   ├─ redirect to m's releasable parent
//!   ├─ already in ledger?            → AlreadyReleased (no command)
//!   ├─ outermost call?                → check the whole cascade first
//!   ├─ confirm                        → Aborted on "no"
//!   ├─ snapshot parent?               → release_module(parent), update-parent + commit in m
//!   ├─ snapshot dependencies          → release + propagate each
//!   ├─ release command in m's dir
//!   ├─ extract version from output
//!   └─ record m and embedded modules  → Released
//! ```
//!
//! Recursion depth is bounded by the module tree; a stack of modules in
//! progress turns a dependency cycle into a configuration error instead of
//! unbounded recursion.

use super::extract::extract_released_version;
use super::ledger::{LedgerEntry, ReleaseLedger};
use super::propagate::Propagator;
use super::resolver::Resolver;
use crate::core::config::CommandSet;
use crate::core::error::{CascadeError, CascadeResult, ConfigError};
use crate::core::invoker::InvokerFactory;
use crate::core::prompt::{Prompter, is_affirmative};
use crate::graph::{ModuleGraph, ModuleId};
use crate::project::{Coordinate, ProjectModel, is_snapshot};
use tracing::{debug, info};

/// Result of a release request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
  /// Released now; `modules` lists the unit and its embedded modules
  Released { modules: Vec<Coordinate>, version: String },
  /// Released earlier in this run
  AlreadyReleased(LedgerEntry),
}

impl ReleaseOutcome {
  pub fn version(&self) -> &str {
    match self {
      ReleaseOutcome::Released { version, .. } => version,
      ReleaseOutcome::AlreadyReleased(entry) => &entry.new_version,
    }
  }
}

pub struct ReleaseExecutor<'a> {
  graph: &'a mut ModuleGraph,
  ledger: &'a mut ReleaseLedger,
  model: &'a dyn ProjectModel,
  invokers: &'a dyn InvokerFactory,
  prompter: &'a mut dyn Prompter,
  commands: &'a CommandSet,
  in_progress: Vec<ModuleId>,
}

impl<'a> ReleaseExecutor<'a> {
  pub fn new(
    graph: &'a mut ModuleGraph,
    ledger: &'a mut ReleaseLedger,
    model: &'a dyn ProjectModel,
    invokers: &'a dyn InvokerFactory,
    prompter: &'a mut dyn Prompter,
    commands: &'a CommandSet,
  ) -> Self {
    Self {
      graph,
      ledger,
      model,
      invokers,
      prompter,
      commands,
      in_progress: Vec::new(),
    }
  }

  /// Release `module`, then move every dependent onto the new version
  pub fn release_module_and_update_dependencies(&mut self, module: ModuleId) -> CascadeResult<ReleaseOutcome> {
    let outcome = self.release_module(module)?;
    if let ReleaseOutcome::Released { modules, .. } = &outcome {
      Propagator::new(self.graph, self.ledger, self.model, self.invokers, self.commands)
        .update_projects_with_latest_dependency_versions(modules)?;
    }
    Ok(outcome)
  }

  /// Release every snapshot dependency `module` needs, in resolved order
  pub fn release_dependencies(&mut self, module: ModuleId) -> CascadeResult<Vec<ReleaseOutcome>> {
    let unit = self.graph.release_unit(module);
    if self.in_progress.is_empty() {
      Resolver::new(self.graph, self.ledger, self.model).ensure_cascade_releasable(unit, false)?;
    }
    let pending = Resolver::new(self.graph, self.ledger, self.model).determine_releasable_modules(unit)?;

    let mut outcomes = Vec::with_capacity(pending.len());
    for dependency in pending {
      outcomes.push(self.release_module_and_update_dependencies(dependency)?);
    }
    Ok(outcomes)
  }

  /// Release one module (or the unit containing it) exactly once per run
  pub fn release_module(&mut self, module: ModuleId) -> CascadeResult<ReleaseOutcome> {
    let unit = self.graph.release_unit(module);
    if unit != module {
      debug!(
        module = %self.graph.coordinate(module),
        unit = %self.graph.coordinate(unit),
        "Redirecting to releasable parent"
      );
    }
    let coordinate = self.graph.coordinate(unit).clone();

    if let Some(entry) = self.ledger.get(&coordinate) {
      info!(module = %coordinate, version = %entry.new_version, "Already released");
      return Ok(ReleaseOutcome::AlreadyReleased(entry.clone()));
    }

    // Outermost call: nothing may run unless the whole cascade can finish
    if self.in_progress.is_empty() {
      Resolver::new(self.graph, self.ledger, self.model).ensure_cascade_releasable(unit, true)?;
    }

    if self.in_progress.contains(&unit) {
      let mut cycle: Vec<String> = self.in_progress.iter().map(|id| self.graph.coordinate(*id).to_string()).collect();
      cycle.push(coordinate.to_string());
      return Err(ConfigError::ReleaseCycle { cycles: vec![cycle] }.into());
    }

    let answer = self.prompter.prompt(&format!("Release {}?", coordinate), "y")?;
    if !is_affirmative(&answer) {
      return Err(CascadeError::Aborted {
        module: coordinate.to_string(),
      });
    }

    self.in_progress.push(unit);
    let result = self.release_confirmed(unit, &coordinate);
    self.in_progress.pop();
    result
  }

  fn release_confirmed(&mut self, unit: ModuleId, coordinate: &Coordinate) -> CascadeResult<ReleaseOutcome> {
    let module_dir = self.graph.module_dir(unit);

    self.release_parent(unit, coordinate)?;
    self.release_dependencies(unit)?;

    let embedded = self.graph.embedded_descendants(unit);
    let mut old_versions = Vec::with_capacity(embedded.len() + 1);
    for id in std::iter::once(unit).chain(embedded.iter().copied()) {
      let version = self.graph.manifest(id, self.model)?.effective_version().unwrap_or_default().to_string();
      old_versions.push((id, version));
    }

    info!(module = %coordinate, dir = %module_dir.display(), "Releasing");
    let mut invoker = self.invokers.invoker(&module_dir);
    invoker.execute_checked(&self.commands.release.render(&[]))?;

    let packaging = self.graph.get(unit).packaging.clone();
    let version = extract_released_version(invoker.output(), &coordinate.artifact, &packaging).ok_or_else(|| {
      CascadeError::VersionExtraction {
        module: coordinate.to_string(),
        artifact: coordinate.artifact.clone(),
      }
    })?;

    let mut modules = Vec::with_capacity(old_versions.len());
    for (id, old_version) in old_versions {
      let released = self.graph.coordinate(id).clone();
      self.ledger.record(LedgerEntry {
        coordinate: released.clone(),
        old_version,
        new_version: version.clone(),
      });
      self.graph.set_released_version(id, &version);
      modules.push(released);
    }

    info!(module = %coordinate, version = %version, modules = modules.len(), "Released");
    Ok(ReleaseOutcome::Released { modules, version })
  }

  /// Release a snapshot parent first and move `unit` onto its new version
  fn release_parent(&mut self, unit: ModuleId, coordinate: &Coordinate) -> CascadeResult<()> {
    let Some(parent) = self.graph.manifest(unit, self.model)?.parent else {
      return Ok(());
    };
    if !is_snapshot(&parent.version) {
      return Ok(());
    }

    let parent_coordinate = parent.coordinate();
    let parent_id = self.graph.find(&parent_coordinate).ok_or_else(|| ConfigError::UnresolvedParent {
      module: coordinate.to_string(),
      parent: format!("{}:{}", parent_coordinate, parent.version),
    })?;
    if self.graph.release_unit(parent_id) == unit {
      return Ok(());
    }

    let outcome = self.release_module(parent_id)?;
    let message = format!("Update parent {} to {}", parent_coordinate, outcome.version());

    info!(module = %coordinate, parent = %parent_coordinate, version = %outcome.version(), "Updating parent");
    let mut invoker = self.invokers.invoker(&self.graph.module_dir(unit));
    invoker.execute_checked(&self.commands.update_parent.render(&[]))?;
    invoker.execute_checked(&self.commands.commit.render(&[("message", message.as_str())]))?;
    Ok(())
  }
}
