//! Release planning: dry-run a cascade without running anything
//!
//! The plan drives the real `ReleaseExecutor` against a recording invoker
//! that never spawns a process. Release commands are answered with a
//! synthetic upload line carrying the predicted version (the current version
//! without its snapshot marker), so ordering, parent updates and propagation
//! are exactly what `cascade release` would do.

use super::executor::ReleaseExecutor;
use super::ledger::{LedgerEntry, ReleaseLedger};
use crate::core::config::CommandSet;
use crate::core::error::CascadeResult;
use crate::core::invoker::{CommandInvoker, CommandLine, InvokerFactory};
use crate::core::prompt::BatchPrompter;
use crate::graph::{ModuleGraph, ModuleId};
use crate::project::{ProjectModel, coordinate::SNAPSHOT_MARKER};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One external command the cascade would run
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCommand {
  /// Module whose directory the command runs in
  pub module: String,
  /// Directory relative to the project base
  pub dir: String,
  pub command: String,
}

/// One module the cascade would release
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRelease {
  pub module: String,
  pub current_version: String,
  pub predicted_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub target: String,
  pub dependencies_only: bool,
  /// Modules released earlier (resumed ledger) and skipped
  pub already_released: Vec<String>,
  pub releases: Vec<PlannedRelease>,
  pub commands: Vec<PlannedCommand>,
}

impl ReleasePlan {
  /// Simulate releasing `target` on a copy of the graph
  pub fn build(
    graph: &ModuleGraph,
    model: &dyn ProjectModel,
    commands: &CommandSet,
    seed: &ReleaseLedger,
    target: ModuleId,
    dependencies_only: bool,
  ) -> CascadeResult<Self> {
    let mut scratch_graph = graph.clone();
    let mut ledger = ReleaseLedger::new();
    for entry in seed.entries() {
      ledger.record(entry.clone());
    }

    let recorder = PlanRecorder::new(graph, model, commands)?;
    let mut prompter = BatchPrompter;
    {
      let mut executor =
        ReleaseExecutor::new(&mut scratch_graph, &mut ledger, model, &recorder, &mut prompter, commands);
      if dependencies_only {
        executor.release_dependencies(target)?;
      } else {
        executor.release_module_and_update_dependencies(target)?;
      }
    }

    let releases = ledger
      .entries()
      .iter()
      .filter(|entry| !seed.contains(&entry.coordinate))
      .map(|entry: &LedgerEntry| PlannedRelease {
        module: entry.coordinate.to_string(),
        current_version: entry.old_version.clone(),
        predicted_version: entry.new_version.clone(),
      })
      .collect();

    Ok(Self {
      target: graph.coordinate(target).to_string(),
      dependencies_only,
      already_released: seed.entries().iter().map(|e| e.coordinate.to_string()).collect(),
      releases,
      commands: recorder.take(),
    })
  }

  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }
}

/// Version the release would most likely produce
pub fn predict_release_version(current: &str) -> String {
  current.replacen(SNAPSHOT_MARKER, "", 1)
}

struct ModuleInfo {
  coordinate: String,
  relative_dir: String,
  artifact: String,
  predicted_version: String,
}

/// Records commands instead of running them
struct PlanRecorder {
  release: CommandLine,
  modules: Rc<HashMap<PathBuf, ModuleInfo>>,
  planned: Rc<RefCell<Vec<PlannedCommand>>>,
}

impl PlanRecorder {
  fn new(graph: &ModuleGraph, model: &dyn ProjectModel, commands: &CommandSet) -> CascadeResult<Self> {
    let mut modules = HashMap::new();
    for id in graph.walk() {
      let manifest = graph.manifest(id, model)?;
      let coordinate = graph.coordinate(id);
      modules.insert(
        graph.module_dir(id),
        ModuleInfo {
          coordinate: coordinate.to_string(),
          relative_dir: graph.relative_dir(id).to_string_lossy().replace('\\', "/"),
          artifact: coordinate.artifact.clone(),
          predicted_version: manifest
            .effective_version()
            .map(predict_release_version)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "0".to_string()),
        },
      );
    }
    Ok(Self {
      release: commands.release.render(&[]),
      modules: Rc::new(modules),
      planned: Rc::new(RefCell::new(Vec::new())),
    })
  }

  fn take(&self) -> Vec<PlannedCommand> {
    self.planned.take()
  }
}

impl InvokerFactory for PlanRecorder {
  fn invoker(&self, work_dir: &Path) -> Box<dyn CommandInvoker> {
    Box::new(PlanInvoker {
      work_dir: work_dir.to_path_buf(),
      release: self.release.clone(),
      modules: Rc::clone(&self.modules),
      planned: Rc::clone(&self.planned),
      output: Vec::new(),
    })
  }
}

struct PlanInvoker {
  work_dir: PathBuf,
  release: CommandLine,
  modules: Rc<HashMap<PathBuf, ModuleInfo>>,
  planned: Rc<RefCell<Vec<PlannedCommand>>>,
  output: Vec<String>,
}

impl CommandInvoker for PlanInvoker {
  fn execute(&mut self, command: &CommandLine) -> CascadeResult<Option<i32>> {
    let info = self.modules.get(&self.work_dir);
    self.planned.borrow_mut().push(PlannedCommand {
      module: info.map(|i| i.coordinate.clone()).unwrap_or_default(),
      dir: info
        .map(|i| i.relative_dir.clone())
        .unwrap_or_else(|| self.work_dir.display().to_string()),
      command: command.to_string(),
    });

    self.output.clear();
    if *command == self.release
      && let Some(info) = info
    {
      self.output.push(format!(
        "Uploading: plan://{artifact}/{version}/{artifact}-{version}.pom",
        artifact = info.artifact,
        version = info.predicted_version
      ));
    }
    Ok(Some(0))
  }

  fn output(&self) -> &[String] {
    &self.output
  }

  fn work_dir(&self) -> &Path {
    &self.work_dir
  }
}
