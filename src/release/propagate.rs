//! Dependent-version propagation
//!
//! After a release every other module that depends on one of the released
//! coordinates (directly or through a `${property}`) gets the update command
//! and a commit in its own directory. Modules without such a dependency are
//! left alone.

use super::ledger::ReleaseLedger;
use crate::core::config::CommandSet;
use crate::core::error::CascadeResult;
use crate::core::invoker::InvokerFactory;
use crate::graph::{ModuleGraph, ModuleId};
use crate::project::{Coordinate, ProjectModel};
use tracing::info;

/// Update required in one dependent module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentUpdate {
  pub module: ModuleId,
  /// Released coordinates the module depends on, in declaration order
  pub coordinates: Vec<Coordinate>,
  /// Properties holding any of those versions
  pub properties: Vec<String>,
}

/// Modules outside `just_released` that depend on any of its coordinates
pub fn find_dependents(
  graph: &ModuleGraph,
  model: &dyn ProjectModel,
  just_released: &[Coordinate],
) -> CascadeResult<Vec<DependentUpdate>> {
  let mut updates = Vec::new();
  for module in graph.walk() {
    if just_released.contains(graph.coordinate(module)) {
      continue;
    }

    let mut coordinates: Vec<Coordinate> = Vec::new();
    let mut properties: Vec<String> = Vec::new();
    for dependency in graph.dependencies(module, model)? {
      if !just_released.contains(&dependency.coordinate) {
        continue;
      }
      if !coordinates.contains(&dependency.coordinate) {
        coordinates.push(dependency.coordinate.clone());
      }
      if let Some(property) = dependency.property
        && !properties.contains(&property)
      {
        properties.push(property);
      }
    }

    if !coordinates.is_empty() {
      updates.push(DependentUpdate {
        module,
        coordinates,
        properties,
      });
    }
  }
  Ok(updates)
}

pub struct Propagator<'a> {
  graph: &'a ModuleGraph,
  ledger: &'a ReleaseLedger,
  model: &'a dyn ProjectModel,
  invokers: &'a dyn InvokerFactory,
  commands: &'a CommandSet,
}

impl<'a> Propagator<'a> {
  pub fn new(
    graph: &'a ModuleGraph,
    ledger: &'a ReleaseLedger,
    model: &'a dyn ProjectModel,
    invokers: &'a dyn InvokerFactory,
    commands: &'a CommandSet,
  ) -> Self {
    Self {
      graph,
      ledger,
      model,
      invokers,
      commands,
    }
  }

  /// Move every dependent module onto the versions just released.
  ///
  /// Returns the modules that were updated.
  pub fn update_projects_with_latest_dependency_versions(
    &self,
    just_released: &[Coordinate],
  ) -> CascadeResult<Vec<ModuleId>> {
    if just_released.is_empty() {
      return Ok(Vec::new());
    }

    let includes = just_released.iter().map(Coordinate::to_string).collect::<Vec<_>>().join(",");
    let mut updated = Vec::new();

    for update in find_dependents(self.graph, self.model, just_released)? {
      let coordinate = self.graph.coordinate(update.module);
      info!(module = %coordinate, dependencies = update.coordinates.len(), "Updating dependency versions");

      let properties = update.properties.join(",");
      let mut invoker = self.invokers.invoker(&self.graph.module_dir(update.module));
      invoker.execute_checked(
        &self
          .commands
          .update_dependencies
          .render(&[("includes", includes.as_str()), ("properties", properties.as_str())]),
      )?;

      let message = self.commit_message(&update.coordinates);
      invoker.execute_checked(&self.commands.commit.render(&[("message", message.as_str())]))?;
      updated.push(update.module);
    }

    Ok(updated)
  }

  fn commit_message(&self, coordinates: &[Coordinate]) -> String {
    let parts: Vec<String> = coordinates
      .iter()
      .map(|c| match self.ledger.get(c) {
        Some(entry) => format!("{} to {}", c, entry.new_version),
        None => c.to_string(),
      })
      .collect();
    format!("Update {}", parts.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::CascadeConfig;
  use crate::core::invoker::testing::RecordingFactory;
  use crate::project::manifest::InMemoryModel;
  use crate::release::ledger::LedgerEntry;
  use std::path::{Path, PathBuf};

  fn model() -> InMemoryModel {
    InMemoryModel::default()
      .with("/ws", "[module]\nmodules = [\"lib\", \"app\", \"tool\", \"other\"]\n")
      .with("/ws/lib", "[module]\ngroup = \"g\"\nartifact = \"lib\"\nversion = \"1-SNAPSHOT\"\n")
      .with(
        "/ws/app",
        r#"
[module]
group = "g"
artifact = "app"
version = "1-SNAPSHOT"

[[dependencies]]
group = "g"
artifact = "lib"
version = "1-SNAPSHOT"
"#,
      )
      .with(
        "/ws/tool",
        r#"
[module]
group = "g"
artifact = "tool"
version = "1-SNAPSHOT"

[properties]
"lib.version" = "1-SNAPSHOT"

[[dependencies]]
group = "g"
artifact = "lib"
version = "${lib.version}"
"#,
      )
      .with(
        "/ws/other",
        r#"
[module]
group = "g"
artifact = "other"
version = "1-SNAPSHOT"

[[dependencies]]
group = "org.ext"
artifact = "thing"
version = "4.0"
"#,
      )
  }

  #[test]
  fn test_find_dependents_records_properties() {
    let model = model();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let updates = find_dependents(&graph, &model, &[Coordinate::new("g", "lib")]).unwrap();

    assert_eq!(updates.len(), 2);
    assert_eq!(graph.coordinate(updates[0].module).artifact, "app");
    assert!(updates[0].properties.is_empty());
    assert_eq!(graph.coordinate(updates[1].module).artifact, "tool");
    assert_eq!(updates[1].properties, vec!["lib.version".to_string()]);
  }

  #[test]
  fn test_exactly_one_update_and_commit_per_dependent() {
    let model = model();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let mut ledger = ReleaseLedger::new();
    ledger.record(LedgerEntry {
      coordinate: Coordinate::new("g", "lib"),
      old_version: "1-SNAPSHOT".to_string(),
      new_version: "1".to_string(),
    });
    let commands = CascadeConfig::default().commands();
    let factory = RecordingFactory::new(|_, _| (0, Vec::new()));

    let updated = Propagator::new(&graph, &ledger, &model, &factory, &commands)
      .update_projects_with_latest_dependency_versions(&[Coordinate::new("g", "lib")])
      .unwrap();
    assert_eq!(updated.len(), 2);

    let calls = factory.invocations();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].work_dir, PathBuf::from("/ws/app"));
    assert!(calls[0].args_contain("-Dincludes=g:lib"));
    assert_eq!(calls[1].command.program, "git");
    assert!(calls[1].args_contain("--message=Update g:lib to 1"));
    assert_eq!(calls[2].work_dir, PathBuf::from("/ws/tool"));
    assert!(calls[2].args_contain("-DincludeProperties=lib.version"));
    assert!(calls.iter().all(|c| c.work_dir != Path::new("/ws/other")));
    assert!(calls.iter().all(|c| c.work_dir != Path::new("/ws/lib")));
  }

  #[test]
  fn test_update_failure_propagates() {
    let model = model();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let commands = CascadeConfig::default().commands();
    let factory = RecordingFactory::new(|_, _| (1, Vec::new()));

    let result = Propagator::new(&graph, &ledger, &model, &factory, &commands)
      .update_projects_with_latest_dependency_versions(&[Coordinate::new("g", "lib")]);
    assert!(result.is_err());
    assert_eq!(factory.invocations().len(), 1);
  }
}
