//! Release-order resolution
//!
//! Determines which modules must be released before a target can be: every
//! snapshot dependency of the target's build (the target and its nested
//! modules) that lives in another release unit and was not released yet.

use super::ledger::ReleaseLedger;
use crate::core::error::{CascadeError, CascadeResult, ConfigError};
use crate::graph::{ModuleGraph, ModuleId};
use crate::project::{ProjectModel, is_snapshot};
use std::collections::HashSet;
use tracing::debug;

pub struct Resolver<'a> {
  graph: &'a ModuleGraph,
  ledger: &'a ReleaseLedger,
  model: &'a dyn ProjectModel,
}

impl<'a> Resolver<'a> {
  pub fn new(graph: &'a ModuleGraph, ledger: &'a ReleaseLedger, model: &'a dyn ProjectModel) -> Self {
    Self { graph, ledger, model }
  }

  /// Modules to release before `target`, in encounter order.
  ///
  /// Fails without side effects when any snapshot dependency is not part of
  /// the module tree; the error lists all of them.
  pub fn determine_releasable_modules(&self, target: ModuleId) -> CascadeResult<Vec<ModuleId>> {
    let (ordered, non_releasable) = self.prerequisites(target)?;
    if !non_releasable.is_empty() {
      return Err(CascadeError::UnreleasableDependencies {
        target: self.graph.coordinate(target).to_string(),
        dependencies: non_releasable,
      });
    }

    debug!(
      target = %self.graph.coordinate(target),
      releasable = ordered.len(),
      "Resolved release order"
    );
    Ok(ordered)
  }

  /// Check everything a cascade from `target` would reach before it starts.
  ///
  /// Follows snapshot parents and snapshot dependencies transitively over
  /// release units not yet in the ledger. Snapshot dependencies outside the
  /// tree are collected across the whole cascade into one error; a snapshot
  /// parent outside the tree is a `ConfigError::UnresolvedParent`. With
  /// `include_parent` unset the target's own parent is not followed.
  pub fn ensure_cascade_releasable(&self, target: ModuleId, include_parent: bool) -> CascadeResult<()> {
    let root = self.graph.release_unit(target);
    let mut pending = vec![root];
    let mut visited: HashSet<ModuleId> = HashSet::new();
    let mut non_releasable: Vec<String> = Vec::new();

    while let Some(unit) = pending.pop() {
      if !visited.insert(unit) {
        continue;
      }

      if (unit != root || include_parent)
        && let Some(parent_unit) = self.snapshot_parent_unit(unit)?
      {
        pending.push(parent_unit);
      }

      let (units, missing) = self.prerequisites(unit)?;
      pending.extend(units);
      for described in missing {
        if !non_releasable.contains(&described) {
          non_releasable.push(described);
        }
      }
    }

    if non_releasable.is_empty() {
      debug!(target = %self.graph.coordinate(root), units = visited.len(), "Cascade is releasable");
      Ok(())
    } else {
      Err(CascadeError::UnreleasableDependencies {
        target: self.graph.coordinate(root).to_string(),
        dependencies: non_releasable,
      })
    }
  }

  /// Unit of `unit`'s snapshot parent when it still has to be released
  fn snapshot_parent_unit(&self, unit: ModuleId) -> CascadeResult<Option<ModuleId>> {
    let Some(parent) = self.graph.manifest(unit, self.model)?.parent else {
      return Ok(None);
    };
    if !is_snapshot(&parent.version) {
      return Ok(None);
    }

    let parent_coordinate = parent.coordinate();
    let parent_id = self.graph.find(&parent_coordinate).ok_or_else(|| ConfigError::UnresolvedParent {
      module: self.graph.coordinate(unit).to_string(),
      parent: format!("{}:{}", parent_coordinate, parent.version),
    })?;
    let parent_unit = self.graph.release_unit(parent_id);
    if parent_unit == unit || self.ledger.contains(self.graph.coordinate(parent_unit)) {
      Ok(None)
    } else {
      Ok(Some(parent_unit))
    }
  }

  /// Unreleased units the build of `target` depends on, and every snapshot
  /// dependency outside the tree (as `g:a:v`)
  fn prerequisites(&self, target: ModuleId) -> CascadeResult<(Vec<ModuleId>, Vec<String>)> {
    let target_unit = self.graph.release_unit(target);
    let mut scope = vec![target];
    scope.extend(self.graph.descendants(target));
    let in_scope: HashSet<ModuleId> = scope.iter().copied().collect();

    let mut ordered: Vec<ModuleId> = Vec::new();
    let mut non_releasable: Vec<String> = Vec::new();

    for module in &scope {
      for dependency in self.graph.dependencies(*module, self.model)? {
        if !dependency.is_snapshot() {
          continue;
        }

        let Some(found) = self.graph.find(&dependency.coordinate) else {
          let described = dependency.describe();
          if !non_releasable.contains(&described) {
            non_releasable.push(described);
          }
          continue;
        };

        if in_scope.contains(&found) {
          continue;
        }
        let unit = self.graph.release_unit(found);
        if unit == target_unit || in_scope.contains(&unit) {
          continue;
        }
        if self.ledger.contains(self.graph.coordinate(unit)) {
          debug!(module = %self.graph.coordinate(unit), "Dependency already released");
          continue;
        }
        if !ordered.contains(&unit) {
          ordered.push(unit);
        }
      }
    }

    Ok((ordered, non_releasable))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::module_graph::fixtures;
  use crate::project::Coordinate;
  use crate::project::manifest::InMemoryModel;
  use crate::release::ledger::LedgerEntry;
  use std::path::Path;

  fn artifacts(graph: &ModuleGraph, ids: &[ModuleId]) -> Vec<String> {
    ids.iter().map(|id| graph.coordinate(*id).artifact.clone()).collect()
  }

  #[test]
  fn test_snapshot_dependency_is_releasable() {
    let model = fixtures::project();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let app = graph.find_by_name("app").unwrap();

    let order = Resolver::new(&graph, &ledger, &model).determine_releasable_modules(app).unwrap();
    assert_eq!(artifacts(&graph, &order), vec!["lib"]);
  }

  #[test]
  fn test_released_dependencies_are_skipped() {
    let model = fixtures::project();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let mut ledger = ReleaseLedger::new();
    ledger.record(LedgerEntry {
      coordinate: Coordinate::new("com.acme", "lib"),
      old_version: "1.0-SNAPSHOT".to_string(),
      new_version: "1.0".to_string(),
    });
    let app = graph.find_by_name("app").unwrap();

    let order = Resolver::new(&graph, &ledger, &model).determine_releasable_modules(app).unwrap();
    assert!(order.is_empty());
  }

  #[test]
  fn test_same_build_dependencies_are_skipped() {
    let model = fixtures::project();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let platform = graph.find_by_name("platform").unwrap();
    let api = graph.find_by_name("platform-api").unwrap();

    let resolver = Resolver::new(&graph, &ledger, &model);
    assert!(resolver.determine_releasable_modules(platform).unwrap().is_empty());
    assert!(resolver.determine_releasable_modules(api).unwrap().is_empty());
  }

  #[test]
  fn test_embedded_dependency_is_substituted_and_deduplicated() {
    let model = InMemoryModel::default()
      .with("/ws", "[module]\nmodules = [\"platform\", \"app\"]\n")
      .with(
        "/ws/platform",
        "[module]\ngroup = \"g\"\nartifact = \"platform\"\nversion = \"1-SNAPSHOT\"\nmodules = [\"core\", \"api\"]\n",
      )
      .with(
        "/ws/platform/core",
        "[module]\ngroup = \"g\"\nartifact = \"core\"\nversion = \"1-SNAPSHOT\"\n",
      )
      .with(
        "/ws/platform/api",
        "[module]\ngroup = \"g\"\nartifact = \"api\"\nversion = \"1-SNAPSHOT\"\n",
      )
      .with(
        "/ws/app",
        r#"
[module]
group = "g"
artifact = "app"
version = "1-SNAPSHOT"

[[dependencies]]
group = "g"
artifact = "api"
version = "1-SNAPSHOT"

[[dependencies]]
group = "g"
artifact = "core"
version = "1-SNAPSHOT"
"#,
      );
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let app = graph.find_by_name("app").unwrap();

    let order = Resolver::new(&graph, &ledger, &model).determine_releasable_modules(app).unwrap();
    assert_eq!(artifacts(&graph, &order), vec!["platform"]);
  }

  #[test]
  fn test_external_snapshots_fail_listing_every_coordinate() {
    let model = InMemoryModel::default()
      .with("/ws", "[module]\nmodules = [\"lib\", \"app\"]\n")
      .with("/ws/lib", "[module]\ngroup = \"g\"\nartifact = \"lib\"\nversion = \"1-SNAPSHOT\"\n")
      .with(
        "/ws/app",
        r#"
[module]
group = "g"
artifact = "app"
version = "1-SNAPSHOT"

[[dependencies]]
group = "org.ext"
artifact = "one"
version = "1.0-SNAPSHOT"

[[dependencies]]
group = "g"
artifact = "lib"
version = "1-SNAPSHOT"

[[dependencies]]
group = "org.ext"
artifact = "two"
version = "2.0-SNAPSHOT"

[[dependencies]]
group = "org.ext"
artifact = "released"
version = "3.0"
"#,
      );
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let app = graph.find_by_name("app").unwrap();

    let err = Resolver::new(&graph, &ledger, &model)
      .determine_releasable_modules(app)
      .unwrap_err();
    match err {
      CascadeError::UnreleasableDependencies { target, dependencies } => {
        assert_eq!(target, "g:app");
        assert_eq!(
          dependencies,
          vec!["org.ext:one:1.0-SNAPSHOT".to_string(), "org.ext:two:2.0-SNAPSHOT".to_string()]
        );
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  fn parent_lib_app_with_external_snapshot() -> InMemoryModel {
    InMemoryModel::default()
      .with("/ws", "[module]\nmodules = [\"parent\", \"lib\", \"app\"]\n")
      .with(
        "/ws/parent",
        r#"
[module]
group = "g"
artifact = "parent"
version = "1-SNAPSHOT"
packaging = "pom"

[[dependencies]]
group = "org.ext"
artifact = "plugin"
version = "5-SNAPSHOT"
"#,
      )
      .with(
        "/ws/lib",
        "[module]\ngroup = \"g\"\nartifact = \"lib\"\nversion = \"1-SNAPSHOT\"\n\n[parent]\ngroup = \"g\"\nartifact = \"parent\"\nversion = \"1-SNAPSHOT\"\n",
      )
      .with(
        "/ws/app",
        "[module]\ngroup = \"g\"\nartifact = \"app\"\nversion = \"1-SNAPSHOT\"\n\n[[dependencies]]\ngroup = \"g\"\nartifact = \"lib\"\nversion = \"1-SNAPSHOT\"\n",
      )
  }

  #[test]
  fn test_cascade_check_follows_dependencies_and_parents() {
    let model = parent_lib_app_with_external_snapshot();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let ledger = ReleaseLedger::new();
    let app = graph.find_by_name("app").unwrap();

    // app itself is clean; the external snapshot sits two steps away
    assert!(Resolver::new(&graph, &ledger, &model).determine_releasable_modules(app).is_ok());
    let err = Resolver::new(&graph, &ledger, &model)
      .ensure_cascade_releasable(app, true)
      .unwrap_err();
    assert!(err.to_string().contains("org.ext:plugin:5-SNAPSHOT"));
  }

  #[test]
  fn test_cascade_check_skips_released_units_and_excluded_parent() {
    let model = parent_lib_app_with_external_snapshot();
    let graph = ModuleGraph::load(Path::new("/ws"), &model).unwrap();
    let lib = graph.find_by_name("lib").unwrap();
    let app = graph.find_by_name("app").unwrap();

    let empty = ReleaseLedger::new();
    assert!(Resolver::new(&graph, &empty, &model).ensure_cascade_releasable(lib, false).is_ok());
    assert!(Resolver::new(&graph, &empty, &model).ensure_cascade_releasable(lib, true).is_err());

    let mut ledger = ReleaseLedger::new();
    ledger.record(LedgerEntry {
      coordinate: Coordinate::new("g", "parent"),
      old_version: "1-SNAPSHOT".to_string(),
      new_version: "1".to_string(),
    });
    assert!(Resolver::new(&graph, &ledger, &model).ensure_cascade_releasable(app, true).is_ok());
  }
}
