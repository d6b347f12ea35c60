//! Module tree checks: the tree loads, and parents are declared consistently

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::CascadeResult;
use crate::graph::ModuleGraph;

/// Every module descriptor parses and all coordinates are unique
pub struct ModuleTreeCheck;

impl Check for ModuleTreeCheck {
  fn name(&self) -> &'static str {
    "module-tree"
  }

  fn description(&self) -> &'static str {
    "Module descriptors parse and form a tree with unique coordinates"
  }

  fn run(&self, ctx: &CheckContext) -> CascadeResult<CheckResult> {
    let model = ctx.model();
    match ModuleGraph::load(&ctx.root, &model) {
      Ok(graph) if graph.is_empty() => Ok(CheckResult::warning(
        self.name(),
        "The root descriptor lists no modules",
        Some("Add module directories under `modules` in the root descriptor"),
      )),
      Ok(graph) => {
        let releasable = graph
          .walk()
          .into_iter()
          .filter(|id| graph.get(*id).is_releasable_module_parent)
          .count();
        Ok(CheckResult::pass(
          self.name(),
          format!("{} module(s), {} releasable on their own", graph.len(), releasable),
        ))
      }
      Err(e) => Ok(CheckResult::error(
        self.name(),
        e.to_string(),
        Some(format!(
          "Every module directory needs a {} descriptor",
          ctx.config.workspace.manifest
        )),
      )),
    }
  }
}

/// Modules declaring the same parent should agree on its version
pub struct ParentVersionsCheck;

impl Check for ParentVersionsCheck {
  fn name(&self) -> &'static str {
    "parent-versions"
  }

  fn description(&self) -> &'static str {
    "Modules sharing a parent declare the same parent version"
  }

  fn run(&self, ctx: &CheckContext) -> CascadeResult<CheckResult> {
    let model = ctx.model();
    let Ok(graph) = ModuleGraph::load(&ctx.root, &model) else {
      return Ok(CheckResult::warning(
        self.name(),
        "Skipped: module tree did not load",
        Some("Fix the module-tree check first"),
      ));
    };

    let conflicts = graph.parent_version_conflicts(&model)?;
    if conflicts.is_empty() {
      return Ok(CheckResult::pass(self.name(), "Parent versions are consistent"));
    }

    let listed: Vec<String> = conflicts
      .iter()
      .map(|(parent, versions)| {
        format!(
          "{} ({})",
          parent,
          versions.iter().cloned().collect::<Vec<_>>().join(", ")
        )
      })
      .collect();
    Ok(
      CheckResult::warning(
        self.name(),
        format!("Parents declared with differing versions: {}", listed.join("; ")),
        Some("Align the [parent] versions before releasing"),
      )
      .with_details(serde_json::json!({ "conflicts": listed })),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checks::trait_def::Severity;
  use crate::core::config::CascadeConfig;
  use std::fs;
  use std::path::Path;

  fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn test_missing_descriptor_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("module.toml"), "[module]\nmodules = [\"gone\"]\n");
    let ctx = CheckContext::new(dir.path().to_path_buf(), CascadeConfig::default());
    assert!(ModuleTreeCheck.run(&ctx).unwrap().is_blocking());
  }

  #[test]
  fn test_parent_version_conflict_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("module.toml"), "[module]\nmodules = [\"parent\", \"a\", \"b\"]\n");
    write(
      &dir.path().join("parent/module.toml"),
      "[module]\ngroup = \"g\"\nartifact = \"parent\"\nversion = \"2-SNAPSHOT\"\npackaging = \"pom\"\n",
    );
    write(
      &dir.path().join("a/module.toml"),
      "[module]\nartifact = \"a\"\n\n[parent]\ngroup = \"g\"\nartifact = \"parent\"\nversion = \"1\"\n",
    );
    write(
      &dir.path().join("b/module.toml"),
      "[module]\nartifact = \"b\"\n\n[parent]\ngroup = \"g\"\nartifact = \"parent\"\nversion = \"2-SNAPSHOT\"\n",
    );

    let ctx = CheckContext::new(dir.path().to_path_buf(), CascadeConfig::default());
    assert!(ModuleTreeCheck.run(&ctx).unwrap().passed);

    let result = ParentVersionsCheck.run(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Warning);
    assert!(result.message.contains("g:parent (1, 2-SNAPSHOT)"));
  }
}
