//! Module tree built from the project model
//!
//! # Structure
//!
//! - **Arena**: the graph owns every `ModuleDescriptor`; modules refer to each
//!   other through `ModuleId` indices, never through owning pointers
//! - **Forest**: top-level modules are roots, nested `modules` lists become
//!   children (declaration order is kept)
//! - **Post-pass**: `parent` is set while the tree is built, `releasable_parent`
//!   is computed once the whole tree exists and never changes afterwards
//! - **Index**: coordinate → module for dependency lookups

use crate::core::error::{CascadeResult, ConfigError};
use crate::project::{Coordinate, ModuleManifest, ProjectModel, ResolvedDependency};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Index of a module inside its `ModuleGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

/// One module of the tree
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
  pub coordinate: Coordinate,
  /// Path relative to the containing module (or the project root)
  pub path: PathBuf,
  pub packaging: String,
  pub children: Vec<ModuleId>,
  /// Containing module
  pub parent: Option<ModuleId>,
  /// Nearest ancestor that is released on its own; absorbs releases of this module
  pub releasable_parent: Option<ModuleId>,
  /// False when the module is embedded in its container's multi-module build
  pub is_releasable_module_parent: bool,
  /// Set once, after this module was released in the current run
  pub released_version: Option<String>,
}

/// Module forest for one project root
#[derive(Debug, Clone)]
pub struct ModuleGraph {
  root: PathBuf,
  modules: Vec<ModuleDescriptor>,
  roots: Vec<ModuleId>,
  index: HashMap<Coordinate, ModuleId>,
}

/// Serializable view of a module for `cascade modules --json`
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
  pub coordinate: String,
  pub path: String,
  pub depth: usize,
  pub releasable: bool,
  pub releasable_parent: Option<String>,
  /// Set once the module has been released (or resumed) in this run
  #[serde(skip_serializing_if = "Option::is_none")]
  pub released_version: Option<String>,
}

impl ModuleGraph {
  /// Build the module tree below `root`.
  ///
  /// The descriptor in `root` lists the top-level modules; the root itself is
  /// only a container and does not become a module.
  pub fn load(root: &Path, model: &dyn ProjectModel) -> CascadeResult<Self> {
    let mut graph = Self {
      root: root.to_path_buf(),
      modules: Vec::new(),
      roots: Vec::new(),
      index: HashMap::new(),
    };

    let root_manifest = model.read(root)?;
    for module_dir in &root_manifest.module.modules {
      let id = graph.add_module(root, Path::new(module_dir), None, model)?;
      graph.roots.push(id);
    }

    graph.resolve_releasable_parents();
    debug!(modules = graph.modules.len(), "Module graph loaded");
    Ok(graph)
  }

  fn add_module(
    &mut self,
    container_dir: &Path,
    relative: &Path,
    parent: Option<ModuleId>,
    model: &dyn ProjectModel,
  ) -> CascadeResult<ModuleId> {
    let dir = container_dir.join(relative);
    let manifest = model.read(&dir)?;
    let coordinate = manifest.coordinate(&dir)?;

    if self.index.contains_key(&coordinate) {
      return Err(
        ConfigError::DuplicateModule {
          coordinate: coordinate.to_string(),
        }
        .into(),
      );
    }

    let id = ModuleId(self.modules.len());
    self.modules.push(ModuleDescriptor {
      coordinate: coordinate.clone(),
      path: relative.to_path_buf(),
      packaging: manifest.module.packaging.clone(),
      children: Vec::new(),
      parent,
      releasable_parent: None,
      is_releasable_module_parent: manifest.module.releasable.unwrap_or(parent.is_none()),
      released_version: None,
    });
    self.index.insert(coordinate, id);
    if let Some(parent_id) = parent {
      self.modules[parent_id.0].children.push(id);
    }

    for child in &manifest.module.modules {
      self.add_module(&dir, Path::new(child), Some(id), model)?;
    }

    Ok(id)
  }

  fn resolve_releasable_parents(&mut self) {
    for index in 0..self.modules.len() {
      if self.modules[index].is_releasable_module_parent {
        continue;
      }
      let mut ancestor = self.modules[index].parent;
      while let Some(candidate) = ancestor {
        if self.modules[candidate.0].is_releasable_module_parent {
          break;
        }
        ancestor = self.modules[candidate.0].parent;
      }
      if ancestor.is_none() {
        warn!(
          module = %self.modules[index].coordinate,
          "Module is not releasable and has no releasable ancestor; it will be released on its own"
        );
      }
      self.modules[index].releasable_parent = ancestor;
    }
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn get(&self, id: ModuleId) -> &ModuleDescriptor {
    &self.modules[id.0]
  }

  pub fn coordinate(&self, id: ModuleId) -> &Coordinate {
    &self.modules[id.0].coordinate
  }

  /// Find a module by coordinate
  pub fn find(&self, coordinate: &Coordinate) -> Option<ModuleId> {
    self.index.get(coordinate).copied()
  }

  /// Find a module by `group:artifact` or by a unique artifact id
  pub fn find_by_name(&self, name: &str) -> CascadeResult<ModuleId> {
    if let Some((group, artifact)) = name.split_once(':') {
      return self
        .find(&Coordinate::new(group, artifact))
        .ok_or_else(|| ConfigError::ModuleNotFound { name: name.to_string() }.into());
    }

    let matches: Vec<ModuleId> = self
      .walk()
      .into_iter()
      .filter(|id| self.coordinate(*id).artifact == name)
      .collect();
    match matches.as_slice() {
      [id] => Ok(*id),
      [] => Err(ConfigError::ModuleNotFound { name: name.to_string() }.into()),
      _ => Err(
        ConfigError::AmbiguousModule {
          name: name.to_string(),
          candidates: matches.iter().map(|id| self.coordinate(*id).to_string()).collect(),
        }
        .into(),
      ),
    }
  }

  /// Every module, depth-first in declaration order
  pub fn walk(&self) -> Vec<ModuleId> {
    let mut order = Vec::with_capacity(self.modules.len());
    let mut stack: Vec<ModuleId> = self.roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
      order.push(id);
      stack.extend(self.modules[id.0].children.iter().rev().copied());
    }
    order
  }

  /// All nested modules below `id` (not including `id`)
  pub fn descendants(&self, id: ModuleId) -> Vec<ModuleId> {
    let mut result = Vec::new();
    let mut stack: Vec<ModuleId> = self.modules[id.0].children.iter().rev().copied().collect();
    while let Some(current) = stack.pop() {
      result.push(current);
      stack.extend(self.modules[current.0].children.iter().rev().copied());
    }
    result
  }

  /// Descendants that are released as part of `id`'s build
  pub fn embedded_descendants(&self, id: ModuleId) -> Vec<ModuleId> {
    self
      .descendants(id)
      .into_iter()
      .filter(|d| self.modules[d.0].releasable_parent == Some(id))
      .collect()
  }

  /// The module a release request for `id` actually releases
  pub fn release_unit(&self, id: ModuleId) -> ModuleId {
    self.modules[id.0].releasable_parent.unwrap_or(id)
  }

  /// Absolute working directory of a module
  pub fn module_dir(&self, id: ModuleId) -> PathBuf {
    let mut segments = Vec::new();
    let mut current = Some(id);
    while let Some(module) = current {
      segments.push(&self.modules[module.0].path);
      current = self.modules[module.0].parent;
    }
    let mut dir = self.root.clone();
    for segment in segments.into_iter().rev() {
      dir.push(segment);
    }
    dir
  }

  /// Module directory relative to the project root
  pub fn relative_dir(&self, id: ModuleId) -> PathBuf {
    let dir = self.module_dir(id);
    dir.strip_prefix(&self.root).map(Path::to_path_buf).unwrap_or(dir)
  }

  /// Re-read the descriptor of a module
  pub fn manifest(&self, id: ModuleId, model: &dyn ProjectModel) -> CascadeResult<ModuleManifest> {
    model.read(&self.module_dir(id))
  }

  /// Dependencies of a module with `${property}` versions resolved
  pub fn dependencies(&self, id: ModuleId, model: &dyn ProjectModel) -> CascadeResult<Vec<ResolvedDependency>> {
    let manifest = self.manifest(id, model)?;
    let lookup = |parent: &crate::project::ParentReference| -> CascadeResult<Option<ModuleManifest>> {
      match self.find(&parent.coordinate()) {
        Some(parent_id) => self.manifest(parent_id, model).map(Some),
        None => Ok(None),
      }
    };
    manifest.resolved_dependencies(self.coordinate(id), &lookup)
  }

  pub fn set_released_version(&mut self, id: ModuleId, version: &str) {
    self.modules[id.0].released_version = Some(version.to_string());
  }

  /// Parents declared with more than one version across the tree
  pub fn parent_version_conflicts(
    &self,
    model: &dyn ProjectModel,
  ) -> CascadeResult<BTreeMap<Coordinate, BTreeSet<String>>> {
    let mut versions: BTreeMap<Coordinate, BTreeSet<String>> = BTreeMap::new();
    for id in self.walk() {
      if let Some(parent) = self.manifest(id, model)?.parent {
        versions.entry(parent.coordinate()).or_default().insert(parent.version);
      }
    }
    versions.retain(|_, v| v.len() > 1);
    Ok(versions)
  }

  /// Flat, depth-annotated listing of the tree
  pub fn summaries(&self) -> Vec<ModuleSummary> {
    self
      .walk()
      .into_iter()
      .map(|id| {
        let module = self.get(id);
        ModuleSummary {
          coordinate: module.coordinate.to_string(),
          path: self.relative_dir(id).to_string_lossy().replace('\\', "/"),
          depth: self.depth(id),
          releasable: module.is_releasable_module_parent,
          releasable_parent: module.releasable_parent.map(|p| self.coordinate(p).to_string()),
          released_version: module.released_version.clone(),
        }
      })
      .collect()
  }

  fn depth(&self, id: ModuleId) -> usize {
    let mut depth = 0;
    let mut current = self.modules[id.0].parent;
    while let Some(parent) = current {
      depth += 1;
      current = self.modules[parent.0].parent;
    }
    depth
  }
}
