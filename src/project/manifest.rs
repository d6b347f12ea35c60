//! Module descriptors (`module.toml`) and the project model contract
//!
//! Each module directory carries one descriptor declaring its coordinate, its
//! build parent, properties, dependencies and nested modules. Descriptors are
//! re-read on every traversal because release and update commands rewrite
//! them while a cascade is running.

use super::coordinate::{Coordinate, is_snapshot};
use crate::core::error::{CascadeResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;

/// Parent chains deeper than this are treated as unresolvable
const MAX_PARENT_DEPTH: usize = 32;

/// Read-only source of module descriptors
pub trait ProjectModel {
  /// Read the descriptor of the module living in `module_dir`
  fn read(&self, module_dir: &Path) -> CascadeResult<ModuleManifest>;
}

/// Reads `<module_dir>/<file_name>` from disk
pub struct ManifestReader {
  file_name: String,
}

impl ManifestReader {
  pub fn new(file_name: impl Into<String>) -> Self {
    Self {
      file_name: file_name.into(),
    }
  }
}

impl ProjectModel for ManifestReader {
  fn read(&self, module_dir: &Path) -> CascadeResult<ModuleManifest> {
    let path = module_dir.join(&self.file_name);
    if !path.is_file() {
      return Err(ConfigError::ManifestNotFound { path }.into());
    }
    let content = fs::read_to_string(&path)?;
    ModuleManifest::parse(&content, &path)
  }
}

/// One module descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleManifest {
  #[serde(default)]
  pub module: ModuleSection,
  #[serde(default)]
  pub parent: Option<ParentReference>,
  #[serde(default)]
  pub properties: BTreeMap<String, String>,
  #[serde(default)]
  pub dependencies: Vec<DependencyReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSection {
  #[serde(default)]
  pub group: Option<String>,
  /// Absent only for the root container
  #[serde(default)]
  pub artifact: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default = "default_packaging")]
  pub packaging: String,
  /// Whether the module can be released on its own
  #[serde(default)]
  pub releasable: Option<bool>,
  /// Nested module directories, relative to this module
  #[serde(default)]
  pub modules: Vec<String>,
}

fn default_packaging() -> String {
  "jar".to_string()
}

impl Default for ModuleSection {
  fn default() -> Self {
    Self {
      group: None,
      artifact: None,
      version: None,
      packaging: default_packaging(),
      releasable: None,
      modules: Vec::new(),
    }
  }
}

/// Build parent the module inherits from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentReference {
  pub group: String,
  pub artifact: String,
  pub version: String,
}

impl ParentReference {
  pub fn coordinate(&self) -> Coordinate {
    Coordinate::new(&self.group, &self.artifact)
  }
}

/// A declared dependency; `version` may be `${property}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReference {
  pub group: String,
  pub artifact: String,
  #[serde(default)]
  pub version: Option<String>,
}

impl DependencyReference {
  pub fn coordinate(&self) -> Coordinate {
    Coordinate::new(&self.group, &self.artifact)
  }

  pub fn version_expression(&self) -> Option<VersionExpression> {
    self.version.as_deref().map(VersionExpression::parse)
  }
}

/// Literal version or indirection through a named property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionExpression {
  Literal(String),
  Property(String),
}

impl VersionExpression {
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
      Some(name) if !name.is_empty() => VersionExpression::Property(name.to_string()),
      _ => VersionExpression::Literal(trimmed.to_string()),
    }
  }
}

/// Dependency with its version expression evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
  pub coordinate: Coordinate,
  /// `None` when the version is managed elsewhere
  pub version: Option<String>,
  /// Property the version was read from, if any
  pub property: Option<String>,
}

impl ResolvedDependency {
  pub fn is_snapshot(&self) -> bool {
    self.version.as_deref().is_some_and(is_snapshot)
  }

  /// `group:artifact:version` as shown in error listings
  pub fn describe(&self) -> String {
    match &self.version {
      Some(version) => format!("{}:{}", self.coordinate, version),
      None => self.coordinate.to_string(),
    }
  }
}

impl ModuleManifest {
  /// Parse a descriptor; `path` is only used for error messages
  pub fn parse(content: &str, path: &Path) -> CascadeResult<Self> {
    toml_edit::de::from_str(content).map_err(|e| {
      ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
      }
      .into()
    })
  }

  /// Coordinate of this module; the group may be inherited from the parent
  pub fn coordinate(&self, path: &Path) -> CascadeResult<Coordinate> {
    let artifact = self
      .module
      .artifact
      .as_deref()
      .filter(|a| !a.is_empty())
      .ok_or_else(|| ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        reason: "missing module.artifact".to_string(),
      })?;
    let group = self
      .module
      .group
      .as_deref()
      .or(self.parent.as_ref().map(|p| p.group.as_str()))
      .ok_or_else(|| ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        reason: format!("module '{}' has no group and no parent to inherit one from", artifact),
      })?;
    Ok(Coordinate::new(group, artifact))
  }

  /// Version of this module; may be inherited from the parent
  pub fn effective_version(&self) -> Option<&str> {
    self
      .module
      .version
      .as_deref()
      .or(self.parent.as_ref().map(|p| p.version.as_str()))
  }

  /// Look up a property here, in the built-ins, then up the parent chain.
  ///
  /// `parent_manifest` returns the descriptor of a known parent module, or
  /// `None` when the parent lives outside the module tree.
  pub fn resolve_property(
    &self,
    name: &str,
    parent_manifest: &dyn Fn(&ParentReference) -> CascadeResult<Option<ModuleManifest>>,
  ) -> CascadeResult<Option<String>> {
    if let Some(value) = self.properties.get(name) {
      return Ok(Some(value.clone()));
    }
    if let Some(value) = self.builtin_property(name) {
      return Ok(Some(value));
    }

    let mut next = self.parent.clone();
    for _ in 0..MAX_PARENT_DEPTH {
      let Some(parent) = next else {
        return Ok(None);
      };
      let Some(manifest) = parent_manifest(&parent)? else {
        return Ok(None);
      };
      if let Some(value) = manifest.properties.get(name) {
        return Ok(Some(value.clone()));
      }
      next = manifest.parent;
    }
    Ok(None)
  }

  fn builtin_property(&self, name: &str) -> Option<String> {
    match name {
      "project.version" | "version" => self.effective_version().map(str::to_string),
      "project.parent.version" | "parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
      _ => None,
    }
  }

  /// Evaluate every dependency's version expression
  pub fn resolved_dependencies(
    &self,
    owner: &Coordinate,
    parent_manifest: &dyn Fn(&ParentReference) -> CascadeResult<Option<ModuleManifest>>,
  ) -> CascadeResult<Vec<ResolvedDependency>> {
    let mut resolved = Vec::with_capacity(self.dependencies.len());
    for dependency in &self.dependencies {
      let (version, property) = match dependency.version_expression() {
        None => (None, None),
        Some(VersionExpression::Literal(v)) => (Some(v), None),
        Some(VersionExpression::Property(name)) => {
          let value = self.resolve_property(&name, parent_manifest)?.ok_or_else(|| {
            ConfigError::UnresolvedProperty {
              module: owner.to_string(),
              property: name.clone(),
            }
          })?;
          (Some(value), Some(name))
        }
      };
      resolved.push(ResolvedDependency {
        coordinate: dependency.coordinate(),
        version,
        property,
      });
    }
    Ok(resolved)
  }
}

/// In-memory project model keyed by module directory
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryModel {
  manifests: std::collections::HashMap<PathBuf, ModuleManifest>,
}

#[cfg(test)]
impl InMemoryModel {
  pub fn with(mut self, dir: impl Into<PathBuf>, toml: &str) -> Self {
    let dir = dir.into();
    let manifest = ModuleManifest::parse(toml, &dir).expect("test manifest should parse");
    self.manifests.insert(dir, manifest);
    self
  }
}

#[cfg(test)]
impl ProjectModel for InMemoryModel {
  fn read(&self, module_dir: &Path) -> CascadeResult<ModuleManifest> {
    self.manifests.get(module_dir).cloned().ok_or_else(|| {
      ConfigError::ManifestNotFound {
        path: module_dir.to_path_buf(),
      }
      .into()
    })
  }
}
