//! Project context - build once, pass everywhere
//!
//! Loads `cascade.toml` (or the defaults), resolves the project base and
//! builds the module graph once in `main.rs`; commands receive it by
//! reference (`&mut` for `release`, which records released versions).

use crate::core::config::CascadeConfig;
use crate::core::error::{CascadeResult, ResultExt};
use crate::graph::ModuleGraph;
use crate::project::ManifestReader;
use std::path::{Path, PathBuf};

pub struct ReleaseContext {
  /// Project base directory (absolute path)
  pub root: PathBuf,

  /// Directory the command was started from; holds `cascade.toml`
  pub config_dir: PathBuf,

  pub config: CascadeConfig,

  /// Reads module descriptors from disk
  pub model: ManifestReader,

  pub graph: ModuleGraph,
}

impl ReleaseContext {
  /// Load config and build the module graph below `start_dir`
  pub fn build(start_dir: &Path) -> CascadeResult<Self> {
    let config_dir = start_dir.to_path_buf();
    let config = CascadeConfig::load_or_default(&config_dir)?;
    let root = project_root(&config_dir, &config);
    let model = ManifestReader::new(&config.workspace.manifest);
    let graph = ModuleGraph::load(&root, &model)
      .with_context(|| format!("Failed to load the module tree under {}", root.display()))?;

    Ok(Self {
      root,
      config_dir,
      config,
      model,
      graph,
    })
  }

  /// Ledger file from config, relative to the project base
  pub fn ledger_path(&self) -> Option<PathBuf> {
    self.config.workspace.ledger.as_ref().map(|p| self.root.join(p))
  }
}

/// Project base for a config found in `config_dir`
pub fn project_root(config_dir: &Path, config: &CascadeConfig) -> PathBuf {
  let root = config_dir.join(&config.workspace.root);
  root.canonicalize().unwrap_or(root)
}
