use crate::core::error::{CascadeError, CascadeResult, ConfigError, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for cascade
/// Searched in order: cascade.toml, .cascade.toml, .config/cascade.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadeConfig {
  #[serde(default)]
  pub workspace: WorkspaceConfig,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub vcs: VcsConfig,
  #[serde(default)]
  pub release: ReleaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
  /// Project base, relative to the directory holding the config file
  #[serde(default = "default_root")]
  pub root: PathBuf,

  /// Module descriptor file name inside every module directory
  #[serde(default = "default_manifest")]
  pub manifest: String,

  /// Where released modules are appended after each run
  #[serde(default)]
  pub ledger: Option<PathBuf>,
}

fn default_root() -> PathBuf {
  PathBuf::from(".")
}

fn default_manifest() -> String {
  "module.toml".to_string()
}

impl Default for WorkspaceConfig {
  fn default() -> Self {
    Self {
      root: default_root(),
      manifest: default_manifest(),
      ledger: Some(PathBuf::from("target/cascade/released-modules.txt")),
    }
  }
}

/// External build tool invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  #[serde(default = "default_build_program")]
  pub program: String,

  /// Release one module and publish its artifacts
  #[serde(default = "default_release_args")]
  pub release: Vec<String>,

  /// Move a module onto the latest released version of its parent
  #[serde(default = "default_update_parent_args")]
  pub update_parent: Vec<String>,

  /// Rewrite dependency versions; supports `{includes}` and `{properties}`
  #[serde(default = "default_update_dependencies_args")]
  pub update_dependencies: Vec<String>,
}

fn default_build_program() -> String {
  "mvn".to_string()
}

fn default_release_args() -> Vec<String> {
  strings(&[
    "clean",
    "install",
    "release:prepare",
    "release:perform",
    "--batch-mode",
    "-DautoVersionSubmodules=true",
  ])
}

fn default_update_parent_args() -> Vec<String> {
  strings(&["versions:update-parent", "versions:commit"])
}

fn default_update_dependencies_args() -> Vec<String> {
  strings(&[
    "versions:update-properties",
    "versions:use-latest-releases",
    "versions:commit",
    "-Dincludes={includes}",
    "-DincludeProperties={properties}",
  ])
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      program: default_build_program(),
      release: default_release_args(),
      update_parent: default_update_parent_args(),
      update_dependencies: default_update_dependencies_args(),
    }
  }
}

/// Version control invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
  #[serde(default = "default_vcs_program")]
  pub program: String,

  /// Commit every local change; supports `{message}`
  #[serde(default = "default_commit_args")]
  pub commit: Vec<String>,

  /// Bring the working copy up to date (empty disables)
  #[serde(default = "default_update_args")]
  pub update: Vec<String>,

  /// List local changes, one per line; empty output means clean
  #[serde(default = "default_status_args")]
  pub status: Vec<String>,
}

fn default_vcs_program() -> String {
  "git".to_string()
}

fn default_commit_args() -> Vec<String> {
  strings(&["commit", "--all", "--message={message}"])
}

fn default_update_args() -> Vec<String> {
  strings(&["pull", "--ff-only"])
}

fn default_status_args() -> Vec<String> {
  strings(&["status", "--porcelain"])
}

impl Default for VcsConfig {
  fn default() -> Self {
    Self {
      program: default_vcs_program(),
      commit: default_commit_args(),
      update: default_update_args(),
      status: default_status_args(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  /// Accept every confirmation prompt with its default
  #[serde(default)]
  pub batch: bool,

  /// Forward external tool output to the log while it runs
  #[serde(default = "default_true")]
  pub echo_output: bool,

  /// Update the working copy and require it clean before releasing
  #[serde(default = "default_true")]
  pub check_workspace: bool,
}

fn default_true() -> bool {
  true
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      batch: false,
      echo_output: true,
      check_workspace: true,
    }
  }
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// Program plus argument list with `{placeholder}` substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
  pub program: String,
  pub args: Vec<String>,
}

impl CommandTemplate {
  pub fn new(program: &str, args: &[String]) -> Self {
    Self {
      program: program.to_string(),
      args: args.to_vec(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.args.is_empty()
  }

  /// Replace every `{key}` in every argument
  pub fn render(&self, values: &[(&str, &str)]) -> crate::core::invoker::CommandLine {
    let args = self
      .args
      .iter()
      .map(|arg| {
        values
          .iter()
          .fold(arg.clone(), |acc, (key, value)| acc.replace(&format!("{{{}}}", key), value))
      })
      .collect();
    crate::core::invoker::CommandLine::new(&self.program, args)
  }
}

/// Every external command a cascade runs
#[derive(Debug, Clone)]
pub struct CommandSet {
  pub release: CommandTemplate,
  pub update_parent: CommandTemplate,
  pub update_dependencies: CommandTemplate,
  pub commit: CommandTemplate,
  pub vcs_update: CommandTemplate,
  pub vcs_status: CommandTemplate,
}

impl CascadeConfig {
  /// Find config file in search order: cascade.toml, .cascade.toml, .config/cascade.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("cascade.toml"),
      path.join(".cascade.toml"),
      path.join(".config").join("cascade.toml"),
    ];
    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from an explicit file
  pub fn load(config_path: &Path) -> CascadeResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: CascadeConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Load the config found under `path`, or the defaults when none exists
  pub fn load_or_default(path: &Path) -> CascadeResult<Self> {
    match Self::find_config_path(path) {
      Some(config_path) => Self::load(&config_path),
      None => Ok(Self::default()),
    }
  }

  /// Save config to cascade.toml (default location)
  pub fn save(&self, path: &Path) -> CascadeResult<()> {
    let config_path = path.join("cascade.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  pub fn validate(&self) -> CascadeResult<()> {
    if self.build.program.trim().is_empty() {
      return Err(CascadeError::Config(ConfigError::MissingField {
        field: "build.program".to_string(),
      }));
    }
    if self.vcs.program.trim().is_empty() {
      return Err(CascadeError::Config(ConfigError::MissingField {
        field: "vcs.program".to_string(),
      }));
    }
    if self.build.release.is_empty() {
      return Err(CascadeError::with_help(
        "build.release must contain at least one argument",
        "Restore the default with `cascade init --force` or list the release goals explicitly",
      ));
    }
    if self.vcs.commit.is_empty() {
      return Err(CascadeError::Config(ConfigError::MissingField {
        field: "vcs.commit".to_string(),
      }));
    }
    if self.workspace.manifest.trim().is_empty() {
      return Err(CascadeError::Config(ConfigError::MissingField {
        field: "workspace.manifest".to_string(),
      }));
    }
    Ok(())
  }

  /// Resolved command templates
  pub fn commands(&self) -> CommandSet {
    CommandSet {
      release: CommandTemplate::new(&self.build.program, &self.build.release),
      update_parent: CommandTemplate::new(&self.build.program, &self.build.update_parent),
      update_dependencies: CommandTemplate::new(&self.build.program, &self.build.update_dependencies),
      commit: CommandTemplate::new(&self.vcs.program, &self.vcs.commit),
      vcs_update: CommandTemplate::new(&self.vcs.program, &self.vcs.update),
      vcs_status: CommandTemplate::new(&self.vcs.program, &self.vcs.status),
    }
  }

  /// Programs that must be resolvable before a release starts
  pub fn required_programs(&self) -> Vec<(&str, &'static str)> {
    vec![(self.build.program.as_str(), "build"), (self.vcs.program.as_str(), "vcs")]
  }
}
