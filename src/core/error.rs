//! Error types for cascade with contextual messages and exit codes
//!
//! Every failure aborts the run. The variants mirror the ways a cascading
//! release can stop: a broken module tree, an unmanaged snapshot, a user
//! declining a prompt, an external tool failing, or a tool succeeding without
//! telling us which version it produced.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, module tree, unmanaged snapshots)
  User = 1,
  /// System error (external commands, I/O)
  System = 2,
  /// Preflight validation failure (dirty working copy, missing tools)
  Validation = 3,
  /// Aborted at a confirmation prompt
  Aborted = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cascade
#[derive(Debug)]
pub enum CascadeError {
  /// Configuration or module tree errors
  Config(ConfigError),

  /// Snapshot dependencies that do not map to a known module
  UnreleasableDependencies { target: String, dependencies: Vec<String> },

  /// User declined a confirmation prompt
  Aborted { module: String },

  /// External build or VCS command failures
  Command(CommandError),

  /// Release command succeeded but its output named no released version
  VersionExtraction { module: String, artifact: String },

  /// Preflight validation errors
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl CascadeError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    CascadeError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    CascadeError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      CascadeError::Message { message, context, help } => CascadeError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      CascadeError::Io(err) => CascadeError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      CascadeError::Config(_) => ExitCode::User,
      CascadeError::UnreleasableDependencies { .. } => ExitCode::User,
      CascadeError::Aborted { .. } => ExitCode::Aborted,
      CascadeError::Command(_) => ExitCode::System,
      CascadeError::VersionExtraction { .. } => ExitCode::System,
      CascadeError::Validation(_) => ExitCode::Validation,
      CascadeError::Io(_) => ExitCode::System,
      CascadeError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      CascadeError::Config(e) => e.help_message(),
      CascadeError::UnreleasableDependencies { .. } => Some(
        "Release these artifacts manually (or add them to the module tree) and run the release again.".to_string(),
      ),
      CascadeError::Aborted { .. } => {
        Some("Releases completed before the prompt are kept in the ledger; re-run with --resume.".to_string())
      }
      CascadeError::Command(e) => e.help_message(),
      CascadeError::VersionExtraction { .. } => Some(
        "The release may have been published. Check the repository and tags before re-running with --resume."
          .to_string(),
      ),
      CascadeError::Validation(e) => e.help_message(),
      CascadeError::Message { help, .. } => help.clone(),
      CascadeError::Io(_) => None,
    }
  }
}

impl fmt::Display for CascadeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CascadeError::Config(e) => write!(f, "{}", e),
      CascadeError::UnreleasableDependencies { target, dependencies } => write!(
        f,
        "Cannot release {} because of external SNAPSHOT dependencies: [{}]",
        target,
        dependencies.join(", ")
      ),
      CascadeError::Aborted { module } => write!(f, "Release of {} aborted by user", module),
      CascadeError::Command(e) => write!(f, "{}", e),
      CascadeError::VersionExtraction { module, artifact } => write!(
        f,
        "Could not extract the released version of {} from the release output (no upload record for '{}')",
        module, artifact
      ),
      CascadeError::Validation(e) => write!(f, "{}", e),
      CascadeError::Io(e) => write!(f, "I/O error: {}", e),
      CascadeError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for CascadeError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CascadeError::Io(e) => Some(e),
      CascadeError::Command(CommandError::Launch { source, .. }) => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for CascadeError {
  fn from(err: io::Error) -> Self {
    CascadeError::Io(err)
  }
}

impl From<String> for CascadeError {
  fn from(msg: String) -> Self {
    CascadeError::message(msg)
  }
}

impl From<&str> for CascadeError {
  fn from(msg: &str) -> Self {
    CascadeError::message(msg)
  }
}

impl From<ConfigError> for CascadeError {
  fn from(err: ConfigError) -> Self {
    CascadeError::Config(err)
  }
}

impl From<CommandError> for CascadeError {
  fn from(err: CommandError) -> Self {
    CascadeError::Command(err)
  }
}

impl From<ValidationError> for CascadeError {
  fn from(err: ValidationError) -> Self {
    CascadeError::Validation(err)
  }
}

impl From<toml_edit::TomlError> for CascadeError {
  fn from(err: toml_edit::TomlError) -> Self {
    CascadeError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for CascadeError {
  fn from(err: toml_edit::de::Error) -> Self {
    CascadeError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for CascadeError {
  fn from(err: toml_edit::ser::Error) -> Self {
    CascadeError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for CascadeError {
  fn from(err: serde_json::Error) -> Self {
    CascadeError::message(format!("JSON error: {}", err))
  }
}

impl From<regex::Error> for CascadeError {
  fn from(err: regex::Error) -> Self {
    CascadeError::message(format!("Pattern error: {}", err))
  }
}

/// Configuration and module tree errors
#[derive(Debug)]
pub enum ConfigError {
  /// A module descriptor file is missing
  ManifestNotFound { path: PathBuf },

  /// A module descriptor could not be parsed or is incomplete
  InvalidManifest { path: PathBuf, reason: String },

  /// Missing or empty required field
  MissingField { field: String },

  /// Two modules share the same coordinate
  DuplicateModule { coordinate: String },

  /// A module's snapshot parent is not part of the module tree
  UnresolvedParent { module: String, parent: String },

  /// A `${property}` version could not be resolved
  UnresolvedProperty { module: String, property: String },

  /// Release target not found in the module tree
  ModuleNotFound { name: String },

  /// Release target matches more than one module
  AmbiguousModule { name: String, candidates: Vec<String> },

  /// Snapshot dependencies form a cycle between release units
  ReleaseCycle { cycles: Vec<Vec<String>> },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::ManifestNotFound { .. } => {
        Some("Every directory listed under `modules` needs its own module descriptor.".to_string())
      }
      ConfigError::UnresolvedParent { parent, .. } => Some(format!(
        "Add '{}' to the module tree or point the parent at a released version.",
        parent
      )),
      ConfigError::ModuleNotFound { .. } => Some("List the known modules with `cascade modules`.".to_string()),
      ConfigError::AmbiguousModule { candidates, .. } => {
        Some(format!("Use the full coordinate, one of: {}", candidates.join(", ")))
      }
      ConfigError::ReleaseCycle { .. } => {
        Some("Break the cycle by releasing one of the modules manually first.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::ManifestNotFound { path } => write!(f, "Module descriptor not found: {}", path.display()),
      ConfigError::InvalidManifest { path, reason } => {
        write!(f, "Invalid module descriptor {}: {}", path.display(), reason)
      }
      ConfigError::MissingField { field } => write!(f, "Missing required field: {}", field),
      ConfigError::DuplicateModule { coordinate } => {
        write!(f, "Module {} is declared more than once in the module tree", coordinate)
      }
      ConfigError::UnresolvedParent { module, parent } => {
        write!(f, "Snapshot parent {} of module {} is not a known module", parent, module)
      }
      ConfigError::UnresolvedProperty { module, property } => {
        write!(f, "Property '{}' used by module {} is not defined", property, module)
      }
      ConfigError::ModuleNotFound { name } => write!(f, "Module '{}' not found in the module tree", name),
      ConfigError::AmbiguousModule { name, .. } => write!(f, "Module name '{}' is ambiguous", name),
      ConfigError::ReleaseCycle { cycles } => {
        let rendered: Vec<String> = cycles.iter().map(|c| c.join(" -> ")).collect();
        write!(f, "Snapshot dependency cycle(s) detected: {}", rendered.join("; "))
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum CommandError {
  /// The process could not be started
  Launch {
    command: String,
    work_dir: PathBuf,
    source: io::Error,
  },

  /// The process exited with a non-zero code
  Failed {
    command: String,
    work_dir: PathBuf,
    exit_code: Option<i32>,
  },
}

impl CommandError {
  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Launch { .. } => Some("Run `cascade doctor` to check the configured programs.".to_string()),
      CommandError::Failed { .. } => Some(
        "External commands are never retried. Resolve partial tags or deployments manually, then re-run with --resume."
          .to_string(),
      ),
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Launch {
        command,
        work_dir,
        source,
      } => write!(
        f,
        "Failed to start `{}` in {}: {}",
        command,
        work_dir.display(),
        source
      ),
      CommandError::Failed {
        command,
        work_dir,
        exit_code,
      } => match exit_code {
        Some(code) => write!(f, "`{}` failed in {} (exit code {})", command, work_dir.display(), code),
        None => write!(f, "`{}` in {} was terminated by a signal", command, work_dir.display()),
      },
    }
  }
}

/// Preflight validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Configured program cannot be found
  ProgramNotFound { program: String, role: String },

  /// Working copy has local modifications
  DirtyWorkingCopy { changes: Vec<String> },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::ProgramNotFound { role, .. } => Some(format!(
        "Install the {} tool or set its `program` in cascade.toml to an absolute path.",
        role
      )),
      ValidationError::DirtyWorkingCopy { .. } => {
        Some("Commit or revert local changes, or pass --skip-workspace-check.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::ProgramNotFound { program, role } => {
        write!(f, "{} program '{}' not found on PATH", role, program)
      }
      ValidationError::DirtyWorkingCopy { changes } => {
        write!(f, "Working copy has local modifications:\n  {}", changes.join("\n  "))
      }
    }
  }
}

/// Result type alias for cascade
pub type CascadeResult<T> = Result<T, CascadeError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> CascadeResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> CascadeResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<CascadeError>,
{
  fn context(self, ctx: impl Into<String>) -> CascadeResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> CascadeResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &CascadeError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for CascadeError {
  fn from(err: anyhow::Error) -> Self {
    CascadeError::message(err.to_string())
  }
}
