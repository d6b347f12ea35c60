//! Utility functions for cross-platform program lookup

use std::env;
use std::path::{Path, PathBuf};

/// Check if a program name is a filesystem path rather than a bare command
///
/// Returns true for:
/// - Absolute paths on Unix: /opt/maven/bin/mvn
/// - Absolute paths on Windows: C:\tools\mvn.cmd
/// - Relative paths: ./mvnw or tools/mvnw
///
/// Returns false for bare names looked up on `PATH`: mvn, git
pub fn is_path_like(program: &str) -> bool {
  program.contains('/') || program.contains('\\') || Path::new(program).is_absolute()
}

/// Resolve a configured program against the project base directory
///
/// Bare names are returned unchanged so the OS searches `PATH`; relative
/// paths are anchored at `base_dir` instead of the child's working directory.
pub fn resolve_program(program: &str, base_dir: &Path) -> PathBuf {
  let path = Path::new(program);
  if is_path_like(program) && path.is_relative() {
    base_dir.join(path)
  } else {
    path.to_path_buf()
  }
}

/// Locate the executable a configured program refers to
pub fn find_executable(program: &str, base_dir: &Path) -> Option<PathBuf> {
  if program.trim().is_empty() {
    return None;
  }

  if is_path_like(program) {
    let resolved = resolve_program(program, base_dir);
    return with_extensions(&resolved).into_iter().find(|p| p.is_file());
  }

  let path_var = env::var_os("PATH")?;
  env::split_paths(&path_var)
    .flat_map(|dir| with_extensions(&dir.join(program)))
    .find(|candidate| candidate.is_file())
}

/// Candidate file names for a program (Windows adds the usual script suffixes)
fn with_extensions(path: &Path) -> Vec<PathBuf> {
  let mut candidates = vec![path.to_path_buf()];
  if cfg!(windows) && path.extension().is_none() {
    for ext in ["exe", "cmd", "bat"] {
      candidates.push(path.with_extension(ext));
    }
  }
  candidates
}
