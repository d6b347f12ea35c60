//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Stub build tool: logs its arguments and, for a release, prints the upload
/// line a real deploy would, with the module's version minus `-SNAPSHOT`.
/// Exits 1 in the directory named by `CASCADE_FAIL_IN`.
const MVN_STUB: &str = r#"#!/bin/sh
module=$(basename "$PWD")
echo "$module: mvn $*" >> "__LOG__"
if [ -n "$CASCADE_FAIL_IN" ] && [ "$module" = "$CASCADE_FAIL_IN" ]; then
  echo "[ERROR] BUILD FAILURE"
  exit 1
fi
case "$*" in
  *release:perform*)
    artifact=$(sed -n 's/^artifact = "\(.*\)"$/\1/p' module.toml | head -n 1)
    version=$(sed -n 's/^version = "\(.*\)-SNAPSHOT"$/\1/p' module.toml | head -n 1)
    echo "[INFO] Uploading to central: https://repo.example/com/acme/$artifact/$version/$artifact-$version.pom"
    ;;
esac
exit 0
"#;

/// Stub VCS: logs its arguments; `status` prints the `.dirty` marker file
const GIT_STUB: &str = r#"#!/bin/sh
module=$(basename "$PWD")
echo "$module: git $*" >> "__LOG__"
if [ "$1" = "status" ] && [ -f "__ROOT__/.dirty" ]; then
  cat "__ROOT__/.dirty"
fi
exit 0
"#;

/// A module tree on disk with stub build and VCS programs
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  /// Empty project with the stubs and a batch-mode cascade.toml
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().canonicalize()?;
    let project = Self { _root: root, path };

    let log = project.path.join("commands.log");
    let root_dir = project.path.to_string_lossy().to_string();
    project.write_script("bin/mvn", &MVN_STUB.replace("__LOG__", &log.to_string_lossy()))?;
    project.write_script(
      "bin/git",
      &GIT_STUB
        .replace("__LOG__", &log.to_string_lossy())
        .replace("__ROOT__", &root_dir),
    )?;

    project.write(
      "cascade.toml",
      r#"[workspace]
ledger = "released-modules.txt"

[build]
program = "./bin/mvn"

[vcs]
program = "./bin/git"

[release]
batch = true
echo_output = false
"#,
    )?;
    Ok(project)
  }

  /// Parent (pom), Lib (child of Parent) and App (depends on Lib)
  pub fn standard() -> Result<Self> {
    let project = Self::new()?;
    project.write("module.toml", "[module]\nmodules = [\"parent\", \"lib\", \"app\"]\n")?;
    project.write(
      "parent/module.toml",
      r#"[module]
group = "com.acme"
artifact = "parent"
version = "1.0-SNAPSHOT"
packaging = "pom"
"#,
    )?;
    project.write(
      "lib/module.toml",
      r#"[module]
group = "com.acme"
artifact = "lib"
version = "1.0-SNAPSHOT"

[parent]
group = "com.acme"
artifact = "parent"
version = "1.0-SNAPSHOT"
"#,
    )?;
    project.write(
      "app/module.toml",
      r#"[module]
group = "com.acme"
artifact = "app"
version = "2.3-SNAPSHOT"

[properties]
"lib.version" = "1.0-SNAPSHOT"

[[dependencies]]
group = "com.acme"
artifact = "lib"
version = "${lib.version}"
"#,
    )?;
    Ok(project)
  }

  pub fn write(&self, relative: &str, content: &str) -> Result<()> {
    let path = self.path.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
  }

  fn write_script(&self, relative: &str, content: &str) -> Result<()> {
    self.write(relative, content)?;
    let path = self.path.join(relative);
    let mut permissions = std::fs::metadata(&path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions)?;
    Ok(())
  }

  pub fn file_exists(&self, relative: &str) -> bool {
    self.path.join(relative).exists()
  }

  pub fn read_file(&self, relative: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(relative))?)
  }

  /// Every stub invocation so far, as `<dir name>: <program> <args>`
  pub fn command_log(&self) -> Result<Vec<String>> {
    if !self.file_exists("commands.log") {
      return Ok(Vec::new());
    }
    Ok(self.read_file("commands.log")?.lines().map(String::from).collect())
  }

  /// Position of the first log line starting with `prefix`
  pub fn log_position(&self, prefix: &str) -> Result<usize> {
    self
      .command_log()?
      .iter()
      .position(|line| line.starts_with(prefix))
      .with_context(|| format!("No command starting with `{}` was run", prefix))
  }
}

/// Run the cascade binary, failing on a non-zero exit
pub fn run_cascade(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cascade_unchecked(cwd, args, &[])?;
  if !output.status.success() {
    anyhow::bail!(
      "cascade command failed: cascade {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}

/// Run the cascade binary with extra environment, whatever the exit status
pub fn run_cascade_unchecked(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let cascade_bin = env!("CARGO_BIN_EXE_cascade");
  Command::new(cascade_bin)
    .current_dir(cwd)
    .args(args)
    .envs(env.iter().copied())
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run cascade")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
