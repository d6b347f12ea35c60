//! Tests for the `release` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_release_cascades_through_parent_and_dependencies() -> Result<()> {
  let project = TestProject::standard()?;

  let output = run_cascade(&project.path, &["release", "com.acme:app"])?;
  assert!(stdout(&output).contains("Cascade complete: 3 module(s) released"));

  let parent = project.log_position("parent: mvn clean install")?;
  let update_parent = project.log_position("lib: mvn versions:update-parent")?;
  let lib = project.log_position("lib: mvn clean install")?;
  let propagate = project.log_position("app: mvn versions:update-properties")?;
  let app = project.log_position("app: mvn clean install")?;
  assert!(parent < update_parent);
  assert!(update_parent < lib);
  assert!(lib < propagate);
  assert!(propagate < app);

  let log = project.command_log()?;
  let propagate_line = &log[propagate];
  assert!(propagate_line.contains("-Dincludes=com.acme:lib"));
  assert!(propagate_line.contains("-DincludeProperties=lib.version"));
  assert!(
    log
      .iter()
      .any(|l| l.starts_with("app: git commit") && l.contains("Update com.acme:lib to 1.0"))
  );

  let ledger = project.read_file("released-modules.txt")?;
  assert!(ledger.contains("com.acme:parent [1.0-SNAPSHOT] -> [1.0]"));
  assert!(ledger.contains("com.acme:lib [1.0-SNAPSHOT] -> [1.0]"));
  assert!(ledger.contains("com.acme:app [2.3-SNAPSHOT] -> [2.3]"));

  Ok(())
}

#[test]
fn test_release_runs_each_module_once() -> Result<()> {
  let project = TestProject::standard()?;
  // Second module depending on lib; lib must still be released only once
  project.write("module.toml", "[module]\nmodules = [\"parent\", \"lib\", \"app\", \"web\"]\n")?;
  project.write(
    "web/module.toml",
    r#"[module]
group = "com.acme"
artifact = "web"
version = "0.9-SNAPSHOT"

[[dependencies]]
group = "com.acme"
artifact = "lib"
version = "1.0-SNAPSHOT"

[[dependencies]]
group = "com.acme"
artifact = "app"
version = "2.3-SNAPSHOT"
"#,
  )?;

  run_cascade(&project.path, &["release", "web"])?;

  let releases: Vec<String> = project
    .command_log()?
    .into_iter()
    .filter(|l| l.contains("release:perform"))
    .collect();
  assert_eq!(releases.iter().filter(|l| l.starts_with("lib:")).count(), 1);
  assert_eq!(releases.iter().filter(|l| l.starts_with("parent:")).count(), 1);
  assert_eq!(releases.len(), 4);

  Ok(())
}

#[test]
fn test_failed_release_keeps_ledger_and_resume_skips_released() -> Result<()> {
  let project = TestProject::standard()?;

  let output = run_cascade_unchecked(&project.path, &["release", "app"], &[("CASCADE_FAIL_IN", "app")])?;
  assert!(!output.status.success());
  assert!(stdout(&output).contains("released before the failure"));

  let ledger = project.read_file("released-modules.txt")?;
  assert!(ledger.contains("com.acme:lib [1.0-SNAPSHOT] -> [1.0]"));
  assert!(!ledger.contains("com.acme:app"));

  let before = project.command_log()?.len();
  let output = run_cascade(&project.path, &["release", "app", "--resume"])?;
  assert!(stdout(&output).contains("Resuming: 2 module(s) already released"));

  let rerun: Vec<String> = project.command_log()?.into_iter().skip(before).collect();
  assert!(!rerun.iter().any(|l| l.starts_with("lib: mvn clean install")));
  assert!(!rerun.iter().any(|l| l.starts_with("parent: mvn clean install")));
  assert!(rerun.iter().any(|l| l.starts_with("app: mvn clean install")));

  Ok(())
}

#[test]
fn test_release_refuses_dirty_working_copy() -> Result<()> {
  let project = TestProject::standard()?;
  project.write(".dirty", " M app/module.toml\n")?;

  let output = run_cascade_unchecked(&project.path, &["release", "app"], &[])?;
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("app/module.toml"));
  assert!(!project.command_log()?.iter().any(|l| l.contains("mvn")));

  // The check can be skipped explicitly
  run_cascade(&project.path, &["release", "app", "--skip-workspace-check"])?;
  Ok(())
}

#[test]
fn test_release_stops_on_unknown_snapshot_before_running_anything() -> Result<()> {
  let project = TestProject::standard()?;
  // lib keeps its snapshot parent, so a late check would release parent first
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

[[dependencies]]
group = "org.other"
artifact = "outside"
version = "0.1-SNAPSHOT"
"#,
  )?;

  for target in ["lib", "app"] {
    let output = run_cascade_unchecked(&project.path, &["release", target], &[])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("org.other:outside:0.1-SNAPSHOT"));
  }
  assert!(project.command_log()?.is_empty());
  assert!(!project.file_exists("released-modules.txt"));

  Ok(())
}

#[test]
fn test_dependencies_only_leaves_target_unreleased() -> Result<()> {
  let project = TestProject::standard()?;

  run_cascade(&project.path, &["release", "app", "--dependencies-only"])?;

  let log = project.command_log()?;
  assert!(log.iter().any(|l| l.starts_with("lib: mvn clean install")));
  assert!(!log.iter().any(|l| l.starts_with("app: mvn clean install")));

  Ok(())
}
