//! Tests for the `init` and `doctor` commands

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;

  run_cascade(temp.path(), &["init"])?;

  let config = std::fs::read_to_string(temp.path().join("cascade.toml"))?;
  assert!(config.contains("[build]"));
  assert!(config.contains("release:perform"));
  assert!(config.contains("[vcs]"));
  Ok(())
}

#[test]
fn test_init_keeps_existing_config_without_force() -> Result<()> {
  let project = TestProject::standard()?;

  let output = run_cascade_unchecked(&project.path, &["init"], &[])?;
  assert!(!output.status.success());
  assert!(project.read_file("cascade.toml")?.contains("./bin/mvn"));

  run_cascade(&project.path, &["init", "--force"])?;
  assert!(!project.read_file("cascade.toml")?.contains("./bin/mvn"));
  Ok(())
}

#[test]
fn test_doctor_passes_on_healthy_project() -> Result<()> {
  let project = TestProject::standard()?;

  let output = run_cascade(&project.path, &["doctor", "--json"])?;
  let results: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let results = results.as_array().expect("doctor prints an array");
  assert_eq!(results.len(), 5);
  assert!(results.iter().all(|r| r["passed"] == true));
  Ok(())
}

#[test]
fn test_doctor_reports_missing_program() -> Result<()> {
  let project = TestProject::standard()?;
  std::fs::remove_file(project.path.join("bin/mvn"))?;

  let output = run_cascade_unchecked(&project.path, &["doctor"], &[])?;
  assert!(!output.status.success());
  assert!(stdout(&output).contains("./bin/mvn"));
  Ok(())
}
