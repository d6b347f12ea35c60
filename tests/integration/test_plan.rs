//! Tests for the `plan` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_plan_predicts_order_without_running_anything() -> Result<()> {
  let project = TestProject::standard()?;

  let output = run_cascade(&project.path, &["plan", "app", "--json"])?;
  let plan: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  let releases: Vec<(&str, &str)> = plan["releases"]
    .as_array()
    .expect("releases array")
    .iter()
    .map(|r| {
      (
        r["module"].as_str().unwrap_or_default(),
        r["predicted_version"].as_str().unwrap_or_default(),
      )
    })
    .collect();
  assert_eq!(
    releases,
    vec![("com.acme:parent", "1.0"), ("com.acme:lib", "1.0"), ("com.acme:app", "2.3")]
  );
  assert!(project.command_log()?.is_empty());
  Ok(())
}

#[test]
fn test_plan_reports_release_cycle() -> Result<()> {
  let project = TestProject::standard()?;
  project.write(
    "lib/module.toml",
    r#"[module]
group = "com.acme"
artifact = "lib"
version = "1.0-SNAPSHOT"

[[dependencies]]
group = "com.acme"
artifact = "app"
version = "2.3-SNAPSHOT"
"#,
  )?;

  let output = run_cascade_unchecked(&project.path, &["plan", "app"], &[])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("com.acme:app"));
  assert!(stderr.contains("com.acme:lib"));
  Ok(())
}
