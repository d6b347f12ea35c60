//! Tests for the `modules` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_modules_lists_tree_with_release_units() -> Result<()> {
  let project = TestProject::standard()?;
  project.write("module.toml", "[module]\nmodules = [\"parent\", \"lib\", \"app\", \"platform\"]\n")?;
  project.write(
    "platform/module.toml",
    r#"[module]
group = "com.acme"
artifact = "platform"
version = "3.0-SNAPSHOT"
packaging = "pom"
modules = ["core"]
"#,
  )?;
  project.write(
    "platform/core/module.toml",
    r#"[module]
group = "com.acme"
artifact = "platform-core"
version = "3.0-SNAPSHOT"
"#,
  )?;

  let output = run_cascade(&project.path, &["modules"])?;
  let text = stdout(&output);
  assert!(text.contains("com.acme:app"));
  assert!(text.contains("com.acme:platform-core  (platform/core) → released with com.acme:platform"));

  let output = run_cascade(&project.path, &["modules", "--json"])?;
  let modules: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let core = modules
    .as_array()
    .expect("modules prints an array")
    .iter()
    .find(|m| m["coordinate"] == "com.acme:platform-core")
    .expect("platform-core is listed");
  assert_eq!(core["releasable_parent"], "com.acme:platform");
  Ok(())
}

#[test]
fn test_modules_fails_on_missing_descriptor() -> Result<()> {
  let project = TestProject::standard()?;
  project.write("module.toml", "[module]\nmodules = [\"parent\", \"missing\"]\n")?;

  let output = run_cascade_unchecked(&project.path, &["modules"], &[])?;
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("missing"));
  Ok(())
}
