//! `cascade init`: write a default cascade.toml

use crate::core::config::CascadeConfig;
use crate::core::error::{CascadeError, CascadeResult};
use std::path::Path;

/// Run the init command
pub fn run_init(dir: &Path, force: bool) -> CascadeResult<()> {
  if let Some(existing) = CascadeConfig::find_config_path(dir)
    && !force
  {
    return Err(CascadeError::with_help(
      format!("Configuration already exists at {}", existing.display()),
      "Pass --force to overwrite it with the defaults",
    ));
  }

  let config = CascadeConfig::default();
  config.save(dir)?;

  println!("✅ Wrote {}", dir.join("cascade.toml").display());
  println!();
  println!("Next steps:");
  println!(
    "  1. Add a {} to the project root listing the top-level modules",
    config.workspace.manifest
  );
  println!("  2. Check the build and VCS commands in cascade.toml");
  println!("  3. Run `cascade doctor`");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    run_init(dir.path(), false).unwrap();
    assert!(CascadeConfig::find_config_path(dir.path()).is_some());
    assert!(run_init(dir.path(), false).is_err());
    assert!(run_init(dir.path(), true).is_ok());
  }
}
