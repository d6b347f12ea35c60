//! Working copy validation
//!
//! Before a cascade the working copy is brought up to date with the
//! configured VCS update command and must then report no local changes.

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::config::CommandSet;
use crate::core::error::{CascadeResult, ValidationError};
use crate::core::invoker::{InvokerFactory, SystemInvokerFactory};
use std::path::Path;
use tracing::info;

/// Local changes reported by the status command, minus `ignored` paths
pub fn local_changes(
  commands: &CommandSet,
  invokers: &dyn InvokerFactory,
  root: &Path,
  ignored: &[String],
) -> CascadeResult<Vec<String>> {
  let mut invoker = invokers.invoker(root);
  invoker.execute_checked(&commands.vcs_status.render(&[]))?;
  Ok(
    invoker
      .output()
      .iter()
      .map(|line| line.trim())
      .filter(|line| !line.is_empty())
      .filter(|line| !ignored.iter().any(|path| line.ends_with(path.as_str())))
      .map(str::to_string)
      .collect(),
  )
}

/// Update the working copy, then fail if it has local changes
pub fn ensure_clean_working_copy(
  commands: &CommandSet,
  invokers: &dyn InvokerFactory,
  root: &Path,
  ignored: &[String],
) -> CascadeResult<()> {
  if !commands.vcs_update.is_empty() {
    info!(dir = %root.display(), "Updating working copy");
    invokers.invoker(root).execute_checked(&commands.vcs_update.render(&[]))?;
  }

  let changes = local_changes(commands, invokers, root, ignored)?;
  if changes.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::DirtyWorkingCopy { changes }.into())
  }
}

/// Read-only variant for `cascade doctor`: status only, no update
pub struct WorkingCopyCheck;

impl Check for WorkingCopyCheck {
  fn name(&self) -> &'static str {
    "working-copy"
  }

  fn description(&self) -> &'static str {
    "Working copy has no local modifications"
  }

  fn run(&self, ctx: &CheckContext) -> CascadeResult<CheckResult> {
    if ctx.config.vcs.status.is_empty() {
      return Ok(CheckResult::pass(self.name(), "Skipped: no status command configured"));
    }

    let invokers = SystemInvokerFactory::new(&ctx.root, false);
    match local_changes(&ctx.config.commands(), &invokers, &ctx.root, &[]) {
      Ok(changes) if changes.is_empty() => Ok(CheckResult::pass(self.name(), "Working copy is clean")),
      Ok(changes) => Ok(
        CheckResult::warning(
          self.name(),
          format!("{} local change(s)", changes.len()),
          Some("Commit or revert local changes before releasing"),
        )
        .with_details(serde_json::json!({ "changes": changes })),
      ),
      Err(e) => Ok(CheckResult::warning(
        self.name(),
        format!("Could not read working copy status: {}", e),
        Some("Check the `vcs.status` command in cascade.toml"),
      )),
    }
  }
}
