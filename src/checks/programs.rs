//! Configured program availability
//!
//! The build and VCS programs must resolve to an executable file, either on
//! `PATH` or as a path relative to the project base.

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::config::CascadeConfig;
use crate::core::error::{CascadeResult, ValidationError};
use crate::utils::find_executable;
use std::path::Path;

pub struct ProgramsCheck;

/// Every configured program that cannot be resolved
pub fn missing_programs(config: &CascadeConfig, base_dir: &Path) -> Vec<ValidationError> {
  config
    .required_programs()
    .into_iter()
    .filter(|(program, _)| find_executable(program, base_dir).is_none())
    .map(|(program, role)| ValidationError::ProgramNotFound {
      program: program.to_string(),
      role: role.to_string(),
    })
    .collect()
}

impl Check for ProgramsCheck {
  fn name(&self) -> &'static str {
    "programs"
  }

  fn description(&self) -> &'static str {
    "Configured build and VCS programs are executable"
  }

  fn run(&self, ctx: &CheckContext) -> CascadeResult<CheckResult> {
    let missing = missing_programs(&ctx.config, &ctx.root);
    if missing.is_empty() {
      let found: Vec<String> = ctx
        .config
        .required_programs()
        .into_iter()
        .map(|(program, role)| format!("{}={}", role, program))
        .collect();
      return Ok(CheckResult::pass(self.name(), format!("Found {}", found.join(", "))));
    }

    let messages: Vec<String> = missing.iter().map(|e| e.to_string()).collect();
    Ok(CheckResult::error(
      self.name(),
      messages.join("; "),
      Some("Install the missing tools or set `build.program` / `vcs.program` in cascade.toml"),
    ))
  }
}
