//! `cascade doctor`: environment and module tree diagnostics

use crate::checks::{CheckContext, CheckResult, Severity, create_default_runner};
use crate::core::config::CascadeConfig;
use crate::core::context::project_root;
use crate::core::error::{CascadeError, CascadeResult};
use std::path::Path;

/// Run the doctor command
pub fn run_doctor(dir: &Path, json: bool) -> CascadeResult<()> {
  let results = match CascadeConfig::load_or_default(dir) {
    Ok(config) => {
      let ctx = CheckContext::new(project_root(dir, &config), config);
      create_default_runner().run_all(&ctx)
    }
    Err(e) => vec![CheckResult::error("config", e.to_string(), e.help_message())],
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
  } else {
    print_results(&results);
  }

  let blocking = results.iter().filter(|r| r.is_blocking()).count();
  if blocking > 0 {
    return Err(CascadeError::with_help(
      format!("{} check(s) failed", blocking),
      "Fix the errors above before running `cascade release`",
    ));
  }
  Ok(())
}

fn print_results(results: &[CheckResult]) {
  println!("🩺 cascade doctor");
  println!();
  for result in results {
    let icon = match (result.passed, result.severity) {
      (true, _) => "✅",
      (false, Severity::Warning) => "⚠️ ",
      (false, _) => "❌",
    };
    println!("{} {:<16} {}", icon, result.check_name, result.message);
    if let Some(suggestion) = &result.suggestion
      && !result.passed
    {
      println!("   💡 {}", suggestion);
    }
  }
  println!();
}
