//! `cascade modules`: show the module tree

use crate::core::context::ReleaseContext;
use crate::core::error::CascadeResult;
use crate::graph::module_graph::ModuleSummary;

/// Run the modules command
pub fn run_modules(ctx: &ReleaseContext, json: bool) -> CascadeResult<()> {
  let summaries = ctx.graph.summaries();

  if json {
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    return Ok(());
  }

  println!("📦 {} module(s) under {}", summaries.len(), ctx.root.display());
  println!();
  for summary in &summaries {
    println!("{}", format_line(summary));
  }
  Ok(())
}

fn format_line(summary: &ModuleSummary) -> String {
  let indent = "  ".repeat(summary.depth + 1);
  let released_with = match &summary.releasable_parent {
    Some(parent) => format!(" → released with {}", parent),
    None if !summary.releasable => " (not releasable)".to_string(),
    None => String::new(),
  };
  format!("{}{}  ({}){}", indent, summary.coordinate, summary.path, released_with)
}
