//! Released-module ledger
//!
//! Append-only record of every module released in the current run. It is the
//! idempotency check for the executor: a coordinate found here is never
//! released again. After the run the entries are appended to a ledger file as
//! one block (timestamp line, then one line per entry) which `--resume` can
//! read back.

use crate::core::error::{CascadeResult, ResultExt};
use crate::project::Coordinate;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// One released module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
  pub coordinate: Coordinate,
  pub old_version: String,
  pub new_version: String,
}

impl fmt::Display for LedgerEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}] -> [{}]", self.coordinate, self.old_version, self.new_version)
  }
}

#[derive(Debug, Default)]
pub struct ReleaseLedger {
  entries: Vec<LedgerEntry>,
  index: HashMap<Coordinate, usize>,
}

impl ReleaseLedger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a release; a coordinate already present is left untouched
  pub fn record(&mut self, entry: LedgerEntry) -> bool {
    if let Some(existing) = self.get(&entry.coordinate) {
      warn!(module = %entry.coordinate, existing = %existing, "Module already recorded as released");
      return false;
    }
    debug!(entry = %entry, "Recorded release");
    self.index.insert(entry.coordinate.clone(), self.entries.len());
    self.entries.push(entry);
    true
  }

  pub fn contains(&self, coordinate: &Coordinate) -> bool {
    self.index.contains_key(coordinate)
  }

  pub fn get(&self, coordinate: &Coordinate) -> Option<&LedgerEntry> {
    self.index.get(coordinate).map(|i| &self.entries[*i])
  }

  /// Entries in release order
  pub fn entries(&self) -> &[LedgerEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Append this run as one block; nothing is written for an empty ledger
  pub fn write_to_file(&self, path: &Path, timestamp: DateTime<Utc>) -> CascadeResult<bool> {
    if self.is_empty() {
      return Ok(false);
    }
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut block = format!("{}\n", timestamp.to_rfc3339());
    for entry in &self.entries {
      block.push_str(&entry.to_string());
      block.push('\n');
    }

    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("Failed to open ledger {}", path.display()))?;
    file
      .write_all(block.as_bytes())
      .with_context(|| format!("Failed to write ledger {}", path.display()))?;
    Ok(true)
  }

  /// Read the last block of a ledger file back into a ledger
  pub fn load_last_run(path: &Path) -> CascadeResult<Self> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read ledger {}", path.display()))?;
    let line_pattern = Regex::new(r"^([^:\s]+):(\S+) \[(.*)\] -> \[(.*)\]$")?;

    let mut last_block: Vec<LedgerEntry> = Vec::new();
    for line in content.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
      match line_pattern.captures(line) {
        Some(caps) => last_block.push(LedgerEntry {
          coordinate: Coordinate::new(&caps[1], &caps[2]),
          old_version: caps[3].to_string(),
          new_version: caps[4].to_string(),
        }),
        None => last_block.clear(),
      }
    }

    let mut ledger = Self::new();
    for entry in last_block {
      ledger.record(entry);
    }
    Ok(ledger)
  }
}
