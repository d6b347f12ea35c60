//! Module coordinates and version classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker carried by every mutable (in-development) version
pub const SNAPSHOT_MARKER: &str = "-SNAPSHOT";

/// `(group, artifact)` pair identifying a module or artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
  pub group: String,
  pub artifact: String,
}

impl Coordinate {
  pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
    Self {
      group: group.into(),
      artifact: artifact.into(),
    }
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.group, self.artifact)
  }
}

/// Check whether a version is a snapshot (mutable) version
pub fn is_snapshot(version: &str) -> bool {
  version.contains(SNAPSHOT_MARKER)
}
