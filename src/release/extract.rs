//! Released version extraction from build tool output
//!
//! The build tool logs one upload line per published file, e.g.
//! `[INFO] Uploading to releases: https://repo/com/acme/lib/1.2/lib-1.2.pom`.
//! The version is read from the repository layout
//! `.../<artifact>/<version>/<artifact>-<version>.<ext>`.

use regex::Regex;
use std::sync::OnceLock;

fn upload_pattern() -> Option<&'static Regex> {
  static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
  PATTERN
    .get_or_init(|| Regex::new(r"(?i)\buploading(?:\s+to\s+[^:\s]+)?\s*:\s*(\S+)").ok())
    .as_ref()
}

/// Version of `artifact` uploaded according to `lines`; first match wins.
///
/// `packaging` is accepted as file extension next to `pom`.
pub fn extract_released_version(lines: &[String], artifact: &str, packaging: &str) -> Option<String> {
  let pattern = upload_pattern()?;
  lines.iter().find_map(|line| {
    let caps = pattern.captures(line)?;
    version_from_upload_path(&caps[1], artifact, packaging)
  })
}

fn version_from_upload_path(url: &str, artifact: &str, packaging: &str) -> Option<String> {
  let mut segments = url.trim_end_matches(['/', ')', '"', '\'']).rsplit('/');
  let file_name = segments.next()?;
  let version = segments.next()?;
  let artifact_dir = segments.next()?;

  if artifact_dir != artifact || version.is_empty() {
    return None;
  }
  let stem = format!("{}-{}.", artifact, version);
  let extension = file_name.strip_prefix(&stem)?;
  (extension == "pom" || extension == packaging).then(|| version.to_string())
}
