//! User confirmation before each release

use crate::core::error::CascadeResult;
use std::io::{self, BufRead, Write};

/// Asks the user a question and returns the answer
pub trait Prompter {
  /// Ask `message`; an empty answer yields `default`
  fn prompt(&mut self, message: &str, default: &str) -> CascadeResult<String>;
}

/// Interactive prompter on stdin/stdout
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
  fn prompt(&mut self, message: &str, default: &str) -> CascadeResult<String> {
    print!("❓ {} [{}]: ", message, default);
    io::stdout().flush()?;

    let mut answer = String::new();
    let read = io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    if read == 0 || answer.is_empty() {
      Ok(default.to_string())
    } else {
      Ok(answer.to_string())
    }
  }
}

/// Accepts every default without asking
pub struct BatchPrompter;

impl Prompter for BatchPrompter {
  fn prompt(&mut self, message: &str, default: &str) -> CascadeResult<String> {
    tracing::debug!(question = message, answer = default, "Batch mode answer");
    Ok(default.to_string())
  }
}

/// True when an answer means "yes"
pub fn is_affirmative(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
