//! External command execution
//!
//! Every build and VCS command runs through a `CommandInvoker` bound to one
//! working directory. The system backend spawns the process, drains stdout
//! and stderr on two scoped threads into one channel, and blocks until the
//! process exits. Captured lines stay available for version extraction.

use crate::core::error::{CascadeResult, CommandError};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};

/// Program plus arguments, rendered from a `CommandTemplate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
  pub program: String,
  pub args: Vec<String>,
}

impl CommandLine {
  pub fn new(program: &str, args: Vec<String>) -> Self {
    Self {
      program: program.to_string(),
      args,
    }
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Runs commands in a fixed working directory
pub trait CommandInvoker {
  /// Run `command` to completion and return its exit code.
  ///
  /// Only a launch failure is an error here; use `execute_checked` to treat a
  /// non-zero exit as one as well.
  fn execute(&mut self, command: &CommandLine) -> CascadeResult<Option<i32>>;

  /// Output lines captured by the last `execute`
  fn output(&self) -> &[String];

  fn work_dir(&self) -> &Path;

  /// Run `command`, failing with `CommandError::Failed` on a non-zero exit
  fn execute_checked(&mut self, command: &CommandLine) -> CascadeResult<()> {
    let exit_code = self.execute(command)?;
    if exit_code == Some(0) {
      Ok(())
    } else {
      Err(
        CommandError::Failed {
          command: command.to_string(),
          work_dir: self.work_dir().to_path_buf(),
          exit_code,
        }
        .into(),
      )
    }
  }
}

/// Creates invokers bound to a working directory
pub trait InvokerFactory {
  fn invoker(&self, work_dir: &Path) -> Box<dyn CommandInvoker>;
}

/// Spawns real processes
pub struct SystemInvokerFactory {
  /// Relative program paths are resolved against this directory
  base_dir: PathBuf,
  echo_output: bool,
}

impl SystemInvokerFactory {
  pub fn new(base_dir: &Path, echo_output: bool) -> Self {
    Self {
      base_dir: base_dir.to_path_buf(),
      echo_output,
    }
  }
}

impl InvokerFactory for SystemInvokerFactory {
  fn invoker(&self, work_dir: &Path) -> Box<dyn CommandInvoker> {
    Box::new(SystemInvoker {
      base_dir: self.base_dir.clone(),
      work_dir: work_dir.to_path_buf(),
      echo_output: self.echo_output,
      output: Vec::new(),
    })
  }
}

pub struct SystemInvoker {
  base_dir: PathBuf,
  work_dir: PathBuf,
  echo_output: bool,
  output: Vec<String>,
}

impl CommandInvoker for SystemInvoker {
  fn execute(&mut self, command: &CommandLine) -> CascadeResult<Option<i32>> {
    info!(command = %command, dir = %self.work_dir.display(), "Running");
    self.output.clear();

    let program = crate::utils::resolve_program(&command.program, &self.base_dir);
    let mut child = Command::new(&program)
      .args(&command.args)
      .current_dir(&self.work_dir)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| CommandError::Launch {
        command: command.to_string(),
        work_dir: self.work_dir.clone(),
        source,
      })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let echo = self.echo_output;
    let (tx, rx) = mpsc::channel::<String>();

    let lines = thread::scope(|scope| {
      if let Some(stdout) = stdout {
        let tx = tx.clone();
        scope.spawn(move || forward_lines(stdout, tx));
      }
      if let Some(stderr) = stderr {
        let tx = tx.clone();
        scope.spawn(move || forward_lines(stderr, tx));
      }
      drop(tx);

      let mut lines = Vec::new();
      for line in rx {
        if echo {
          info!(target: "cascade::tool", "{}", line);
        } else {
          debug!(target: "cascade::tool", "{}", line);
        }
        lines.push(line);
      }
      lines
    });

    let status = child.wait().map_err(|source| CommandError::Launch {
      command: command.to_string(),
      work_dir: self.work_dir.clone(),
      source,
    })?;
    self.output = lines;

    debug!(command = %command, status = ?status.code(), lines = self.output.len(), "Finished");
    Ok(status.code())
  }

  fn output(&self) -> &[String] {
    &self.output
  }

  fn work_dir(&self) -> &Path {
    &self.work_dir
  }
}

fn forward_lines(stream: impl Read, tx: mpsc::Sender<String>) {
  let reader = BufReader::new(stream);
  for line in reader.split(b'\n') {
    let Ok(bytes) = line else {
      break;
    };
    let text = String::from_utf8_lossy(&bytes).trim_end_matches('\r').to_string();
    if tx.send(text).is_err() {
      break;
    }
  }
}
