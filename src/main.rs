mod checks;
mod commands;
mod core;
mod graph;
mod project;
mod release;
mod utils;

use clap::{Parser, Subcommand};
use core::context::ReleaseContext;
use core::error::{CascadeError, print_error};
use std::path::PathBuf;

/// Release a multi-module snapshot tree in dependency order
#[derive(Parser)]
#[command(name = "cascade")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Emit logs as JSON lines on stderr
  #[arg(long, global = true)]
  log_json: bool,

  /// Run as if started in this directory
  #[arg(short = 'C', long, global = true, value_name = "DIR")]
  directory: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Setup & Inspection
  // ============================================================================
  /// Write a default cascade.toml
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },

  /// Run health checks and diagnostics
  Doctor {
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the module tree and which modules are released together
  Modules {
    /// Output modules in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Releases
  // ============================================================================
  /// Show the release order and commands without running anything
  Plan {
    /// Module to release (`group:artifact` or a unique artifact)
    target: String,
    /// Plan only the snapshot dependencies of the target
    #[arg(long)]
    dependencies_only: bool,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Release a module and every snapshot module it depends on
  Release {
    /// Module to release (`group:artifact` or a unique artifact)
    target: String,
    /// Release only the snapshot dependencies of the target
    #[arg(long)]
    dependencies_only: bool,
    /// Never prompt; accept every default answer
    #[arg(long)]
    batch: bool,
    /// Skip modules released by the last recorded run
    #[arg(long)]
    resume: bool,
    /// Do not update or inspect the working copy first
    #[arg(long)]
    skip_workspace_check: bool,
    /// Ledger file (default: workspace.ledger from cascade.toml)
    #[arg(long, value_name = "FILE")]
    ledger: Option<PathBuf>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  core::telemetry::init_tracing(cli.log_json, core::telemetry::level_from_verbosity(cli.verbose));

  let start_dir = match cli.directory {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(CascadeError::from(e).context("Failed to get current directory")),
    },
  };

  let result = match cli.command {
    // Work without a loadable module tree
    Commands::Init { force } => commands::run_init(&start_dir, force),
    Commands::Doctor { json } => commands::run_doctor(&start_dir, json),

    // Need the module tree, loaded once
    command => {
      let mut ctx = match ReleaseContext::build(&start_dir) {
        Ok(ctx) => ctx,
        Err(e) => handle_error(e),
      };
      match command {
        Commands::Modules { json } => commands::run_modules(&ctx, json),
        Commands::Plan {
          target,
          dependencies_only,
          json,
        } => commands::run_plan(&ctx, &target, dependencies_only, json),
        Commands::Release {
          target,
          dependencies_only,
          batch,
          resume,
          skip_workspace_check,
          ledger,
        } => commands::run_release(
          &mut ctx,
          commands::ReleaseOptions {
            target,
            dependencies_only,
            batch,
            resume,
            skip_workspace_check,
            ledger,
          },
        ),
        Commands::Init { .. } | Commands::Doctor { .. } => Ok(()),
      }
    }
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: CascadeError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
