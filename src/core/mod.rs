//! Core building blocks shared by every command
//!
//! - **config**: cascade.toml parsing, defaults and command templates
//! - **context**: project context built once in main.rs
//! - **error**: error types with contextual help messages
//! - **invoker**: external build/VCS command execution
//! - **prompt**: user confirmation (interactive or batch)
//! - **telemetry**: tracing subscriber setup

pub mod config;
pub mod context;
pub mod error;
pub mod invoker;
pub mod prompt;
pub mod telemetry;
