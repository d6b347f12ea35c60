//! Integration tests for the `cascade` binary
//!
//! Each test builds a module tree in a temp directory with stub `mvn` and
//! `git` scripts that log their arguments instead of doing any work.

#![cfg(unix)]

mod helpers;
mod test_init;
mod test_modules;
mod test_plan;
mod test_release;
