#![forbid(unsafe_code)]
//! probe: a host/guest test harness.
//!
//! Test suites are compiled into sandboxed guest modules (see `probe_guest`). This crate is the host: it loads each
//! module through a [`probe_core::ModuleLoader`], validates its import and export surface, implements the primitives
//! the guest runner calls, and aggregates the results.
//!
//! - [`host`] - the per-module [`host::TestContext`] and its result tree
//! - [`run`] - discovery, the run aggregator, background artifact writes
//! - [`reporter`] - the [`reporter::TestReporter`] trait and console output
//! - [`config`] - `probe.config.json`
//! - [`cli`] - the command-line entry point
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `host` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Guest code**: A guest panic inside a test or hook is caught at the `tryCall` boundary and recorded as a
//!   failure; it never unwinds into the host.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod reporter;
pub mod run;

pub use config::Configuration;
pub use error::{ConfigError, StructuralError};
pub use host::{GroupResult, ModuleResult, TestContext, TestResult};
pub use reporter::{ConsoleReporter, EmptyReporter, TestReporter};
pub use run::{RunAggregate, RunOptions, run_entries};
