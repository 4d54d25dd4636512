//! Guest-side runtime for probe test modules.
//!
//! A suite registers groups, tests and hooks through a [`Session`]; the resulting context tree is executed by the
//! [`GuestRunner`], which talks to the host exclusively through [`probe_core::HostImports`]. [`NativeModule`] packages
//! a suite as a [`probe_core::GuestModule`] so any host can load and run it.
//!
//! ```ignore
//! use probe_guest::NativeModule;
//!
//! let module = NativeModule::new("math.spec", |s| {
//!     s.describe("math", |s| {
//!         s.test("adds", |env| env.expect(1 + 2).to_be(3));
//!         s.throws("divides by zero", |env| env.fail("division by zero"));
//!     });
//! });
//! ```

#![forbid(unsafe_code)]

pub mod context;
pub mod env;
pub mod expect;
pub mod module;
pub mod runner;
pub mod session;

pub use context::{ExecutionNode, HookPhase, NodeId, Registry, TestEntry};
pub use env::Env;
pub use expect::{Expectation, GuestValue};
pub use module::{NativeLoader, NativeModule, RUNNER_FRAME, SuiteFn};
pub use runner::GuestRunner;
pub use session::{FunctionTable, GuestFn, GuestFunction, Session};
