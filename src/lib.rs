//! idatest: an in-process async test harness for an embedded scripting runtime
//!
//! Tests are declared against a [`RunContext`], grouped, optionally filtered
//! with only-markers, and executed one after another on a single-threaded
//! event loop. A test completes when its first assertion arrives through the
//! [`Expect`] façade; a test that never asserts fails after a bound.
//!
//! # Quick Start
//!
//! ```no_run
//! use idatest::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut ctx = RunContext::new();
//!     ctx.group("Math", |ctx| {
//!         ctx.test("adds", |e| {
//!             e.equal(1 + 2, 3);
//!         })
//!     })?;
//!     let report = ctx.run_blocking()?;
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! # Module Overview
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Declaration** | [`context`], [`registry`] |
//! | **Execution** | [`test_runner`], [`event_loop`] |
//! | **Assertions** | [`assert`] |
//! | **Mocking** | [`mock`] |
//! | **Values** | [`runtime`], [`error`](Error) |
//! | **Output** | [`console`] |
//! | **Self-test** | [`suites`] |
// Clippy configuration.
//
// - new_without_default: builder-style types keep an explicit `new`
// - should_implement_trait: `Expect::eq` mirrors the script assertion name
#![allow(clippy::new_without_default)]
#![allow(clippy::should_implement_trait)]

pub mod assert;
pub mod console;
pub mod context;
pub mod event_loop;
pub mod mock;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod suites;
pub mod test_runner;

mod error;

pub use assert::{AssertionCollector, AssertionOutcome, Expect, FailureDetail, FailureKind};
pub use console::{BufferConsole, Console, LogLevel, StdConsole};
pub use context::RunContext;
pub use error::{messages, Error, ErrorKind, Result};
pub use mock::{create_mock_fn, create_mock_obj, MockFn, MockObjectView};
pub use registry::{deferred, Step, TestRegistry};
pub use runtime::{ObjectKind, PropertyStore, Value};
pub use test_runner::{RunState, TestConfig, TestRecord, TestReport, TestRunner};

/// idatest version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
