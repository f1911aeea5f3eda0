//! Prelude module for convenient imports
//!
//! ```no_run
//! use idatest::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut ctx = RunContext::new();
//!     ctx.test("mock records calls", |e| -> Result<()> {
//!         let mock = create_mock_fn(Value::Undefined);
//!         mock.call(&[Value::from(1)])?;
//!         e.equal(mock.call_count(), 1);
//!         Ok(())
//!     })?;
//!     ctx.run_blocking()?;
//!     Ok(())
//! }
//! ```

// Declaration & execution
pub use crate::context::RunContext;
pub use crate::registry::{deferred, Step};
pub use crate::test_runner::{TestConfig, TestReport};

// Assertions
pub use crate::assert::{AssertionOutcome, Expect};

// Event loop helpers
pub use crate::event_loop::{clear_timer, set_interval, set_timeout, wait, wait_for};

// Mocking
pub use crate::mock::{create_mock_fn, create_mock_obj, MockFn};

// Values & errors
pub use crate::error::{Error, Result};
pub use crate::runtime::{PropertyStore, Value};
