//! Assertions
//!
//! [`Expect`] is the façade test bodies assert through. Outcomes land in an
//! [`AssertionCollector`], which the runner watches to detect completion.

mod collector;
mod expect;
pub mod predicates;

pub use collector::{
    AssertionCollector, AssertionOutcome, CompletionSignal, FailureDetail, FailureKind,
};
pub use expect::Expect;
pub(crate) use expect::panic_message;
