//! Assertion outcome collection
//!
//! The collector is the only channel through which the runner learns that a
//! test has asserted. Every façade call appends one [`AssertionOutcome`];
//! the first append after [`AssertionCollector::arm`] fires the single-slot
//! completion signal.

use crate::error::Error;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tokio::sync::oneshot;

/// Why an outcome failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A predicate did not hold
    Assertion,
    /// The test never asserted within the bound
    Timeout,
    /// A body or hook returned an error or panicked
    Uncaught,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "AssertionFailure"),
            FailureKind::Timeout => write!(f, "TestTimeout"),
            FailureKind::Uncaught => write!(f, "UncaughtError"),
        }
    }
}

/// A recorded failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureDetail {
    /// An assertion failure with the given message
    pub fn assertion(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: message.into(),
        }
    }

    /// The failure recorded when no assertion arrived within `timeout_ms`
    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("test never asserted during {}ms", timeout_ms),
        }
    }

    /// An error that escaped a body or hook
    pub fn uncaught(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Uncaught,
            message: message.into(),
        }
    }
}

impl From<&Error> for FailureDetail {
    fn from(err: &Error) -> Self {
        FailureDetail::uncaught(err.to_string())
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of a single assertion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOutcome {
    pub passed: bool,
    pub error: Option<FailureDetail>,
}

impl AssertionOutcome {
    /// A passing outcome
    pub fn pass() -> Self {
        Self {
            passed: true,
            error: None,
        }
    }

    /// A failing outcome
    pub fn fail(detail: FailureDetail) -> Self {
        Self {
            passed: false,
            error: Some(detail),
        }
    }

    /// Whether the assertion held
    pub fn is_passed(&self) -> bool {
        self.passed
    }

    /// View the outcome as a `Result`
    pub fn into_result(self) -> std::result::Result<(), FailureDetail> {
        match self.error {
            Some(detail) if !self.passed => Err(detail),
            _ => Ok(()),
        }
    }
}

/// Fires once the first outcome of the current test is recorded
pub type CompletionSignal = oneshot::Receiver<()>;

#[derive(Default)]
struct CollectorState {
    outcomes: Vec<AssertionOutcome>,
    signal: Option<oneshot::Sender<()>>,
}

/// Shared, single-threaded outcome log for the test currently executing
#[derive(Clone, Default)]
pub struct AssertionCollector {
    inner: Rc<RefCell<CollectorState>>,
}

impl AssertionCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all outcomes and install a fresh completion slot.
    ///
    /// Any previously returned signal is dropped and reads as closed.
    pub fn arm(&self) -> CompletionSignal {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.borrow_mut();
        state.outcomes.clear();
        state.signal = Some(tx);
        rx
    }

    /// Append an outcome and fire the completion slot if it is still armed
    pub fn record(&self, outcome: AssertionOutcome) {
        let signal = {
            let mut state = self.inner.borrow_mut();
            state.outcomes.push(outcome);
            state.signal.take()
        };
        if let Some(tx) = signal {
            // The receiver may already be gone if the test timed out
            let _ = tx.send(());
        }
    }

    /// Record a failure outcome
    pub fn fail(&self, detail: FailureDetail) {
        self.record(AssertionOutcome::fail(detail));
    }

    /// Snapshot of the outcomes recorded since the last `arm`
    pub fn outcomes(&self) -> Vec<AssertionOutcome> {
        self.inner.borrow().outcomes.clone()
    }

    /// The failures recorded since the last `arm`
    pub fn failures(&self) -> Vec<FailureDetail> {
        self.inner
            .borrow()
            .outcomes
            .iter()
            .filter_map(|o| o.clone().into_result().err())
            .collect()
    }

    /// Number of recorded outcomes
    pub fn len(&self) -> usize {
        self.inner.borrow().outcomes.len()
    }

    /// Whether nothing has been recorded since the last `arm`
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_clears_outcomes() {
        let collector = AssertionCollector::new();
        collector.record(AssertionOutcome::pass());
        assert_eq!(collector.len(), 1);
        let _signal = collector.arm();
        assert!(collector.is_empty());
    }

    #[test]
    fn test_first_record_fires_signal() {
        let collector = AssertionCollector::new();
        let mut signal = collector.arm();
        assert!(signal.try_recv().is_err());
        collector.record(AssertionOutcome::pass());
        assert!(signal.try_recv().is_ok());
        // Later outcomes still accumulate
        collector.fail(FailureDetail::assertion("nope"));
        assert_eq!(collector.len(), 2);
        assert_eq!(collector.failures(), vec![FailureDetail::assertion("nope")]);
    }

    #[test]
    fn test_rearm_drops_previous_signal() {
        let collector = AssertionCollector::new();
        let mut stale = collector.arm();
        let _fresh = collector.arm();
        assert!(matches!(
            stale.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn test_outcome_into_result() {
        assert_eq!(AssertionOutcome::pass().into_result(), Ok(()));
        let detail = FailureDetail::timeout(5000);
        assert_eq!(detail.to_string(), "TestTimeout: test never asserted during 5000ms");
        assert_eq!(AssertionOutcome::fail(detail.clone()).into_result(), Err(detail));
    }

    #[test]
    fn test_failure_from_error() {
        let detail = FailureDetail::from(&Error::thrown("boom"));
        assert_eq!(detail.kind, FailureKind::Uncaught);
        assert_eq!(detail.to_string(), "UncaughtError: Error: boom");
    }
}
