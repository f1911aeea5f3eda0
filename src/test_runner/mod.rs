//! Test runner
//!
//! Drives the per-test state machine over the tests a [`TestRegistry`]
//! selects: arm the collector, run beforeEach, run the body, wait for the
//! first assertion, run afterEach, classify. Every failure is contained to
//! the test it happened in; nothing escapes [`TestRunner::run`].
//!
//! # Example
//!
//! ```no_run
//! use idatest::{AssertionCollector, BufferConsole, LogLevel};
//! use idatest::{TestConfig, TestRegistry, TestRunner};
//!
//! let registry = TestRegistry::new();
//! let config = TestConfig::default();
//! let console = BufferConsole::new(LogLevel::Info);
//! let runner = TestRunner::new(&registry, AssertionCollector::new(), &config, &console);
//! let report = idatest::event_loop::block_on(runner.run(None)).unwrap();
//! println!("{}", report);
//! ```

use crate::assert::{panic_message, AssertionCollector, Expect, FailureDetail};
use crate::console::{Console, LogLevel};
use crate::error::Result;
use crate::registry::{Step, TestCase, TestRegistry};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::Instrument;

/// Default per-test bound
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Called once with the run's exit code (0 or 1)
pub type ResultCallback = Rc<dyn Fn(i32) -> Step>;

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Where the runner is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    /// Executing the test at this index of the filtered list
    Executing(usize),
    Reporting,
    /// Terminal
    Done,
}

// ---------------------------------------------------------------------------
// TestConfig
// ---------------------------------------------------------------------------

/// Runner configuration, loadable from camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestConfig {
    /// How long a test may go without asserting.
    pub timeout_ms: u64,
    /// Only tests whose full name contains this run.
    pub filter: Option<String>,
    /// Console threshold, 0 (debug) to 4 (none).
    pub log_level: u8,
    /// Append per-test durations to report lines.
    pub verbose: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            filter: None,
            log_level: LogLevel::Info as u8,
            verbose: false,
        }
    }
}

impl TestConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&source)
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Console threshold; out-of-range values clamp to `None`
    pub fn console_level(&self) -> LogLevel {
        LogLevel::from_number(self.log_level).unwrap_or(LogLevel::None)
    }
}

// ---------------------------------------------------------------------------
// TestRecord & TestReport
// ---------------------------------------------------------------------------

/// Outcome of one executed test.
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub full_name: String,
    pub group: String,
    pub passed: bool,
    pub failures: Vec<FailureDetail>,
    pub duration: Duration,
}

/// Summary report for an entire run.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    /// Number of executed tests.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Tests removed by the name filter.
    pub skipped: usize,
    pub duration: Duration,
    /// Per-test records in execution order.
    pub results: Vec<TestRecord>,
}

impl TestReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// 0 when every executed test passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn record(&self, full_name: &str) -> Option<&TestRecord> {
        self.results.iter().find(|r| r.full_name == full_name)
    }

    fn push(&mut self, record: TestRecord) {
        self.total += 1;
        if record.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(record);
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Test Report")?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

        for record in &self.results {
            let icon = if record.passed { "✓" } else { "✗" };
            writeln!(f, "  {} {} ({:?})", icon, record.full_name, record.duration)?;
            for failure in &record.failures {
                writeln!(f, "      {}", failure)?;
            }
        }

        writeln!(f, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "  Total: {}  Passed: {}  Failed: {}  Skipped: {}",
            self.total, self.passed, self.failed, self.skipped
        )?;
        writeln!(f, "  Duration: {:?}", self.duration)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TestRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Stage {
    BeforeEach,
    Body,
    AfterEach,
    Callback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BeforeEach => write!(f, "beforeEach"),
            Stage::Body => write!(f, "test body"),
            Stage::AfterEach => write!(f, "afterEach"),
            Stage::Callback => write!(f, "result callback"),
        }
    }
}

/// How a body, hook or callback ended
enum Settled {
    Clean,
    Failed(FailureDetail),
}

/// Executes the registry's selected tests one after another.
pub struct TestRunner<'a> {
    registry: &'a TestRegistry,
    collector: AssertionCollector,
    config: &'a TestConfig,
    console: &'a dyn Console,
    state: Cell<RunState>,
}

impl<'a> TestRunner<'a> {
    pub fn new(
        registry: &'a TestRegistry,
        collector: AssertionCollector,
        config: &'a TestConfig,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            registry,
            collector,
            config,
            console,
            state: Cell::new(RunState::Idle),
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    fn transition(&self, next: RunState) {
        tracing::trace!(from = ?self.state.get(), to = ?next, "runner state");
        self.state.set(next);
    }

    /// Run every selected test, print the report and invoke `callback`.
    ///
    /// Must be awaited inside a `LocalSet` when tests spawn timers.
    pub async fn run(&self, callback: Option<ResultCallback>) -> TestReport {
        let run_start = Instant::now();
        self.transition(RunState::Discovering);
        let selection = self.registry.select(self.config.filter.as_deref());
        let count = selection.tests.len();

        let span = tracing::info_span!("run", tests = count, skipped = selection.skipped);
        let mut report = async {
            tracing::info!("starting run");
            self.console.info(&format!("Running {} tests", count));

            let mut report = TestReport {
                skipped: selection.skipped,
                ..TestReport::default()
            };
            for (index, test) in selection.tests.iter().enumerate() {
                self.transition(RunState::Executing(index));
                let record = self.run_test(test).await;
                self.print_record(&record);
                report.push(record);
            }
            report
        }
        .instrument(span)
        .await;

        self.transition(RunState::Reporting);
        report.duration = run_start.elapsed();
        self.print_summary(&report);

        if let Some(callback) = callback {
            let code = report.exit_code();
            if let Settled::Failed(detail) = self.settle(Stage::Callback, || callback(code)).await {
                tracing::error!(%detail, "result callback failed");
                self.console.error(&format!("Result callback failed: {}", detail));
            }
        }

        self.transition(RunState::Done);
        report
    }

    async fn run_test(&self, test: &TestCase) -> TestRecord {
        let span = tracing::debug_span!("test", name = %test.full_name);
        async {
            let start = Instant::now();
            let signal = self.collector.arm();
            let hooks = self.registry.group_hooks(&test.group);

            let before = hooks.and_then(|g| g.before_each.clone());
            let ready = match before {
                Some(hook) => self.run_stage(Stage::BeforeEach, || hook()).await,
                None => true,
            };

            if ready {
                let expect = Expect::new(self.collector.clone());
                let body = Rc::clone(&test.body);
                self.run_stage(Stage::Body, move || body(expect)).await;

                // A failure recorded above has already fired the signal
                if time::timeout(self.config.timeout(), signal).await.is_err() {
                    tracing::warn!(timeout_ms = self.config.timeout_ms, "test never asserted");
                    self.collector.fail(FailureDetail::timeout(self.config.timeout_ms));
                }
            }

            let after = hooks.and_then(|g| g.after_each.clone());
            if let Some(hook) = after {
                self.run_stage(Stage::AfterEach, || hook()).await;
            }

            let failures = self.collector.failures();
            TestRecord {
                full_name: test.full_name.clone(),
                group: test.group.clone(),
                passed: failures.is_empty() && !self.collector.is_empty(),
                failures,
                duration: start.elapsed(),
            }
        }
        .instrument(span)
        .await
    }

    /// Run one stage and record its failure, returning whether it succeeded
    async fn run_stage<F>(&self, stage: Stage, call: F) -> bool
    where
        F: FnOnce() -> Step,
    {
        match self.settle(stage, call).await {
            Settled::Clean => true,
            Settled::Failed(detail) => {
                tracing::debug!(%stage, %detail, "stage failed");
                self.collector.fail(detail);
                false
            }
        }
    }

    /// Call `call`, awaiting a deferred step within the per-test bound.
    /// Errors and panics, sync or async, become failure details.
    async fn settle<F>(&self, stage: Stage, call: F) -> Settled
    where
        F: FnOnce() -> Step,
    {
        let step = match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(step) => step,
            Err(payload) => {
                return Settled::Failed(uncaught(stage, panic_message(payload.as_ref())))
            }
        };

        let result = match step {
            Step::Ready(result) => result,
            Step::Deferred(future) => {
                let guarded = AssertUnwindSafe(future).catch_unwind();
                match time::timeout(self.config.timeout(), guarded).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(payload)) => {
                        return Settled::Failed(uncaught(stage, panic_message(payload.as_ref())))
                    }
                    Err(_) => {
                        tracing::warn!(
                            %stage,
                            timeout_ms = self.config.timeout_ms,
                            "deferred step timed out"
                        );
                        return Settled::Failed(FailureDetail::timeout(self.config.timeout_ms));
                    }
                }
            }
        };

        match result {
            Ok(()) => Settled::Clean,
            Err(err) => Settled::Failed(uncaught(stage, err.to_string())),
        }
    }

    fn print_record(&self, record: &TestRecord) {
        let timing = if self.config.verbose {
            format!(" ({:?})", record.duration)
        } else {
            String::new()
        };
        if record.passed {
            self.console.info(&format!("[v] {}{}", record.full_name, timing));
        } else {
            self.console.error(&format!("[x] {}{}", record.full_name, timing));
            for failure in &record.failures {
                self.console.error(&format!("    {}", failure));
            }
        }
    }

    fn print_summary(&self, report: &TestReport) {
        self.console.info(&format!("Done executing {} tests", report.total));
        if report.all_passed() {
            self.console.info("[v] All tests passed!");
        } else {
            self.console.info(&format!("{} tests passed", report.passed));
            self.console.error(&format!("{} tests failed", report.failed));
        }
        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "run finished"
        );
    }
}

fn uncaught(stage: Stage, message: String) -> FailureDetail {
    match stage {
        Stage::Body | Stage::Callback => FailureDetail::uncaught(message),
        Stage::BeforeEach | Stage::AfterEach => {
            FailureDetail::uncaught(format!("{} hook: {}", stage, message))
        }
    }
}
