//! Shared test helpers for integration tests

use idatest::{BufferConsole, LogLevel, RunContext, TestReport};
use tokio::task::LocalSet;

/// A context whose report lines are captured instead of printed
pub fn captured_context() -> (RunContext, BufferConsole) {
    let console = BufferConsole::new(LogLevel::Debug);
    let ctx = RunContext::new().with_console(console.clone());
    (ctx, console)
}

/// Run `ctx` inside a `LocalSet` so tests may spawn timers
pub async fn run_local(ctx: &RunContext) -> TestReport {
    LocalSet::new().run_until(ctx.run()).await
}

/// Full names of the executed tests, in order
#[allow(dead_code)]
pub fn executed(report: &TestReport) -> Vec<String> {
    report.results.iter().map(|r| r.full_name.clone()).collect()
}
