//! Runs the built-in core suite end to end

mod common;

use common::{captured_context, executed, run_local};
use idatest::suites::register_core_suite;
use idatest::TestConfig;

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_core_suite_passes() {
    let (mut ctx, console) = captured_context();
    register_core_suite(&mut ctx).unwrap();

    let report = run_local(&ctx).await;
    assert_eq!(report.total, 12, "{}", console.output());
    assert!(report.all_passed(), "{}", console.output());
    assert_eq!(
        console.lines().last().map(String::as_str),
        Some("[v] All tests passed!")
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_core_suite_respects_name_filter() {
    let (ctx, _console) = captured_context();
    let mut ctx = ctx.with_config(TestConfig::default().with_filter("(Mocks)"));
    register_core_suite(&mut ctx).unwrap();

    let report = run_local(&ctx).await;
    assert_eq!(report.total, 6);
    assert_eq!(report.skipped, 6);
    assert!(executed(&report).iter().all(|name| name.starts_with("(Mocks): ")));
    assert!(report.all_passed());
}
