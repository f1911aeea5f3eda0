//! Event loop utilities
//!
//! Everything here runs on a single-threaded tokio runtime inside a
//! [`LocalSet`], matching the host's cooperative event loop. Timers are
//! local tasks, so callbacks may capture `Rc` state and [`Value`]s.
//!
//! [`Value`]: crate::Value

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::{JoinHandle, LocalSet};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Interval at which [`wait_for`] re-checks its condition
pub const POLL_INTERVAL_MS: u64 = 50;

/// Default deadline for [`wait_for`]
pub const DEFAULT_WAIT_FOR_TIMEOUT_MS: u64 = 5000;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Resolve after `duration_ms` milliseconds
pub async fn wait(duration_ms: u64) {
    time::sleep(Duration::from_millis(duration_ms)).await;
}

/// Poll `condition` every [`POLL_INTERVAL_MS`] until it holds.
///
/// The first check happens one interval after the call. Fails with
/// [`Error::WaitTimeout`] once the remaining budget reaches zero. Work the
/// condition is waiting on is not cancelled.
pub async fn wait_for<F>(mut condition: F, timeout_ms: u64) -> Result<()>
where
    F: FnMut() -> bool,
{
    let period = Duration::from_millis(POLL_INTERVAL_MS);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut remaining = timeout_ms;
    loop {
        ticker.tick().await;
        if condition() {
            return Ok(());
        }
        if remaining == 0 {
            tracing::debug!(timeout_ms, "wait_for deadline passed");
            return Err(Error::WaitTimeout { timeout_ms });
        }
        remaining = remaining.saturating_sub(POLL_INTERVAL_MS);
    }
}

/// Handle to a pending timeout or interval
#[derive(Debug)]
pub struct TimerHandle {
    id: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Unique timer id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the timer already fired (timeouts) or was cancelled
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `callback` once after `delay_ms`.
///
/// Must be called from within a [`LocalSet`].
pub fn set_timeout<F>(delay_ms: u64, callback: F) -> TimerHandle
where
    F: FnOnce() + 'static,
{
    let delay = Duration::from_millis(delay_ms);
    let task = tokio::task::spawn_local(async move {
        time::sleep(delay).await;
        callback();
    });
    TimerHandle {
        id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
        task,
    }
}

/// Run `callback` every `period_ms` until cleared.
///
/// A zero period is clamped to 1ms. Must be called from within a [`LocalSet`].
pub fn set_interval<F>(period_ms: u64, mut callback: F) -> TimerHandle
where
    F: FnMut() + 'static,
{
    let period = Duration::from_millis(period_ms.max(1));
    let task = tokio::task::spawn_local(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            callback();
        }
    });
    TimerHandle {
        id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
        task,
    }
}

/// Cancel a timeout or interval. Clearing a fired timer is a no-op.
pub fn clear_timer(handle: &TimerHandle) {
    handle.task.abort();
}

/// Drive `future` to completion on a fresh current-thread runtime and
/// [`LocalSet`].
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = LocalSet::new();
    Ok(local.block_on(&runtime, future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_wait_advances_clock() {
        let start = Instant::now();
        wait(250).await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_wait_for_resolves_when_condition_holds() {
        LocalSet::new()
            .run_until(async {
                let flag = Rc::new(Cell::new(false));
                let setter = Rc::clone(&flag);
                let _timer = set_timeout(120, move || setter.set(true));

                let start = Instant::now();
                let checked = Rc::clone(&flag);
                wait_for(move || checked.get(), 1000).await.unwrap();
                // Checks land on 50ms boundaries
                let elapsed = start.elapsed();
                assert!(elapsed >= Duration::from_millis(150));
                assert!(elapsed < Duration::from_millis(200));
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_wait_for_times_out() {
        let err = wait_for(|| false, 200).await.unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { timeout_ms: 200 }));
        assert_eq!(
            err.to_string(),
            "WaitTimeout: Condition not met within 200ms"
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_wait_for_huge_budget_keeps_polling() {
        let checks = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&checks);
        let waiting = wait_for(
            move || {
                counter.set(counter.get() + 1);
                false
            },
            u64::MAX,
        );
        let outcome = time::timeout(Duration::from_secs(60), waiting).await;
        assert!(outcome.is_err(), "wait_for gave up early: {:?}", outcome);
        assert!(checks.get() >= 1000);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_wait_for_default_budget() {
        let start = Instant::now();
        let err = wait_for(|| false, DEFAULT_WAIT_FOR_TIMEOUT_MS).await.unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { timeout_ms: 5000 }));
        assert!(start.elapsed() >= Duration::from_millis(DEFAULT_WAIT_FOR_TIMEOUT_MS));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_clear_timer_prevents_callback() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let timer = set_timeout(100, move || flag.set(true));
                clear_timer(&timer);
                wait(200).await;
                assert!(!fired.get());
                assert!(timer.is_finished());
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_interval_fires_periodically() {
        LocalSet::new()
            .run_until(async {
                let counter = Rc::new(Cell::new(0));
                let tick = Rc::clone(&counter);
                let timer = set_interval(100, move || tick.set(tick.get() + 1));
                wait(350).await;
                clear_timer(&timer);
                assert_eq!(counter.get(), 3);
                wait(300).await;
                assert_eq!(counter.get(), 3);
            })
            .await;
    }

    #[test]
    fn test_block_on_runs_local_tasks() {
        let value = block_on(async {
            let cell = Rc::new(Cell::new(0));
            let inner = Rc::clone(&cell);
            let _timer = set_timeout(10, move || inner.set(42));
            wait(20).await;
            cell.get()
        })
        .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_timer_ids_are_unique() {
        block_on(async {
            let a = set_timeout(0, || {});
            let b = set_timeout(0, || {});
            assert_ne!(a.id(), b.id());
        })
        .unwrap();
    }
}
