//! Built-in smoke suite for the host runtime
//!
//! Exercises timers, waits, mock functions and mock views through the same
//! public surface user suites go through. Timer tests spawn local tasks, so
//! the run must be driven inside a `LocalSet`.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::event_loop::{
    clear_timer, set_interval, set_timeout, wait, wait_for, DEFAULT_WAIT_FOR_TIMEOUT_MS,
};
use crate::mock::{create_mock_fn, create_mock_obj};
use crate::registry::deferred;
use crate::runtime::Value;
use std::cell::Cell;
use std::rc::Rc;
use tokio::time::Instant;

/// Register the "Core Tests" and "Mocks" groups
pub fn register_core_suite(ctx: &mut RunContext) -> Result<()> {
    ctx.group("Core Tests", register_timer_tests)?;
    ctx.group("Mocks", register_mock_tests)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn register_timer_tests(ctx: &mut RunContext) -> Result<()> {
    ctx.test("setTimeout fires after its delay", |e| {
        let start = Instant::now();
        let _timer = set_timeout(1000, move || {
            e.msg("timer drifted").between(950, 1050, elapsed_ms(start));
        });
    })?;

    ctx.test("clearTimeout cancels a pending timeout", |e| {
        deferred(async move {
            let fired = Rc::new(Cell::new(false));
            let flag = Rc::clone(&fired);
            let timer = set_timeout(100, move || flag.set(true));
            clear_timer(&timer);
            wait(200).await;
            e.is_false(fired.get());
            Ok(())
        })
    })?;

    ctx.test("setInterval fires until cleared", |e| {
        deferred(async move {
            let ticks = Rc::new(Cell::new(0u32));
            let tick = Rc::clone(&ticks);
            let timer = set_interval(100, move || tick.set(tick.get() + 1));
            wait(350).await;
            clear_timer(&timer);
            let seen = ticks.get();
            e.gte(3, seen);
            wait(250).await;
            e.msg("interval kept firing after clear").equal(ticks.get(), seen);
            Ok(())
        })
    })?;

    ctx.test("wait resolves after the delay", |e| {
        deferred(async move {
            let start = Instant::now();
            wait(200).await;
            e.gte(200, elapsed_ms(start));
            Ok(())
        })
    })?;

    ctx.test("waitFor resolves once the condition holds", |e| {
        deferred(async move {
            let ready = Rc::new(Cell::new(false));
            let setter = Rc::clone(&ready);
            let _timer = set_timeout(120, move || setter.set(true));
            let observed = Rc::clone(&ready);
            wait_for(move || observed.get(), DEFAULT_WAIT_FOR_TIMEOUT_MS).await?;
            e.is_true(ready.get());
            Ok(())
        })
    })?;

    ctx.test("waitFor gives up after its timeout", |e| {
        deferred(async move {
            let result = wait_for(|| false, 200).await;
            e.is_true(matches!(result, Err(Error::WaitTimeout { timeout_ms: 200 })));
            Ok(())
        })
    })
}

fn register_mock_tests(ctx: &mut RunContext) -> Result<()> {
    let shared = create_mock_fn("initial");
    let reset_target = shared.clone();
    ctx.before_each(move || reset_target.reset())?;

    let mock = shared.clone();
    ctx.test("mock function records calls in order", move |e| -> Result<()> {
        mock.call(&[Value::from(1)])?;
        mock.call(&[Value::from("a"), Value::from(true)])?;
        e.equal(mock.call_count(), 2);
        let calls = mock.calls();
        e.collection_equal(Value::array(calls[0].clone()), Value::array([1]));
        e.collection_equal(
            Value::array(calls[1].clone()),
            Value::array([Value::from("a"), Value::from(true)]),
        );
        Ok(())
    })?;

    let mock = shared.clone();
    ctx.test("mock function return value and reset", move |e| -> Result<()> {
        e.msg("beforeEach should have reset the log").equal(mock.call_count(), 0);
        e.equal(mock.call(&[])?, "initial");
        mock.set_return_value(7);
        e.equal(mock.call(&[])?, 7);
        mock.reset();
        e.equal(mock.call_count(), 0);
        e.equal(mock.call(&[])?, "initial");
        Ok(())
    })?;

    ctx.test("mock function runs a callable return value", |e| -> Result<()> {
        let mock = create_mock_fn(Value::Undefined);
        mock.returns_with(|_, args| Ok(Value::from(args.len() * 10)));
        e.equal(mock.call(&[Value::Null, Value::Null])?, 20);
        Ok(())
    })?;

    ctx.test("mock object overrides win on read", |e| -> Result<()> {
        let original = Value::object([("name", "original"), ("kind", "service")]);
        let view = create_mock_obj(&original, &Value::object([("name", "mocked")]));
        e.equal(view.get("name")?, "mocked");
        e.equal(view.get("kind")?, "service");
        e.has_properties(&["name", "kind"], &view);
        Ok(())
    })?;

    ctx.test("mock object binds methods to the original", |e| -> Result<()> {
        let original = Value::object([("name", "original")]);
        original.set("describe", Value::function("describe", |this, _| this.get("name")))?;
        let view = create_mock_obj(&original, &Value::object([("name", "mocked")]));
        e.equal(view.call_method("describe", &[])?, "original");
        Ok(())
    })?;

    ctx.test("mock object writes leave the original untouched", |e| -> Result<()> {
        let original =
            Value::object([("name", Value::from("original")), ("count", Value::from(1))]);
        let overrides = Value::object([("name", "mocked")]);
        let view = create_mock_obj(&original, &overrides);
        view.set("name", Value::from("rewritten"))?;
        view.set("count", Value::from(2))?;
        e.equal(overrides.get("name")?, "rewritten");
        e.equal(original.get("name")?, "original");
        e.equal(original.get("count")?, 1);
        e.equal(view.get("count")?, 2);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_both_groups() {
        let mut ctx = RunContext::new();
        register_core_suite(&mut ctx).unwrap();
        assert_eq!(ctx.registry().len(), 12);
        assert!(ctx
            .registry()
            .get("(Core Tests): setTimeout fires after its delay")
            .is_some());
        assert!(ctx.registry().group_hooks("Mocks").unwrap().before_each.is_some());
        assert_eq!(ctx.registry().current_group(), "");
    }
}
