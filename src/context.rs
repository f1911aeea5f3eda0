//! Declaration and execution entry point
//!
//! A [`RunContext`] owns one registry, one assertion collector, the runner
//! configuration and the console. Declaring tests borrows it mutably, so
//! nothing can be registered once `run` has started.

use crate::assert::{AssertionCollector, Expect};
use crate::console::{Console, StdConsole};
use crate::error::Result;
use crate::event_loop;
use crate::registry::{Step, TestFn, TestRegistry};
use crate::test_runner::{ResultCallback, TestConfig, TestReport, TestRunner};
use std::rc::Rc;

/// Per-run state: registry, collector, config and console
pub struct RunContext {
    registry: TestRegistry,
    collector: AssertionCollector,
    config: TestConfig,
    console: Rc<dyn Console>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// A context with default config, printing to stdout/stderr
    pub fn new() -> Self {
        let config = TestConfig::default();
        Self {
            registry: TestRegistry::new(),
            collector: AssertionCollector::new(),
            console: Rc::new(StdConsole::new(config.console_level())),
            config,
        }
    }

    pub fn with_config(mut self, config: TestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_console(mut self, console: impl Console + 'static) -> Self {
        self.console = Rc::new(console);
        self
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    pub fn collector(&self) -> &AssertionCollector {
        &self.collector
    }

    // ----- Declaration -----

    /// Register a test in the current group
    pub fn test<F, R>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: Fn(Expect) -> R + 'static,
        R: Into<Step>,
    {
        let body: TestFn = Rc::new(move |expect: Expect| -> Step { body(expect).into() });
        self.registry.register(name, body).map(|_| ())
    }

    /// Register a test that limits the run to only-marked tests and groups
    pub fn test_only<F, R>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: Fn(Expect) -> R + 'static,
        R: Into<Step>,
    {
        let body: TestFn = Rc::new(move |expect: Expect| -> Step { body(expect).into() });
        self.registry.register_only(name, body)
    }

    /// Declare the tests and hooks of group `name`.
    ///
    /// Groups do not nest: the current group is reset to the default group
    /// when `declare` returns, whatever it was before.
    pub fn group<F>(&mut self, name: &str, declare: F) -> Result<()>
    where
        F: FnOnce(&mut RunContext) -> Result<()>,
    {
        self.registry.enter_group(name)?;
        let declared = declare(self);
        self.registry.leave_group();
        declared
    }

    /// Declare a group and mark it only
    pub fn group_only<F>(&mut self, name: &str, declare: F) -> Result<()>
    where
        F: FnOnce(&mut RunContext) -> Result<()>,
    {
        self.group(name, declare)?;
        self.registry.mark_group_only(name);
        Ok(())
    }

    /// Attach a hook run before each test of the current group
    pub fn before_each<F, R>(&mut self, hook: F) -> Result<()>
    where
        F: Fn() -> R + 'static,
        R: Into<Step>,
    {
        self.registry.set_before_each(Rc::new(move || -> Step { hook().into() }));
        Ok(())
    }

    /// Attach a hook run after each test of the current group
    pub fn after_each<F, R>(&mut self, hook: F) -> Result<()>
    where
        F: Fn() -> R + 'static,
        R: Into<Step>,
    {
        self.registry.set_after_each(Rc::new(move || -> Step { hook().into() }));
        Ok(())
    }

    // ----- Execution -----

    /// Execute the selected tests and print the report.
    ///
    /// Await inside a `LocalSet` when tests use timers.
    pub async fn run(&self) -> TestReport {
        self.runner().run(None).await
    }

    /// Like [`run`](Self::run), then call `callback` with 0 or 1
    pub async fn run_with_callback<F, R>(&self, callback: F) -> TestReport
    where
        F: Fn(i32) -> R + 'static,
        R: Into<Step>,
    {
        let callback: ResultCallback =
            Rc::new(move |code: i32| -> Step { callback(code).into() });
        self.runner().run(Some(callback)).await
    }

    /// Drive [`run`](Self::run) on a fresh current-thread runtime
    pub fn run_blocking(&self) -> Result<TestReport> {
        event_loop::block_on(self.run())
    }

    fn runner(&self) -> TestRunner<'_> {
        TestRunner::new(&self.registry, self.collector.clone(), &self.config, &*self.console)
    }
}
