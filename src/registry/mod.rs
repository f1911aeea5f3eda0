//! Test registry
//!
//! Holds everything the declaration phase produces: test cases in
//! declaration order, per-group hooks, the only-filter and the current
//! group context.

use crate::assert::Expect;
use crate::error::{messages, Error, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Name of the implicit default group
pub const DEFAULT_GROUP: &str = "";

/// What a test body or hook hands back to the runner
pub enum Step {
    /// Finished synchronously
    Ready(Result<()>),
    /// Finishes when the future resolves
    Deferred(LocalBoxFuture<'static, Result<()>>),
}

impl From<()> for Step {
    fn from(_: ()) -> Self {
        Step::Ready(Ok(()))
    }
}

impl From<Result<()>> for Step {
    fn from(result: Result<()>) -> Self {
        Step::Ready(result)
    }
}

impl From<LocalBoxFuture<'static, Result<()>>> for Step {
    fn from(future: LocalBoxFuture<'static, Result<()>>) -> Self {
        Step::Deferred(future)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Step::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

/// Wrap an async block as a deferred step
pub fn deferred<F>(future: F) -> Step
where
    F: Future<Output = Result<()>> + 'static,
{
    Step::Deferred(future.boxed_local())
}

/// A registered test body
pub type TestFn = Rc<dyn Fn(Expect) -> Step>;

/// A beforeEach / afterEach hook
pub type HookFn = Rc<dyn Fn() -> Step>;

/// A registered test
#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub full_name: String,
    pub group: String,
    pub body: TestFn,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("full_name", &self.full_name)
            .field("group", &self.group)
            .finish()
    }
}

/// A named group and its hooks
#[derive(Clone, Default)]
pub struct Group {
    pub name: String,
    pub before_each: Option<HookFn>,
    pub after_each: Option<HookFn>,
}

/// Tests and groups marked `only`
#[derive(Debug, Clone, Default)]
pub struct OnlyFilter {
    test_names: FxHashSet<String>,
    group_names: FxHashSet<String>,
}

impl OnlyFilter {
    /// Whether no only-markers exist
    pub fn is_empty(&self) -> bool {
        self.test_names.is_empty() && self.group_names.is_empty()
    }

    /// Union semantics: a named test, or any test of a named group
    pub fn admits(&self, test: &TestCase) -> bool {
        self.is_empty()
            || self.test_names.contains(&test.full_name)
            || self.group_names.contains(&test.group)
    }

    pub fn mark_test(&mut self, full_name: impl Into<String>) {
        self.test_names.insert(full_name.into());
    }

    pub fn mark_group(&mut self, name: impl Into<String>) {
        self.group_names.insert(name.into());
    }
}

/// Result of [`TestRegistry::select`]
#[derive(Debug, Default)]
pub struct Selection {
    pub tests: Vec<TestCase>,
    /// Tests removed by the name filter
    pub skipped: usize,
}

/// Full name of a test declared under `group`
pub fn full_name(group: &str, name: &str) -> String {
    if group.is_empty() {
        name.to_string()
    } else {
        format!("({}): {}", group, name)
    }
}

fn non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::configuration(messages::must_be(what, "a non-empty string")))
    } else {
        Ok(())
    }
}

/// Declaration-phase store
#[derive(Default)]
pub struct TestRegistry {
    tests: IndexMap<String, TestCase>,
    groups: FxHashMap<String, Group>,
    only: OnlyFilter,
    current_group: String,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test under the current group.
    ///
    /// A later test with the same full name replaces the earlier one in place.
    pub fn register(&mut self, name: &str, body: TestFn) -> Result<String> {
        non_empty("testName", name)?;
        let group = self.current_group.clone();
        let full = full_name(&group, name);
        tracing::trace!(test = %full, "registered");
        self.tests.insert(
            full.clone(),
            TestCase {
                name: name.to_string(),
                full_name: full.clone(),
                group,
                body,
            },
        );
        Ok(full)
    }

    /// Register a test and mark it `only`
    pub fn register_only(&mut self, name: &str, body: TestFn) -> Result<()> {
        let full = self.register(name, body)?;
        self.only.mark_test(full);
        Ok(())
    }

    /// Make `name` the current group
    pub fn enter_group(&mut self, name: &str) -> Result<()> {
        non_empty("groupName", name)?;
        self.groups.entry(name.to_string()).or_insert_with(|| Group {
            name: name.to_string(),
            ..Group::default()
        });
        self.current_group = name.to_string();
        Ok(())
    }

    /// Return to the default group. Does not restore an enclosing group.
    pub fn leave_group(&mut self) {
        self.current_group = DEFAULT_GROUP.to_string();
    }

    /// Mark a group `only`
    pub fn mark_group_only(&mut self, name: &str) {
        self.only.mark_group(name);
    }

    fn current_group_mut(&mut self) -> &mut Group {
        let name = self.current_group.clone();
        self.groups.entry(name.clone()).or_insert_with(|| Group {
            name,
            ..Group::default()
        })
    }

    /// Attach (or replace) the current group's beforeEach hook
    pub fn set_before_each(&mut self, hook: HookFn) {
        self.current_group_mut().before_each = Some(hook);
    }

    /// Attach (or replace) the current group's afterEach hook
    pub fn set_after_each(&mut self, hook: HookFn) {
        self.current_group_mut().after_each = Some(hook);
    }

    /// Tests to execute, in declaration order.
    ///
    /// The only-filter applies first, then the optional substring filter.
    pub fn select(&self, name_filter: Option<&str>) -> Selection {
        let mut selection = Selection::default();
        for test in self.tests.values().filter(|t| self.only.admits(t)) {
            match name_filter {
                Some(pattern) if !test.full_name.contains(pattern) => selection.skipped += 1,
                _ => selection.tests.push(test.clone()),
            }
        }
        selection
    }

    // ----- Introspection -----

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn get(&self, full_name: &str) -> Option<&TestCase> {
        self.tests.get(full_name)
    }

    /// All tests in declaration order
    pub fn tests(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.values()
    }

    pub fn group_hooks(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn current_group(&self) -> &str {
        &self.current_group
    }

    pub fn only_filter(&self) -> &OnlyFilter {
        &self.only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> TestFn {
        Rc::new(|_| Step::from(()))
    }

    fn names(selection: &Selection) -> Vec<&str> {
        selection.tests.iter().map(|t| t.full_name.as_str()).collect()
    }

    #[test]
    fn test_full_names() {
        assert_eq!(full_name("", "adds"), "adds");
        assert_eq!(full_name("Math", "adds"), "(Math): adds");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let mut registry = TestRegistry::new();
        let err = registry.register("", body()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ConfigurationError: testName must be a non-empty string"
        );
        assert!(registry.enter_group("").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut registry = TestRegistry::new();
        registry.register("a", body()).unwrap();
        registry.register("b", body()).unwrap();
        registry.register("a", body()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(names(&registry.select(None)), vec!["a", "b"]);
    }

    #[test]
    fn test_groups_do_not_nest() {
        let mut registry = TestRegistry::new();
        registry.enter_group("outer").unwrap();
        registry.enter_group("inner").unwrap();
        registry.leave_group();
        registry.register("after", body()).unwrap();
        assert_eq!(registry.current_group(), DEFAULT_GROUP);
        assert!(registry.get("after").is_some());
    }

    #[test]
    fn test_only_filter_is_a_union() {
        let mut registry = TestRegistry::new();
        registry.register("plain", body()).unwrap();
        registry.register_only("picked", body()).unwrap();
        registry.enter_group("G").unwrap();
        registry.register("one", body()).unwrap();
        registry.register("two", body()).unwrap();
        registry.leave_group();
        registry.mark_group_only("G");
        assert_eq!(
            names(&registry.select(None)),
            vec!["picked", "(G): one", "(G): two"]
        );
    }

    #[test]
    fn test_name_filter_counts_skips() {
        let mut registry = TestRegistry::new();
        registry.register("alpha", body()).unwrap();
        registry.register("beta", body()).unwrap();
        let selection = registry.select(Some("alp"));
        assert_eq!(names(&selection), vec!["alpha"]);
        assert_eq!(selection.skipped, 1);
    }

    #[test]
    fn test_hooks_replace_per_group() {
        let mut registry = TestRegistry::new();
        registry.enter_group("G").unwrap();
        registry.set_before_each(Rc::new(|| Step::from(())));
        registry.set_before_each(Rc::new(|| Step::Ready(Err(Error::thrown("second")))));
        registry.leave_group();
        let group = registry.group_hooks("G").unwrap();
        let hook = group.before_each.as_ref().unwrap();
        assert!(matches!(hook(), Step::Ready(Err(_))));
        assert!(group.after_each.is_none());
        assert!(registry.group_hooks(DEFAULT_GROUP).is_none());
    }
}
