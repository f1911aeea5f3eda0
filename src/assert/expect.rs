//! The assertion façade handed to every test body

use super::collector::{AssertionCollector, AssertionOutcome, FailureDetail};
use super::predicates::{self as p, Check};
use crate::error::{Error, Result};
use crate::runtime::Value;
use std::panic::{self, AssertUnwindSafe};

/// Assertion façade.
///
/// Every method records exactly one outcome into the shared collector and
/// returns it. Failures are never raised into the caller.
#[derive(Clone)]
pub struct Expect {
    collector: AssertionCollector,
    message: Option<String>,
}

impl Expect {
    /// Create a façade recording into `collector`
    pub fn new(collector: AssertionCollector) -> Self {
        Self {
            collector,
            message: None,
        }
    }

    /// A façade whose failures carry `message` instead of the generated text
    pub fn msg(&self, message: impl Into<String>) -> Expect {
        Expect {
            collector: self.collector.clone(),
            message: Some(message.into()),
        }
    }

    /// The collector outcomes are recorded into
    pub fn collector(&self) -> &AssertionCollector {
        &self.collector
    }

    fn record(&self, check: Check) -> AssertionOutcome {
        let outcome = match check {
            Ok(()) => AssertionOutcome::pass(),
            Err(generated) => {
                let message = self.message.clone().unwrap_or(generated);
                AssertionOutcome::fail(FailureDetail::assertion(message))
            }
        };
        self.collector.record(outcome.clone());
        outcome
    }

    // ----- Boolean & equality -----

    pub fn is_true(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::is_true(&value.into()))
    }

    pub fn is_false(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::is_false(&value.into()))
    }

    pub fn equal(&self, value: impl Into<Value>, expected: impl Into<Value>) -> AssertionOutcome {
        self.record(p::equal(&value.into(), &expected.into()))
    }

    pub fn eq(&self, value: impl Into<Value>, expected: impl Into<Value>) -> AssertionOutcome {
        self.record(p::eq(&value.into(), &expected.into()))
    }

    /// Deep equality of two objects
    pub fn object_equal(&self, object: &Value, expected: &Value) -> AssertionOutcome {
        self.record(p::object_equal(object, expected, false))
    }

    /// Every key of `expected` must be deeply equal on `object`
    pub fn object_equal_partial(&self, object: &Value, expected: &Value) -> AssertionOutcome {
        self.record(p::object_equal(object, expected, true))
    }

    // ----- Types -----

    pub fn integer(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::integer(&value.into()))
    }

    pub fn number(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::number(&value.into()))
    }

    pub fn string(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::string(&value.into()))
    }

    pub fn boolean(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::boolean(&value.into()))
    }

    pub fn object(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::object(&value.into()))
    }

    pub fn array(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::array(&value.into()))
    }

    pub fn is_function(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::is_function(&value.into()))
    }

    // ----- Shape -----

    pub fn has_function(&self, name: &str, object: &Value) -> AssertionOutcome {
        self.record(p::has_function(name, object))
    }

    pub fn has_property(&self, name: &str, object: &Value) -> AssertionOutcome {
        self.record(p::has_property(name, object))
    }

    pub fn has_properties(&self, names: &[&str], object: &Value) -> AssertionOutcome {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.record(p::has_properties(&names, object))
    }

    pub fn one_of(&self, value: impl Into<Value>, candidates: &[Value]) -> AssertionOutcome {
        self.record(p::one_of(&value.into(), candidates))
    }

    // ----- Range -----

    /// Passes when `value > expected`
    pub fn greater_than(
        &self,
        expected: impl Into<Value>,
        value: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::greater_than(&expected.into(), &value.into()))
    }

    pub fn greater_than_or_equal(
        &self,
        expected: impl Into<Value>,
        value: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::greater_than_or_equal(&expected.into(), &value.into()))
    }

    /// Passes when `value < expected`
    pub fn less_than(
        &self,
        expected: impl Into<Value>,
        value: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::less_than(&expected.into(), &value.into()))
    }

    pub fn less_than_or_equal(
        &self,
        expected: impl Into<Value>,
        value: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::less_than_or_equal(&expected.into(), &value.into()))
    }

    /// Inclusive range check
    pub fn between(
        &self,
        min: impl Into<Value>,
        max: impl Into<Value>,
        value: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::between(&min.into(), &max.into(), &value.into()))
    }

    pub fn gt(&self, expected: impl Into<Value>, value: impl Into<Value>) -> AssertionOutcome {
        self.greater_than(expected, value)
    }

    pub fn gte(&self, expected: impl Into<Value>, value: impl Into<Value>) -> AssertionOutcome {
        self.greater_than_or_equal(expected, value)
    }

    pub fn lt(&self, expected: impl Into<Value>, value: impl Into<Value>) -> AssertionOutcome {
        self.less_than(expected, value)
    }

    pub fn lte(&self, expected: impl Into<Value>, value: impl Into<Value>) -> AssertionOutcome {
        self.less_than_or_equal(expected, value)
    }

    // ----- Collections -----

    pub fn contains_only_string(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::contains_only_string(&value.into()))
    }

    pub fn contains_only_integer(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::contains_only_integer(&value.into()))
    }

    pub fn contains_only_number(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::contains_only_number(&value.into()))
    }

    pub fn count(&self, expected: usize, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::count(&Value::from(expected), &value.into()))
    }

    pub fn not_empty(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::not_empty(&value.into()))
    }

    /// Length, then element-wise identity, of two iterables
    pub fn collection_equal(
        &self,
        first: impl Into<Value>,
        second: impl Into<Value>,
    ) -> AssertionOutcome {
        self.record(p::collection_equal(&first.into(), &second.into()))
    }

    // ----- Numeric & formats -----

    pub fn odd_number(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::odd_number(&value.into()))
    }

    pub fn even_number(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::even_number(&value.into()))
    }

    pub fn json_string(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::json_string(&value.into()))
    }

    pub fn email(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::email(&value.into()))
    }

    pub fn url(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::url(&value.into()))
    }

    pub fn uuid(&self, value: impl Into<Value>) -> AssertionOutcome {
        self.record(p::uuid(&value.into()))
    }

    // ----- Behavior -----

    /// `callback` must fail or panic. With `expected`, the error message
    /// must contain it.
    pub fn throws<T, F>(&self, callback: F, expected: Option<&str>) -> AssertionOutcome
    where
        F: FnOnce() -> Result<T>,
    {
        let result = match panic::catch_unwind(AssertUnwindSafe(callback)) {
            Ok(result) => result,
            Err(payload) => Err(Error::thrown(panic_message(payload.as_ref()))),
        };
        self.record(p::throws(result, expected))
    }

    /// Call a script function with no arguments and expect it to fail
    pub fn throws_value(&self, func: &Value, expected: Option<&str>) -> AssertionOutcome {
        if !func.is_callable() {
            return self.record(Err(format!(
                "Expected a function but got {}",
                func.type_of()
            )));
        }
        self.throws(|| func.call(&Value::Undefined, &[]), expected)
    }

    /// Dynamic dispatch by script method name.
    ///
    /// The argument after the method's own arguments, when it is a string,
    /// becomes the failure message. Unknown names record nothing.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<AssertionOutcome> {
        let arity = arity(name).ok_or_else(|| Error::UnknownAssertion(name.to_string()))?;
        let scoped = match args.get(arity) {
            Some(Value::String(message)) => self.msg(message.clone()),
            _ => self.clone(),
        };
        let a = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);

        let outcome = match name {
            "true" => scoped.is_true(a(0)),
            "false" => scoped.is_false(a(0)),
            "equal" => scoped.equal(a(0), a(1)),
            "eq" => scoped.eq(a(0), a(1)),
            "objectEqual" => {
                let partial = a(arity + 1).to_boolean();
                scoped.record(p::object_equal(&a(0), &a(1), partial))
            }
            "integer" => scoped.integer(a(0)),
            "number" => scoped.number(a(0)),
            "string" => scoped.string(a(0)),
            "boolean" => scoped.boolean(a(0)),
            "object" => scoped.object(a(0)),
            "array" => scoped.array(a(0)),
            "isFunction" => scoped.is_function(a(0)),
            "hasFunction" => scoped.record(p::has_function(&a(0).to_js_string(), &a(1))),
            "hasProperty" => scoped.record(p::has_property(&a(0).to_js_string(), &a(1))),
            "hasProperties" => {
                let names: Vec<String> = a(0)
                    .iterable_values()
                    .unwrap_or_default()
                    .iter()
                    .map(Value::to_js_string)
                    .collect();
                scoped.record(p::has_properties(&names, &a(1)))
            }
            "oneOf" => {
                let candidates = a(1).iterable_values().unwrap_or_default();
                scoped.one_of(a(0), &candidates)
            }
            "greaterThan" | "gt" => scoped.greater_than(a(0), a(1)),
            "greaterThanOrEqual" | "gte" => scoped.greater_than_or_equal(a(0), a(1)),
            "lessThan" | "lt" => scoped.less_than(a(0), a(1)),
            "lessThanOrEqual" | "lte" => scoped.less_than_or_equal(a(0), a(1)),
            "between" => scoped.between(a(0), a(1), a(2)),
            "containsOnlyString" => scoped.contains_only_string(a(0)),
            "containsOnlyInteger" => scoped.contains_only_integer(a(0)),
            "containsOnlyNumber" => scoped.contains_only_number(a(0)),
            "count" => scoped.record(p::count(&a(0), &a(1))),
            "notEmpty" => scoped.not_empty(a(0)),
            "collectionEqual" => scoped.collection_equal(a(0), a(1)),
            "oddNumber" => scoped.odd_number(a(0)),
            "evenNumber" => scoped.even_number(a(0)),
            "jsonString" => scoped.json_string(a(0)),
            "email" => scoped.email(a(0)),
            "url" => scoped.url(a(0)),
            "uuid" => scoped.uuid(a(0)),
            "throws" => {
                let expected = a(1);
                scoped.throws_value(&a(0), expected.as_str())
            }
            _ => return Err(Error::UnknownAssertion(name.to_string())),
        };
        Ok(outcome)
    }
}

/// Number of positional arguments an assertion takes before its message
fn arity(name: &str) -> Option<usize> {
    let n = match name {
        "true" | "false" | "integer" | "number" | "string" | "boolean" | "object" | "array"
        | "isFunction" | "containsOnlyString" | "containsOnlyInteger" | "containsOnlyNumber"
        | "notEmpty" | "oddNumber" | "evenNumber" | "jsonString" | "email" | "url" | "uuid" => 1,
        "equal" | "eq" | "objectEqual" | "hasFunction" | "hasProperty" | "hasProperties"
        | "oneOf" | "greaterThan" | "greaterThanOrEqual" | "lessThan" | "lessThanOrEqual"
        | "gt" | "gte" | "lt" | "lte" | "count" | "collectionEqual" | "throws" => 2,
        "between" => 3,
        _ => return None,
    };
    Some(n)
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::FailureKind;

    fn expect() -> Expect {
        Expect::new(AssertionCollector::new())
    }

    #[test]
    fn test_each_call_records_one_outcome() {
        let e = expect();
        assert!(e.is_true(true).is_passed());
        assert!(!e.equal(1, 2).is_passed());
        assert!(e.between(1, 3, 2).is_passed());
        assert_eq!(e.collector().len(), 3);
        assert_eq!(e.collector().failures().len(), 1);
    }

    #[test]
    fn test_caller_message_replaces_generated_text() {
        let e = expect();
        let outcome = e.msg("counter should be seven").equal(3, 7);
        let detail = outcome.into_result().unwrap_err();
        assert_eq!(detail.kind, FailureKind::Assertion);
        assert_eq!(detail.message, "counter should be seven");

        let generated = e.equal(3, 7).into_result().unwrap_err();
        assert_eq!(generated.message, "Expected 3 to equal 7");
    }

    #[test]
    fn test_throws_catches_errors_and_panics() {
        let e = expect();
        assert!(e.throws(|| -> Result<()> { Err(Error::thrown("nope")) }, None).is_passed());
        assert!(e.throws(|| -> Result<()> { panic!("kaboom") }, Some("kaboom")).is_passed());
        assert!(!e.throws(|| Ok(1), None).is_passed());
    }

    #[test]
    fn test_throws_value_calls_script_function() {
        let e = expect();
        let failing = Value::function("bad", |_, _| Err(Error::range_error("out of range")));
        assert!(e.throws_value(&failing, Some("out of range")).is_passed());
        assert!(!e.throws_value(&Value::from(1), None).is_passed());
    }

    #[test]
    fn test_call_dispatches_by_name() {
        let e = expect();
        let outcome = e.call("gt", &[Value::from(1), Value::from(2)]).unwrap();
        assert!(outcome.is_passed());
        let outcome = e
            .call(
                "between",
                &[Value::from(1), Value::from(5), Value::from(9), Value::from("too big")],
            )
            .unwrap();
        assert_eq!(outcome.into_result().unwrap_err().message, "too big");
        let a = Value::object([("x", 1), ("y", 2)]);
        let b = Value::object([("x", 1)]);
        let partial = e
            .call("objectEqual", &[a, b, Value::Undefined, Value::from(true)])
            .unwrap();
        assert!(partial.is_passed());
    }

    #[test]
    fn test_call_unknown_records_nothing() {
        let e = expect();
        let err = e.call("instanceOf", &[Value::Null]).unwrap_err();
        assert!(matches!(err, Error::UnknownAssertion(ref name) if name == "instanceOf"));
        assert!(e.collector().is_empty());
    }
}
