//! Mock functions and delegating object views
//!
//! [`create_mock_fn`] records every call and answers with a configurable
//! return value. [`create_mock_obj`] overlays overrides on top of an
//! existing object without ever writing to it.

mod view;

pub use view::{create_mock_obj, DelegateStore, MockObjectView, OverrideStore};

use crate::error::Result;
use crate::runtime::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct MockState {
    calls: Vec<Vec<Value>>,
    initial: Value,
    return_value: Value,
}

/// Handle to a mock function.
///
/// Clones share the same call log and return value.
#[derive(Clone)]
pub struct MockFn {
    state: Rc<RefCell<MockState>>,
}

/// Create a mock function answering with `initial_return`
pub fn create_mock_fn(initial_return: impl Into<Value>) -> MockFn {
    MockFn::new(initial_return)
}

impl MockFn {
    pub fn new(initial_return: impl Into<Value>) -> Self {
        let initial = initial_return.into();
        Self {
            state: Rc::new(RefCell::new(MockState {
                calls: Vec::new(),
                return_value: initial.clone(),
                initial,
            })),
        }
    }

    /// Call with an undefined receiver
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.call_with(&Value::Undefined, args)
    }

    /// Record `args` and produce the current return value.
    ///
    /// An undefined return value falls back to the initial one. A callable
    /// return value is invoked with the same receiver and arguments.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> Result<Value> {
        let answer = {
            let mut state = self.state.borrow_mut();
            state.calls.push(args.to_vec());
            if state.return_value.is_undefined() {
                state.initial.clone()
            } else {
                state.return_value.clone()
            }
        };
        if answer.is_callable() {
            answer.call(this, args)
        } else {
            Ok(answer)
        }
    }

    /// Argument lists of every call, in call order
    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn last_call(&self) -> Option<Vec<Value>> {
        self.state.borrow().calls.last().cloned()
    }

    pub fn return_value(&self) -> Value {
        self.state.borrow().return_value.clone()
    }

    /// Replace the return value; a function value becomes the implementation
    pub fn set_return_value(&self, value: impl Into<Value>) {
        self.state.borrow_mut().return_value = value.into();
    }

    /// Answer calls by running `implementation`
    pub fn returns_with<F>(&self, implementation: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        self.set_return_value(Value::function("mockImplementation", implementation));
    }

    /// Clear the call log and restore the initial return value
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.clear();
        state.return_value = state.initial.clone();
    }

    /// A callable script value recording into this mock's log
    pub fn to_value(&self) -> Value {
        let mock = self.clone();
        Value::function("mockFn", move |this, args| mock.call_with(this, args))
    }
}

impl fmt::Debug for MockFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockFn")
            .field("calls", &state.calls.len())
            .field("return_value", &state.return_value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_call_log_keeps_order_and_arguments() {
        let mock = create_mock_fn(Value::Undefined);
        mock.call(&[Value::from(1)]).unwrap();
        mock.call(&[Value::from("a"), Value::from(true)]).unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(
            mock.calls(),
            vec![vec![Value::from(1)], vec![Value::from("a"), Value::from(true)]]
        );
        assert_eq!(mock.last_call(), Some(vec![Value::from("a"), Value::from(true)]));
    }

    #[test]
    fn test_return_value_and_reset() {
        let mock = create_mock_fn(42);
        assert_eq!(mock.call(&[]).unwrap(), Value::from(42));
        mock.set_return_value("changed");
        assert_eq!(mock.call(&[]).unwrap(), Value::from("changed"));
        mock.set_return_value(Value::Undefined);
        assert_eq!(mock.call(&[]).unwrap(), Value::from(42));
        mock.reset();
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.return_value(), Value::from(42));
    }

    #[test]
    fn test_callable_return_value_is_invoked() {
        let mock = create_mock_fn(Value::Undefined);
        mock.returns_with(|_, args| Ok(Value::from(args.len())));
        let out = mock.call(&[Value::Null, Value::Null, Value::Null]).unwrap();
        assert_eq!(out, Value::from(3));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_implementation_errors_propagate() {
        let mock = create_mock_fn(Value::function("bad", |_, _| Err(Error::thrown("nope"))));
        assert!(mock.call(&[]).is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_script_value_shares_log() {
        let mock = create_mock_fn("hi");
        let func = mock.to_value();
        assert!(func.is_callable());
        let obj = Value::object([("greet", func)]);
        assert_eq!(obj.call_method("greet", &[Value::from(7)]).unwrap(), Value::from("hi"));
        assert_eq!(mock.calls(), vec![vec![Value::from(7)]]);
    }
}
