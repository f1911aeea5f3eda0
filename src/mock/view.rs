//! Delegating object views
//!
//! A view answers each key from one of two stores. The router sends keys
//! already present in the overrides to [`OverrideStore`] and everything else
//! to [`DelegateStore`], which layers a private backing map over the
//! original object.

use crate::error::Result;
use crate::runtime::{PropertyStore, Value};
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::rc::Rc;

/// Serves keys from the override mapping
pub struct OverrideStore {
    overrides: Value,
}

impl OverrideStore {
    pub fn new(overrides: Value) -> Self {
        Self { overrides }
    }

    /// Whether `key` is owned by the overrides
    pub fn claims(&self, key: &str) -> bool {
        self.overrides.has(key).unwrap_or(false)
    }
}

impl PropertyStore for OverrideStore {
    fn get(&self, key: &str) -> Result<Value> {
        self.overrides.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.overrides.set(key, value)
    }

    fn has(&self, key: &str) -> Result<bool> {
        self.overrides.has(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.overrides.keys()
    }
}

/// Serves keys from a backing map, then the original object.
///
/// Writes land in the backing map; the original is only ever read.
pub struct DelegateStore {
    original: Value,
    backing: RefCell<IndexMap<String, Value>>,
}

impl DelegateStore {
    pub fn new(original: Value) -> Self {
        Self {
            original,
            backing: RefCell::new(IndexMap::new()),
        }
    }

    /// Call `method` with the original object as receiver
    fn bind(&self, key: &str, method: Value) -> Value {
        let receiver = self.original.clone();
        Value::function(key, move |_this, args| method.call(&receiver, args))
    }
}

impl PropertyStore for DelegateStore {
    fn get(&self, key: &str) -> Result<Value> {
        if let Some(value) = self.backing.borrow().get(key) {
            return Ok(value.clone());
        }
        let value = match self.original.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(key, %err, "original object read failed");
                Value::Undefined
            }
        };
        if value.is_callable() {
            Ok(self.bind(key, value))
        } else {
            Ok(value)
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.backing.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool> {
        if self.backing.borrow().contains_key(key) {
            return Ok(true);
        }
        Ok(self.original.has(key).unwrap_or(false))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self.original.keys().unwrap_or_default();
        keys.extend(self.backing.borrow().keys().cloned());
        Ok(keys)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Override,
    Delegate,
}

/// Host object overlaying overrides on an original object
pub struct MockObjectView {
    overrides: OverrideStore,
    delegate: DelegateStore,
}

impl MockObjectView {
    pub fn new(original: Value, overrides: Value) -> Self {
        Self {
            overrides: OverrideStore::new(overrides),
            delegate: DelegateStore::new(original),
        }
    }

    fn route(&self, key: &str) -> Route {
        if self.overrides.claims(key) {
            Route::Override
        } else {
            Route::Delegate
        }
    }

    fn store(&self, key: &str) -> &dyn PropertyStore {
        match self.route(key) {
            Route::Override => &self.overrides,
            Route::Delegate => &self.delegate,
        }
    }
}

impl PropertyStore for MockObjectView {
    fn get(&self, key: &str) -> Result<Value> {
        self.store(key).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.store(key).set(key, value)
    }

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.overrides.claims(key) || self.delegate.has(key)?)
    }

    /// Original keys, then backing keys, then override keys, without repeats
    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: IndexSet<String> = self.delegate.keys()?.into_iter().collect();
        keys.extend(self.overrides.keys().unwrap_or_default());
        Ok(keys.into_iter().collect())
    }
}

/// Overlay `overrides` on `original`.
///
/// A missing original yields the overrides (or an empty object); missing
/// overrides yield the original. Only when both exist is a view created.
pub fn create_mock_obj(original: &Value, overrides: &Value) -> Value {
    match (original.is_nullish(), overrides.is_nullish()) {
        (true, true) => Value::new_object(),
        (true, false) => overrides.clone(),
        (false, true) => original.clone(),
        (false, false) => {
            Value::host(Rc::new(MockObjectView::new(original.clone(), overrides.clone())))
        }
    }
}
