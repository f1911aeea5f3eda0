//! Script value types
//!
//! This module defines the runtime representation of values that flow
//! between test bodies, assertions and mocks.

use crate::error::{messages, Error, Result};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Type alias for native function implementations.
///
/// The first argument is the receiver (`this`) the function was invoked on.
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value>>;

/// Capability interface for property access on an object.
///
/// Host objects implement this to take over `get`/`set`/`has`/`keys` for a
/// value. Any of the four may fail, the same way a host accessor can throw.
pub trait PropertyStore {
    /// Read a property; missing keys read as `undefined`
    fn get(&self, key: &str) -> Result<Value>;
    /// Write a property
    fn set(&self, key: &str, value: Value) -> Result<()>;
    /// Membership test (`key in obj`)
    fn has(&self, key: &str) -> Result<bool>;
    /// Enumerable own keys, in insertion order
    fn keys(&self) -> Result<Vec<String>>;
}

/// A script value
#[derive(Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object (includes arrays, functions and host objects)
    Object(Rc<RefCell<Object>>),
}

impl Value {
    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is nullish (null or undefined)
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value can be called
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Function { .. }),
            _ => false,
        }
    }

    /// Check if value is an array
    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Array(_)),
            _ => false,
        }
    }

    /// Check if value is a host object backed by a [`PropertyStore`]
    pub fn is_host(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Host(_)),
            _ => false,
        }
    }

    /// Convert to boolean (truthiness)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Convert to number
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Object(_) => f64::NAN,
        }
    }

    /// The number inside, without coercion
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string inside, without coercion
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to the script string representation
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(true) => "true".to_string(),
            Value::Boolean(false) => "false".to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Array(arr) => join_values(arr, ","),
                    ObjectKind::Function { name, .. } => format!("[Function: {}]", name),
                    ObjectKind::Ordinary | ObjectKind::Host(_) => "[object Object]".to_string(),
                }
            }
        }
    }

    /// Get the typeof string
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // Historical quirk
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) => match obj.borrow().kind {
                ObjectKind::Function { .. } => "function",
                _ => "object",
            },
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN never equals itself; f64 comparison already gives that
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Create a new empty object value
    pub fn new_object() -> Value {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Ordinary))))
    }

    /// Create an object value from `(key, value)` pairs
    pub fn object<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut object = Object::new(ObjectKind::Ordinary);
        for (key, value) in entries {
            object.properties.insert(key.into(), value.into());
        }
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// Create a new array value
    pub fn array<I, V>(elements: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let elements = elements.into_iter().map(Into::into).collect();
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Array(elements)))))
    }

    /// Create a native function value
    pub fn function<F>(name: impl Into<String>, func: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Function {
            name: name.into(),
            func: Rc::new(func),
        }))))
    }

    /// Wrap a [`PropertyStore`] as a host object value
    pub fn host(store: Rc<dyn PropertyStore>) -> Value {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Host(store)))))
    }

    /// Values produced by iterating this value, if it is iterable.
    ///
    /// Arrays yield their elements, strings yield one-character strings.
    pub fn iterable_values(&self) -> Option<Vec<Value>> {
        match self {
            Value::String(s) => Some(s.chars().map(|c| Value::String(c.to_string())).collect()),
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Array(arr) => Some(arr.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The `length` of a string, array or length-bearing object
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Object(_) => match self.get("length") {
                Ok(Value::Number(n)) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
                _ => None,
            },
            _ => None,
        }
    }

    /// Read a property
    pub fn get(&self, key: &str) -> Result<Value> {
        match self {
            Value::Undefined | Value::Null => Err(Error::type_error(
                messages::cannot_read_property(key, &self.to_js_string()),
            )),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                Ok(parse_index(key)
                    .and_then(|idx| s.chars().nth(idx))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined))
            }
            Value::Boolean(_) | Value::Number(_) => Ok(Value::Undefined),
            Value::Object(obj) => match host_store(obj) {
                Some(store) => store.get(key),
                None => Ok(obj.borrow().get_own(key).unwrap_or(Value::Undefined)),
            },
        }
    }

    /// Write a property
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        match self {
            Value::Undefined | Value::Null => Err(Error::type_error(
                messages::cannot_set_property(key, &self.to_js_string()),
            )),
            // Writes to primitives are silently dropped
            Value::Boolean(_) | Value::Number(_) | Value::String(_) => Ok(()),
            Value::Object(obj) => match host_store(obj) {
                Some(store) => store.set(key, value),
                None => obj.borrow_mut().set_own(key, value),
            },
        }
    }

    /// Membership test (`key in value`)
    pub fn has(&self, key: &str) -> Result<bool> {
        match self {
            Value::Object(obj) => match host_store(obj) {
                Some(store) => store.has(key),
                None => Ok(obj.borrow().get_own(key).is_some()),
            },
            _ => Err(Error::type_error(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key,
                self.to_js_string()
            ))),
        }
    }

    /// Enumerable own keys
    pub fn keys(&self) -> Result<Vec<String>> {
        match self {
            Value::Undefined | Value::Null => Err(Error::type_error(
                "Cannot convert undefined or null to object",
            )),
            Value::String(s) => Ok((0..s.chars().count()).map(|i| i.to_string()).collect()),
            Value::Boolean(_) | Value::Number(_) => Ok(Vec::new()),
            Value::Object(obj) => match host_store(obj) {
                Some(store) => store.keys(),
                None => Ok(obj.borrow().own_keys()),
            },
        }
    }

    /// Call this value as a function with an explicit receiver
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        let func = match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Function { func, .. } => Some(Rc::clone(func)),
                _ => None,
            },
            _ => None,
        };
        match func {
            // The borrow is released before the call so the function may
            // touch its own object
            Some(func) => func(this, args),
            None => Err(Error::type_error(messages::not_a_function(
                &self.to_js_string(),
            ))),
        }
    }

    /// Read `key` and call it with this value as the receiver
    pub fn call_method(&self, key: &str, args: &[Value]) -> Result<Value> {
        let method = self.get(key)?;
        if !method.is_callable() {
            return Err(Error::type_error(messages::not_a_function(key)));
        }
        method.call(self, args)
    }
}

/// The store behind a host object.
///
/// Cloned out so the object's borrow is released before the store runs.
fn host_store(obj: &Rc<RefCell<Object>>) -> Option<Rc<dyn PropertyStore>> {
    match &obj.borrow().kind {
        ObjectKind::Host(store) => Some(Rc::clone(store)),
        _ => None,
    }
}

/// Join values the way `Array.prototype.join` does
pub fn join_values(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
        .collect::<Vec<_>>()
        .join(separator)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Largest array index (2^32 - 2); larger numeric keys are plain properties
pub const MAX_ARRAY_INDEX: u64 = u32::MAX as u64 - 1;

/// Arrays are stored densely, so writes may not grow them past this length
pub const MAX_DENSE_LENGTH: usize = 1 << 24;

fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    let idx = key.parse::<u64>().ok().filter(|idx| *idx <= MAX_ARRAY_INDEX)?;
    usize::try_from(idx).ok()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Ordinary => {
                        let mut map = f.debug_map();
                        for (k, v) in &obj.properties {
                            map.entry(k, v);
                        }
                        map.finish()
                    }
                    ObjectKind::Array(arr) => write!(f, "{:?}", arr),
                    ObjectKind::Function { name, .. } => write!(f, "[Function: {}]", name),
                    ObjectKind::Host(_) => write!(f, "[Host]"),
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}

/// Script object
pub struct Object {
    /// Object kind
    pub kind: ObjectKind,
    /// Own properties, in insertion order
    pub properties: IndexMap<String, Value>,
}

impl Object {
    /// Create an object of the given kind with no properties
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
        }
    }

    /// Get an own property, including the virtual `length`/index/`name` slots
    pub fn get_own(&self, key: &str) -> Option<Value> {
        match &self.kind {
            ObjectKind::Array(arr) => {
                if key == "length" {
                    return Some(Value::Number(arr.len() as f64));
                }
                if let Some(idx) = parse_index(key) {
                    return arr.get(idx).cloned();
                }
            }
            ObjectKind::Function { name, .. } => {
                if key == "name" && !self.properties.contains_key(key) {
                    return Some(Value::String(name.clone()));
                }
            }
            ObjectKind::Ordinary | ObjectKind::Host(_) => {}
        }
        self.properties.get(key).cloned()
    }

    /// Set an own property; array indices write into the element list.
    ///
    /// Fails with a RangeError when the write would grow an array past
    /// [`MAX_DENSE_LENGTH`].
    pub fn set_own(&mut self, key: &str, value: Value) -> Result<()> {
        if let ObjectKind::Array(arr) = &mut self.kind {
            if let Some(idx) = parse_index(key) {
                if idx >= arr.len() {
                    let len = idx
                        .checked_add(1)
                        .filter(|len| *len <= MAX_DENSE_LENGTH)
                        .ok_or_else(|| Error::range_error("Invalid array length"))?;
                    arr.resize(len, Value::Undefined);
                }
                arr[idx] = value;
                return Ok(());
            }
        }
        self.properties.insert(key.to_string(), value);
        Ok(())
    }

    /// Enumerable own keys
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let ObjectKind::Array(arr) = &self.kind {
            keys.extend((0..arr.len()).map(|i| i.to_string()));
        }
        keys.extend(self.properties.keys().cloned());
        keys
    }
}

/// Object kinds
pub enum ObjectKind {
    /// Ordinary object
    Ordinary,
    /// Array object
    Array(Vec<Value>),
    /// Native function
    Function { name: String, func: NativeFn },
    /// Host object whose properties are served by a store
    Host(Rc<dyn PropertyStore>),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::array(elements)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Undefined)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}
