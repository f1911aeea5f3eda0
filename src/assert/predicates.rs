//! Assertion predicates
//!
//! Each predicate returns `Ok(())` when it holds, or the auto-generated
//! failure message. The façade decides whether a caller message replaces it.

use crate::runtime::{join_values, ObjectKind, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Outcome of a predicate before it is recorded
pub type Check = std::result::Result<(), String>;

const MAX_DEPTH: usize = 64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?|ftp)://[^\s/$.?#][^\s]*$").expect("valid url regex")
});
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-8][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("valid uuid regex")
});

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Check {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

/// Render a value for a failure message
pub fn describe(value: &Value) -> String {
    describe_at(value, &mut Vec::new())
}

/// `ancestors` holds the objects currently being rendered, so a cycle prints
/// as `[Circular]` instead of being expanded again
fn describe_at(value: &Value, ancestors: &mut Vec<usize>) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Object(obj) if ancestors.len() < MAX_DEPTH => {
            let id = Rc::as_ptr(obj) as usize;
            if ancestors.contains(&id) {
                return "[Circular]".to_string();
            }
            ancestors.push(id);
            let obj = obj.borrow();
            let rendered = match &obj.kind {
                ObjectKind::Array(items) => {
                    let items: Vec<String> =
                        items.iter().map(|v| describe_at(v, ancestors)).collect();
                    format!("[{}]", items.join(", "))
                }
                ObjectKind::Ordinary => {
                    let entries: Vec<String> = obj
                        .properties
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, describe_at(v, ancestors)))
                        .collect();
                    format!("{{{}}}", entries.join(", "))
                }
                _ => value.to_js_string(),
            };
            ancestors.pop();
            rendered
        }
        _ => value.to_js_string(),
    }
}

/// Structural equality: arrays element-wise, plain objects key-wise
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    deep_equals_at(a, b, 0, &mut FxHashSet::default())
}

/// `seen` holds every object pair already compared or in progress. A pair
/// met again is assumed equal; any real difference is found on its first
/// visit. This keeps cyclic graphs linear in the number of pairs.
fn deep_equals_at(
    a: &Value,
    b: &Value,
    depth: usize,
    seen: &mut FxHashSet<(usize, usize)>,
) -> bool {
    if a.strict_equals(b) {
        return true;
    }
    if depth >= MAX_DEPTH {
        return false;
    }
    match (a, b) {
        (Value::Object(rc_a), Value::Object(rc_b)) => {
            if !seen.insert((Rc::as_ptr(rc_a) as usize, Rc::as_ptr(rc_b) as usize)) {
                return true;
            }
            if a.is_callable() || b.is_callable() || a.is_array() != b.is_array() {
                return false;
            }
            let (Ok(keys_a), Ok(keys_b)) = (a.keys(), b.keys()) else {
                return false;
            };
            if keys_a.len() != keys_b.len() {
                return false;
            }
            keys_a.iter().all(|key| {
                matches!(b.has(key), Ok(true))
                    && match (a.get(key), b.get(key)) {
                        (Ok(x), Ok(y)) => deep_equals_at(&x, &y, depth + 1, seen),
                        _ => false,
                    }
            })
        }
        _ => false,
    }
}

fn number_arg(value: &Value, role: &str) -> std::result::Result<f64, String> {
    match value.as_number() {
        Some(n) if !n.is_nan() => Ok(n),
        _ => Err(format!("Expected {} to be a number but got {}", role, describe(value))),
    }
}

fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_finite() && n.fract() == 0.0)
}

fn string_arg<'a>(value: &'a Value, role: &str) -> std::result::Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Expected {} to be a string but got {}", role, describe(value)))
}

fn array_arg(value: &Value) -> std::result::Result<Vec<Value>, String> {
    if value.is_array() {
        value.iterable_values().ok_or_else(|| "Expected an array".to_string())
    } else {
        Err(format!("Expected array but got {}", describe(value)))
    }
}

// ---------------------------------------------------------------------------
// Boolean & equality
// ---------------------------------------------------------------------------

pub fn is_true(value: &Value) -> Check {
    ensure(value.strict_equals(&Value::Boolean(true)), || {
        format!("Expected true but got {}", describe(value))
    })
}

pub fn is_false(value: &Value) -> Check {
    ensure(value.strict_equals(&Value::Boolean(false)), || {
        format!("Expected false but got {}", describe(value))
    })
}

pub fn equal(value: &Value, expected: &Value) -> Check {
    ensure(value.strict_equals(expected), || {
        format!("Expected {} to equal {}", describe(value), describe(expected))
    })
}

/// Strict reference equality
pub fn eq(value: &Value, expected: &Value) -> Check {
    ensure(value.strict_equals(expected), || {
        format!(
            "Expected value {} to equal {} but it's not.",
            value.to_js_string(),
            expected.to_js_string()
        )
    })
}

/// Deep object equality; with `partial`, only the expected keys must match
pub fn object_equal(object: &Value, expected: &Value, partial: bool) -> Check {
    object_type(object)?;
    object_type(expected)?;
    let holds = if partial {
        match expected.keys() {
            Ok(keys) => keys.iter().all(|key| match (object.get(key), expected.get(key)) {
                (Ok(actual), Ok(wanted)) => {
                    matches!(object.has(key), Ok(true)) && deep_equals(&actual, &wanted)
                }
                _ => false,
            }),
            Err(_) => false,
        }
    } else {
        deep_equals(object, expected)
    };
    ensure(holds, || {
        format!("Expected object {} to equal {}", describe(object), describe(expected))
    })
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub fn integer(value: &Value) -> Check {
    ensure(is_integer(value), || format!("Expected integer but got {}", describe(value)))
}

pub fn number(value: &Value) -> Check {
    ensure(value.type_of() == "number", || {
        format!("Expected number but got {}", value.type_of())
    })
}

pub fn string(value: &Value) -> Check {
    ensure(value.type_of() == "string", || {
        format!("Expected string but got {}", value.type_of())
    })
}

pub fn boolean(value: &Value) -> Check {
    ensure(value.type_of() == "boolean", || {
        format!("Expected boolean but got {}", value.type_of())
    })
}

fn object_type(value: &Value) -> Check {
    ensure(value.type_of() == "object" && !value.is_null(), || {
        format!("Expected object but got {}", describe(value))
    })
}

/// Non-null, non-function object (arrays included)
pub fn object(value: &Value) -> Check {
    object_type(value)
}

pub fn array(value: &Value) -> Check {
    ensure(value.is_array(), || format!("Expected array but got {}", describe(value)))
}

pub fn is_function(value: &Value) -> Check {
    ensure(value.is_callable(), || {
        format!("Expected function but got {}", value.type_of())
    })
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

pub fn has_function(name: &str, object: &Value) -> Check {
    let found = object.get(name).map(|v| v.is_callable()).unwrap_or(false);
    ensure(found, || format!("Expected object to have function \"{}\"", name))
}

pub fn has_property(name: &str, object: &Value) -> Check {
    let found = object.has(name).unwrap_or(false);
    ensure(found, || format!("Expected object to have property \"{}\"", name))
}

pub fn has_properties(names: &[String], object: &Value) -> Check {
    let missing: Vec<&str> = names
        .iter()
        .filter(|name| !object.has(name).unwrap_or(false))
        .map(String::as_str)
        .collect();
    ensure(missing.is_empty(), || {
        format!("Expected object to have properties [{}]", missing.join(", "))
    })
}

pub fn one_of(value: &Value, candidates: &[Value]) -> Check {
    ensure(candidates.iter().any(|c| c.strict_equals(value)), || {
        format!(
            "Expected {} to be one of {}",
            describe(value),
            describe(&Value::array(candidates.to_vec()))
        )
    })
}

// ---------------------------------------------------------------------------
// Range & comparison (bound first, then the checked value)
// ---------------------------------------------------------------------------

pub fn greater_than(expected: &Value, value: &Value) -> Check {
    let (bound, actual) = (number_arg(expected, "bound")?, number_arg(value, "value")?);
    ensure(actual > bound, || format!("Expected {} to be greater than {}", actual, bound))
}

pub fn greater_than_or_equal(expected: &Value, value: &Value) -> Check {
    let (bound, actual) = (number_arg(expected, "bound")?, number_arg(value, "value")?);
    ensure(actual >= bound, || {
        format!("Expected {} to be greater than or equal to {}", actual, bound)
    })
}

pub fn less_than(expected: &Value, value: &Value) -> Check {
    let (bound, actual) = (number_arg(expected, "bound")?, number_arg(value, "value")?);
    ensure(actual < bound, || format!("Expected {} to be less than {}", actual, bound))
}

pub fn less_than_or_equal(expected: &Value, value: &Value) -> Check {
    let (bound, actual) = (number_arg(expected, "bound")?, number_arg(value, "value")?);
    ensure(actual <= bound, || {
        format!("Expected {} to be less than or equal to {}", actual, bound)
    })
}

/// Inclusive on both ends
pub fn between(min: &Value, max: &Value, value: &Value) -> Check {
    greater_than_or_equal(min, value)?;
    less_than_or_equal(max, value)
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

fn contains_only(value: &Value, kind: &str, accepts: fn(&Value) -> bool) -> Check {
    let items = array_arg(value)?;
    match items.iter().position(|item| !accepts(item)) {
        None => Ok(()),
        Some(idx) => Err(format!(
            "Expected array to contain only {} values, but element at index {} is {}",
            kind,
            idx,
            describe(&items[idx])
        )),
    }
}

pub fn contains_only_string(value: &Value) -> Check {
    contains_only(value, "string", |v| v.type_of() == "string")
}

pub fn contains_only_integer(value: &Value) -> Check {
    contains_only(value, "integer", is_integer)
}

pub fn contains_only_number(value: &Value) -> Check {
    contains_only(value, "number", |v| v.type_of() == "number")
}

pub fn count(expected: &Value, value: &Value) -> Check {
    let wanted = number_arg(expected, "expected count")?;
    let items = array_arg(value)?;
    ensure(items.len() as f64 == wanted, || {
        format!("Expected array to have {} elements but it has {}", wanted, items.len())
    })
}

pub fn not_empty(value: &Value) -> Check {
    match value.length() {
        Some(len) => ensure(len > 0, || "Expected value to not be empty".to_string()),
        None => Err(format!("Expected a value with a length but got {}", describe(value))),
    }
}

/// Both operands must be iterable; compare length, then each element by identity
pub fn collection_equal(first: &Value, second: &Value) -> Check {
    let a = first
        .iterable_values()
        .ok_or_else(|| format!("First argument is not iterable: {}", first.to_js_string()))?;
    let b = second
        .iterable_values()
        .ok_or_else(|| format!("Second argument is not iterable: {}", second.to_js_string()))?;

    if a.len() != b.len() {
        return Err(format!(
            "Collections have different lengths:\n  \
             Collection 1 (length {}): [{}]\n  \
             Collection 2 (length {}): [{}]",
            a.len(),
            join_values(&a, ", "),
            b.len(),
            join_values(&b, ", ")
        ));
    }

    match a.iter().zip(&b).position(|(x, y)| !x.strict_equals(y)) {
        None => Ok(()),
        Some(idx) => Err(format!(
            "Collections differ first at index {}:\n  \
             Collection 1: [{}]\n  \
             Collection 2: [{}]\n  \
             At index {}: {} !== {}",
            idx,
            join_values(&a, ", "),
            join_values(&b, ", "),
            idx,
            a[idx].to_js_string(),
            b[idx].to_js_string()
        )),
    }
}

// ---------------------------------------------------------------------------
// Numeric
// ---------------------------------------------------------------------------

pub fn odd_number(value: &Value) -> Check {
    integer(value)?;
    let n = value.to_number();
    ensure(n.rem_euclid(2.0) == 1.0, || format!("Expected odd number but got {}", n))
}

pub fn even_number(value: &Value) -> Check {
    integer(value)?;
    let n = value.to_number();
    ensure(n.rem_euclid(2.0) == 0.0, || format!("Expected even number but got {}", n))
}

// ---------------------------------------------------------------------------
// String formats
// ---------------------------------------------------------------------------

pub fn json_string(value: &Value) -> Check {
    let s = string_arg(value, "value")?;
    ensure(serde_json::from_str::<serde_json::Value>(s).is_ok(), || {
        format!("Expected valid JSON string but got \"{}\"", s)
    })
}

pub fn email(value: &Value) -> Check {
    let s = string_arg(value, "value")?;
    ensure(EMAIL_RE.is_match(s), || format!("Expected valid email but got \"{}\"", s))
}

pub fn url(value: &Value) -> Check {
    let s = string_arg(value, "value")?;
    ensure(URL_RE.is_match(s), || format!("Expected valid url but got \"{}\"", s))
}

pub fn uuid(value: &Value) -> Check {
    let s = string_arg(value, "value")?;
    ensure(UUID_RE.is_match(s), || format!("Expected valid UUID but got \"{}\"", s))
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// The callback must fail; with `expected`, its message must contain it
pub fn throws<T>(result: crate::Result<T>, expected: Option<&str>) -> Check {
    match (result, expected) {
        (Ok(_), _) => Err("Expected callback to throw an error".to_string()),
        (Err(_), None) => Ok(()),
        (Err(err), Some(wanted)) => {
            let message = err.to_string();
            ensure(message.contains(wanted), || {
                format!("Expected error \"{}\" but got \"{}\"", wanted, message)
            })
        }
    }
}
