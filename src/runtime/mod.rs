//! Value model for the embedded scripting runtime
//!
//! Test bodies, assertions and mocks all exchange [`Value`]s. Objects are
//! shared (`Rc<RefCell<..>>`) and single-threaded by design; host objects
//! route property access through a [`PropertyStore`].

mod value;

pub use value::{
    join_values, NativeFn, Object, ObjectKind, PropertyStore, Value, MAX_ARRAY_INDEX,
    MAX_DENSE_LENGTH,
};
