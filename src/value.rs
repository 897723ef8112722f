//! Ground values that flow through facts, substitutions and oracle/call arguments.

use std::cmp::Ordering;
use std::rc::Rc;

/// An opaque, hashable, totally-comparable scalar.
///
/// `Value` has no notion of floating point: the evaluator's correctness
/// properties (deterministic fixpoints, fact-set dedup) rely on structural
/// equality and hashing, which IEEE floats don't give you for free.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    /// A symbolic/atom identifier, distinct from `Str` so `relation(:foo)`
    /// and `relation("foo")` don't accidentally unify.
    Atom(Rc<str>),
    /// An opaque host handle (pointer-sized token with no interpreted
    /// structure; e.g. a device descriptor passed through a Call).
    Handle(u64),
    /// The sentinel tail value appended to an I/O fact when the underlying
    /// Call returned a unit-like value (see §4.8 of the design).
    Unit,
}

impl Value {
    pub fn int(v: i64) -> Self {
        Value::Int(v)
    }

    pub fn str(v: impl Into<Rc<str>>) -> Self {
        Value::Str(v.into())
    }

    pub fn atom(v: impl Into<Rc<str>>) -> Self {
        Value::Atom(v.into())
    }

    pub fn handle(v: u64) -> Self {
        Value::Handle(v)
    }

    /// Partial order used by the comparator combinators (`<`, `<=`, ...).
    /// Values of different variants are incomparable (`None`), matching the
    /// host-agnostic comparator semantics: comparing a string to an int is
    /// simply false for every ordering predicate, never an error.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Atom(a), Value::Atom(b)) => a.partial_cmp(b),
            (Value::Handle(a), Value::Handle(b)) => a.partial_cmp(b),
            (Value::Unit, Value::Unit) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Rc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Rc::from(v))
    }
}
