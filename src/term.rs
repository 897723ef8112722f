//! Variables, wildcards and the generic argument slot (`Arg`) that formulas
//! are built from.

use std::rc::Rc;

use crate::formula::Literal;
use crate::symbol::{oracle, Oracle};
use crate::value::Value;

/// A named logic variable. Two variables are equal iff their names are equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(Rc<str>);

impl Variable {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// `self < value`, as an oracle literal.
    pub fn lt(&self, value: impl Into<Value>) -> Literal {
        comparator_literal("lt", |a, b| a.partial_cmp_value(b) == Some(std::cmp::Ordering::Less), self, value)
    }

    pub fn le(&self, value: impl Into<Value>) -> Literal {
        comparator_literal(
            "le",
            |a, b| matches!(a.partial_cmp_value(b), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)),
            self,
            value,
        )
    }

    pub fn eq(&self, value: impl Into<Value>) -> Literal {
        comparator_literal("eq", |a, b| a == b, self, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> Literal {
        comparator_literal("ne", |a, b| a != b, self, value)
    }

    pub fn ge(&self, value: impl Into<Value>) -> Literal {
        comparator_literal(
            "ge",
            |a, b| matches!(a.partial_cmp_value(b), Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)),
            self,
            value,
        )
    }

    pub fn gt(&self, value: impl Into<Value>) -> Literal {
        comparator_literal("gt", |a, b| a.partial_cmp_value(b) == Some(std::cmp::Ordering::Greater), self, value)
    }
}

fn comparator_literal(
    label: &'static str,
    cmp: impl Fn(&Value, &Value) -> bool + 'static,
    var: &Variable,
    value: impl Into<Value>,
) -> Literal {
    let value = value.into();
    let op: Oracle = oracle(move |args: &[Value]| cmp(&args[0], &args[1]));
    let _ = label;
    op.of(vec![Arg::Var(var.clone()), Arg::Value(value)]).into()
}

/// Placeholder for "match anything here, bind nothing". Never appears in a
/// rule head (see range restriction, §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Wildcard;

pub fn any() -> Arg {
    Arg::Any
}

/// A single argument slot in a formula: a concrete value, a variable to bind
/// or read, or a wildcard.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arg {
    Value(Value),
    Var(Variable),
    Any,
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<Variable> for Arg {
    fn from(v: Variable) -> Self {
        Arg::Var(v)
    }
}

impl From<Wildcard> for Arg {
    fn from(_: Wildcard) -> Self {
        Arg::Any
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Value(Value::Int(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Value(Value::from(v))
    }
}
