//! Relations, oracles and calls — the three kinds of predicate symbol a
//! formula can be built over.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::formula::Formula;
use crate::term::Arg;
use crate::value::Value;

/// A deductive relation, identified by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Relation(Rc<str>);

impl Relation {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Relation(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn of(&self, args: Vec<Arg>) -> Formula {
        Formula::new(Symbol::Relation(self.clone()), args)
    }
}

/// What a `Call`'s side-effecting host function produced this invocation.
///
/// A `Unit` return appends a single unit placeholder rather than an empty
/// tail, so the resulting I/O fact's arity still reflects "one return value".
pub enum CallReturn {
    Unit,
    Single(Value),
    Tuple(Vec<Value>),
}

impl From<()> for CallReturn {
    fn from(_: ()) -> Self {
        CallReturn::Unit
    }
}

impl From<Value> for CallReturn {
    fn from(v: Value) -> Self {
        CallReturn::Single(v)
    }
}

impl From<Vec<Value>> for CallReturn {
    fn from(v: Vec<Value>) -> Self {
        CallReturn::Tuple(v)
    }
}

impl CallReturn {
    pub fn into_tail(self) -> Vec<Value> {
        match self {
            CallReturn::Unit => vec![Value::Unit],
            CallReturn::Single(v) => vec![v],
            CallReturn::Tuple(vs) => vs,
        }
    }
}

type OracleFn = dyn Fn(&[Value]) -> bool;
type CallFn = dyn Fn(&[Value]) -> CallReturn;

enum OracleInner {
    Native(Box<OracleFn>),
    Named(String),
}

/// A pure, synchronous predicate (or comparator) over `Value`s.
///
/// Identity: two `Oracle`s wrapping the same host closure (by reference)
/// are the same symbol; two wrapping equal *names* are the same symbol;
/// a native wrapper and a named wrapper are always distinct.
#[derive(Clone)]
pub struct Oracle(Rc<OracleInner>);

impl Oracle {
    pub fn of(&self, args: Vec<Arg>) -> Formula {
        Formula::new(Symbol::Oracle(self.clone()), args)
    }

    pub fn label(&self) -> &str {
        match &*self.0 {
            OracleInner::Named(name) => name,
            OracleInner::Native(_) => "<native>",
        }
    }

    pub(crate) fn call(&self, args: &[Value], resolved: Option<&Rc<OracleFn>>) -> Result<bool, String> {
        let invoke_native = |f: &dyn Fn(&[Value]) -> bool| {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(args))).map_err(panic_message)
        };
        match (&*self.0, resolved) {
            (_, Some(f)) => invoke_native(f.as_ref()),
            (OracleInner::Native(f), None) => invoke_native(f.as_ref()),
            (OracleInner::Named(name), None) => {
                tracing::warn!(oracle = name.as_str(), "named oracle has no resolution for this run");
                Err(format!("unresolved named oracle '{name}'"))
            }
        }
    }
}

impl fmt::Debug for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            OracleInner::Native(_) => write!(f, "Oracle(<native>)"),
            OracleInner::Named(n) => write!(f, "Oracle({n:?})"),
        }
    }
}

impl PartialEq for Oracle {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (OracleInner::Native(_), OracleInner::Native(_)) => Rc::ptr_eq(&self.0, &other.0),
            (OracleInner::Named(a), OracleInner::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Oracle {}

impl Hash for Oracle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.0 {
            OracleInner::Native(_) => (Rc::as_ptr(&self.0) as *const () as usize).hash(state),
            OracleInner::Named(n) => n.hash(state),
        }
    }
}

pub fn oracle(f: impl Fn(&[Value]) -> bool + 'static) -> Oracle {
    Oracle(Rc::new(OracleInner::Native(Box::new(f))))
}

pub fn oracle_named(name: impl Into<String>) -> Oracle {
    Oracle(Rc::new(OracleInner::Named(name.into())))
}

enum CallInner {
    Native(Box<CallFn>),
    Named(String),
}

/// An effectful host function, invoked only while evaluating NEXT rules.
///
/// Identity follows the same rule as `Oracle`: native closures compare by
/// reference, named calls compare by name.
#[derive(Clone)]
pub struct Call(Rc<CallInner>);

impl Call {
    pub fn of(&self, args: Vec<Arg>) -> Formula {
        Formula::new(Symbol::Call(self.clone()), args)
    }

    pub fn label(&self) -> String {
        match &*self.0 {
            CallInner::Native(_) => "<native>".to_string(),
            CallInner::Named(name) => name.clone(),
        }
    }

    pub(crate) fn resolution_key(&self) -> Option<&str> {
        match &*self.0 {
            CallInner::Native(_) => None,
            CallInner::Named(name) => Some(name),
        }
    }

    pub(crate) fn invoke(
        &self,
        args: &[Value],
        resolved: Option<&Rc<CallFn>>,
    ) -> Result<CallReturn, String> {
        let invoke_native = |f: &dyn Fn(&[Value]) -> CallReturn| {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(args)))
                .map_err(|payload| panic_message(payload))
        };
        match (&*self.0, resolved) {
            (_, Some(f)) => invoke_native(f.as_ref()),
            (CallInner::Native(f), None) => invoke_native(f.as_ref()),
            (CallInner::Named(name), None) => Err(format!("unresolved named call '{name}'")),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "call panicked with a non-string payload".to_string()
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            CallInner::Native(_) => write!(f, "Call(<native>)"),
            CallInner::Named(n) => write!(f, "Call({n:?})"),
        }
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (CallInner::Native(_), CallInner::Native(_)) => Rc::ptr_eq(&self.0, &other.0),
            (CallInner::Named(a), CallInner::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Call {}

impl Hash for Call {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.0 {
            CallInner::Native(_) => (Rc::as_ptr(&self.0) as *const () as usize).hash(state),
            CallInner::Named(n) => n.hash(state),
        }
    }
}

pub fn call(f: impl Fn(&[Value]) -> CallReturn + 'static) -> Call {
    Call(Rc::new(CallInner::Native(Box::new(f))))
}

pub fn call_named(name: impl Into<String>) -> Call {
    Call(Rc::new(CallInner::Named(name.into())))
}

/// The three kinds of predicate symbol a `Formula` can carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Relation(Relation),
    Oracle(Oracle),
    Call(Call),
}

impl Symbol {
    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Symbol::Relation(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Symbol::Call(c) => Some(c),
            _ => None,
        }
    }
}
