//! Name → host-callable resolution, merged at both construction and run
//! time (§4.9).

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::symbol::{CallReturn, Oracle};
use crate::value::Value;

type OracleFn = dyn Fn(&[Value]) -> bool;
type CallFn = dyn Fn(&[Value]) -> CallReturn;

/// A table from symbol name to the callable it should resolve to. Entries
/// only matter for `Named` oracles/calls — a native closure is already its
/// own resolution and never consults this table.
#[derive(Clone, Default)]
pub struct FnMapping {
    oracles: FxHashMap<String, Rc<OracleFn>>,
    calls: FxHashMap<String, Rc<CallFn>>,
}

impl FnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_oracle(&mut self, name: impl Into<String>, f: impl Fn(&[Value]) -> bool + 'static) {
        self.oracles.insert(name.into(), Rc::new(f));
    }

    pub fn insert_call(&mut self, name: impl Into<String>, f: impl Fn(&[Value]) -> CallReturn + 'static) {
        self.calls.insert(name.into(), Rc::new(f));
    }

    /// Merge `overrides` on top of `self`; entries in `overrides` win,
    /// matching `{**construction_map, **run_map}` precedence.
    pub fn merge(&self, overrides: &FnMapping) -> FnMapping {
        let mut oracles = self.oracles.clone();
        oracles.extend(overrides.oracles.clone());
        let mut calls = self.calls.clone();
        calls.extend(overrides.calls.clone());
        FnMapping { oracles, calls }
    }

    pub(crate) fn resolve_oracle(&self, oracle: &Oracle) -> Option<Rc<OracleFn>> {
        self.oracles.get(oracle.label()).cloned()
    }

    pub(crate) fn resolve_call(&self, name: &str) -> Option<Rc<CallFn>> {
        self.calls.get(name).cloned()
    }

    /// Point two names at the very same host closure, the way a host can
    /// register one implementation under several symbolic names.
    #[cfg(test)]
    pub(crate) fn alias_calls(&mut self, a: impl Into<String>, b: impl Into<String>, f: impl Fn(&[Value]) -> CallReturn + 'static) {
        let rc: Rc<CallFn> = Rc::new(f);
        self.calls.insert(a.into(), rc.clone());
        self.calls.insert(b.into(), rc);
    }
}
