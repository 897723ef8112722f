//! The match engine: enumerating substitutions for a literal or a whole
//! conjunction against the current model (§4.6).

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::fact::Model;
use crate::fnmapping::FnMapping;
use crate::formula::{Conjunction, Formula, Literal};
use crate::symbol::Symbol;
use crate::term::{Arg, Variable};
use crate::value::Value;
use crate::TickError;

/// A binding from variable to value, extension-only within a single match
/// attempt: once bound, a variable is never rebound to a different value.
#[derive(Clone, Debug, Default)]
pub struct Substitution(FxHashMap<Variable, Value>);

impl Substitution {
    pub fn get(&self, var: &Variable) -> Option<&Value> {
        self.0.get(var)
    }

    pub fn insert(&mut self, var: Variable, value: Value) {
        self.0.insert(var, value);
    }

    /// Try to extend `self` with `var = value`, failing if `var` is already
    /// bound to something else.
    fn try_extend(&self, var: &Variable, value: &Value) -> Option<Substitution> {
        if let Some(existing) = self.0.get(var) {
            if existing != value {
                return None;
            }
            return Some(self.clone());
        }
        let mut next = self.clone();
        next.0.insert(var.clone(), value.clone());
        Some(next)
    }

    fn merge(&self, local: FxHashMap<Variable, Value>) -> Option<Substitution> {
        let mut result = self.clone();
        for (k, v) in local {
            if let Some(existing) = result.0.get(&k) {
                if existing != &v {
                    return None;
                }
            } else {
                result.0.insert(k, v);
            }
        }
        Some(result)
    }
}

impl PartialEq for Substitution {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|(k, v)| other.0.get(k) == Some(v))
    }
}

impl Eq for Substitution {}

impl Hash for Substitution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.len().hash(state);
        for (k, v) in entries {
            k.hash(state);
            v.hash(state);
        }
    }
}

/// Enumerate every substitution extending `base` that matches `formula`
/// positively against the facts stored for its symbol.
fn match_positive(formula: &Formula, model: &Model, base: &Substitution) -> Vec<Substitution> {
    model
        .facts_for(&formula.symbol)
        .filter(|fact_args| fact_args.len() == formula.args.len())
        .filter_map(|fact_args| {
            let mut local: FxHashMap<Variable, Value> = FxHashMap::default();
            for (pat, val) in formula.args.iter().zip(fact_args.iter()) {
                match pat {
                    Arg::Any => continue,
                    Arg::Value(pv) => {
                        if pv != val {
                            return None;
                        }
                    }
                    Arg::Var(v) => {
                        if let Some(existing) = local.get(v) {
                            if existing != val {
                                return None;
                            }
                        } else {
                            local.insert(v.clone(), val.clone());
                        }
                    }
                }
            }
            base.merge(local)
        })
        .collect()
}

/// Negated match: passes with `base` unchanged iff no fact matches the
/// formula once already-bound variables are substituted in.
fn match_negative(formula: &Formula, model: &Model, base: &Substitution) -> Vec<Substitution> {
    let grounded = formula.substitute(base);
    if match_positive(&grounded, model, &Substitution::default()).is_empty() {
        vec![base.clone()]
    } else {
        vec![]
    }
}

fn match_oracle(formula: &Formula, base: &Substitution, negate: bool, fnmapping: &FnMapping) -> Result<Vec<Substitution>, TickError> {
    let grounded = formula.substitute(base);
    let mut values = Vec::with_capacity(grounded.args.len());
    for a in &grounded.args {
        match a {
            Arg::Value(v) => values.push(v.clone()),
            Arg::Var(_) | Arg::Any => return Ok(vec![]),
        }
    }
    let Some(oracle_symbol) = (match &formula.symbol {
        crate::symbol::Symbol::Oracle(o) => Some(o),
        _ => None,
    }) else {
        return Ok(vec![]);
    };
    let resolved = fnmapping.resolve_oracle(oracle_symbol);
    let outcome = oracle_symbol
        .call(&values, resolved.as_ref())
        .map_err(|message| TickError::OracleFailed {
            symbol: oracle_symbol.label().to_string(),
            message,
        })?;
    if outcome != negate {
        Ok(vec![base.clone()])
    } else {
        Ok(vec![])
    }
}

/// Two call/oracle symbols are the same fact-producer if they're the same
/// `Symbol`, or if both are `Call`s that resolve (via `fnmapping`) to the
/// same host closure — mirroring `fnmapping.get(rel, rel)` comparisons on
/// both sides of a match in the system this evaluator is based on.
fn symbols_match_for_calls(a: &Symbol, b: &Symbol, fnmapping: &FnMapping) -> bool {
    if a == b {
        return true;
    }
    let (Symbol::Call(ca), Symbol::Call(cb)) = (a, b) else {
        return false;
    };
    match (
        ca.resolution_key().and_then(|n| fnmapping.resolve_call(n)),
        cb.resolution_key().and_then(|n| fnmapping.resolve_call(n)),
    ) {
        (Some(fa), Some(fb)) => Rc::ptr_eq(&fa, &fb),
        _ => false,
    }
}

/// Like `match_positive`, but for `Call` literals: scans every fact in the
/// model rather than just those keyed under `formula.symbol`, since a call
/// whose symbol resolves through `fnmapping` to the same closure as a
/// differently-named stored fact must still unify with it.
fn match_call_positive(formula: &Formula, model: &Model, base: &Substitution, fnmapping: &FnMapping) -> Vec<Substitution> {
    model
        .iter()
        .filter(|fact| symbols_match_for_calls(&fact.symbol, &formula.symbol, fnmapping))
        .filter(|fact| fact.args.len() == formula.args.len())
        .filter_map(|fact| {
            let mut local: FxHashMap<Variable, Value> = FxHashMap::default();
            for (pat, val) in formula.args.iter().zip(fact.args.iter()) {
                match pat {
                    Arg::Any => continue,
                    Arg::Value(pv) => {
                        if pv != val {
                            return None;
                        }
                    }
                    Arg::Var(v) => {
                        if let Some(existing) = local.get(v) {
                            if existing != val {
                                return None;
                            }
                        } else {
                            local.insert(v.clone(), val.clone());
                        }
                    }
                }
            }
            base.merge(local)
        })
        .collect()
}

/// Negated match for a `Call` literal, fnmapping-aware in the same way as
/// `match_call_positive`.
fn match_call_negative(formula: &Formula, model: &Model, base: &Substitution, fnmapping: &FnMapping) -> Vec<Substitution> {
    let grounded = formula.substitute(base);
    if match_call_positive(&grounded, model, &Substitution::default(), fnmapping).is_empty() {
        vec![base.clone()]
    } else {
        vec![]
    }
}

/// Evaluate one literal, extending `base`. Oracle/Call evaluation can fail
/// (a panicking host function); everything else is infallible.
pub fn literal_substitutions(
    literal: &Literal,
    model: &Model,
    base: &Substitution,
    fnmapping: &FnMapping,
) -> Result<Vec<Substitution>, TickError> {
    Ok(match literal {
        Literal::Pos(f) => match_positive(f, model, base),
        Literal::Neg(f) => match_negative(f, model, base),
        Literal::CallLit(f) => match_call_positive(f, model, base, fnmapping),
        Literal::CallNeg(f) => match_call_negative(f, model, base, fnmapping),
        Literal::OraclePos(f) => match_oracle(f, base, false, fnmapping)?,
        Literal::OracleNeg(f) => match_oracle(f, base, true, fnmapping)?,
    })
}

impl Conjunction {
    /// All substitutions satisfying every literal, left to right, deduped.
    pub fn substitutions(&self, model: &Model, fnmapping: &FnMapping) -> Result<Vec<Substitution>, TickError> {
        let raw = self.substitutions_from(model, &Substitution::default(), fnmapping)?;
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for s in raw {
            if seen.insert(s.clone()) {
                out.push(s);
            }
        }
        Ok(out)
    }

    fn substitutions_from(
        &self,
        model: &Model,
        base: &Substitution,
        fnmapping: &FnMapping,
    ) -> Result<Vec<Substitution>, TickError> {
        match self.0.split_first() {
            None => Ok(vec![base.clone()]),
            Some((first, rest)) => {
                let mut out = Vec::new();
                for sigma in literal_substitutions(first, model, base, fnmapping)? {
                    let rest_conj = Conjunction(rest.to_vec());
                    out.extend(rest_conj.substitutions_from(model, &sigma, fnmapping)?);
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{Fact, FactArgs};
    use crate::formula::Conjoinable;
    use crate::symbol::{Relation, Symbol};

    #[test]
    fn positive_match_binds_variable() {
        let a = Relation::new("a");
        let x = Variable::new("X");
        let mut model = Model::new();
        model.insert(Fact {
            symbol: Symbol::Relation(a.clone()),
            args: FactArgs::from_vec(vec![Value::int(1)]),
        });
        let f = a.of(vec![x.clone().into()]);
        let subs = match_positive(&f, &model, &Substitution::default());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].get(&x), Some(&Value::int(1)));
    }

    #[test]
    fn negation_fails_when_fact_present() {
        let a = Relation::new("a");
        let mut model = Model::new();
        model.insert(Fact {
            symbol: Symbol::Relation(a.clone()),
            args: FactArgs::from_vec(vec![Value::int(1)]),
        });
        let lit = a.of(vec![Value::int(1).into()]).negate();
        let fnmapping = FnMapping::default();
        let subs = literal_substitutions(&lit, &model, &Substitution::default(), &fnmapping).unwrap();
        assert!(subs.is_empty());
    }

    #[test]
    fn call_literal_matches_differently_named_producer_sharing_a_resolution() {
        use crate::symbol::call_named;

        // Two names aliased to the very same host closure: a body literal
        // under one name must still unify with a fact produced under the
        // other, since they resolve to the same effective function.
        let mut fnmapping = FnMapping::new();
        fnmapping.alias_calls("sensor_a", "sensor_b", |_| crate::symbol::CallReturn::Unit);

        let mut model = Model::new();
        model.insert(Fact {
            symbol: Symbol::Call(call_named("sensor_a")),
            args: FactArgs::from_vec(vec![Value::int(1)]),
        });

        let aliased = call_named("sensor_b").of(vec![Value::int(1).into()]);
        let subs = match_call_positive(&aliased, &model, &Substitution::default(), &fnmapping);
        assert_eq!(subs.len(), 1);

        // An unrelated name, resolving to a different closure entirely,
        // must not unify.
        fnmapping.insert_call("unrelated", |_| crate::symbol::CallReturn::Unit);
        let unrelated = call_named("unrelated").of(vec![Value::int(1).into()]);
        let subs = match_call_positive(&unrelated, &model, &Substitution::default(), &fnmapping);
        assert!(subs.is_empty());
    }

    #[test]
    fn conjunction_dedups_substitutions() {
        let a = Relation::new("a");
        let b = Relation::new("b");
        let x = Variable::new("X");
        let mut model = Model::new();
        for (rel, v) in [(&a, 1), (&b, 1)] {
            model.insert(Fact {
                symbol: Symbol::Relation(rel.clone()),
                args: FactArgs::from_vec(vec![Value::int(v)]),
            });
        }
        let body = a.of(vec![x.clone().into()]).and(b.of(vec![x.into()]));
        let fnmapping = FnMapping::default();
        let subs = body.substitutions(&model, &fnmapping).unwrap();
        assert_eq!(subs.len(), 1);
    }
}
