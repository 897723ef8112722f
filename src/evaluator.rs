//! The tick loop (§4.7): per-tick fixpoint over "always" rules then each
//! stratum in order, followed by NEXT-rule evaluation producing the next
//! tick's model and any I/O facts.

use rustc_hash::FxHashSet;

use crate::error::TickError;
use crate::fact::{Fact, FactArgs, Model};
use crate::fnmapping::FnMapping;
use crate::matcher::Substitution;
use crate::program::Program;
use crate::rule::Rule;
use crate::symbol::Symbol;

/// What a completed tick produced: either just the I/O facts emitted by
/// `Call` heads, or (with `extended_state`) the full rolled-forward model
/// plus those same I/O facts.
#[derive(Clone, Debug, Default)]
pub struct Observation {
    pub io_facts: FxHashSet<Fact>,
    pub model: Option<Model>,
}

fn apply_layer(rules: &[Rule], model: &mut Model, fnmapping: &FnMapping) -> Result<(), TickError> {
    loop {
        let mut derived = Vec::new();
        for rule in rules {
            match &rule.body {
                None => {
                    if let Some(fact) = rule.head.formula.as_fact(&Substitution::default()) {
                        derived.push(fact);
                    }
                }
                Some(body) => {
                    for subst in body.substitutions(model, fnmapping)? {
                        if let Some(fact) = rule.head.formula.as_fact(&subst) {
                            derived.push(fact);
                        }
                    }
                }
            }
        }
        if !model.extend(derived) {
            break;
        }
    }
    Ok(())
}

fn invoke_next_rule(rule: &Rule, model: &Model, fnmapping: &FnMapping) -> Result<(Vec<Fact>, Vec<Fact>), TickError> {
    let mut relation_facts = Vec::new();
    let mut io_facts = Vec::new();

    let substitutions = match &rule.body {
        None => vec![Substitution::default()],
        Some(body) => body.substitutions(model, fnmapping)?,
    };

    // A call fires once per distinct *grounded head*, not once per body
    // substitution: several substitutions can project to the same call
    // args when a bound body variable doesn't appear in the head.
    let mut seen_calls: FxHashSet<FactArgs> = FxHashSet::default();

    for subst in substitutions {
        match &rule.head.formula.symbol {
            Symbol::Call(call) => {
                let grounded = rule.head.formula.substitute(&subst);
                let mut args = Vec::with_capacity(grounded.args.len());
                let mut fully_ground = true;
                for a in &grounded.args {
                    match a {
                        crate::term::Arg::Value(v) => args.push(v.clone()),
                        _ => {
                            fully_ground = false;
                            break;
                        }
                    }
                }
                if !fully_ground {
                    continue;
                }
                if !seen_calls.insert(FactArgs::from_vec(args.clone())) {
                    continue;
                }
                let resolved = call.resolution_key().and_then(|name| fnmapping.resolve_call(name));
                let outcome = call.invoke(&args, resolved.as_ref()).map_err(|message| TickError::CallFailed {
                    symbol: call.label(),
                    message,
                })?;
                let mut full_args = args;
                full_args.extend(outcome.into_tail());
                io_facts.push(Fact {
                    symbol: Symbol::Call(call.clone()),
                    args: smallvec::SmallVec::from_vec(full_args),
                });
            }
            Symbol::Relation(_) => {
                if let Some(fact) = rule.head.formula.as_fact(&subst) {
                    relation_facts.push(fact);
                }
            }
            Symbol::Oracle(_) => unreachable!("Program::new rejects oracle-headed rules"),
        }
    }

    Ok((relation_facts, io_facts))
}

/// Drives a `Program` one tick at a time. Implements `Iterator` so the host
/// can drive it lazily (`run_generator`) or let `run`/`run_cb` drain it.
pub struct TickIter<'p> {
    program: &'p Program,
    model: Model,
    fnmapping: FnMapping,
    ticks_remaining: Option<u64>,
    started: bool,
    extended_state: bool,
}

impl<'p> TickIter<'p> {
    pub(crate) fn new(program: &'p Program, cycles: Option<u64>, run_fnmapping: FnMapping, extended_state: bool) -> Self {
        TickIter {
            program,
            model: Model::new(),
            fnmapping: program.fnmapping.merge(&run_fnmapping),
            ticks_remaining: cycles,
            started: false,
            extended_state,
        }
    }
}

impl<'p> Iterator for TickIter<'p> {
    type Item = Result<Observation, TickError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ticks_remaining == Some(0) {
            return None;
        }

        if !self.started {
            self.started = true;
            for rule in &self.program.initial {
                if let Some(fact) = rule.head.formula.as_fact(&Substitution::default()) {
                    self.model.insert(fact);
                }
            }
        }

        if let Err(e) = apply_layer(&self.program.always, &mut self.model, &self.fnmapping) {
            return Some(Err(e));
        }
        for (i, stratum) in self.program.strata.iter().enumerate() {
            if let Err(e) = apply_layer(stratum, &mut self.model, &self.fnmapping) {
                return Some(Err(e));
            }
            tracing::trace!(stratum = i, "fixpoint reached");
        }

        let mut pending_next = Model::new();
        let mut pending_io = FxHashSet::default();
        for rule in &self.program.next {
            match invoke_next_rule(rule, &self.model, &self.fnmapping) {
                Ok((relation_facts, io_facts)) => {
                    pending_next.extend(relation_facts);
                    for f in io_facts {
                        pending_io.insert(f);
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }

        let observation = if self.extended_state {
            let mut full = self.model.clone();
            full.extend(pending_io.iter().cloned());
            Observation {
                io_facts: pending_io.clone(),
                model: Some(full),
            }
        } else {
            Observation {
                io_facts: pending_io.clone(),
                model: None,
            }
        };

        self.model = pending_next;
        self.model.extend(pending_io);

        if let Some(remaining) = &mut self.ticks_remaining {
            *remaining -= 1;
        }
        tracing::debug!(facts = self.model.len(), "tick complete");
        Some(Ok(observation))
    }
}

impl Program {
    /// Lazily drive the tick loop; the host controls how many ticks to
    /// pull and whether to observe the full rolled-forward model
    /// (`extended_state`) or just the I/O facts emitted this tick.
    pub fn run_generator(&self, cycles: Option<u64>, fnmapping: FnMapping, extended_state: bool) -> TickIter<'_> {
        TickIter::new(self, cycles, fnmapping, extended_state)
    }

    /// Drive every tick, invoking `cb` with each observation. Stops at the
    /// first `TickError`.
    pub fn run_cb(
        &self,
        cycles: Option<u64>,
        fnmapping: FnMapping,
        extended_state: bool,
        mut cb: impl FnMut(&Observation),
    ) -> Result<(), TickError> {
        for obs in self.run_generator(cycles, fnmapping, extended_state) {
            cb(&obs?);
        }
        Ok(())
    }

    /// Drive every tick, discarding observations; useful when only the
    /// side effects of `Call`s matter.
    pub fn run(&self, cycles: Option<u64>, fnmapping: FnMapping) -> Result<(), TickError> {
        for obs in self.run_generator(cycles, fnmapping, false) {
            obs?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::formula::{Conjoinable, HeadLike};
    use crate::symbol::Relation;
    use crate::term::Variable;
    use crate::value::Value;

    /// Transitive closure over `edge`, built directly against `apply_layer`
    /// rather than through `Program::new` — a plain Horn recursion with no
    /// negation, so it's a fixpoint regardless of the edges fed into it.
    fn transitive_closure_rules() -> (Vec<Rule>, Relation, Relation) {
        let edge = Relation::new("edge");
        let reachable = Relation::new("reachable");
        let x = Variable::new("X");
        let y = Variable::new("Y");
        let z = Variable::new("Z");

        let rules = vec![
            reachable
                .of(vec![x.clone().into(), y.clone().into()])
                .when(edge.of(vec![x.clone().into(), y.clone().into()])),
            reachable.of(vec![x.clone().into(), z.clone().into()]).when(
                edge.of(vec![x.clone().into(), y.clone().into()])
                    .and(reachable.of(vec![y.into(), z.into()])),
            ),
        ];
        (rules, edge, reachable)
    }

    fn model_of_edges(edge: &Relation, edges: &[(i64, i64)]) -> Model {
        let mut model = Model::new();
        for (a, b) in edges {
            model.insert(Fact {
                symbol: Symbol::Relation(edge.clone()),
                args: smallvec::smallvec![Value::int(*a), Value::int(*b)],
            });
        }
        model
    }

    proptest! {
        /// Applying a layer a second time after it has already converged
        /// derives nothing further: the model size is unchanged.
        #[test]
        fn fixpoint_is_idempotent(edges in prop::collection::vec((0i64..5, 0i64..5), 0..12)) {
            let (rules, edge, _reachable) = transitive_closure_rules();
            let fnmapping = FnMapping::new();
            let mut model = model_of_edges(&edge, &edges);

            apply_layer(&rules, &mut model, &fnmapping).unwrap();
            let first_len = model.len();
            apply_layer(&rules, &mut model, &fnmapping).unwrap();
            prop_assert_eq!(model.len(), first_len);
        }

        /// Adding more `edge` facts before reaching a fixpoint can only grow
        /// (never shrink) the derived `reachable` set: an "always" layer of
        /// positive Horn rules is monotone in its input facts.
        #[test]
        fn always_layer_is_monotone(
            base in prop::collection::vec((0i64..5, 0i64..5), 0..8),
            extra in prop::collection::vec((0i64..5, 0i64..5), 0..8),
        ) {
            let (rules, edge, reachable) = transitive_closure_rules();
            let fnmapping = FnMapping::new();

            let mut small = model_of_edges(&edge, &base);
            apply_layer(&rules, &mut small, &fnmapping).unwrap();

            let mut combined_edges = base.clone();
            combined_edges.extend(extra);
            let mut big = model_of_edges(&edge, &combined_edges);
            apply_layer(&rules, &mut big, &fnmapping).unwrap();

            let reachable_symbol = Symbol::Relation(reachable);
            for small_args in small.facts_for(&reachable_symbol) {
                prop_assert!(big.facts_for(&reachable_symbol).any(|a| a == small_args));
            }
        }
    }
}
