//! Validates, canonicalises, partitions and stratifies a rule set into a
//! runnable `Program` (§4.5).

use rustc_hash::FxHashSet;

use crate::error::ProgramError;
use crate::fnmapping::FnMapping;
use crate::formula::{Literal, TemporalAnnotation};
use crate::rule::Rule;
use crate::symbol::{Relation, Symbol};

enum RuleClass {
    Initial,
    Always,
    Next,
    Unstratified,
}

fn classify(rule: &Rule) -> Result<RuleClass, ProgramError> {
    let symbol = &rule.head.formula.symbol;
    match (rule.head.temporal, symbol) {
        (Some(TemporalAnnotation::Start), Symbol::Relation(_)) => {
            if rule.body.is_some() {
                return Err(ProgramError::StartRuleHasBody(format!("{:?}", rule.head.formula)));
            }
            Ok(RuleClass::Initial)
        }
        (Some(TemporalAnnotation::Start), _) => Err(ProgramError::BadRuleShape(
            "START annotation is only valid on a relation head".to_string(),
        )),
        (Some(TemporalAnnotation::Next), Symbol::Relation(_) | Symbol::Call(_)) => Ok(RuleClass::Next),
        (Some(TemporalAnnotation::Next), Symbol::Oracle(_)) => Err(ProgramError::UnsupportedRuleHead(
            "an oracle cannot be a rule head".to_string(),
        )),
        (None, Symbol::Call(_)) => Ok(RuleClass::Next),
        (None, Symbol::Oracle(_)) => Err(ProgramError::UnsupportedRuleHead(
            "an oracle cannot be a rule head".to_string(),
        )),
        (None, Symbol::Relation(_)) => {
            if body_is_always(rule) {
                Ok(RuleClass::Always)
            } else {
                Ok(RuleClass::Unstratified)
            }
        }
    }
}

fn body_is_always(rule: &Rule) -> bool {
    match &rule.body {
        None => true,
        Some(conj) => conj
            .0
            .iter()
            .all(|l| matches!(l, Literal::OraclePos(_) | Literal::OracleNeg(_))),
    }
}

/// `(head_relation, edge_value, body_relation)`, where `edge_value` is `0`
/// for a positive dependency and `-1` for a negative one.
type Dep = (Relation, i8, Relation);

fn build_deps(unstratified: &[Rule]) -> FxHashSet<Dep> {
    let mut deps = FxHashSet::default();
    for rule in unstratified {
        let head_rel = match &rule.head.formula.symbol {
            Symbol::Relation(r) => r.clone(),
            _ => continue,
        };
        // Every unstratified rule's head must surface in the graph even if
        // its body is all Call/Oracle literals (no Pos/Neg relation edges),
        // otherwise it never reaches `rels` and gets no stratum assigned.
        deps.insert((head_rel.clone(), 0, head_rel.clone()));
        let Some(body) = &rule.body else { continue };
        for lit in &body.0 {
            match lit {
                Literal::Pos(f) => {
                    if let Symbol::Relation(r) = &f.symbol {
                        deps.insert((head_rel.clone(), 0, r.clone()));
                    }
                }
                Literal::Neg(f) => {
                    if let Symbol::Relation(r) = &f.symbol {
                        deps.insert((head_rel.clone(), -1, r.clone()));
                    }
                }
                _ => {}
            }
        }
    }
    deps
}

/// For every relation `r` reachable in the dependency graph, compute the
/// worst (most-negative) edge value along any path from `r`. This is the
/// Ceri/Gottlob/Tanca reachability closure: a `-1` entry `(r, -1, t)` means
/// some path from `r` to `t` crosses a negative edge.
fn close_reachability(deps: &FxHashSet<Dep>) -> FxHashSet<Dep> {
    let rels: FxHashSet<Relation> = deps.iter().flat_map(|(f, _, t)| [f.clone(), t.clone()]).collect();
    let mut edeps = FxHashSet::default();
    for r in &rels {
        let mut reachable = rustc_hash::FxHashMap::default();
        reachable.insert(r.clone(), 0i8);
        loop {
            let before: (usize, i64) = (reachable.len(), reachable.values().map(|v| *v as i64).sum());
            for (df, v, dt) in deps {
                if let Some(&dfval) = reachable.get(df) {
                    let dtval = *reachable.get(dt).unwrap_or(&0);
                    let candidate = (*v).min(dtval).min(dfval);
                    reachable.insert(dt.clone(), candidate);
                }
            }
            let after: (usize, i64) = (reachable.len(), reachable.values().map(|v| *v as i64).sum());
            if before == after {
                break;
            }
        }
        for (t, v) in reachable {
            edeps.insert((r.clone(), v, t));
        }
    }
    edeps
}

/// Repeatedly peel off the set of relations with no outgoing negative edge
/// as the next stratum. No progress on some iteration (while edges remain)
/// means a negative cycle: the program is unstratifiable.
fn stratify(mut deps: FxHashSet<Dep>) -> Result<Vec<FxHashSet<Relation>>, ProgramError> {
    let mut strata = Vec::new();
    while !deps.is_empty() {
        let mut this_stratum: FxHashSet<Relation> = deps.iter().map(|(f, _, _)| f.clone()).collect();
        for (f, v, _t) in &deps {
            if *v == -1 {
                this_stratum.remove(f);
            }
        }
        if this_stratum.is_empty() {
            let stuck: Vec<String> = deps.iter().map(|(f, _, _)| f.name().to_string()).collect();
            return Err(ProgramError::UnstratifiableProgram(stuck));
        }
        strata.push(this_stratum.clone());
        deps = deps
            .into_iter()
            .filter(|(f, _, t)| !this_stratum.contains(f) && !this_stratum.contains(t))
            .collect();
    }
    Ok(strata)
}

/// A validated, partitioned, stratified rule set ready to be driven by the
/// evaluator.
pub struct Program {
    pub(crate) initial: Vec<Rule>,
    pub(crate) always: Vec<Rule>,
    pub(crate) next: Vec<Rule>,
    pub(crate) strata: Vec<Vec<Rule>>,
    pub(crate) fnmapping: FnMapping,
}

impl Program {
    /// Validate range restriction, canonicalise bodies, partition into
    /// initial/always/next/unstratified, then stratify the unstratified
    /// rules by dependency graph. Fails fast on the first invalid rule.
    pub fn new(rules: Vec<Rule>, fnmapping: FnMapping) -> Result<Program, ProgramError> {
        for rule in &rules {
            if !rule.is_range_restricted() {
                tracing::debug!(head = ?rule.head.formula, "rejected: not range restricted");
                return Err(ProgramError::RuleNotRangeRestricted(format!("{:?}", rule.head.formula)));
            }
        }

        let rules: Vec<Rule> = rules.into_iter().map(Rule::reordered).collect();

        let mut initial = Vec::new();
        let mut always = Vec::new();
        let mut next = Vec::new();
        let mut unstratified = Vec::new();
        for rule in rules {
            match classify(&rule)? {
                RuleClass::Initial => initial.push(rule),
                RuleClass::Always => always.push(rule),
                RuleClass::Next => next.push(rule),
                RuleClass::Unstratified => unstratified.push(rule),
            }
        }

        let deps = close_reachability(&build_deps(&unstratified));
        let strata_rels = stratify(deps)?;
        tracing::debug!(strata = strata_rels.len(), "stratification complete");

        let mut strata: Vec<Vec<Rule>> = strata_rels.iter().map(|_| Vec::new()).collect();
        for rule in unstratified {
            let head_rel = match &rule.head.formula.symbol {
                Symbol::Relation(r) => r.clone(),
                _ => unreachable!("unstratified rules always have a relation head"),
            };
            let idx = strata_rels
                .iter()
                .position(|s| s.contains(&head_rel))
                .expect("every unstratified rule's head relation appears in its own dependency graph");
            strata[idx].push(rule);
        }

        Ok(Program {
            initial,
            always,
            next,
            strata,
            fnmapping,
        })
    }
}
