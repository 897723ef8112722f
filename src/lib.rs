//! Embedded Temporal Datalog Evaluator
//!
//! A host program declares relations, oracles and calls, wires them into
//! rules (optionally annotated `@START`/`@NEXT`), and hands the resulting
//! `Program` to the tick loop:
//! - Stratified negation, resolved by the Ceri/Gottlob/Tanca dependency
//!   algorithm at construction time.
//! - Semi-naive-style fixpoint evaluation per tick, layered by stratum.
//! - Side-effecting `Call`s, invoked only at the tick boundary and
//!   producing I/O facts the host observes.
//!
//! Based on:
//! - Ceri, Gottlob, Tanca. "What You Always Wanted to Know About Datalog
//!   (And Never Dared to Ask)" (1989) — the stratification algorithm.
//! - Ullman. "Principles of Database and Knowledge-base Systems" — safety
//!   (range restriction) and semi-naive evaluation.

mod error;
mod evaluator;
mod fact;
mod fnmapping;
mod formula;
mod matcher;
mod program;
mod rule;
mod symbol;
mod term;
mod value;

pub use error::{ProgramError, TickError};
pub use evaluator::{Observation, TickIter};
pub use fact::{Fact, FactArgs, Model};
pub use fnmapping::FnMapping;
pub use formula::{Conjoinable, Conjunction, Formula, Head, HeadLike, Literal, TemporalAnnotation};
pub use matcher::Substitution;
pub use program::Program;
pub use rule::Rule;
pub use symbol::{call, call_named, oracle, oracle_named, Call, CallReturn, Oracle, Relation, Symbol};
pub use term::{any, Arg, Variable, Wildcard};
pub use value::Value;

pub fn relation(name: impl Into<std::rc::Rc<str>>) -> Relation {
    Relation::new(name)
}

pub fn variable(name: impl Into<std::rc::Rc<str>>) -> Variable {
    Variable::new(name)
}

pub fn variables(names: &[&str]) -> Vec<Variable> {
    names.iter().map(|n| Variable::new(*n)).collect()
}
