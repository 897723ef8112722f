//! Ground facts and the per-symbol fact store (`Model`) the evaluator folds
//! rules over.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::symbol::Symbol;
use crate::value::Value;

pub type FactArgs = SmallVec<[Value; 4]>;

/// A fully-ground atom: a symbol (relation or, for I/O facts, a call) and
/// its concrete argument tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fact {
    pub symbol: Symbol,
    pub args: FactArgs,
}

/// The current tick's fact store, indexed by symbol, generalised from
/// relation names to any symbol kind so I/O facts from a prior tick live
/// alongside deductive facts without special-casing the match engine.
#[derive(Clone, Debug, Default)]
pub struct Model(FxHashMap<Symbol, FxHashSet<FactArgs>>);

impl Model {
    pub fn new() -> Self {
        Model::default()
    }

    pub fn facts_for(&self, symbol: &Symbol) -> impl Iterator<Item = &FactArgs> {
        self.0.get(symbol).into_iter().flatten()
    }

    /// Insert a fact, returning `true` if it was new.
    pub fn insert(&mut self, fact: Fact) -> bool {
        self.0.entry(fact.symbol).or_default().insert(fact.args)
    }

    pub fn extend(&mut self, facts: impl IntoIterator<Item = Fact>) -> bool {
        let mut changed = false;
        for f in facts {
            changed |= self.insert(f);
        }
        changed
    }

    pub fn merge(&mut self, other: Model) {
        for (symbol, args) in other.0 {
            self.0.entry(symbol).or_default().extend(args);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Fact> + '_ {
        self.0.iter().flat_map(|(symbol, args)| {
            args.iter().map(move |a| Fact {
                symbol: symbol.clone(),
                args: a.clone(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.0.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
