//! Rules: a head plus an optional body, and the range-restriction check
//! that gates every rule before it enters a `Program`.

use rustc_hash::FxHashSet;

use crate::formula::{Conjunction, Head, Literal};
use crate::term::Variable;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Head,
    pub body: Option<Conjunction>,
}

impl Rule {
    /// D ⊆ P, where P is the set of variables bound by a positive relation
    /// or call literal in the body, and D is the set of variables the rule
    /// *depends on* being bound: every head variable, plus every variable
    /// appearing in a negated or oracle literal.
    pub fn is_range_restricted(&self) -> bool {
        let Some(body) = &self.body else {
            return self.head.formula.variables().next().is_none();
        };

        let positive: FxHashSet<Variable> = body
            .0
            .iter()
            .filter_map(|l| match l {
                Literal::Pos(f) | Literal::CallLit(f) => Some(f),
                _ => None,
            })
            .flat_map(|f| f.variables().cloned())
            .collect();

        let mut dependent: FxHashSet<Variable> = self.head.formula.variables().cloned().collect();
        for l in &body.0 {
            if let Literal::Neg(f) | Literal::OraclePos(f) | Literal::OracleNeg(f) | Literal::CallNeg(f) = l {
                dependent.extend(f.variables().cloned());
            }
        }

        dependent.is_subset(&positive)
    }

    /// Apply canonical body reordering (`Conjunction::reorder`), a no-op on
    /// bodyless rules.
    pub fn reordered(self) -> Rule {
        Rule {
            head: self.head,
            body: self.body.map(Conjunction::reorder),
        }
    }
}
