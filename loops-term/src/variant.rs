//! Variant normalization, structural fingerprints and clause templates.

use crate::bindings::VarSource;
use crate::term::{Term, VarId};
use ahash::AHashMap;
use indexmap::IndexSet;
use std::hash::{BuildHasher, Hash, Hasher};

const SEED0: u64 = 0x0FED_CBA9_8765_4321;
const SEED1: u64 = 0x0BAD_F00D_F00D_BAAD;
const SEED2: u64 = 0xCAFE_BABE_DEAD_C0DE;
const SEED3: u64 = 0x1234_5678_9ABC_DEF0;

/// Fixed-seed hasher so fingerprints are stable across runs.
pub fn stable_hasher() -> ahash::RandomState {
    ahash::RandomState::with_seeds(SEED0, SEED1, SEED2, SEED3)
}

pub type VarSet = IndexSet<VarId, ahash::RandomState>;

/// Distinct variables of `term` in order of first occurrence.
pub fn term_vars(term: &Term) -> VarSet {
    let mut set = VarSet::default();
    collect_vars(term, &mut set);
    set
}

pub fn collect_vars(term: &Term, into: &mut VarSet) {
    term.for_each_var(&mut |v| {
        into.insert(v);
    });
}

/// Rename variables to `0..n` in order of first occurrence.
///
/// Two terms are variants of each other exactly when their normal forms are
/// equal. The second component is the number of distinct variables.
pub fn normalize(term: &Term) -> (Term, u32) {
    let mut renaming: AHashMap<VarId, VarId> = AHashMap::new();
    let normal = term.map_vars(&mut |v| {
        let next = renaming.len() as u32;
        Term::Var(*renaming.entry(v).or_insert(VarId(next)))
    });
    (normal, renaming.len() as u32)
}

pub fn fingerprint(term: &Term) -> u64 {
    let mut hasher = stable_hasher().build_hasher();
    term.hash(&mut hasher);
    hasher.finish()
}

/// A group of terms stored with variables numbered `0..width`, instantiated
/// with fresh variables on every use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    terms: Vec<Term>,
    width: u32,
}

impl Template {
    /// Normalize `terms` jointly so that shared variables stay shared.
    pub fn new(terms: Vec<Term>) -> Self {
        let mut renaming: AHashMap<VarId, VarId> = AHashMap::new();
        let terms = terms
            .iter()
            .map(|term| {
                term.map_vars(&mut |v| {
                    let next = renaming.len() as u32;
                    Term::Var(*renaming.entry(v).or_insert(VarId(next)))
                })
            })
            .collect();
        Self {
            terms,
            width: renaming.len() as u32,
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn instantiate(&self, vars: &mut impl VarSource) -> Vec<Term> {
        let fresh: Vec<VarId> = (0..self.width).map(|_| vars.fresh_var()).collect();
        self.terms
            .iter()
            .map(|term| term.map_vars(&mut |v| Term::Var(fresh[v.index()])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Bindings;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variants_normalize_equal() {
        let mut b = Bindings::new();
        let (x, y, z) = (b.fresh_term(), b.fresh_term(), b.fresh_term());
        let left = Term::compound("f", vec![x.clone(), y.clone(), x]);
        let right = Term::compound("f", vec![z.clone(), y, z]);
        assert_eq!(normalize(&left), normalize(&right));
        assert_eq!(fingerprint(&normalize(&left).0), fingerprint(&normalize(&right).0));
    }

    #[test]
    fn test_non_variants_differ() {
        let mut b = Bindings::new();
        let (x, y) = (b.fresh_term(), b.fresh_term());
        let left = Term::compound("f", vec![x.clone(), x]);
        let right = Term::compound("f", vec![y.clone(), b.fresh_term()]);
        assert_ne!(normalize(&left).0, normalize(&right).0);
    }

    #[test]
    fn test_template_instantiation_keeps_sharing() {
        let mut b = Bindings::new();
        let x = b.fresh_term();
        let template = Template::new(vec![
            Term::compound("h", vec![x.clone()]),
            Term::compound("g", vec![x]),
        ]);
        assert_eq!(template.width(), 1);

        let first = template.instantiate(&mut b);
        let second = template.instantiate(&mut b);
        assert_eq!(first[0].args(), first[1].args());
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn test_term_vars_in_first_occurrence_order() {
        let mut b = Bindings::new();
        let (x, y) = (b.fresh_var(), b.fresh_var());
        let term = Term::compound("f", vec![Term::Var(y), Term::Var(x), Term::Var(y)]);
        let vars: Vec<VarId> = term_vars(&term).into_iter().collect();
        assert_eq!(vars, vec![y, x]);
    }
}
