//! Variable store with a trail for chronological backtracking.

use crate::term::{Term, VarId};
use smallvec::SmallVec;
use std::sync::Arc;

/// Anything that can hand out fresh variables.
pub trait VarSource {
    fn fresh_var(&mut self) -> VarId;

    fn fresh_term(&mut self) -> Term {
        Term::Var(self.fresh_var())
    }
}

/// Snapshot of the store; restoring it undoes bindings and frees younger variables.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    trail: usize,
    cells: usize,
}

#[derive(Debug, Default)]
pub struct Bindings {
    cells: Vec<Option<Term>>,
    trail: Vec<VarId>,
}

impl VarSource for Bindings {
    fn fresh_var(&mut self) -> VarId {
        let id = self.cells.len() as u32;
        self.cells.push(None);
        VarId(id)
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn mark(&self) -> Mark {
        Mark {
            trail: self.trail.len(),
            cells: self.cells.len(),
        }
    }

    /// Every binding is trailed, so once the trail is unwound no older
    /// variable can reference a cell past the mark.
    pub fn undo_to(&mut self, mark: Mark) {
        self.undo_bindings(mark);
        self.cells.truncate(mark.cells);
    }

    pub fn lookup(&self, var: VarId) -> Option<&Term> {
        self.cells.get(var.index()).and_then(Option::as_ref)
    }

    pub fn bind(&mut self, var: VarId, value: Term) {
        debug_assert!(self.lookup(var).is_none(), "rebinding {var}");
        if let Some(cell) = self.cells.get_mut(var.index()) {
            *cell = Some(value);
            self.trail.push(var);
        }
    }

    /// Shallow dereference: follow variable chains until a non-variable or an unbound variable.
    pub fn walk(&self, term: &Term) -> Term {
        let mut current = term;
        while let Term::Var(v) = current {
            match self.lookup(*v) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone()
    }

    /// Deep substitution of every bound variable.
    pub fn resolve(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(s) => {
                let args = s.args.iter().map(|arg| self.resolve(arg)).collect();
                Term::Compound(Arc::new(crate::term::Structure {
                    functor: s.functor.clone(),
                    args,
                }))
            }
            other => other,
        }
    }

    /// Unify two terms. On failure every binding made by this call is undone.
    pub fn unify(&mut self, left: &Term, right: &Term) -> bool {
        let mark = self.mark();
        if self.unify_inner(left, right) {
            true
        } else {
            self.undo_bindings(mark);
            false
        }
    }

    /// Pairwise unification of two argument tuples of equal length.
    pub fn unify_all(&mut self, left: &[Term], right: &[Term]) -> bool {
        if left.len() != right.len() {
            return false;
        }
        let mark = self.mark();
        for (l, r) in left.iter().zip(right) {
            if !self.unify(l, r) {
                self.undo_bindings(mark);
                return false;
            }
        }
        true
    }

    fn undo_bindings(&mut self, mark: Mark) {
        while self.trail.len() > mark.trail {
            if let Some(var) = self.trail.pop()
                && let Some(cell) = self.cells.get_mut(var.index())
            {
                *cell = None;
            }
        }
    }

    fn unify_inner(&mut self, left: &Term, right: &Term) -> bool {
        let mut pending: SmallVec<[(Term, Term); 8]> = SmallVec::new();
        pending.push((left.clone(), right.clone()));

        while let Some((l, r)) = pending.pop() {
            let l = self.walk(&l);
            let r = self.walk(&r);
            match (&l, &r) {
                (Term::Var(a), Term::Var(b)) if a == b => {}
                // Bind the younger variable to the older one so that
                // truncating on backtrack never leaves dangling references.
                (Term::Var(a), Term::Var(b)) => {
                    if a > b {
                        self.bind(*a, r.clone());
                    } else {
                        self.bind(*b, l.clone());
                    }
                }
                (Term::Var(a), _) => self.bind(*a, r.clone()),
                (_, Term::Var(b)) => self.bind(*b, l.clone()),
                (Term::Int(x), Term::Int(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Term::Atom(x), Term::Atom(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Term::Compound(x), Term::Compound(y)) => {
                    if x.functor != y.functor || x.args.len() != y.args.len() {
                        return false;
                    }
                    for (a, b) in x.args.iter().zip(&y.args).rev() {
                        pending.push((a.clone(), b.clone()));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}
