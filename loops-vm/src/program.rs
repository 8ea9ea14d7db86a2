//! User clause database.

use ahash::AHashMap;
use loops_term::{Atom, Template, Term, TermError};
use std::sync::Arc;

/// Clauses grouped by predicate, each stored as a `[head, body]` template.
#[derive(Debug, Default)]
pub struct Program {
    predicates: AHashMap<(Atom, usize), Arc<Vec<Template>>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause. Facts get the body `true`.
    pub fn add_clause(&mut self, clause: &Term) -> Result<(), TermError> {
        let (head, body) = match clause.shape(":-", 2) {
            Some([head, body]) => (head.clone(), body.clone()),
            _ => (clause.clone(), Term::atom("true")),
        };
        let key = match &head {
            Term::Atom(name) => (name.clone(), 0),
            Term::Compound(s) => (s.functor.clone(), s.args.len()),
            Term::Var(_) => return Err(TermError::instantiation("clause head")),
            Term::Int(_) => return Err(TermError::type_error("callable", &head)),
        };
        let clauses = self.predicates.entry(key).or_default();
        Arc::make_mut(clauses).push(Template::new(vec![head, body]));
        Ok(())
    }

    pub fn clauses(&self, name: &Atom, arity: usize) -> Option<Arc<Vec<Template>>> {
        self.predicates.get(&(name.clone(), arity)).cloned()
    }

    pub fn len(&self) -> usize {
        self.predicates.values().map(|clauses| clauses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
