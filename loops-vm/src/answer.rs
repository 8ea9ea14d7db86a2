//! Query answers.

use indexmap::IndexMap;
use loops_term::Term;
use std::fmt;

/// One solution: the query's named variables and their values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Answer {
    bindings: IndexMap<String, Term>,
}

impl Answer {
    pub(crate) fn new(bindings: IndexMap<String, Term>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, term)| (name.as_str(), term))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Renders `X = value, Y = value`, skipping unbound variables; `true` when
/// nothing is bound.
impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self
            .bindings
            .iter()
            .filter(|(_, term)| !term.is_var());
        match shown.next() {
            None => write!(f, "true"),
            Some((name, term)) => {
                write!(f, "{name} = {term}")?;
                for (name, term) in shown {
                    write!(f, ", {name} = {term}")?;
                }
                Ok(())
            }
        }
    }
}
