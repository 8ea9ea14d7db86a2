//! The term representation shared by the compiler and the machine.

use std::fmt;
use std::sync::Arc;

/// Identifier of a logic variable inside a [`crate::Bindings`] store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) u32);

impl VarId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_G{}", self.0)
    }
}

/// Interned-by-refcount atom name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(Arc<str>);

impl Atom {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::new(value)
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl std::ops::Deref for Atom {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A structure `functor(args...)` with at least one argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Structure {
    pub functor: Atom,
    pub args: Vec<Term>,
}

pub const NIL: &str = "[]";
pub const CONS: &str = ".";
pub const CONJUNCTION: &str = ",";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(VarId),
    Int(i64),
    Atom(Atom),
    Compound(Arc<Structure>),
}

impl Term {
    pub fn var(id: VarId) -> Self {
        Term::Var(id)
    }

    pub fn int(n: i64) -> Self {
        Term::Int(n)
    }

    pub fn atom(name: &str) -> Self {
        Term::Atom(Atom::new(name))
    }

    /// Build `functor(args...)`; an empty argument list yields the plain atom.
    pub fn compound(functor: impl Into<Atom>, args: Vec<Term>) -> Self {
        let functor = functor.into();
        if args.is_empty() {
            Term::Atom(functor)
        } else {
            Term::Compound(Arc::new(Structure { functor, args }))
        }
    }

    pub fn nil() -> Self {
        Term::atom(NIL)
    }

    pub fn cons(head: Term, tail: Term) -> Self {
        Term::compound(CONS, vec![head, tail])
    }

    pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
        Self::list_with_tail(items, Term::nil())
    }

    pub fn list_with_tail(items: impl IntoIterator<Item = Term>, tail: Term) -> Self {
        let items: Vec<Term> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Term::cons(item, acc))
    }

    /// Right-nested `','/2` chain; an empty sequence is `true`.
    pub fn conjunction(goals: impl IntoIterator<Item = Term>) -> Self {
        let goals: Vec<Term> = goals
            .into_iter()
            .filter(|goal| !goal.is_atom("true"))
            .collect();
        let mut iter = goals.into_iter().rev();
        match iter.next() {
            None => Term::atom("true"),
            Some(last) => iter.fold(last, |acc, goal| {
                Term::compound(CONJUNCTION, vec![goal, acc])
            }),
        }
    }

    #[inline]
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Term::Atom(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_atom(&self, name: &str) -> bool {
        matches!(self, Term::Atom(a) if a.as_str() == name)
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Compound(_))
    }

    /// Name and arity of an atom or compound.
    pub fn name_arity(&self) -> Option<(&str, usize)> {
        match self {
            Term::Atom(a) => Some((a.as_str(), 0)),
            Term::Compound(s) => Some((s.functor.as_str(), s.args.len())),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(s) => &s.args,
            _ => &[],
        }
    }

    /// Arguments of `name/arity`, if this term has exactly that shape.
    pub fn shape(&self, name: &str, arity: usize) -> Option<&[Term]> {
        match self.name_arity() {
            Some((n, a)) if n == name && a == arity => Some(self.args()),
            _ => None,
        }
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Int(_) | Term::Atom(_) => true,
            Term::Compound(s) => s.args.iter().all(Term::is_ground),
        }
    }

    /// Rebuild the term replacing every variable with `f(var)`.
    pub fn map_vars(&self, f: &mut impl FnMut(VarId) -> Term) -> Term {
        match self {
            Term::Var(v) => f(*v),
            Term::Int(_) | Term::Atom(_) => self.clone(),
            Term::Compound(s) => Term::Compound(Arc::new(Structure {
                functor: s.functor.clone(),
                args: s.args.iter().map(|arg| arg.map_vars(f)).collect(),
            })),
        }
    }

    /// Visit variables in depth-first, left-to-right order (with repetitions).
    pub fn for_each_var(&self, f: &mut impl FnMut(VarId)) {
        match self {
            Term::Var(v) => f(*v),
            Term::Int(_) | Term::Atom(_) => {}
            Term::Compound(s) => s.args.iter().for_each(|arg| arg.for_each_var(f)),
        }
    }

    /// Flatten a `','/2` chain into its goals.
    pub fn conjuncts(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        let mut cursor = self;
        while let Some([left, right]) = cursor.shape(CONJUNCTION, 2) {
            out.push(left);
            cursor = right;
        }
        out.push(cursor);
        out
    }

    /// Elements of a proper list, or `None` for partial and non-lists.
    pub fn list_items(&self) -> Option<Vec<&Term>> {
        let mut out = Vec::new();
        let mut cursor = self;
        loop {
            if cursor.is_atom(NIL) {
                return Some(out);
            }
            let [head, tail] = cursor.shape(CONS, 2)? else {
                return None;
            };
            out.push(head);
            cursor = tail;
        }
    }
}

impl From<VarId> for Term {
    fn from(value: VarId) -> Self {
        Term::Var(value)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Int(value)
    }
}
