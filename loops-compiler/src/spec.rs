//! Iterator descriptors and their parsing from a conjunction.

use crate::error::{Result, SpecificationError};
use loops_term::{Term, VarId, VarSet, collect_vars};
use nonempty_collections::NEVec;
use smallvec::SmallVec;

/// One conjunct of a loop specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IteratorSpec {
    /// `foreach(Elem, List)`
    ForEach { elem: Term, list: Term },
    /// `foreacharg(Elem, Struct)`
    ForEachArg { elem: Term, compound: Term },
    /// `foreacharg(Elem, Struct, Index)`
    ForEachArgIndexed {
        elem: Term,
        compound: Term,
        index: Term,
    },
    /// `for(Index, From, To)` and `for(Index, From, To, Step)`
    For {
        index: Term,
        from: Term,
        to: Term,
        step: Term,
    },
    /// `count(Index, From, Max)`
    Count { index: Term, from: Term, max: Term },
    /// `fromto(First, In, Out, Last)`
    FromTo {
        first: Term,
        current: Term,
        next: Term,
        last: Term,
    },
    /// `param(V1, ..., Vn)`
    Param(SmallVec<[VarId; 4]>),
}

impl IteratorSpec {
    /// Recognize a single descriptor.
    pub fn parse(term: &Term) -> Result<Self> {
        let unknown = || SpecificationError::UnknownIterator(term.to_string());
        let Some((name, arity)) = term.name_arity() else {
            return Err(unknown());
        };
        let args = term.args();

        let spec = match (name, arity) {
            ("foreach", 2) => IteratorSpec::ForEach {
                elem: args[0].clone(),
                list: args[1].clone(),
            },
            ("foreacharg", 2) => IteratorSpec::ForEachArg {
                elem: args[0].clone(),
                compound: args[1].clone(),
            },
            ("foreacharg", 3) => IteratorSpec::ForEachArgIndexed {
                elem: args[0].clone(),
                compound: args[1].clone(),
                index: args[2].clone(),
            },
            ("for", 3) => IteratorSpec::For {
                index: args[0].clone(),
                from: args[1].clone(),
                to: args[2].clone(),
                step: Term::int(1),
            },
            ("for", 4) => IteratorSpec::For {
                index: args[0].clone(),
                from: args[1].clone(),
                to: args[2].clone(),
                step: args[3].clone(),
            },
            ("count", 3) => IteratorSpec::Count {
                index: args[0].clone(),
                from: args[1].clone(),
                max: args[2].clone(),
            },
            ("fromto", 4) => IteratorSpec::FromTo {
                first: args[0].clone(),
                current: args[1].clone(),
                next: args[2].clone(),
                last: args[3].clone(),
            },
            ("param", _) => {
                let vars = args
                    .iter()
                    .map(|arg| arg.as_var())
                    .collect::<Option<SmallVec<_>>>()
                    .ok_or_else(|| SpecificationError::ParamNotVariable(term.to_string()))?;
                IteratorSpec::Param(vars)
            }
            _ => return Err(unknown()),
        };
        Ok(spec)
    }

    /// Render back to descriptor syntax.
    pub fn to_term(&self) -> Term {
        match self {
            IteratorSpec::ForEach { elem, list } => {
                Term::compound("foreach", vec![elem.clone(), list.clone()])
            }
            IteratorSpec::ForEachArg { elem, compound } => {
                Term::compound("foreacharg", vec![elem.clone(), compound.clone()])
            }
            IteratorSpec::ForEachArgIndexed {
                elem,
                compound,
                index,
            } => Term::compound(
                "foreacharg",
                vec![elem.clone(), compound.clone(), index.clone()],
            ),
            IteratorSpec::For {
                index,
                from,
                to,
                step,
            } => Term::compound(
                "for",
                vec![index.clone(), from.clone(), to.clone(), step.clone()],
            ),
            IteratorSpec::Count { index, from, max } => {
                Term::compound("count", vec![index.clone(), from.clone(), max.clone()])
            }
            IteratorSpec::FromTo {
                first,
                current,
                next,
                last,
            } => Term::compound(
                "fromto",
                vec![first.clone(), current.clone(), next.clone(), last.clone()],
            ),
            IteratorSpec::Param(vars) => {
                Term::compound("param", vars.iter().map(|v| Term::Var(*v)).collect())
            }
        }
    }

    /// Variables in positions that are fresh on every iteration.
    pub fn local_vars(&self, into: &mut VarSet) {
        match self {
            IteratorSpec::ForEach { elem, .. } | IteratorSpec::ForEachArg { elem, .. } => {
                collect_vars(elem, into)
            }
            IteratorSpec::ForEachArgIndexed { elem, index, .. } => {
                collect_vars(elem, into);
                collect_vars(index, into);
            }
            IteratorSpec::For { index, .. } | IteratorSpec::Count { index, .. } => {
                collect_vars(index, into)
            }
            IteratorSpec::FromTo { current, next, .. } => {
                collect_vars(current, into);
                collect_vars(next, into);
            }
            IteratorSpec::Param(_) => {}
        }
    }

    /// Variables in positions evaluated once, outside the iterations.
    pub fn global_vars(&self, into: &mut VarSet) {
        match self {
            IteratorSpec::ForEach { list, .. } => collect_vars(list, into),
            IteratorSpec::ForEachArg { compound, .. }
            | IteratorSpec::ForEachArgIndexed { compound, .. } => collect_vars(compound, into),
            IteratorSpec::For { from, to, step, .. } => {
                collect_vars(from, into);
                collect_vars(to, into);
                collect_vars(step, into);
            }
            IteratorSpec::Count { from, max, .. } => {
                collect_vars(from, into);
                collect_vars(max, into);
            }
            IteratorSpec::FromTo { first, last, .. } => {
                collect_vars(first, into);
                collect_vars(last, into);
            }
            IteratorSpec::Param(_) => {}
        }
    }
}

/// Ordered, non-empty conjunction of iterators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopSpecification {
    iterators: NEVec<IteratorSpec>,
}

impl LoopSpecification {
    pub fn new(first: IteratorSpec) -> Self {
        Self {
            iterators: NEVec::new(first),
        }
    }

    pub fn push(&mut self, spec: IteratorSpec) {
        self.iterators.push(spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = &IteratorSpec> {
        (&self.iterators).into_iter()
    }

    /// Variables listed by every `param/N` entry, in order.
    pub fn declared_params(&self) -> VarSet {
        let mut declared = VarSet::default();
        for spec in self.iter() {
            if let IteratorSpec::Param(vars) = spec {
                declared.extend(vars.iter().copied());
            }
        }
        declared
    }

    /// Replace every `param/N` entry by a single leading one listing `shared`.
    ///
    /// A specification made of parameters only keeps a single `param/N`
    /// entry even when `shared` is empty; its terminal pattern matches at
    /// once, so such a loop never runs its body.
    pub fn with_params(&self, shared: &VarSet) -> Self {
        let rest = self
            .iter()
            .filter(|spec| !matches!(spec, IteratorSpec::Param(_)))
            .cloned();
        let mut ordered: Vec<IteratorSpec> = Vec::new();
        if !shared.is_empty() {
            ordered.push(IteratorSpec::Param(shared.iter().copied().collect()));
        }
        ordered.extend(rest);
        match NEVec::try_from_vec(ordered) {
            Some(iterators) => Self { iterators },
            None => Self::new(IteratorSpec::Param(SmallVec::new())),
        }
    }

    pub fn local_vars(&self) -> VarSet {
        let mut out = VarSet::default();
        for spec in self.iter() {
            spec.local_vars(&mut out);
        }
        out
    }

    pub fn global_vars(&self) -> VarSet {
        let mut out = VarSet::default();
        for spec in self.iter() {
            spec.global_vars(&mut out);
        }
        out
    }

    /// The conjunction this specification was parsed from, in normal form.
    pub fn to_term(&self) -> Term {
        Term::conjunction(self.iter().map(IteratorSpec::to_term))
    }
}

/// Parse a `','/2` chain of iterator descriptors.
pub fn parse_specification(specs: &Term) -> Result<LoopSpecification> {
    let mut conjuncts = specs.conjuncts().into_iter();
    let first = conjuncts
        .next()
        .ok_or_else(|| SpecificationError::UnknownIterator(specs.to_string()))?;
    let mut spec = LoopSpecification::new(IteratorSpec::parse(first)?);
    for conjunct in conjuncts {
        spec.push(IteratorSpec::parse(conjunct)?);
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loops_term::{Bindings, read_term};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(src: &str) -> Result<LoopSpecification> {
        let mut bindings = Bindings::new();
        let term = read_term(src, &mut bindings).expect("readable").term;
        parse_specification(&term)
    }

    #[test]
    fn test_parse_all_kinds_in_order() {
        let spec = parse(
            "foreach(X, L), foreacharg(A, S), foreacharg(B, S, I), for(J, 1, 5), \
             for(K, 10, 1, -2), count(C, 1, N), fromto(0, S0, S1, T), param(P, Q)",
        )
        .expect("valid");
        let kinds: Vec<&str> = spec
            .iter()
            .map(|s| match s {
                IteratorSpec::ForEach { .. } => "foreach",
                IteratorSpec::ForEachArg { .. } => "foreacharg/2",
                IteratorSpec::ForEachArgIndexed { .. } => "foreacharg/3",
                IteratorSpec::For { .. } => "for",
                IteratorSpec::Count { .. } => "count",
                IteratorSpec::FromTo { .. } => "fromto",
                IteratorSpec::Param(_) => "param",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "foreach",
                "foreacharg/2",
                "foreacharg/3",
                "for",
                "for",
                "count",
                "fromto",
                "param"
            ]
        );
        assert_eq!(spec.declared_params().len(), 2);
    }

    #[test]
    fn test_for_defaults_to_unit_step() {
        let spec = parse("for(I, 1, 3)").expect("valid");
        let Some(IteratorSpec::For { step, .. }) = spec.iter().next() else {
            panic!("expected for/3");
        };
        assert_eq!(step, &Term::int(1));
    }

    #[rstest]
    #[case::unknown_tag("forall(X, L)")]
    #[case::wrong_arity("foreach(X)")]
    #[case::not_callable("42")]
    #[case::second_conjunct("foreach(X, L), bogus")]
    fn test_unknown_iterators_are_rejected(#[case] src: &str) {
        assert!(matches!(
            parse(src),
            Err(SpecificationError::UnknownIterator(_))
        ));
    }

    #[test]
    fn test_param_requires_variables() {
        assert!(matches!(
            parse("foreach(X, L), param(f(Y))"),
            Err(SpecificationError::ParamNotVariable(_))
        ));
    }

    #[test]
    fn test_parameters_only_round_trip_without_any_parameter() {
        let spec = parse("param(P)").expect("valid");
        let settled = spec.with_params(&VarSet::default());
        let reparsed = parse_specification(&settled.to_term()).expect("valid");
        assert_eq!(reparsed, settled);
        assert!(reparsed.declared_params().is_empty());
    }

    #[test]
    fn test_with_params_moves_shared_to_front() {
        let mut bindings = Bindings::new();
        let read = read_term("foreach(X, L), param(A), count(I, 1, N)", &mut bindings)
            .expect("readable");
        let spec = parse_specification(&read.term).expect("valid");
        let mut shared = VarSet::default();
        shared.insert(read.var("N").expect("N"));
        let settled = spec.with_params(&shared);
        assert_eq!(
            settled.to_term().to_string(),
            format!(
                "param({}), foreach({},{}), count({},1,{})",
                read.var("N").unwrap(),
                read.var("X").unwrap(),
                read.var("L").unwrap(),
                read.var("I").unwrap(),
                read.var("N").unwrap(),
            )
        );
    }

    #[test]
    fn test_local_and_global_positions() {
        let mut bindings = Bindings::new();
        let read = read_term("foreach(X, L), fromto(F, S0, S1, T)", &mut bindings)
            .expect("readable");
        let spec = parse_specification(&read.term).expect("valid");
        let local: Vec<_> = spec.local_vars().into_iter().collect();
        let global: Vec<_> = spec.global_vars().into_iter().collect();
        let var = |n| read.var(n).expect("named");
        assert_eq!(local, vec![var("X"), var("S0"), var("S1")]);
        assert_eq!(global, vec![var("L"), var("F"), var("T")]);
    }
}
