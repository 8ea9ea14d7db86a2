//! Per-iterator argument threading.
//!
//! Every iterator contributes a few argument positions to the generated
//! procedure. [`Artifacts`] holds, for each position group, what the first
//! call passes, what the terminating clause expects, what the recursive
//! clause matches, what it computes before the body, and what it passes on.

use crate::error::{Result, SpecificationError};
use crate::spec::{IteratorSpec, LoopSpecification};
use crate::stop_bound::{BoundError, stop_bound};
use loops_term::{Term, VarSource, const_eval};
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub initial: Vec<Term>,
    pub terminal: Vec<Term>,
    pub prelude: Vec<Term>,
    pub head: Vec<Term>,
    pub steps: Vec<Term>,
    pub call: Vec<Term>,
}

impl Artifacts {
    pub fn arity(&self) -> usize {
        self.initial.len()
    }

    pub fn append(&mut self, other: Artifacts) {
        self.initial.extend(other.initial);
        self.terminal.extend(other.terminal);
        self.prelude.extend(other.prelude);
        self.head.extend(other.head);
        self.steps.extend(other.steps);
        self.call.extend(other.call);
    }
}

fn is(target: Term, expr: Term) -> Term {
    Term::compound("is", vec![target, expr])
}

fn plus(term: Term, n: i64) -> Term {
    match n.checked_neg() {
        Some(magnitude) if n < 0 => Term::compound("-", vec![term, Term::int(magnitude)]),
        _ => Term::compound("+", vec![term, Term::int(n)]),
    }
}

fn overflow(spec: &IteratorSpec) -> SpecificationError {
    SpecificationError::BoundOverflow(spec.to_term().to_string())
}

/// A numeric slot as an integer when known, else a fresh variable computed by
/// a prelude goal.
fn settle(expr: &Term, prelude: &mut Vec<Term>, vars: &mut impl VarSource) -> Term {
    match const_eval(expr) {
        Some(n) => Term::int(n),
        None => {
            let settled = vars.fresh_term();
            prelude.push(is(settled.clone(), expr.clone()));
            settled
        }
    }
}

/// Artifacts of a single iterator.
pub fn generate(spec: &IteratorSpec, vars: &mut impl VarSource) -> Result<Artifacts> {
    let mut out = Artifacts::default();
    match spec {
        IteratorSpec::ForEach { elem, list } => {
            let tail = vars.fresh_term();
            out.initial.push(list.clone());
            out.terminal.push(Term::nil());
            out.head.push(Term::cons(elem.clone(), tail.clone()));
            out.call.push(tail);
        }

        IteratorSpec::ForEachArg { elem, compound }
        | IteratorSpec::ForEachArgIndexed { elem, compound, .. } => {
            let limit = match compound {
                Term::Var(_) => {
                    let arity = vars.fresh_term();
                    let limit = vars.fresh_term();
                    out.prelude.push(Term::compound(
                        "functor",
                        vec![compound.clone(), vars.fresh_term(), arity.clone()],
                    ));
                    out.prelude.push(is(limit.clone(), plus(arity, 1)));
                    limit
                }
                other => {
                    let arity = other.args().len() as i64;
                    Term::int(arity + 1)
                }
            };
            out.initial
                .extend([compound.clone(), Term::int(1), limit]);

            let last = vars.fresh_term();
            out.terminal
                .extend([vars.fresh_term(), last.clone(), last]);

            let (structure, index, next, bound) = (
                vars.fresh_term(),
                vars.fresh_term(),
                vars.fresh_term(),
                vars.fresh_term(),
            );
            out.head
                .extend([structure.clone(), index.clone(), bound.clone()]);
            out.steps.push(Term::compound(
                "arg",
                vec![index.clone(), structure.clone(), elem.clone()],
            ));
            if let IteratorSpec::ForEachArgIndexed { index: exposed, .. } = spec {
                out.steps
                    .push(Term::compound("=", vec![exposed.clone(), index.clone()]));
            }
            out.steps.push(is(next.clone(), plus(index, 1)));
            out.call.extend([structure, next, bound]);
        }

        IteratorSpec::For {
            index,
            from,
            to,
            step,
        } => {
            let step = match const_eval(step) {
                Some(0) => {
                    return Err(SpecificationError::ZeroStep(spec.to_term().to_string()));
                }
                Some(s) => s,
                None => {
                    return Err(SpecificationError::UnsupportedStep(
                        spec.to_term().to_string(),
                    ));
                }
            };
            let next = vars.fresh_term();

            if let (Some(f), Some(t)) = (const_eval(from), const_eval(to)) {
                let stop = stop_bound(f, t, step).map_err(|err| match err {
                    BoundError::ZeroStep => {
                        SpecificationError::ZeroStep(spec.to_term().to_string())
                    }
                    BoundError::Overflow => overflow(spec),
                })?;
                out.initial.push(Term::int(f));
                out.terminal.push(Term::int(stop));
                out.head.push(index.clone());
                out.steps.push(is(next.clone(), plus(index.clone(), step)));
                out.call.push(next);
                return Ok(out);
            }

            let (bound, edge) = match step {
                1 => ("max", plus(to.clone(), 1)),
                -1 => ("min", plus(to.clone(), -1)),
                _ => {
                    return Err(SpecificationError::UnsupportedBound(
                        spec.to_term().to_string(),
                    ));
                }
            };
            let start = settle(from, &mut out.prelude, vars);
            let stop = vars.fresh_term();
            out.prelude.push(is(
                stop.clone(),
                Term::compound(bound, vec![start.clone(), edge]),
            ));

            let (last, limit) = (vars.fresh_term(), vars.fresh_term());
            out.initial.extend([start, stop]);
            out.terminal.extend([last.clone(), last]);
            out.head.extend([index.clone(), limit.clone()]);
            out.steps.push(is(next.clone(), plus(index.clone(), step)));
            out.call.extend([next, limit]);
        }

        IteratorSpec::Count { index, from, max } => {
            let start = match const_eval(from) {
                Some(f) => Term::int(f.checked_sub(1).ok_or_else(|| overflow(spec))?),
                None => {
                    let start = vars.fresh_term();
                    out.prelude.push(is(start.clone(), plus(from.clone(), -1)));
                    start
                }
            };
            let previous = vars.fresh_term();
            out.steps.push(is(index.clone(), plus(previous.clone(), 1)));

            match (const_eval(max), start.as_int()) {
                (Some(m), Some(s)) => {
                    out.initial.push(start);
                    out.terminal.push(Term::int(m.max(s)));
                    out.head.push(previous);
                    out.call.push(index.clone());
                }
                (Some(m), None) => {
                    let stop = vars.fresh_term();
                    out.prelude.push(is(
                        stop.clone(),
                        Term::compound("max", vec![start.clone(), Term::int(m)]),
                    ));
                    let (last, limit) = (vars.fresh_term(), vars.fresh_term());
                    out.initial.extend([start, stop]);
                    out.terminal.extend([last.clone(), last]);
                    out.head.extend([previous, limit.clone()]);
                    out.call.extend([index.clone(), limit]);
                }
                (None, _) => {
                    // A max bound by the time the loop starts is clamped like
                    // a constant one; an unbound max is bound by the loop.
                    let stop = vars.fresh_term();
                    out.prelude.push(Term::compound(
                        ";",
                        vec![
                            Term::compound(
                                "->",
                                vec![
                                    Term::compound("var", vec![max.clone()]),
                                    Term::compound("=", vec![stop.clone(), max.clone()]),
                                ],
                            ),
                            is(
                                stop.clone(),
                                Term::compound("max", vec![start.clone(), max.clone()]),
                            ),
                        ],
                    ));
                    let (last, limit) = (vars.fresh_term(), vars.fresh_term());
                    out.initial.extend([start, stop]);
                    out.terminal.extend([last.clone(), last]);
                    out.head.extend([previous, limit.clone()]);
                    out.call.extend([index.clone(), limit]);
                }
            }
        }

        IteratorSpec::FromTo {
            first,
            current,
            next,
            last,
        } => {
            if last.is_ground() {
                out.initial.push(first.clone());
                out.terminal.push(last.clone());
                out.head.push(current.clone());
                out.call.push(next.clone());
            } else {
                let (end, limit) = (vars.fresh_term(), vars.fresh_term());
                out.initial.extend([first.clone(), last.clone()]);
                out.terminal.extend([end.clone(), end]);
                out.head.extend([current.clone(), limit.clone()]);
                out.call.extend([next.clone(), limit]);
            }
        }

        IteratorSpec::Param(shared) => {
            for var in shared {
                let var = Term::Var(*var);
                out.initial.push(var.clone());
                out.terminal.push(var.clone());
                out.head.push(var.clone());
                out.call.push(var);
            }
        }
    }
    Ok(out)
}

/// Concatenate the artifacts of every iterator in specification order.
pub fn combine(spec: &LoopSpecification, vars: &mut impl VarSource) -> Result<Artifacts> {
    let mut combined = Artifacts::default();
    for iterator in spec.iter() {
        let artifacts = generate(iterator, vars)?;
        trace!(
            iterator = %iterator.to_term(),
            positions = artifacts.arity(),
            "generated iterator artifacts"
        );
        combined.append(artifacts);
    }
    Ok(combined)
}
