//! Ahead-of-time treatment of loop goals inside clauses.
//!
//! A clause is walked through its control constructs. Each `Specs do Body`
//! goal met on the way is either compiled and replaced by its initial goal,
//! or kept as a goal whose `param/N` entries list the variables it shares.
//! In both cases the variables visible around the loop decide which body
//! variables are parameters.

use crate::cache::ProcedureStore;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::params::check_params;
use crate::spec::{LoopSpecification, parse_specification};
use crate::{LoopCompiler, LoopRequest};
use loops_term::{Atom, Term, VarSet, VarSource, collect_vars, term_vars};

/// A clause or goal with its loops compiled or settled.
#[derive(Clone, Debug)]
pub struct Expansion {
    pub term: Term,
    pub diagnostics: Vec<Diagnostic>,
}

/// Variables that must be threaded through the loop: body variables not
/// local to an iterator that also occur around the loop or in a position of
/// the specification evaluated once, plus declared parameters that occur
/// around the loop.
pub fn shared_vars(spec: &LoopSpecification, body: &Term, outside: &VarSet) -> VarSet {
    let local = spec.local_vars();
    let global = spec.global_vars();
    let from_body = term_vars(body)
        .into_iter()
        .filter(|v| !local.contains(v) && (outside.contains(v) || global.contains(v)));
    let declared = spec
        .declared_params()
        .into_iter()
        .filter(|v| outside.contains(v));
    from_body.chain(declared).collect()
}

fn with_vars_of(outside: &VarSet, term: &Term) -> VarSet {
    let mut extended = outside.clone();
    collect_vars(term, &mut extended);
    extended
}

/// Rewrite every loop in `clause` with `on_loop`, which receives the
/// specification, the body and the variables around the loop.
fn rewrite_clause<F>(clause: &Term, on_loop: &mut F) -> Result<Expansion>
where
    F: FnMut(&Term, &Term, &VarSet) -> Result<(Term, Vec<Diagnostic>)>,
{
    if let Some([head, body]) = clause.shape(":-", 2) {
        let (body, diagnostics) = rewrite_goal(body, &term_vars(head), on_loop)?;
        return Ok(Expansion {
            term: Term::compound(":-", vec![head.clone(), body]),
            diagnostics,
        });
    }
    if let Some([goal]) = clause.shape(":-", 1) {
        let (goal, diagnostics) = rewrite_goal(goal, &VarSet::default(), on_loop)?;
        return Ok(Expansion {
            term: Term::compound(":-", vec![goal]),
            diagnostics,
        });
    }
    Ok(Expansion {
        term: clause.clone(),
        diagnostics: Vec::new(),
    })
}

fn rewrite_goal<F>(goal: &Term, outside: &VarSet, on_loop: &mut F) -> Result<(Term, Vec<Diagnostic>)>
where
    F: FnMut(&Term, &Term, &VarSet) -> Result<(Term, Vec<Diagnostic>)>,
{
    let Some((name, _)) = goal.name_arity() else {
        return Ok((goal.clone(), Vec::new()));
    };

    match (name, goal.args()) {
        ("," | ";" | "->", [left, right]) => {
            let (left_goal, mut diagnostics) =
                rewrite_goal(left, &with_vars_of(outside, right), on_loop)?;
            let (right_goal, more) = rewrite_goal(right, &with_vars_of(outside, left), on_loop)?;
            diagnostics.extend(more);
            Ok((Term::compound(name, vec![left_goal, right_goal]), diagnostics))
        }
        ("\\+" | "call", [inner]) => {
            let (inner, diagnostics) = rewrite_goal(inner, outside, on_loop)?;
            Ok((Term::compound(name, vec![inner]), diagnostics))
        }
        ("do", [specs, body]) if !specs.is_var() => on_loop(specs, body, outside),
        _ => Ok((goal.clone(), Vec::new())),
    }
}

/// Keep the loops of `clause` as goals, with their `param/N` entries
/// replaced by the variables each loop shares with its surroundings.
pub fn settle_clause(clause: &Term) -> Result<Expansion> {
    rewrite_clause(clause, &mut settle_loop)
}

/// [`settle_clause`] for a goal, where `outside` holds the variables
/// occurring around it.
pub fn settle_goal(goal: &Term, outside: &VarSet) -> Result<(Term, Vec<Diagnostic>)> {
    rewrite_goal(goal, outside, &mut settle_loop)
}

fn settle_loop(specs: &Term, body: &Term, outside: &VarSet) -> Result<(Term, Vec<Diagnostic>)> {
    let spec = parse_specification(specs)?;
    let shared = shared_vars(&spec, body, outside);

    // Nested loops see what a generated procedure would pass around.
    let mut around = spec.local_vars();
    around.extend(shared.iter().copied());
    let (body, mut diagnostics) = settle_goal(body, &around)?;

    let check = check_params(&shared, &spec.declared_params());
    diagnostics.extend(Diagnostic::parameters(Atom::new("do"), check));
    let settled = spec.with_params(&shared).to_term();
    Ok((Term::compound("do", vec![settled, body]), diagnostics))
}

impl<S: ProcedureStore + ?Sized> LoopCompiler<'_, S> {
    /// Expand every loop in a clause, a directive or a fact.
    pub fn expand_clause<V: VarSource>(&self, clause: &Term, vars: &mut V) -> Result<Expansion> {
        rewrite_clause(clause, &mut |specs, body, outside| {
            self.expand_loop(specs, body, outside, vars)
        })
    }

    /// Expand the loops of `goal`, where `outside` holds the variables
    /// occurring around it.
    pub fn expand_goal<V: VarSource>(
        &self,
        goal: &Term,
        outside: &VarSet,
        vars: &mut V,
    ) -> Result<(Term, Vec<Diagnostic>)> {
        rewrite_goal(goal, outside, &mut |specs, body, outside| {
            self.expand_loop(specs, body, outside, vars)
        })
    }

    fn expand_loop<V: VarSource>(
        &self,
        specs: &Term,
        body: &Term,
        outside: &VarSet,
        vars: &mut V,
    ) -> Result<(Term, Vec<Diagnostic>)> {
        let spec = parse_specification(specs)?;
        let shared = shared_vars(&spec, body, outside);
        let compiled = self.compile(
            LoopRequest {
                specs,
                body,
                shared: Some(&shared),
            },
            vars,
        )?;
        Ok((compiled.goal, compiled.diagnostics))
    }
}
