//! Clause synthesis from combined artifacts.

use crate::artifacts::Artifacts;
use crate::cache::GeneratedProcedure;
use loops_term::{Atom, Template, Term};

/// Build the terminating and recursive clauses of procedure `name`.
///
/// The recursive body runs the iterator steps, then the loop body, then the
/// recursive call.
pub fn build_procedure(name: Atom, artifacts: &Artifacts, body: Term) -> GeneratedProcedure {
    let base_head = Term::compound(name.clone(), artifacts.terminal.clone());
    let head = Term::compound(name.clone(), artifacts.head.clone());
    let call = Term::compound(name.clone(), artifacts.call.clone());

    let mut goals = artifacts.steps.clone();
    goals.push(body);
    goals.push(call);

    GeneratedProcedure {
        arity: artifacts.arity(),
        base: Template::new(vec![base_head]),
        recursive: Template::new(vec![head, Term::conjunction(goals)]),
        name,
    }
}

/// The prelude followed by the first call.
pub fn initial_goal(name: &Atom, artifacts: &Artifacts) -> Term {
    let mut goals = artifacts.prelude.clone();
    goals.push(Term::compound(name.clone(), artifacts.initial.clone()));
    Term::conjunction(goals)
}

/// The same loop, laid out for direct execution without a named procedure.
#[derive(Clone, Debug)]
pub struct LoopPlan {
    pub prelude: Vec<Term>,
    pub initial: Vec<Term>,
    /// Terminal argument pattern
    pub terminal: Template,
    /// `[head_args, steps_and_body, call_args]`, argument tuples as lists
    pub step: Template,
}

impl LoopPlan {
    pub fn from_artifacts(artifacts: Artifacts, body: &Term) -> Self {
        let Artifacts {
            initial,
            terminal,
            prelude,
            head,
            mut steps,
            call,
        } = artifacts;
        steps.push(body.clone());
        Self {
            prelude,
            initial,
            terminal: Template::new(terminal),
            step: Template::new(vec![
                Term::list(head),
                Term::conjunction(steps),
                Term::list(call),
            ]),
        }
    }
}
