//! Direct execution of a loop from its [`LoopPlan`], without generating a
//! procedure. Each iteration behaves like one call of the generated
//! procedure would.

use crate::error::Result;
use crate::machine::{Cont, Machine, Signal};
use loops_compiler::LoopPlan;
use loops_term::Term;
use tracing::trace;

impl Machine {
    pub(crate) fn interpret(
        &mut self,
        plan: &LoopPlan,
        depth: usize,
        barrier: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let prelude = Term::conjunction(plan.prelude.iter().cloned());
        self.solve(&prelude, depth, barrier, &mut |m: &mut Machine| {
            m.iterate(plan, &plan.initial, depth, k)
        })
    }

    fn iterate(
        &mut self,
        plan: &LoopPlan,
        args: &[Term],
        depth: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        self.check_depth(depth)?;
        let mark = self.bindings.mark();
        let terminal = plan.terminal.instantiate(&mut self.bindings);
        if self.bindings.unify_all(&terminal, args) {
            trace!(depth, "interpreted loop finished");
            let signal = k(self);
            self.bindings.undo_to(mark);
            return signal;
        }

        let step = plan.step.instantiate(&mut self.bindings);
        let head = list_args(&step[0]);
        let call = list_args(&step[2]);
        let local = self.new_barrier();
        let signal = if self.bindings.unify_all(&head, args) {
            self.solve(&step[1], depth + 1, local, &mut |m: &mut Machine| {
                m.iterate(plan, &call, depth + 1, k)
            })
        } else {
            Ok(Signal::Continue)
        };
        self.bindings.undo_to(mark);
        match signal? {
            Signal::Cut(b) if b == local => Ok(Signal::Continue),
            other => Ok(other),
        }
    }
}

fn list_args(list: &Term) -> Vec<Term> {
    list.list_items()
        .map(|items| items.into_iter().cloned().collect())
        .unwrap_or_default()
}
