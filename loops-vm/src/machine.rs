//! Depth-first resolution with chronological backtracking.
//!
//! Goals are solved in continuation-passing style: every solution of a goal
//! is handed to a continuation, and the [`Signal`] it returns tells the goal
//! whether to look for more solutions, stop the search or unwind to a cut
//! barrier. Each solve undoes its own bindings before returning, so the
//! store always looks the same to a caller after a goal is exhausted.

use crate::answer::Answer;
use crate::config::{EngineConfig, LoopMode};
use crate::error::{EngineError, Result};
use crate::library::LIBRARY;
use crate::program::Program;
use crate::report::LoopWarning;
use indexmap::IndexMap;
use loops_compiler::{
    Diagnostic, GeneratedProcedure, LoopCompiler, LoopRequest, ProcedureHandle, ProcedureStore,
    parse_specification, settle_clause, settle_goal, shared_vars,
};
use loops_term::{
    Atom, Bindings, ReadTerm, Template, Term, TermError, VarId, VarSet, read_program, read_term,
    term_vars,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

const STACK_RED_ZONE: usize = 32 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

/// What a continuation asks of the goal that produced a solution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Backtrack into the goal for further solutions.
    Continue,
    /// Abandon the whole search.
    Halt,
    /// Discard every alternative up to the given barrier.
    Cut(usize),
}

pub(crate) type Cont<'a> = dyn FnMut(&mut Machine) -> Result<Signal> + 'a;

pub struct Machine {
    config: EngineConfig,
    program: Program,
    pub(crate) bindings: Bindings,
    pub(crate) output: String,
    warnings: Vec<LoopWarning>,
    next_barrier: usize,
}

impl Machine {
    /// A machine with the list library already consulted.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let mut machine = Self {
            config,
            program: Program::new(),
            bindings: Bindings::new(),
            output: String::new(),
            warnings: Vec::new(),
            next_barrier: 0,
        };
        machine.consult(LIBRARY)?;
        Ok(machine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ProcedureStore> {
        &self.config.store
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Add the clauses of `text` to the program and run its directives.
    /// Returns the number of clauses added.
    pub fn consult(&mut self, text: &str) -> Result<usize> {
        let mark = self.bindings.mark();
        let result = self.consult_clauses(text);
        self.bindings.undo_to(mark);
        result
    }

    fn consult_clauses(&mut self, text: &str) -> Result<usize> {
        let mut added = 0;
        for read in read_program(text, &mut self.bindings)? {
            let clause = self.prepare_clause(&read)?;
            if let Some([goal]) = clause.shape(":-", 1) {
                self.run_directive(goal)?;
                continue;
            }
            self.program.add_clause(&clause)?;
            added += 1;
        }
        debug!(added, "consulted clauses");
        Ok(added)
    }

    fn run_directive(&mut self, goal: &Term) -> Result<()> {
        let mut succeeded = false;
        let barrier = self.new_barrier();
        self.solve(goal, 0, barrier, &mut |_: &mut Machine| {
            succeeded = true;
            Ok(Signal::Halt)
        })?;
        if !succeeded {
            warn!(directive = %goal, "directive failed");
        }
        Ok(())
    }

    /// Compile the loops of a read clause, or settle their parameters when
    /// loops are left to run time.
    fn prepare_clause(&mut self, read: &ReadTerm) -> Result<Term> {
        let expansion = if self.config.expands_ahead() {
            let store = Arc::clone(&self.config.store);
            LoopCompiler::new(&*store).expand_clause(&read.term, &mut self.bindings)?
        } else {
            settle_clause(&read.term)?
        };
        self.report(&expansion.diagnostics, &read.var_names);
        Ok(expansion.term)
    }

    /// Every answer to the goal in `text`.
    pub fn query(&mut self, text: &str) -> Result<Vec<Answer>> {
        self.run_query(text, None)
    }

    /// The first answer to the goal in `text`, if any.
    pub fn query_once(&mut self, text: &str) -> Result<Option<Answer>> {
        Ok(self.run_query(text, Some(1))?.into_iter().next())
    }

    /// At most `limit` answers to the goal in `text`.
    pub fn query_limit(&mut self, text: &str, limit: usize) -> Result<Vec<Answer>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.run_query(text, Some(limit))
    }

    fn run_query(&mut self, text: &str, limit: Option<usize>) -> Result<Vec<Answer>> {
        let mark = self.bindings.mark();
        let result = self.collect_answers(text, limit);
        self.bindings.undo_to(mark);
        result
    }

    fn collect_answers(&mut self, text: &str, limit: Option<usize>) -> Result<Vec<Answer>> {
        let read = read_term(text, &mut self.bindings)?;
        let (goal, diagnostics) = if self.config.expands_ahead() {
            let store = Arc::clone(&self.config.store);
            LoopCompiler::new(&*store).expand_goal(
                &read.term,
                &VarSet::default(),
                &mut self.bindings,
            )?
        } else {
            settle_goal(&read.term, &VarSet::default())?
        };
        self.report(&diagnostics, &read.var_names);

        let named: Vec<(String, VarId)> = read
            .var_names
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .cloned()
            .collect();
        let mut answers = Vec::new();
        let barrier = self.new_barrier();
        self.solve(&goal, 0, barrier, &mut |m: &mut Machine| {
            let bindings: IndexMap<String, Term> = named
                .iter()
                .map(|(name, var)| (name.clone(), m.bindings.resolve(&Term::Var(*var))))
                .collect();
            answers.push(Answer::new(bindings));
            Ok(match limit {
                Some(limit) if answers.len() >= limit => Signal::Halt,
                _ => Signal::Continue,
            })
        })?;
        debug!(query = %read.term, answers = answers.len(), "query finished");
        Ok(answers)
    }

    /// Call a registered procedure directly. Variables in `args` are
    /// renamed apart; the arguments as bound by the first solution are
    /// returned.
    pub fn invoke(&mut self, handle: ProcedureHandle, args: &[Term]) -> Result<Option<Vec<Term>>> {
        let procedure = self
            .config
            .store
            .get(handle)
            .ok_or_else(|| EngineError::unknown(&format!("#{}", handle.index()), args.len()))?;
        if procedure.arity != args.len() {
            return Err(EngineError::unknown(&procedure.name, args.len()));
        }

        let mark = self.bindings.mark();
        let args = Template::new(args.to_vec()).instantiate(&mut self.bindings);
        let mut solution = None;
        let result = self.call_generated(&procedure, &args, 0, &mut |m: &mut Machine| {
            solution = Some(args.iter().map(|arg| m.bindings.resolve(arg)).collect());
            Ok(Signal::Halt)
        });
        self.bindings.undo_to(mark);
        result?;
        Ok(solution)
    }

    /// Clauses of every generated procedure, in registration order.
    pub fn listing(&self) -> Vec<String> {
        self.config
            .store
            .procedures()
            .iter()
            .flat_map(|procedure| procedure.clauses())
            .map(|clause| format!("{clause}."))
            .collect()
    }

    /// Warnings collected since the last call.
    pub fn take_warnings(&mut self) -> Vec<LoopWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Text written by the output builtins since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn report(&mut self, diagnostics: &[Diagnostic], names: &[(String, VarId)]) {
        self.warnings.extend(
            diagnostics
                .iter()
                .map(|diagnostic| LoopWarning::from_diagnostic(diagnostic, names)),
        );
    }

    pub(crate) fn new_barrier(&mut self) -> usize {
        self.next_barrier += 1;
        self.next_barrier
    }

    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        match self.config.depth_limit {
            Some(limit) if depth >= limit => Err(EngineError::DepthLimit(limit)),
            _ => Ok(()),
        }
    }

    pub(crate) fn solve(
        &mut self,
        goal: &Term,
        depth: usize,
        barrier: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
            self.solve_goal(goal, depth, barrier, k)
        })
    }

    fn solve_goal(
        &mut self,
        goal: &Term,
        depth: usize,
        barrier: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let goal = self.bindings.walk(goal);
        let (name, args) = match &goal {
            Term::Var(_) => return Err(TermError::instantiation("goal").into()),
            Term::Int(_) => return Err(TermError::type_error("callable", &goal).into()),
            Term::Atom(name) => (name.clone(), &[][..]),
            Term::Compound(s) => (s.functor.clone(), s.args.as_slice()),
        };

        match (name.as_str(), args) {
            ("true", []) => k(self),
            ("fail" | "false", []) => Ok(Signal::Continue),
            ("!", []) => match k(self)? {
                Signal::Continue => Ok(Signal::Cut(barrier)),
                other => Ok(other),
            },
            (",", [left, right]) => self.solve(left, depth, barrier, &mut |m: &mut Machine| {
                m.solve(right, depth, barrier, k)
            }),
            (";", [left, right]) => {
                let left = self.bindings.walk(left);
                if let Some([condition, then]) = left.shape("->", 2) {
                    return self.if_then_else(condition, then, Some(right), depth, barrier, k);
                }
                match self.solve(&left, depth, barrier, k)? {
                    Signal::Continue => self.solve(right, depth, barrier, k),
                    other => Ok(other),
                }
            }
            ("->", [condition, then]) => {
                self.if_then_else(condition, then, None, depth, barrier, k)
            }
            ("\\+" | "not", [inner]) => self.negation(inner, depth, k),
            ("call", [target, extra @ ..]) => {
                let goal = add_args(&self.bindings.walk(target), extra)?;
                self.solve_opaque(&goal, depth, k)
            }
            ("do", [specs, body]) => self.run_loop(specs, body, depth, barrier, k),
            ("findall", [template, inner, result]) => {
                self.findall(template, inner, result, depth, k)
            }
            _ => match self.call_builtin(&name, args, k)? {
                Some(signal) => Ok(signal),
                None => self.call_predicate(&name, args, depth, k),
            },
        }
    }

    fn if_then_else(
        &mut self,
        condition: &Term,
        then: &Term,
        otherwise: Option<&Term>,
        depth: usize,
        barrier: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let local = self.new_barrier();
        let mut found = false;
        let signal = self.solve(condition, depth, local, &mut |m: &mut Machine| {
            found = true;
            match m.solve(then, depth, barrier, k)? {
                Signal::Continue => Ok(Signal::Cut(local)),
                other => Ok(other),
            }
        })?;
        match signal {
            Signal::Cut(b) if b == local => Ok(Signal::Continue),
            Signal::Continue if !found => match otherwise {
                Some(otherwise) => self.solve(otherwise, depth, barrier, k),
                None => Ok(Signal::Continue),
            },
            other => Ok(other),
        }
    }

    fn negation(&mut self, inner: &Term, depth: usize, k: &mut Cont<'_>) -> Result<Signal> {
        let local = self.new_barrier();
        match self.solve(inner, depth, local, &mut |_: &mut Machine| Ok(Signal::Cut(local)))? {
            Signal::Cut(b) if b == local => Ok(Signal::Continue),
            Signal::Continue => k(self),
            other => Ok(other),
        }
    }

    /// Solve `goal` with cuts inside it confined to the goal itself.
    fn solve_opaque(&mut self, goal: &Term, depth: usize, k: &mut Cont<'_>) -> Result<Signal> {
        let local = self.new_barrier();
        match self.solve(goal, depth, local, k)? {
            Signal::Cut(b) if b == local => Ok(Signal::Continue),
            other => Ok(other),
        }
    }

    fn findall(
        &mut self,
        template: &Term,
        inner: &Term,
        result: &Term,
        depth: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let mut found: Vec<Template> = Vec::new();
        let local = self.new_barrier();
        self.solve(inner, depth, local, &mut |m: &mut Machine| {
            found.push(Template::new(vec![m.bindings.resolve(template)]));
            Ok(Signal::Continue)
        })?;
        let items: Vec<Term> = found
            .iter()
            .flat_map(|copy| copy.instantiate(&mut self.bindings))
            .collect();
        self.unify_then(result, &Term::list(items), k)
    }

    /// Run a loop reached at run time. The loop is compiled or planned from
    /// its unresolved shape so that calls on different data share one
    /// procedure; outer variables bound by now are passed in as parameters.
    fn run_loop(
        &mut self,
        specs: &Term,
        body: &Term,
        depth: usize,
        barrier: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let spec = parse_specification(&self.iterators(specs))?;
        let bound: VarSet = term_vars(body)
            .into_iter()
            .filter(|&var| self.bindings.walk(&Term::Var(var)) != Term::Var(var))
            .collect();
        let mut threaded = spec.declared_params();
        threaded.extend(shared_vars(&spec, body, &bound));
        let specs = spec.with_params(&threaded).to_term();

        match self.config.loop_mode {
            LoopMode::Compiled => {
                let store = Arc::clone(&self.config.store);
                let compiled = LoopCompiler::new(&*store).compile(
                    LoopRequest {
                        specs: &specs,
                        body,
                        shared: None,
                    },
                    &mut self.bindings,
                )?;
                self.report(&compiled.diagnostics, &[]);
                trace!(procedure = %compiled.name, reused = compiled.reused, "calling loop");
                self.solve(&compiled.goal, depth, barrier, k)
            }
            LoopMode::Interpreted => {
                let plan = loops_compiler::plan(&specs, body, &mut self.bindings)?;
                self.interpret(&plan, depth, barrier, k)
            }
        }
    }

    /// The conjunction of iterator descriptors behind `specs`, with the
    /// descriptors' own arguments left as they are.
    fn iterators(&self, specs: &Term) -> Term {
        let specs = self.bindings.walk(specs);
        match specs.shape(",", 2) {
            Some([left, right]) => {
                Term::compound(",", vec![self.iterators(left), self.iterators(right)])
            }
            _ => specs,
        }
    }

    fn call_predicate(
        &mut self,
        name: &Atom,
        args: &[Term],
        depth: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        if let Some(clauses) = self.program.clauses(name, args.len()) {
            self.check_depth(depth)?;
            let local = self.new_barrier();
            for clause in clauses.iter() {
                let mark = self.bindings.mark();
                let renamed = clause.instantiate(&mut self.bindings);
                let signal = if self.bindings.unify_all(renamed[0].args(), args) {
                    self.solve(&renamed[1], depth + 1, local, k)?
                } else {
                    Signal::Continue
                };
                self.bindings.undo_to(mark);
                match signal {
                    Signal::Continue => {}
                    Signal::Cut(b) if b == local => return Ok(Signal::Continue),
                    other => return Ok(other),
                }
            }
            return Ok(Signal::Continue);
        }

        match self.config.store.resolve(name) {
            Some(procedure) if procedure.arity == args.len() => {
                self.call_generated(&procedure, args, depth, k)
            }
            _ => Err(EngineError::unknown(name, args.len())),
        }
    }

    /// Run a generated loop procedure. The terminating clause is tried first
    /// and, when it matches, the recursive clause is never tried.
    pub(crate) fn call_generated(
        &mut self,
        procedure: &GeneratedProcedure,
        args: &[Term],
        depth: usize,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        self.check_depth(depth)?;
        let mark = self.bindings.mark();
        let base = procedure.base.instantiate(&mut self.bindings);
        if self.bindings.unify_all(base[0].args(), args) {
            trace!(procedure = %procedure.name, depth, "loop finished");
            let signal = k(self);
            self.bindings.undo_to(mark);
            return signal;
        }

        let clause = procedure.recursive.instantiate(&mut self.bindings);
        let local = self.new_barrier();
        let signal = if self.bindings.unify_all(clause[0].args(), args) {
            self.solve(&clause[1], depth + 1, local, k)
        } else {
            Ok(Signal::Continue)
        };
        self.bindings.undo_to(mark);
        match signal? {
            Signal::Cut(b) if b == local => Ok(Signal::Continue),
            other => Ok(other),
        }
    }

    pub(crate) fn unify_then(
        &mut self,
        left: &Term,
        right: &Term,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        let mark = self.bindings.mark();
        if !self.bindings.unify(left, right) {
            return Ok(Signal::Continue);
        }
        let signal = k(self);
        self.bindings.undo_to(mark);
        signal
    }
}

/// `call/N`: extend a goal with extra arguments.
fn add_args(target: &Term, extra: &[Term]) -> Result<Term> {
    if extra.is_empty() {
        return Ok(target.clone());
    }
    match target {
        Term::Atom(name) => Ok(Term::compound(name.clone(), extra.to_vec())),
        Term::Compound(s) => {
            let mut args = s.args.clone();
            args.extend_from_slice(extra);
            Ok(Term::compound(s.functor.clone(), args))
        }
        Term::Var(_) => Err(TermError::instantiation("call/N").into()),
        Term::Int(_) => Err(TermError::type_error("callable", target).into()),
    }
}
