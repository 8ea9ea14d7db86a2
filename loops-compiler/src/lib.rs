//! Compilation of declarative loops into recursive procedures.
//!
//! A loop `Specs do Body` is compiled into a procedure `do__N` with two
//! clauses: a terminating one, matched against the combined terminal
//! pattern of every iterator, and a recursive one that runs the iterator
//! steps and the body before calling itself. Procedures are registered in a
//! [`ProcedureStore`] under the [`Signature`] of the loop, so variants of the
//! same loop share one procedure.

pub mod artifacts;
pub mod cache;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod params;
pub mod spec;
pub mod stop_bound;
pub mod synth;

pub use artifacts::{Artifacts, combine};
pub use cache::{
    GeneratedProcedure, ProcedureCache, ProcedureHandle, ProcedureStore, Registration, Signature,
    Synthesizer,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, WarningKind};
pub use error::{Result, SpecificationError};
pub use expand::{Expansion, settle_clause, settle_goal, shared_vars};
pub use params::{ParamCheck, check_params};
pub use spec::{IteratorSpec, LoopSpecification, parse_specification};
pub use synth::LoopPlan;

use loops_term::{Atom, Term, VarSet, VarSource, collect_vars};
use tracing::debug;

/// A loop goal to compile.
#[derive(Clone, Copy, Debug)]
pub struct LoopRequest<'a> {
    pub specs: &'a Term,
    pub body: &'a Term,
    /// Variables the body shares with its surroundings, when known. `None`
    /// keeps the `param/N` entries as declared.
    pub shared: Option<&'a VarSet>,
}

#[derive(Clone, Debug)]
pub struct CompiledLoop {
    /// Prelude goals followed by the first call of the procedure
    pub goal: Term,
    pub handle: ProcedureHandle,
    pub name: Atom,
    pub arity: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether an existing procedure was reused
    pub reused: bool,
}

/// Compiles loops against a procedure store.
#[derive(Debug)]
pub struct LoopCompiler<'s, S: ProcedureStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: ProcedureStore + ?Sized> LoopCompiler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    pub fn compile<V: VarSource>(
        &self,
        request: LoopRequest<'_>,
        vars: &mut V,
    ) -> Result<CompiledLoop> {
        let parsed = parse_specification(request.specs)?;
        let (spec, check) = match request.shared {
            Some(detected) => (
                parsed.with_params(detected),
                check_params(detected, &parsed.declared_params()),
            ),
            None => (parsed, ParamCheck::Consistent),
        };

        let artifacts = combine(&spec, vars)?;
        let signature = Signature::of(&spec.to_term(), request.body);

        let mut diagnostics = Vec::new();
        let Registration {
            handle,
            name,
            fresh,
        } = self.store.register_with(signature.clone(), &mut |name| {
            let (procedure, nested) = self.synthesize(name, &artifacts, request.body, vars)?;
            diagnostics.extend(nested);
            Ok(procedure)
        })?;

        if fresh {
            debug!(%signature, %name, arity = artifacts.arity(), "compiled loop");
        } else {
            debug!(%signature, %name, "reused loop procedure");
        }

        diagnostics.extend(Diagnostic::parameters(name.clone(), check));

        Ok(CompiledLoop {
            goal: synth::initial_goal(&name, &artifacts),
            handle,
            arity: artifacts.arity(),
            name,
            diagnostics,
            reused: !fresh,
        })
    }

    /// Build the procedure, expanding loops nested in the body first.
    fn synthesize<V: VarSource>(
        &self,
        name: Atom,
        artifacts: &Artifacts,
        body: &Term,
        vars: &mut V,
    ) -> Result<(GeneratedProcedure, Vec<Diagnostic>)> {
        let mut context = VarSet::default();
        for term in artifacts
            .head
            .iter()
            .chain(&artifacts.steps)
            .chain(&artifacts.call)
        {
            collect_vars(term, &mut context);
        }
        let (body, diagnostics) = self.expand_goal(body, &context, vars)?;
        Ok((synth::build_procedure(name, artifacts, body), diagnostics))
    }
}

/// Lay out a loop for direct execution, keeping `param/N` as declared.
pub fn plan<V: VarSource>(specs: &Term, body: &Term, vars: &mut V) -> Result<LoopPlan> {
    let spec = parse_specification(specs)?;
    let artifacts = combine(&spec, vars)?;
    Ok(LoopPlan::from_artifacts(artifacts, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loops_term::{Bindings, read_term};
    use pretty_assertions::assert_eq;

    fn split(src: &str, bindings: &mut Bindings) -> (Term, Term) {
        let term = read_term(src, bindings).expect("readable").term;
        let [specs, body] = term.shape("do", 2).expect("loop") else {
            unreachable!()
        };
        (specs.clone(), body.clone())
    }

    #[test]
    fn test_compile_emits_two_clauses() {
        let store = ProcedureCache::new();
        let compiler = LoopCompiler::new(&store);
        let mut bindings = Bindings::new();
        let (specs, body) = split("for(I, 1, 3) do write(I)", &mut bindings);
        let compiled = compiler
            .compile(
                LoopRequest {
                    specs: &specs,
                    body: &body,
                    shared: None,
                },
                &mut bindings,
            )
            .expect("compiles");

        assert_eq!(compiled.goal.to_string(), "do__0(1)");
        let procedure = store.get(compiled.handle).expect("registered");
        let [base, recursive] = procedure.clauses();
        assert_eq!(base.to_string(), "do__0(4) :- true");
        assert_eq!(
            recursive.to_string(),
            "do__0(_G0) :- _G1 is _G0+1, write(_G0), do__0(_G1)"
        );
    }

    #[test]
    fn test_inconsistent_params_warn_but_compile() {
        let store = ProcedureCache::new();
        let compiler = LoopCompiler::new(&store);
        let mut bindings = Bindings::new();
        let read = read_term("foreach(X, L), param(Y) do write(X-Z)", &mut bindings)
            .expect("readable");
        let [specs, body] = read.term.shape("do", 2).expect("loop") else {
            unreachable!()
        };
        let shared: VarSet = [read.var("Z").expect("Z")].into_iter().collect();
        let compiled = compiler
            .compile(
                LoopRequest {
                    specs,
                    body,
                    shared: Some(&shared),
                },
                &mut bindings,
            )
            .expect("compiles");

        assert_eq!(
            compiled.diagnostics,
            vec![Diagnostic::warning(
                compiled.name.clone(),
                WarningKind::ParameterDeclaration {
                    undeclared: vec![read.var("Z").expect("Z")],
                    unshared: vec![read.var("Y").expect("Y")],
                }
            )]
        );
        assert_eq!(compiled.arity, 2);
    }

    #[test]
    fn test_nested_loop_is_expanded_in_generated_body() {
        let store = ProcedureCache::new();
        let compiler = LoopCompiler::new(&store);
        let mut bindings = Bindings::new();
        let (specs, body) = split(
            "foreach(Row, Rows), count(I, 1, _) do (foreach(X, Row) do write(I-X))",
            &mut bindings,
        );
        let compiled = compiler
            .compile(
                LoopRequest {
                    specs: &specs,
                    body: &body,
                    shared: Some(&VarSet::default()),
                },
                &mut bindings,
            )
            .expect("compiles");

        assert_eq!(store.len(), 2);
        let outer = store.get(compiled.handle).expect("registered");
        let [_, recursive] = outer.clauses();
        let rendered = recursive.to_string();
        assert!(!rendered.contains(" do "), "{rendered}");
        let inner = store.resolve("do__1").expect("nested procedure");
        assert_eq!(inner.arity, 2, "row list plus the shared index");
    }

    #[test]
    fn test_plan_matches_compiled_layout() {
        let mut bindings = Bindings::new();
        let (specs, body) = split("foreach(X, [a, b]), count(I, 1, N) do true", &mut bindings);
        let plan = plan(&specs, &body, &mut bindings).expect("plans");
        assert_eq!(plan.initial.len(), 3);
        assert_eq!(plan.terminal.terms().len(), 3);
        assert_eq!(plan.step.terms().len(), 3);
    }
}
