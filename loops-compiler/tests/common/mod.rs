#![allow(dead_code)]

use loops_compiler::{CompiledLoop, LoopCompiler, LoopRequest, ProcedureStore, Result};
use loops_term::{Bindings, ReadTerm, Term, VarSet, read_term};

/// Read `Specs do Body` and return the read term with both halves.
pub fn read_loop(src: &str, bindings: &mut Bindings) -> (ReadTerm, Term, Term) {
    let read = read_term(src, bindings).expect("loop source should be readable");
    let (specs, body) = match read.term.shape("do", 2) {
        Some([specs, body]) => (specs.clone(), body.clone()),
        _ => panic!("not a loop: {src}"),
    };
    (read, specs, body)
}

/// Compile `src` with the parameters as declared.
pub fn compile_declared<S: ProcedureStore + ?Sized>(
    store: &S,
    src: &str,
) -> Result<CompiledLoop> {
    let mut bindings = Bindings::new();
    let (_, specs, body) = read_loop(src, &mut bindings);
    LoopCompiler::new(store).compile(
        LoopRequest {
            specs: &specs,
            body: &body,
            shared: None,
        },
        &mut bindings,
    )
}

/// Compile `src` with `shared` named variables detected as shared.
pub fn compile_shared<S: ProcedureStore + ?Sized>(
    store: &S,
    src: &str,
    shared: &[&str],
) -> Result<(CompiledLoop, ReadTerm)> {
    let mut bindings = Bindings::new();
    let (read, specs, body) = read_loop(src, &mut bindings);
    let detected: VarSet = shared
        .iter()
        .map(|name| read.var(name).expect("shared variable should occur in the loop"))
        .collect();
    let compiled = LoopCompiler::new(store).compile(
        LoopRequest {
            specs: &specs,
            body: &body,
            shared: Some(&detected),
        },
        &mut bindings,
    )?;
    Ok((compiled, read))
}
