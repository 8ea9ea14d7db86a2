mod common;

use common::{compile_declared, compile_shared};
use loops_compiler::{
    DiagnosticKind, ProcedureCache, ProcedureStore, SpecificationError, WarningKind,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;

#[test]
fn test_same_loop_compiles_once() {
    let store = ProcedureCache::new();
    let first = compile_declared(&store, "foreach(X, L) do write(X)").expect("compiles");
    let second = compile_declared(&store, "foreach(Elem, List) do write(Elem)").expect("compiles");

    assert_eq!(first.name, second.name);
    assert_eq!(first.handle, second.handle);
    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_different_bodies_get_different_procedures() {
    let store = ProcedureCache::new();
    let first = compile_declared(&store, "foreach(X, L) do write(X)").expect("compiles");
    let second = compile_declared(&store, "foreach(X, L) do writeln(X)").expect("compiles");
    assert_ne!(first.name, second.name);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_different_bounds_get_different_procedures() {
    let store = ProcedureCache::new();
    let five = compile_declared(&store, "for(I, 1, 5) do true").expect("compiles");
    let six = compile_declared(&store, "for(I, 1, 6) do true").expect("compiles");
    assert_ne!(five.handle, six.handle);
}

#[rstest]
#[case::unknown("forall(X, L) do true")]
#[case::zero_step("for(I, 1, 5, 0) do true")]
#[case::variable_step("for(I, 1, 5, S) do true")]
#[case::open_stride("for(I, 1, N, 2) do true")]
#[case::param_term("foreach(X, L), param(f(Y)) do true")]
fn test_errors_register_nothing(#[case] src: &str) {
    let store = ProcedureCache::new();
    assert!(compile_declared(&store, src).is_err());
    assert!(store.is_empty());
}

#[test]
fn test_error_carries_descriptor() {
    let store = ProcedureCache::new();
    let err = compile_declared(&store, "foreach(X, L), loop(X) do true").unwrap_err();
    assert_eq!(err, SpecificationError::UnknownIterator("loop(_G0)".to_string()));
}

#[test]
fn test_param_warning_lists_both_sides() {
    let store = ProcedureCache::new();
    let (compiled, read) = compile_shared(
        &store,
        "foreach(X, L), param(Unused) do write(X-Limit)",
        &["Limit"],
    )
    .expect("compiles despite the warning");

    assert_eq!(compiled.diagnostics.len(), 1);
    let DiagnosticKind::Warning(WarningKind::ParameterDeclaration {
        undeclared,
        unshared,
    }) = &compiled.diagnostics[0].kind;
    assert_eq!(undeclared, &vec![read.var("Limit").expect("Limit")]);
    assert_eq!(unshared, &vec![read.var("Unused").expect("Unused")]);
}

#[test]
fn test_matching_params_are_silent() {
    let store = ProcedureCache::new();
    let (compiled, _) = compile_shared(
        &store,
        "foreach(X, L), param(Limit) do X < Limit",
        &["Limit"],
    )
    .expect("compiles");
    assert!(compiled.diagnostics.is_empty());
}

#[test]
fn test_concurrent_compilation_registers_one_procedure() {
    let store = ProcedureCache::new();
    let names: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    compile_declared(&store, "foreach(X, L), count(I, 1, N) do write(I-X)")
                        .expect("compiles")
                        .name
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread finished"))
            .collect()
    });

    let distinct: HashSet<_> = names.iter().collect();
    assert_eq!(distinct.len(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_global_store_is_shared() {
    let a = ProcedureCache::global();
    let b = ProcedureCache::global();
    let compiled = compile_declared(&*a, "foreach(X, L) do global_marker(X)").expect("compiles");
    assert!(b.resolve(compiled.name.as_str()).is_some());
}
