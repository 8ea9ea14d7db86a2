mod common;

use common::{Mode, only, values};
use loops_compiler::SpecificationError;
use loops_vm::{EngineConfig, EngineError, Machine};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case::for_builds_list("for(I, 1, 5), foreach(x, L) do true", "[x,x,x,x,x]")]
#[case::for_descending("for(I, 5, 1, -1), foreach(I, L) do true", "[5,4,3,2,1]")]
#[case::for_step_hits_bound("for(I, 1, 10, 3), foreach(I, L) do true", "[1,4,7,10]")]
#[case::for_step_overshoots("for(I, 1, 9, 3), foreach(I, L) do true", "[1,4,7]")]
#[case::for_empty_range("for(I, 3, 1), foreach(I, L) do true", "[]")]
#[case::for_expression_bounds("for(I, 2 - 1, 2 * 2), foreach(I, L) do true", "[1,2,3,4]")]
#[case::count_closed("count(I, 1, 3), foreach(I, L) do true", "[1,2,3]")]
#[case::count_from_zero("count(I, 0, 2), foreach(I, L) do true", "[0,1,2]")]
#[case::foreach_maps("foreach(X, [1, 2, 3]), foreach(Y, L) do Y is X * X", "[1,4,9]")]
#[case::foreacharg("foreacharg(A, f(a, b, c)), foreach(A, L) do true", "[a,b,c]")]
#[case::foreacharg_indexed("foreacharg(A, g(x, y), I), foreach(I-A, L) do true", "[1-x,2-y]")]
#[case::fromto_reverses("foreach(X, [a, b, c]), fromto([], T, [X|T], L) do true", "[c,b,a]")]
fn test_loop_results(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
    #[case] specs: &str,
    #[case] expected: &str,
) {
    let query = format!("({specs})");
    assert_eq!(only(mode, &query, "L"), expected, "{mode:?}");
}

#[rstest]
fn test_sum_is_independent_of_iterator_order(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let first = only(
        mode,
        "(foreach(X, [1, 2, 3, 4]), fromto(0, S0, S1, S) do S1 is S0 + X)",
        "S",
    );
    let second = only(
        mode,
        "(fromto(0, S0, S1, S), foreach(X, [1, 2, 3, 4]) do S1 is S0 + X)",
        "S",
    );
    assert_eq!(first, "10");
    assert_eq!(second, first);
}

#[rstest]
fn test_mismatched_lengths_fail(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let mut machine = mode.machine();
    assert_eq!(
        values(&mut machine, "(foreach(X, [a, b]), foreach(Y, [1, 2, 3]) do true)", "X"),
        Vec::<String>::new()
    );
    assert_eq!(
        values(&mut machine, "(foreach(X, [a, b, c]), for(I, 1, 2) do true)", "X"),
        Vec::<String>::new()
    );
}

#[rstest]
fn test_count_with_open_max_binds_it(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    assert_eq!(
        only(mode, "(foreach(_, [a, b, c]), count(I, 1, N) do true)", "N"),
        "3"
    );
    assert_eq!(
        only(mode, "(foreach(_, []), count(I, 1, N) do true)", "N"),
        "0"
    );
}

#[rstest]
fn test_params_carry_outer_values(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    assert_eq!(
        only(
            mode,
            "K = 10, (foreach(X, [1, 2]), foreach(Y, L), param(K) do Y is X + K)",
            "L"
        ),
        "[11,12]"
    );
}

#[rstest]
fn test_undeclared_shared_variables_are_threaded(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    assert_eq!(only(mode, "(foreach(X, [a]) do Y = X), Z = Y", "Z"), "a");
    assert_eq!(
        only(
            mode,
            "K = 10, (foreach(X, [1, 2]), foreach(Y, L) do Y is X + K)",
            "L"
        ),
        "[11,12]"
    );
}

#[rstest]
fn test_count_max_bound_before_the_loop(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let mut machine = Machine::new(mode.config().with_depth_limit(500)).expect("loads");
    assert_eq!(
        values(&mut machine, "N = 1, (count(I, 5, N) do true)", "N"),
        ["1"]
    );
    assert_eq!(
        values(&mut machine, "N = 7, (count(I, 5, N), foreach(I, L) do true)", "L"),
        ["[5,6,7]"]
    );
}

#[rstest]
fn test_nested_loops(#[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode) {
    assert_eq!(
        only(
            mode,
            "(foreach(Row, [[1, 2], [3]]), foreach(S, L) do \
               (foreach(X, Row), fromto(0, A0, A1, S) do A1 is A0 + X))",
            "L"
        ),
        "[3,3]"
    );
    assert_eq!(
        only(
            mode,
            "(foreach(Row, [[a, b], [c]]), count(I, 1, _), foreach(R, L) do \
               (foreach(X, Row), foreach(I-X, R), param(I) do true))",
            "L"
        ),
        "[[1-a,1-b],[2-c]]"
    );
}

#[rstest]
fn test_body_alternatives_backtrack_into_earlier_iterations(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let mut machine = mode.machine();
    let answers = values(
        &mut machine,
        "(foreach(X, [a, b]), foreach(Y, L) do member(Y, [X, z]))",
        "L",
    );
    assert_eq!(answers, ["[a,b]", "[a,z]", "[z,b]", "[z,z]"]);
}

#[rstest]
fn test_findall_over_loop_solutions(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    assert_eq!(
        only(
            mode,
            "findall(S, (foreach(X, [1, 2]), fromto(0, A, B, S) do member(D, [0, X]), B is A + D), All)",
            "All"
        ),
        "[0,2,1,3]"
    );
}

#[rstest]
fn test_body_output_follows_iteration_order(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let mut machine = mode.machine();
    machine
        .query("(for(I, 1, 3) do write(I), write(' '))")
        .expect("runs");
    assert_eq!(machine.take_output(), "1 2 3 ");
}

#[rstest]
fn test_loops_inside_consulted_clauses(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
) {
    let mut machine = mode.machine();
    machine
        .consult(
            "scale(Xs, K, Ys) :- ( foreach(X, Xs), foreach(Y, Ys), param(K) do Y is X * K ).\n\
             squares(N, Sq) :- ( for(I, 1, N), foreach(S, Sq) do S is I * I ).",
        )
        .expect("consults");
    assert_eq!(
        values(&mut machine, "scale([1, 2, 3], 3, Ys)", "Ys"),
        ["[3,6,9]"]
    );
    assert_eq!(values(&mut machine, "squares(4, Sq)", "Sq"), ["[1,4,9,16]"]);
    assert_eq!(values(&mut machine, "squares(0, Sq)", "Sq"), ["[]"]);
}

#[rstest]
fn test_library_loops(#[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode) {
    assert_eq!(only(mode, "sum_list([3, 4, 5], S)", "S"), "12");
    assert_eq!(only(mode, "numlist(2, 5, L)", "L"), "[2,3,4,5]");
    assert_eq!(only(mode, "reverse([1, 2, 3], L)", "L"), "[3,2,1]");
}

#[rstest]
#[case::zero_step("(for(I, 1, 5, 0) do true)", "ZeroStep")]
#[case::unbound_step("(for(I, 1, 5, S) do true)", "UnsupportedStep")]
#[case::open_bound_with_wide_step("(for(I, 1, N, 2) do true)", "UnsupportedBound")]
#[case::unknown_iterator("(loop(X) do true)", "UnknownIterator")]
fn test_invalid_loops_are_errors(
    #[values(Mode::Ahead, Mode::Runtime, Mode::Interpreted)] mode: Mode,
    #[case] query: &str,
    #[case] expected: &str,
) {
    let mut machine = mode.machine();
    let err = machine.query(query).unwrap_err();
    let EngineError::Specification(found) = &err else {
        panic!("{mode:?}: unexpected error {err}");
    };
    let kind = match found {
        SpecificationError::ZeroStep(_) => "ZeroStep",
        SpecificationError::UnsupportedStep(_) => "UnsupportedStep",
        SpecificationError::UnsupportedBound(_) => "UnsupportedBound",
        SpecificationError::UnknownIterator(_) => "UnknownIterator",
        other => panic!("{mode:?}: unexpected error {other}"),
    };
    assert_eq!(kind, expected, "{mode:?}");
}

#[test]
fn test_depth_limit_stops_long_loops() {
    let mut machine = Machine::new(EngineConfig::default().with_depth_limit(50)).expect("loads");
    assert_eq!(
        machine.query("(for(I, 1, 1000) do true)").unwrap_err(),
        EngineError::DepthLimit(50)
    );
    assert_eq!(machine.query("(for(I, 1, 10) do true)").expect("runs").len(), 1);
}

#[test]
fn test_deep_loops_run_without_a_limit() {
    let mut machine = Mode::Ahead.machine();
    assert_eq!(
        values(
            &mut machine,
            "(for(I, 1, 10000), fromto(0, S0, S1, S) do S1 is S0 + I)",
            "S"
        ),
        ["50005000"]
    );
}
