//! Integer arithmetic over terms.

use crate::bindings::Bindings;
use crate::error::{Result, TermError};
use crate::term::Term;

/// Evaluate an arithmetic expression under the current bindings.
pub fn eval(term: &Term, bindings: &Bindings) -> Result<i64> {
    match bindings.walk(term) {
        Term::Int(n) => Ok(n),
        Term::Var(_) => Err(TermError::instantiation("arithmetic expression")),
        Term::Atom(a) => Err(TermError::type_error("evaluable", format!("{}/0", a.as_str()))),
        Term::Compound(s) => match s.args.as_slice() {
            [x] => apply_unary(s.functor.as_str(), eval(x, bindings)?),
            [x, y] => apply_binary(
                s.functor.as_str(),
                eval(x, bindings)?,
                eval(y, bindings)?,
            ),
            args => Err(TermError::type_error(
                "evaluable",
                format!("{}/{}", s.functor.as_str(), args.len()),
            )),
        },
    }
}

/// Evaluate a term that is already ground, without any bindings.
///
/// Returns `None` when the term contains variables or is not an arithmetic
/// expression; the loop compiler uses this to decide whether a bound is known
/// at compile time.
pub fn const_eval(term: &Term) -> Option<i64> {
    match term {
        Term::Int(n) => Some(*n),
        Term::Var(_) | Term::Atom(_) => None,
        Term::Compound(s) => match s.args.as_slice() {
            [x] => apply_unary(s.functor.as_str(), const_eval(x)?).ok(),
            [x, y] => apply_binary(s.functor.as_str(), const_eval(x)?, const_eval(y)?).ok(),
            _ => None,
        },
    }
}

fn apply_unary(op: &str, x: i64) -> Result<i64> {
    match op {
        "-" => x.checked_neg().ok_or(TermError::Evaluation("int_overflow")),
        "+" => Ok(x),
        "abs" => x.checked_abs().ok_or(TermError::Evaluation("int_overflow")),
        "sign" => Ok(x.signum()),
        _ => Err(TermError::type_error("evaluable", format!("{op}/1"))),
    }
}

fn apply_binary(op: &str, x: i64, y: i64) -> Result<i64> {
    let overflow = TermError::Evaluation("int_overflow");
    match op {
        "+" => x.checked_add(y).ok_or(overflow),
        "-" => x.checked_sub(y).ok_or(overflow),
        "*" => x.checked_mul(y).ok_or(overflow),
        "//" => {
            if y == 0 {
                Err(TermError::Evaluation("zero_divisor"))
            } else {
                x.checked_div(y).ok_or(overflow)
            }
        }
        "rem" => {
            if y == 0 {
                Err(TermError::Evaluation("zero_divisor"))
            } else {
                x.checked_rem(y).ok_or(overflow)
            }
        }
        "mod" => {
            if y == 0 {
                Err(TermError::Evaluation("zero_divisor"))
            } else {
                Ok(floor_mod(x, y))
            }
        }
        "min" => Ok(x.min(y)),
        "max" => Ok(x.max(y)),
        _ => Err(TermError::type_error("evaluable", format!("{op}/2"))),
    }
}

/// Modulo whose result takes the sign of the divisor.
pub fn floor_mod(x: i64, y: i64) -> i64 {
    let r = x.wrapping_rem(y);
    if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }
}
