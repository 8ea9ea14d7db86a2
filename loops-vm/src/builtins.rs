//! Deterministic built-in predicates.

use crate::error::Result;
use crate::machine::{Cont, Machine, Signal};
use loops_term::{Term, TermError, Unquoted, VarSource, eval};
use std::cmp::Ordering;

impl Machine {
    /// Run `name/args` if it is a builtin; `None` otherwise.
    pub(crate) fn call_builtin(
        &mut self,
        name: &str,
        args: &[Term],
        k: &mut Cont<'_>,
    ) -> Result<Option<Signal>> {
        let signal = match (name, args) {
            ("=", [left, right]) => self.unify_then(left, right, k)?,
            ("\\=", [left, right]) => {
                let mark = self.bindings.mark();
                let unifiable = self.bindings.unify(left, right);
                self.bindings.undo_to(mark);
                self.succeed_if(!unifiable, k)?
            }
            ("==", [left, right]) => {
                let identical = self.bindings.resolve(left) == self.bindings.resolve(right);
                self.succeed_if(identical, k)?
            }
            ("\\==", [left, right]) => {
                let identical = self.bindings.resolve(left) == self.bindings.resolve(right);
                self.succeed_if(!identical, k)?
            }
            ("is", [target, expr]) => {
                let value = eval(expr, &self.bindings)?;
                self.unify_then(target, &Term::int(value), k)?
            }
            ("=:=" | "=\\=" | "<" | ">" | "=<" | ">=", [left, right]) => {
                let ordering = eval(left, &self.bindings)?.cmp(&eval(right, &self.bindings)?);
                let holds = match name {
                    "=:=" => ordering == Ordering::Equal,
                    "=\\=" => ordering != Ordering::Equal,
                    "<" => ordering == Ordering::Less,
                    ">" => ordering == Ordering::Greater,
                    "=<" => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                self.succeed_if(holds, k)?
            }

            ("var", [term]) => {
                let holds = self.bindings.walk(term).is_var();
                self.succeed_if(holds, k)?
            }
            ("nonvar", [term]) => {
                let holds = !self.bindings.walk(term).is_var();
                self.succeed_if(holds, k)?
            }
            ("integer", [term]) => {
                let holds = matches!(self.bindings.walk(term), Term::Int(_));
                self.succeed_if(holds, k)?
            }
            ("atom", [term]) => {
                let holds = matches!(self.bindings.walk(term), Term::Atom(_));
                self.succeed_if(holds, k)?
            }
            ("atomic", [term]) => {
                let holds = matches!(self.bindings.walk(term), Term::Atom(_) | Term::Int(_));
                self.succeed_if(holds, k)?
            }
            ("compound", [term]) => {
                let holds = matches!(self.bindings.walk(term), Term::Compound(_));
                self.succeed_if(holds, k)?
            }
            ("is_list", [term]) => {
                let holds = self.bindings.resolve(term).list_items().is_some();
                self.succeed_if(holds, k)?
            }

            ("functor", [term, name, arity]) => self.functor(term, name, arity, k)?,
            ("arg", [index, term, value]) => self.arg(index, term, value, k)?,
            ("=..", [term, list]) => self.univ(term, list, k)?,
            ("length", [list, length]) => self.length(list, length, k)?,
            ("atom_length", [atom, length]) => match self.bindings.walk(atom) {
                Term::Atom(a) => {
                    let count = a.as_str().chars().count() as i64;
                    self.unify_then(length, &Term::int(count), k)?
                }
                Term::Var(_) => return Err(TermError::instantiation("atom_length/2").into()),
                other => return Err(TermError::type_error("atom", &other).into()),
            },
            ("succ", [before, after]) => self.succ(before, after, k)?,

            ("write" | "print", [term]) => {
                let text = Unquoted(&self.bindings.resolve(term)).to_string();
                self.output.push_str(&text);
                k(self)?
            }
            ("writeln", [term]) => {
                let text = Unquoted(&self.bindings.resolve(term)).to_string();
                self.output.push_str(&text);
                self.output.push('\n');
                k(self)?
            }
            ("nl", []) => {
                self.output.push('\n');
                k(self)?
            }
            _ => return Ok(None),
        };
        Ok(Some(signal))
    }

    fn succeed_if(&mut self, holds: bool, k: &mut Cont<'_>) -> Result<Signal> {
        if holds { k(self) } else { Ok(Signal::Continue) }
    }

    fn functor(
        &mut self,
        term: &Term,
        name: &Term,
        arity: &Term,
        k: &mut Cont<'_>,
    ) -> Result<Signal> {
        match self.bindings.walk(term) {
            Term::Var(_) => {
                let name = self.bindings.walk(name);
                let arity = match self.bindings.walk(arity) {
                    Term::Int(n) => n,
                    Term::Var(_) => return Err(TermError::instantiation("functor/3").into()),
                    other => return Err(TermError::type_error("integer", &other).into()),
                };
                if arity == 0 {
                    return self.unify_then(term, &name, k);
                }
                let Term::Atom(functor) = name else {
                    return Err(TermError::type_error("atom", &name).into());
                };
                let args = (0..arity.max(0)).map(|_| self.bindings.fresh_term()).collect();
                self.unify_then(term, &Term::compound(functor, args), k)
            }
            Term::Compound(s) => {
                let found = [
                    Term::Atom(s.functor.clone()),
                    Term::int(s.args.len() as i64),
                ];
                self.unify_all_then(&[name.clone(), arity.clone()], &found, k)
            }
            atomic => self.unify_all_then(&[name.clone(), arity.clone()], &[atomic, Term::int(0)], k),
        }
    }

    fn arg(&mut self, index: &Term, term: &Term, value: &Term, k: &mut Cont<'_>) -> Result<Signal> {
        let index = match self.bindings.walk(index) {
            Term::Int(n) => n,
            Term::Var(_) => return Err(TermError::instantiation("arg/3").into()),
            other => return Err(TermError::type_error("integer", &other).into()),
        };
        let Term::Compound(s) = self.bindings.walk(term) else {
            return Err(TermError::type_error("compound", term).into());
        };
        match usize::try_from(index).ok().and_then(|i| s.args.get(i.checked_sub(1)?)) {
            Some(arg) => self.unify_then(value, arg, k),
            None => Ok(Signal::Continue),
        }
    }

    fn univ(&mut self, term: &Term, list: &Term, k: &mut Cont<'_>) -> Result<Signal> {
        match self.bindings.walk(term) {
            Term::Var(_) => {
                let resolved = self.bindings.resolve(list);
                let Some(items) = resolved.list_items() else {
                    return Err(TermError::instantiation("=../2").into());
                };
                let built = match items.as_slice() {
                    [] => return Err(TermError::type_error("non-empty list", &resolved).into()),
                    [single] => (*single).clone(),
                    [Term::Atom(name), args @ ..] => {
                        Term::compound(name.clone(), args.iter().map(|arg| (*arg).clone()).collect())
                    }
                    [other, ..] => return Err(TermError::type_error("atom", other).into()),
                };
                self.unify_then(term, &built, k)
            }
            Term::Compound(s) => {
                let items = std::iter::once(Term::Atom(s.functor.clone())).chain(s.args.iter().cloned());
                self.unify_then(list, &Term::list(items), k)
            }
            atomic => self.unify_then(list, &Term::list([atomic]), k),
        }
    }

    fn length(&mut self, list: &Term, length: &Term, k: &mut Cont<'_>) -> Result<Signal> {
        let resolved = self.bindings.resolve(list);
        if let Some(items) = resolved.list_items() {
            return self.unify_then(length, &Term::int(items.len() as i64), k);
        }
        match self.bindings.walk(length) {
            Term::Int(n) if n >= 0 => {
                let items: Vec<Term> = (0..n).map(|_| self.bindings.fresh_term()).collect();
                self.unify_then(list, &Term::list(items), k)
            }
            Term::Int(_) => Ok(Signal::Continue),
            Term::Var(_) => Err(TermError::instantiation("length/2").into()),
            other => Err(TermError::type_error("integer", &other).into()),
        }
    }

    fn succ(&mut self, before: &Term, after: &Term, k: &mut Cont<'_>) -> Result<Signal> {
        match (self.bindings.walk(before), self.bindings.walk(after)) {
            (Term::Int(n), _) if n >= 0 => {
                let next = n
                    .checked_add(1)
                    .ok_or(TermError::Evaluation("integer overflow"))?;
                self.unify_then(after, &Term::int(next), k)
            }
            (Term::Var(_), Term::Int(n)) if n > 0 => self.unify_then(before, &Term::int(n - 1), k),
            (Term::Var(_), Term::Int(0)) => Ok(Signal::Continue),
            (Term::Var(_), Term::Var(_)) => Err(TermError::instantiation("succ/2").into()),
            (culprit, _) => Err(TermError::type_error("not_less_than_zero", &culprit).into()),
        }
    }

    fn unify_all_then(&mut self, left: &[Term], right: &[Term], k: &mut Cont<'_>) -> Result<Signal> {
        let mark = self.bindings.mark();
        if !self.bindings.unify_all(left, right) {
            return Ok(Signal::Continue);
        }
        let signal = k(self);
        self.bindings.undo_to(mark);
        signal
    }
}

#[cfg(test)]
mod tests {
    use crate::{EngineConfig, EngineError, Machine};
    use loops_term::TermError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn first(query: &str, var: &str) -> Option<String> {
        let mut machine = Machine::new(EngineConfig::default()).expect("library loads");
        machine
            .query_once(query)
            .expect("runs")
            .map(|answer| answer.get(var).expect("named").to_string())
    }

    #[rstest]
    #[case::arithmetic("X is 7 // 2 + max(2, 8) mod 5", "6")]
    #[case::functor_build("functor(X, point, 2), X = point(1, 2)", "point(1,2)")]
    #[case::functor_inspect("functor(f(a, b, c), N, X)", "3")]
    #[case::arg("arg(2, f(a, b, c), X)", "b")]
    #[case::univ("f(a, b) =.. X", "[f,a,b]")]
    #[case::univ_build("X =.. [g, 1]", "g(1)")]
    #[case::length("length([a, b, c], X)", "3")]
    #[case::atom_length("atom_length(hello, X)", "5")]
    #[case::succ_down("succ(X, 4)", "3")]
    #[case::findall("findall(Y-Z, member(Y-Z, [1-a, 2-b]), X)", "[1-a,2-b]")]
    fn test_builtin_answers(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(first(query, "X").as_deref(), Some(expected));
    }

    #[rstest]
    #[case("1 =:= 2")]
    #[case("a == b")]
    #[case("X \\= Y")]
    #[case("arg(4, f(a), _)")]
    #[case("succ(_, 0)")]
    #[case("atom(1)")]
    fn test_builtin_failures(#[case] query: &str) {
        let mut machine = Machine::new(EngineConfig::default()).expect("library loads");
        assert_eq!(machine.query(query).expect("runs"), vec![]);
    }

    #[test]
    fn test_length_of_partial_list_builds_it() {
        let answer = first("L = [a|T], length(L, 3)", "L").expect("succeeds");
        assert!(answer.starts_with("[a,_G"), "{answer}");
    }

    #[test]
    fn test_unbound_arithmetic_is_an_instantiation_error() {
        let mut machine = Machine::new(EngineConfig::default()).expect("library loads");
        assert_eq!(
            machine.query("X is Y + 1").unwrap_err(),
            EngineError::Term(TermError::instantiation("arithmetic expression"))
        );
    }

    #[test]
    fn test_write_collects_output_unquoted() {
        let mut machine = Machine::new(EngineConfig::default()).expect("library loads");
        machine
            .query("write('hello world'), nl, writeln(f(x))")
            .expect("runs");
        assert_eq!(machine.take_output(), "hello world\nf(x)\n");
        assert_eq!(machine.take_output(), "");
    }
}
