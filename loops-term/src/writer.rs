//! Operator-aware rendering of terms.

use crate::ops::{self, ARG_PRIORITY, Infix, MAX_PRIORITY, Prefix};
use crate::term::{Atom, CONS, NIL, Term};
use std::fmt::{self, Display, Write};

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer { quoted: true }.term(f, self, MAX_PRIORITY)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer { quoted: true }.atom(f, self.as_str())
    }
}

/// Renders a term with atoms printed as they are, never quoted.
pub struct Unquoted<'a>(pub &'a Term);

impl Display for Unquoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer { quoted: false }.term(f, self.0, MAX_PRIORITY)
    }
}

#[derive(Copy, Clone)]
struct Writer {
    quoted: bool,
}

impl Writer {
    fn term(self, f: &mut fmt::Formatter<'_>, term: &Term, max: u32) -> fmt::Result {
        match term {
            Term::Var(v) => write!(f, "{v}"),
            Term::Int(n) => write!(f, "{n}"),
            Term::Atom(a) => self.atom(f, a.as_str()),
            Term::Compound(s) => {
                let name = s.functor.as_str();
                match (s.args.as_slice(), ops::infix(name), ops::prefix(name)) {
                    ([_, _], _, _) if name == CONS => self.list(f, term),
                    ([inner], _, _) if name == "{}" => {
                        f.write_char('{')?;
                        self.term(f, inner, MAX_PRIORITY)?;
                        f.write_char('}')
                    }
                    ([left, right], Some((priority, kind)), _) => {
                        let (left_max, right_max) = match kind {
                            Infix::Xfx => (priority - 1, priority - 1),
                            Infix::Xfy => (priority - 1, priority),
                            Infix::Yfx => (priority, priority - 1),
                        };
                        let open = priority > max;
                        if open {
                            f.write_char('(')?;
                        }
                        self.term(f, left, left_max)?;
                        match name {
                            "," => f.write_str(", ")?,
                            "+" | "-" | "*" | "/" | "//" | "^" if !starts_with_sign(right) => {
                                f.write_str(name)?
                            }
                            _ => write!(f, " {name} ")?,
                        }
                        self.term(f, right, right_max)?;
                        if open {
                            f.write_char(')')?;
                        }
                        Ok(())
                    }
                    ([arg], _, Some((priority, kind))) if !matches!(arg, Term::Int(_)) => {
                        let arg_max = match kind {
                            Prefix::Fy => priority,
                            Prefix::Fx => priority - 1,
                        };
                        let open = priority > max;
                        if open {
                            f.write_char('(')?;
                        }
                        self.atom(f, name)?;
                        if name.chars().all(char::is_alphanumeric) || name == "\\+" {
                            f.write_char(' ')?;
                        }
                        self.term(f, arg, arg_max)?;
                        if open {
                            f.write_char(')')?;
                        }
                        Ok(())
                    }
                    (args, _, _) => {
                        self.atom(f, name)?;
                        f.write_char('(')?;
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                f.write_char(',')?;
                            }
                            self.term(f, arg, ARG_PRIORITY)?;
                        }
                        f.write_char(')')
                    }
                }
            }
        }
    }

    fn list(self, f: &mut fmt::Formatter<'_>, list: &Term) -> fmt::Result {
        f.write_char('[')?;
        let mut cursor = list;
        let mut first = true;
        while let Some([head, tail]) = cursor.shape(CONS, 2) {
            if !first {
                f.write_char(',')?;
            }
            self.term(f, head, ARG_PRIORITY)?;
            first = false;
            cursor = tail;
        }
        if !cursor.is_atom(NIL) {
            f.write_char('|')?;
            self.term(f, cursor, ARG_PRIORITY)?;
        }
        f.write_char(']')
    }

    fn atom(self, f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
        if !self.quoted || !needs_quotes(name) {
            return f.write_str(name);
        }
        f.write_char('\'')?;
        for c in name.chars() {
            match c {
                '\'' => f.write_str("\\'")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                other => f.write_char(other)?,
            }
        }
        f.write_char('\'')
    }
}

fn starts_with_sign(term: &Term) -> bool {
    match term {
        Term::Int(n) => *n < 0,
        Term::Compound(s) => s.args.len() == 1 && ops::prefix(s.functor.as_str()).is_some(),
        _ => false,
    }
}

fn needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if matches!(name, "[]" | "!" | ";" | "{}") {
        return false;
    }
    if first.is_lowercase() {
        return !chars.all(|c| c.is_alphanumeric() || c == '_');
    }
    !name.chars().all(ops::is_symbol_char)
}
