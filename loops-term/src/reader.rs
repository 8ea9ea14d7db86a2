//! Operator-precedence reader for the term syntax.
//!
//! Supports the usual clause notation: functional terms `f(a, B)`, lists
//! `[H|T]`, quoted atoms, integers, `%` and `/* */` comments and the operator
//! table in [`crate::ops`]. Each clause read through [`read_program`] gets its
//! own variable namespace.

use crate::bindings::VarSource;
use crate::error::{Result, TermError};
use crate::ops::{self, ARG_PRIORITY, Infix, MAX_PRIORITY, Prefix};
use crate::term::{Term, VarId};
use indexmap::IndexMap;

/// A term together with the names of the variables it was written with.
#[derive(Clone, Debug)]
pub struct ReadTerm {
    pub term: Term,
    pub var_names: Vec<(String, VarId)>,
}

impl ReadTerm {
    pub fn var(&self, name: &str) -> Option<VarId> {
        self.var_names
            .iter()
            .find_map(|(n, v)| (n == name).then_some(*v))
    }
}

/// Read exactly one term; a trailing `.` is optional.
pub fn read_term(src: &str, vars: &mut impl VarSource) -> Result<ReadTerm> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(&tokens, src.len(), vars);
    let read = parser.read_one()?;
    if parser.peek_is(&Tok::End) {
        parser.advance();
    }
    if let Some(extra) = parser.peek() {
        return Err(TermError::syntax(extra.offset, "operator expected"));
    }
    Ok(read)
}

/// Read a sequence of `.`-terminated clauses.
pub fn read_program(src: &str, vars: &mut impl VarSource) -> Result<Vec<ReadTerm>> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(&tokens, src.len(), vars);
    let mut out = Vec::new();
    while parser.peek().is_some() {
        out.push(parser.read_one()?);
        parser.expect(&Tok::End, "end of clause expected")?;
    }
    Ok(out)
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Int(i64),
    Var(String),
    Name(String),
    Punct(char),
    /// An opening parenthesis directly after a name: functional notation.
    OpenCall,
    End,
}

#[derive(Clone, Debug)]
struct Token {
    tok: Tok,
    offset: usize,
    layout_before: bool,
}

struct Lexer<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Lexer<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek_char().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Skip whitespace and comments, reporting whether anything was skipped.
    fn skip_layout(&mut self) -> Result<bool> {
        let start = self.pos;
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('%') => {
                    self.take_while(|c| c != '\n');
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let open = self.pos;
                    match self.src[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => return Err(TermError::syntax(open, "unterminated block comment")),
                    }
                }
                _ => break,
            }
        }
        Ok(self.pos > start)
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            let layout_before = self.skip_layout()?;
            let offset = self.pos;
            let Some(c) = self.peek_char() else {
                break;
            };

            let tok = match c {
                '0'..='9' => {
                    let digits = self.take_while(|c| c.is_ascii_digit() || c == '_');
                    let digits: String = digits.chars().filter(|c| *c != '_').collect();
                    let n = digits
                        .parse::<i64>()
                        .map_err(|_| TermError::syntax(offset, "integer out of range"))?;
                    Tok::Int(n)
                }
                c if c == '_' || c.is_uppercase() => {
                    Tok::Var(self.take_while(is_alnum).to_string())
                }
                c if c.is_alphabetic() => Tok::Name(self.take_while(is_alnum).to_string()),
                '\'' => Tok::Name(self.quoted(offset)?),
                '(' => {
                    self.bump();
                    let follows_name = matches!(
                        tokens.last(),
                        Some(Token { tok: Tok::Name(_), .. })
                    );
                    if follows_name && !layout_before {
                        Tok::OpenCall
                    } else {
                        Tok::Punct('(')
                    }
                }
                ')' | '[' | ']' | '|' | ',' | '{' | '}' => {
                    self.bump();
                    Tok::Punct(c)
                }
                '!' | ';' => {
                    self.bump();
                    Tok::Name(c.to_string())
                }
                '.' if self
                    .peek_second()
                    .is_none_or(|n| n.is_whitespace() || n == '%') =>
                {
                    self.bump();
                    Tok::End
                }
                c if ops::is_symbol_char(c) => {
                    Tok::Name(self.take_while(ops::is_symbol_char).to_string())
                }
                other => {
                    return Err(TermError::syntax(
                        offset,
                        format!("unexpected character {other:?}"),
                    ));
                }
            };
            tokens.push(Token {
                tok,
                offset,
                layout_before,
            });
        }
        Ok(tokens)
    }

    fn quoted(&mut self, offset: usize) -> Result<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(TermError::syntax(offset, "unterminated quoted atom")),
                Some('\'') if self.peek_char() == Some('\'') => {
                    self.bump();
                    out.push('\'');
                }
                Some('\'') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    _ => return Err(TermError::syntax(self.pos, "bad escape sequence")),
                },
                Some(c) => out.push(c),
            }
        }
    }
}

fn is_alnum(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Parser<'t, V> {
    tokens: &'t [Token],
    pos: usize,
    eof: usize,
    vars: &'t mut V,
    names: IndexMap<String, VarId>,
}

impl<'t, V: VarSource> Parser<'t, V> {
    fn new(tokens: &'t [Token], eof: usize, vars: &'t mut V) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
            vars,
            names: IndexMap::new(),
        }
    }

    fn read_one(&mut self) -> Result<ReadTerm> {
        self.names.clear();
        let (term, _) = self.parse(MAX_PRIORITY)?;
        let var_names = self.names.drain(..).collect();
        Ok(ReadTerm { term, var_names })
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, tok: &Tok) -> bool {
        self.peek().is_some_and(|t| &t.tok == tok)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.eof, |t| t.offset)
    }

    fn expect(&mut self, tok: &Tok, message: &str) -> Result<()> {
        if self.peek_is(tok) {
            self.advance();
            Ok(())
        } else {
            Err(TermError::syntax(self.offset(), message))
        }
    }

    fn variable(&mut self, name: &str) -> Term {
        if name == "_" {
            return self.vars.fresh_term();
        }
        if let Some(v) = self.names.get(name) {
            return Term::Var(*v);
        }
        let v = self.vars.fresh_var();
        self.names.insert(name.to_string(), v);
        Term::Var(v)
    }

    /// Name of the infix operator at the cursor, if any.
    fn peek_infix(&self) -> Option<(String, u32, Infix)> {
        let name = match &self.peek()?.tok {
            Tok::Name(name) => name.as_str(),
            Tok::Punct(',') => ",",
            _ => return None,
        };
        let (priority, kind) = ops::infix(name)?;
        Some((name.to_string(), priority, kind))
    }

    fn parse(&mut self, max: u32) -> Result<(Term, u32)> {
        let (mut left, mut left_priority) = self.parse_primary(max)?;
        while let Some((name, priority, kind)) = self.peek_infix() {
            if priority > max {
                break;
            }
            let left_max = match kind {
                Infix::Yfx => priority,
                Infix::Xfx | Infix::Xfy => priority - 1,
            };
            if left_priority > left_max {
                break;
            }
            let right_max = match kind {
                Infix::Xfy => priority,
                Infix::Xfx | Infix::Yfx => priority - 1,
            };
            self.advance();
            let (right, _) = self.parse(right_max)?;
            left = Term::compound(name, vec![left, right]);
            left_priority = priority;
        }
        Ok((left, left_priority))
    }

    fn can_start_term(&self) -> bool {
        match self.peek().map(|t| &t.tok) {
            Some(Tok::Int(_) | Tok::Var(_) | Tok::OpenCall) => true,
            Some(Tok::Punct(c)) => matches!(c, '(' | '['),
            Some(Tok::Name(name)) => ops::infix(name).is_none() || ops::prefix(name).is_some(),
            _ => false,
        }
    }

    fn parse_primary(&mut self, max: u32) -> Result<(Term, u32)> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(TermError::syntax(offset, "unexpected end of input"));
        };

        match &token.tok {
            Tok::Int(n) => Ok((Term::int(*n), 0)),
            Tok::Var(name) => Ok((self.variable(name), 0)),
            Tok::Punct('(') | Tok::OpenCall => {
                let (inner, _) = self.parse(MAX_PRIORITY)?;
                self.expect(&Tok::Punct(')'), "')' expected")?;
                Ok((inner, 0))
            }
            Tok::Punct('[') => self.parse_list().map(|list| (list, 0)),
            Tok::Punct('{') => {
                let (inner, _) = self.parse(MAX_PRIORITY)?;
                self.expect(&Tok::Punct('}'), "'}' expected")?;
                Ok((Term::compound("{}", vec![inner]), 0))
            }
            Tok::Name(name) => self.parse_name(name, max),
            Tok::End => Err(TermError::syntax(offset, "unexpected end of clause")),
            Tok::Punct(c) => Err(TermError::syntax(offset, format!("unexpected '{c}'"))),
        }
    }

    fn parse_name(&mut self, name: &str, max: u32) -> Result<(Term, u32)> {
        if self.peek_is(&Tok::OpenCall) {
            self.advance();
            let args = self.parse_arglist(')')?;
            return Ok((Term::compound(name, args), 0));
        }

        if name == "-"
            && let Some(Token {
                tok: Tok::Int(n),
                layout_before: false,
                ..
            }) = self.peek()
        {
            self.advance();
            return Ok((Term::int(-n), 0));
        }

        if let Some((priority, kind)) = ops::prefix(name)
            && priority <= max
            && self.can_start_term()
        {
            let arg_max = match kind {
                Prefix::Fy => priority,
                Prefix::Fx => priority - 1,
            };
            let (arg, _) = self.parse(arg_max)?;
            return Ok((Term::compound(name, vec![arg]), priority));
        }

        Ok((Term::atom(name), 0))
    }

    fn parse_arglist(&mut self, close: char) -> Result<Vec<Term>> {
        let mut args = Vec::new();
        loop {
            let (arg, _) = self.parse(ARG_PRIORITY)?;
            args.push(arg);
            if self.peek_is(&Tok::Punct(',')) {
                self.advance();
                continue;
            }
            self.expect(&Tok::Punct(close), "',' or closing bracket expected")?;
            return Ok(args);
        }
    }

    fn parse_list(&mut self) -> Result<Term> {
        if self.peek_is(&Tok::Punct(']')) {
            self.advance();
            return Ok(Term::nil());
        }
        let mut items = Vec::new();
        loop {
            let (item, _) = self.parse(ARG_PRIORITY)?;
            items.push(item);
            match self.peek().map(|t| &t.tok) {
                Some(Tok::Punct(',')) => {
                    self.advance();
                }
                Some(Tok::Punct('|')) => {
                    self.advance();
                    let (tail, _) = self.parse(ARG_PRIORITY)?;
                    self.expect(&Tok::Punct(']'), "']' expected")?;
                    return Ok(Term::list_with_tail(items, tail));
                }
                _ => {
                    self.expect(&Tok::Punct(']'), "']' expected")?;
                    return Ok(Term::list(items));
                }
            }
        }
    }
}
