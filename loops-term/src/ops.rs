//! Operator table shared by the reader and the writer.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Infix {
    Xfx,
    Xfy,
    Yfx,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prefix {
    Fx,
    Fy,
}

pub const MAX_PRIORITY: u32 = 1200;
pub const ARG_PRIORITY: u32 = 999;

pub fn infix(name: &str) -> Option<(u32, Infix)> {
    use Infix::*;
    let op = match name {
        ":-" | "-->" => (1200, Xfx),
        ";" => (1100, Xfy),
        "do" => (1100, Xfx),
        "->" => (1050, Xfy),
        "," => (1000, Xfy),
        "=" | "\\=" | "==" | "\\==" | "is" | "=:=" | "=\\=" | "<" | ">" | "=<" | ">=" | "=.." => {
            (700, Xfx)
        }
        "+" | "-" => (500, Yfx),
        "*" | "/" | "//" | "mod" | "rem" => (400, Yfx),
        "^" => (200, Xfy),
        _ => return None,
    };
    Some(op)
}

pub fn prefix(name: &str) -> Option<(u32, Prefix)> {
    use Prefix::*;
    let op = match name {
        ":-" | "?-" => (1200, Fx),
        "\\+" => (900, Fy),
        "-" | "+" => (200, Fy),
        _ => return None,
    };
    Some(op)
}

pub fn is_symbol_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '\\' | '^' | '<' | '>' | '=' | '~' | ':' | '.' | '?' | '@' | '#'
            | '&' | '$'
    )
}
