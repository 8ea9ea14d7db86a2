//! Terms, variable bindings and a reader/writer for clause syntax.
//!
//! This crate is the common ground of the loop compiler and the machine that
//! runs compiled loops: both build goals out of [`Term`]s and both allocate
//! fresh variables through [`VarSource`].

pub mod arith;
pub mod bindings;
pub mod error;
pub mod ops;
pub mod reader;
pub mod term;
pub mod variant;
mod writer;

pub use arith::{const_eval, eval};
pub use bindings::{Bindings, Mark, VarSource};
pub use error::{Result, TermError};
pub use reader::{ReadTerm, read_program, read_term};
pub use term::{Atom, Structure, Term, VarId};
pub use variant::{Template, VarSet, collect_vars, fingerprint, normalize, stable_hasher, term_vars};
pub use writer::Unquoted;
