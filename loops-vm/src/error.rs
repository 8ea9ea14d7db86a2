//! Error types for running programs

use loops_compiler::SpecificationError;
use loops_term::TermError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Specification(#[from] SpecificationError),

    #[error("unknown procedure {name}/{arity}")]
    UnknownProcedure { name: String, arity: usize },

    #[error("call depth limit of {0} exceeded")]
    DepthLimit(usize),
}

impl EngineError {
    pub fn unknown(name: &str, arity: usize) -> Self {
        EngineError::UnknownProcedure {
            name: name.to_string(),
            arity,
        }
    }
}

/// Convenient Result type
pub type Result<T> = std::result::Result<T, EngineError>;
