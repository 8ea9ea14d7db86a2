//! Errors raised while compiling a loop specification

use thiserror::Error;

/// A loop specification that cannot be compiled.
///
/// Every variant carries the rendered iterator descriptor it was raised for.
/// No procedure is registered when compilation fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecificationError {
    #[error("unknown loop iterator: {0}")]
    UnknownIterator(String),

    #[error("zero step in {0}")]
    ZeroStep(String),

    #[error("step must be a constant in {0}")]
    UnsupportedStep(String),

    #[error("only steps of 1 and -1 are supported with a non-constant bound in {0}")]
    UnsupportedBound(String),

    #[error("param/N expects variables: {0}")]
    ParamNotVariable(String),

    #[error("loop bound out of integer range in {0}")]
    BoundOverflow(String),
}

pub type Result<T> = std::result::Result<T, SpecificationError>;
