//! Error types for term reading and evaluation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("instantiation error in {context}")]
    Instantiation { context: String },

    #[error("type error: expected {expected}, found {culprit}")]
    Type {
        expected: &'static str,
        culprit: String,
    },

    #[error("evaluation error: {0}")]
    Evaluation(&'static str),
}

impl TermError {
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        TermError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub fn instantiation(context: impl Into<String>) -> Self {
        TermError::Instantiation {
            context: context.into(),
        }
    }

    pub fn type_error(expected: &'static str, culprit: impl ToString) -> Self {
        TermError::Type {
            expected,
            culprit: culprit.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TermError>;
