//! A small backtracking machine that runs logical loops.
//!
//! Loops reach the machine either already compiled, when clauses and queries
//! are expanded ahead of time, or as `do/2` goals at run time. Run-time loops
//! are compiled into procedures of the configured store or, in
//! [`LoopMode::Interpreted`], executed straight from their plan.

mod answer;
mod builtins;
mod config;
mod error;
mod interpreter;
mod library;
mod machine;
mod program;
mod report;

pub use answer::Answer;
pub use config::{EngineConfig, LoopMode};
pub use error::{EngineError, Result};
pub use machine::Machine;
pub use program::Program;
pub use report::LoopWarning;
