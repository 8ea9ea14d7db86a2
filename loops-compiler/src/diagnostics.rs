//! Non-fatal findings reported alongside a compiled loop.

use crate::params::ParamCheck;
use loops_term::{Atom, VarId};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Procedure generated for the loop the finding is about, `do` for a
    /// loop kept as a goal
    pub procedure: Atom,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn warning(procedure: Atom, kind: WarningKind) -> Self {
        Self {
            procedure,
            kind: DiagnosticKind::Warning(kind),
        }
    }

    /// The warning for an inconsistent parameter declaration, if any.
    pub fn parameters(procedure: Atom, check: ParamCheck) -> Option<Self> {
        let ParamCheck::Inconsistent {
            undeclared,
            unshared,
        } = check
        else {
            return None;
        };
        warn!(
            procedure = %procedure,
            undeclared = undeclared.len(),
            unshared = unshared.len(),
            "loop parameters differ from the shared variables"
        );
        Some(Self::warning(
            procedure,
            WarningKind::ParameterDeclaration {
                undeclared,
                unshared,
            },
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Warning(WarningKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Explicit `param/N` entries disagree with the variables the body shares
    /// with its surroundings.
    ParameterDeclaration {
        undeclared: Vec<VarId>,
        unshared: Vec<VarId>,
    },
}
