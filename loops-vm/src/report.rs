//! Loop warnings with variables shown by their source names.

use loops_compiler::{Diagnostic, DiagnosticKind, WarningKind};
use loops_term::{Atom, VarId};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopWarning {
    pub procedure: Atom,
    /// Shared variables missing from `param/N`
    pub undeclared: Vec<String>,
    /// Declared parameters the body does not share
    pub unshared: Vec<String>,
}

impl LoopWarning {
    /// Name the variables of `diagnostic` after `names`, falling back to the
    /// internal `_G` form for variables without a source name.
    pub(crate) fn from_diagnostic(diagnostic: &Diagnostic, names: &[(String, VarId)]) -> Self {
        let DiagnosticKind::Warning(WarningKind::ParameterDeclaration {
            undeclared,
            unshared,
        }) = &diagnostic.kind;
        let name_of = |var: &VarId| {
            names
                .iter()
                .find_map(|(name, id)| (id == var).then(|| name.clone()))
                .unwrap_or_else(|| var.to_string())
        };
        Self {
            procedure: diagnostic.procedure.clone(),
            undeclared: undeclared.iter().map(name_of).collect(),
            unshared: unshared.iter().map(name_of).collect(),
        }
    }
}

impl fmt::Display for LoopWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop {}: parameters differ from the shared variables", self.procedure)?;
        if !self.undeclared.is_empty() {
            write!(f, "; undeclared: {}", self.undeclared.join(", "))?;
        }
        if !self.unshared.is_empty() {
            write!(f, "; not shared: {}", self.unshared.join(", "))?;
        }
        Ok(())
    }
}
