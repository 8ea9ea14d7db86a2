//! Consistency of declared loop parameters.

use loops_term::{VarId, VarSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamCheck {
    Consistent,
    Inconsistent {
        /// Shared with the surroundings but missing from `param/N`
        undeclared: Vec<VarId>,
        /// Listed in `param/N` but not shared
        unshared: Vec<VarId>,
    },
}

/// Compare detected shared variables with the declared ones.
///
/// Having no declaration at all is consistent.
pub fn check_params(detected: &VarSet, declared: &VarSet) -> ParamCheck {
    if declared.is_empty() {
        return ParamCheck::Consistent;
    }
    let undeclared: Vec<VarId> = detected.difference(declared).copied().collect();
    let unshared: Vec<VarId> = declared.difference(detected).copied().collect();
    if undeclared.is_empty() && unshared.is_empty() {
        ParamCheck::Consistent
    } else {
        ParamCheck::Inconsistent {
            undeclared,
            unshared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn set(ids: &[u32]) -> VarSet {
        ids.iter().map(|&i| VarId::new(i)).collect()
    }

    fn ids(ids: &[u32]) -> Vec<VarId> {
        ids.iter().map(|&i| VarId::new(i)).collect()
    }

    #[rstest]
    #[case::nothing_declared(&[1, 2], &[])]
    #[case::same_set(&[1, 2], &[1, 2])]
    #[case::order_irrelevant(&[1, 2], &[2, 1])]
    fn test_consistent(#[case] detected: &[u32], #[case] declared: &[u32]) {
        assert_eq!(check_params(&set(detected), &set(declared)), ParamCheck::Consistent);
    }

    #[test]
    fn test_reports_both_differences() {
        assert_eq!(
            check_params(&set(&[1, 2, 3]), &set(&[3, 4])),
            ParamCheck::Inconsistent {
                undeclared: ids(&[1, 2]),
                unshared: ids(&[4]),
            }
        );
    }

    #[test]
    fn test_declared_but_nothing_shared() {
        assert_eq!(
            check_params(&set(&[]), &set(&[7])),
            ParamCheck::Inconsistent {
                undeclared: vec![],
                unshared: ids(&[7]),
            }
        );
    }
}
