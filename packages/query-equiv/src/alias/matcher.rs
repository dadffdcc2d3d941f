use std::collections::BTreeMap;

use derive_more::Deref;
use tracing::trace;

use super::AliasMap;
use crate::{compare::Comparator, ALIAS};

/// A renaming from alias names of one query to alias names of another.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref)]
pub struct AliasCorrespondence(BTreeMap<String, String>);

impl AliasCorrespondence {
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) -> Option<String> {
        self.0.insert(from.into(), to.into())
    }

    pub fn rename(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AliasCorrespondence {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut correspondence = AliasCorrespondence::default();
        for (from, to) in pairs {
            correspondence.insert(from, to);
        }
        correspondence
    }
}

/// Pairs every alias of `left` with every alias of `right` whose subtrees are structurally equal.
///
/// Every pair is tried, in registration order. Nothing forces the result to be one-to-one: a later
/// match for the same left alias replaces an earlier one, and several left aliases may map to the
/// same right alias.
pub fn match_aliases(
    left: &AliasMap<'_>,
    right: &AliasMap<'_>,
    comparator: &Comparator,
) -> AliasCorrespondence {
    let mut correspondence = AliasCorrespondence::default();

    for (left_name, left_node) in left.iter() {
        for (right_name, right_node) in right.iter() {
            if comparator.equal(left_node, right_node) {
                trace!(target: ALIAS, msg = "Matched alias", from = left_name, to = right_name);
                correspondence.insert(left_name, right_name);
            }
        }
    }

    correspondence
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{alias::extract_aliases, test_helpers::optimized};
    use pretty_assertions::assert_eq;

    fn correspondence(left: &str, right: &str) -> AliasCorrespondence {
        let left = optimized(left);
        let right = optimized(right);
        match_aliases(
            &extract_aliases(&left),
            &extract_aliases(&right),
            &Comparator::default(),
        )
    }

    #[test]
    fn matches_structurally_equal_subtrees() {
        assert_eq!(
            correspondence(
                "SELECT COUNT(*) AS n FROM t AS a",
                "SELECT COUNT(*) AS total FROM t AS b"
            ),
            AliasCorrespondence::from([("a", "b"), ("n", "total")])
        );
    }

    #[test]
    fn unmatched_aliases_are_left_out() {
        assert_eq!(
            correspondence("SELECT a + 1 AS x FROM t", "SELECT a + 2 AS y FROM t"),
            AliasCorrespondence::default()
        );
    }

    // The matcher does not enforce a one-to-one renaming: both left aliases denote the same
    // expression, so both map onto the single right alias.
    #[test]
    fn renaming_may_be_many_to_one() {
        assert_eq!(
            correspondence(
                "SELECT MAX(a) AS p, MAX(a) AS q FROM t",
                "SELECT MAX(a) AS r FROM t"
            ),
            AliasCorrespondence::from([("p", "r"), ("q", "r")])
        );
    }

    // Table aliases of a self-join denote equal table references, so every left alias matches every
    // right alias and the last one wins. Both `a` and `b` collapse onto `y`, and renaming the aliases
    // of a self-join does not preserve equivalence.
    #[test]
    fn self_join_aliases_collapse_onto_the_last_match() {
        let left = "SELECT a.name FROM emp AS a JOIN emp AS b ON a.id = b.manager_id";
        let right = "SELECT x.name FROM emp AS x JOIN emp AS y ON x.id = y.manager_id";

        assert_eq!(
            correspondence(left, right),
            AliasCorrespondence::from([("a", "y"), ("b", "y")])
        );
        assert!(!crate::structural_equivalence(left, right, crate::Dialect::Sqlite));
    }

    #[test]
    fn later_matches_overwrite_earlier_ones() {
        assert_eq!(
            correspondence(
                "SELECT MAX(a) AS p FROM t",
                "SELECT MAX(a) AS r, MAX(a) AS s FROM t"
            ),
            AliasCorrespondence::from([("p", "s")])
        );
    }
}
