//! The structural equivalence engine.

use tracing::debug;

use crate::{
    alias::{extract_aliases, match_aliases},
    compare::{Comparator, MatchStrategy},
    normalize::normalize,
    provider::{AstProvider, Dialect, SqlParserProvider},
    Verdict, COMPARE,
};

/// Decides whether two queries have the same shape up to a consistent renaming of aliases.
///
/// Both queries are parsed and optimized, their aliases are extracted and cross-matched, the first
/// query's aliases are renamed to their counterparts and the two trees are compared. Any failure to
/// parse either query is reported as a negative [`Verdict`].
#[derive(Debug, Default, Clone)]
pub struct StructuralMatcher<P: AstProvider = SqlParserProvider> {
    provider: P,
    dialect: Dialect,
    strategy: MatchStrategy,
}

impl StructuralMatcher {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_provider(SqlParserProvider, dialect)
    }
}

impl<P: AstProvider> StructuralMatcher<P> {
    pub fn with_provider(provider: P, dialect: Dialect) -> Self {
        Self {
            provider,
            dialect,
            strategy: MatchStrategy::default(),
        }
    }

    pub fn strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn check(&self, left: &str, right: &str) -> Verdict {
        let parsed = self
            .provider
            .parse_and_optimize(left, self.dialect)
            .and_then(|left| Ok((left, self.provider.parse_and_optimize(right, self.dialect)?)));

        let (left, right) = match parsed {
            Ok(trees) => trees,
            Err(err) => {
                debug!(target: COMPARE, msg = "Query could not be parsed", error = %err);
                return Verdict::different(format!("Error parsing SQL: {err}"));
            }
        };

        let comparator = Comparator::new(self.strategy);

        let left_aliases = extract_aliases(&left);
        let right_aliases = extract_aliases(&right);
        let correspondence = match_aliases(&left_aliases, &right_aliases, &comparator);

        debug!(target: COMPARE, msg = "Alias correspondence", ?correspondence);

        let normalized = normalize(&left, &correspondence);

        let verdict = Verdict::from(comparator.compare(&normalized, &right));

        debug!(target: COMPARE, msg = "Structural verdict", %verdict);

        verdict
    }
}

/// `true` when `left` and `right` are structurally equivalent under `dialect`.
pub fn structural_equivalence(left: &str, right: &str, dialect: Dialect) -> bool {
    structural_equivalence_verbose(left, right, dialect).is_equivalent()
}

/// Like [`structural_equivalence`], returning the full [`Verdict`] with its diagnostic.
pub fn structural_equivalence_verbose(left: &str, right: &str, dialect: Dialect) -> Verdict {
    StructuralMatcher::new(dialect).check(left, right)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ast::Node, ParseError};

    #[derive(Debug, Default, Clone, Copy)]
    struct FailingProvider;

    impl AstProvider for FailingProvider {
        fn parse_and_optimize(&self, _sql: &str, _dialect: Dialect) -> Result<Node, ParseError> {
            Err(ParseError::Unsupported("nothing".into()))
        }
    }

    #[test]
    fn provider_failures_become_negative_verdicts() {
        let verdict =
            StructuralMatcher::with_provider(FailingProvider, Dialect::Sqlite).check("a", "b");

        assert!(!verdict.is_equivalent());
        assert_eq!(
            verdict.diagnostic(),
            Some("Error parsing SQL: Unsupported statement: nothing")
        );
    }

    #[test]
    fn syntax_errors_on_either_side_are_reported() {
        let left = structural_equivalence_verbose("SELECT a FROM t", "SELEC a FROM t", Dialect::Sqlite);
        let right = structural_equivalence_verbose("SELEC a FROM t", "SELECT a FROM t", Dialect::Sqlite);

        for verdict in [left, right] {
            assert!(!verdict.is_equivalent());
            assert!(verdict
                .diagnostic()
                .is_some_and(|diagnostic| diagnostic.starts_with("Error parsing SQL:")));
        }
    }

    #[test]
    fn mismatch_diagnostic_names_the_path() {
        let verdict = structural_equivalence_verbose(
            "SELECT a FROM t WHERE b > 1",
            "SELECT a FROM t WHERE b < 1",
            Dialect::Sqlite,
        );

        assert!(!verdict.is_equivalent());
        assert_eq!(
            verdict.diagnostic(),
            Some("at $.this.where: Match failed: [Value] op='>' and [Value] op='<' are not equal.")
        );
    }

    #[test]
    fn bipartite_strategy_agrees_on_reordered_projections() {
        let matcher = StructuralMatcher::new(Dialect::Postgres).strategy(MatchStrategy::Bipartite);

        assert!(matcher
            .check("SELECT a, b, a FROM t", "SELECT b, a, a FROM t")
            .is_equivalent());
    }
}
