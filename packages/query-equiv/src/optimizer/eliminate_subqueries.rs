use tracing::trace;

use super::Rule;
use crate::{
    ast::{Arg, Node, NodeKind},
    OptimizeError, PARSER,
};

/// Lifts derived tables out of FROM and JOIN clauses into CTEs of the outermost query.
///
/// `SELECT … FROM (SELECT …) AS t` becomes `WITH t AS (SELECT …) SELECT … FROM t`, so a query and its
/// CTE phrasing share one shape. The derived table's alias names the CTE; unaliased ones get `_q_N`.
/// Lifted CTEs are placed ahead of the CTE that contained them. Lateral derived tables stay put.
#[derive(Debug, Default)]
pub(crate) struct EliminateSubqueries {
    generated: usize,
}

impl Rule for EliminateSubqueries {
    fn apply(&mut self, mut tree: Node) -> Result<Node, OptimizeError> {
        if !tree.is(NodeKind::Query) {
            return Err(OptimizeError::UnexpectedShape {
                rule: "EliminateSubqueries",
                expected: NodeKind::Query,
                found: tree.kind(),
            });
        }

        let mut ctes = Vec::new();
        let mut recursive = false;

        if let Some(Arg::Node(mut with)) = tree.remove("with") {
            recursive = with.flag("recursive");
            if let Some(Arg::List(existing)) = with.remove("expressions") {
                for mut cte in existing {
                    self.lift_within(&mut cte, &mut ctes);
                    ctes.push(cte);
                }
            }
        }

        self.lift_within(&mut tree, &mut ctes);

        if !ctes.is_empty() {
            let with = Node::new(NodeKind::With)
                .with_flag("recursive", recursive)
                .with("expressions", Arg::List(ctes));
            tree.prepend("with", with);
        }

        Ok(tree)
    }
}

impl EliminateSubqueries {
    // A derived table's own derived tables are lifted ahead of it, and sources are lifted left to
    // right.
    fn lift_within(&mut self, node: &mut Node, out: &mut Vec<Node>) {
        let holds_source = node.is(NodeKind::From) || node.is(NodeKind::Join);

        for (key, arg) in node.args_mut() {
            for child in arg.nodes_mut() {
                self.lift_within(child, out);

                if holds_source
                    && key == "this"
                    && child.is(NodeKind::Subquery)
                    && !child.flag("lateral")
                {
                    let derived = std::mem::replace(child, Node::new(NodeKind::Table));
                    *child = self.lift(derived, out);
                }
            }
        }
    }

    fn lift(&mut self, mut derived: Node, out: &mut Vec<Node>) -> Node {
        let alias = match derived.remove("alias") {
            Some(Arg::Node(alias)) if alias.alias_name().is_some() => *alias,
            _ => {
                let name = format!("_q_{}", self.generated);
                self.generated += 1;
                Node::new(NodeKind::TableAlias).with("this", Node::identifier(name))
            }
        };

        let name = alias.alias_name().unwrap_or_default().to_string();

        trace!(target: PARSER, msg = "Lifting derived table into CTE", name);

        let mut cte = Node::new(NodeKind::Cte);
        if let Some(body) = derived.remove("this") {
            cte.set("this", body);
        }
        out.push(cte.with("alias", alias));

        Node::new(NodeKind::Table).with("this", Node::identifier(name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::lower;
    use pretty_assertions::assert_eq;

    fn apply(sql: &str) -> Node {
        EliminateSubqueries::default().apply(lower(sql)).unwrap()
    }

    fn cte_names(tree: &Node) -> Vec<String> {
        tree.child("with")
            .map(|with| {
                with.nodes("expressions")
                    .iter()
                    .filter_map(|cte| cte.child("alias").and_then(Node::alias_name))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn derived_table_becomes_cte() {
        let derived = apply("SELECT x FROM (SELECT a AS x FROM t) AS s");
        let cte = apply("WITH s AS (SELECT a AS x FROM t) SELECT x FROM s");

        assert_eq!(derived, cte);
    }

    #[test]
    fn unaliased_derived_tables_get_generated_names() {
        let tree = apply("SELECT * FROM (SELECT 1) JOIN (SELECT 2) ON TRUE");

        assert_eq!(cte_names(&tree), vec!["_q_0", "_q_1"]);
    }

    #[test]
    fn nested_derived_tables_are_lifted_first() {
        let tree = apply("SELECT * FROM (SELECT * FROM (SELECT 1) AS inner_q) AS outer_q");

        assert_eq!(cte_names(&tree), vec!["inner_q", "outer_q"]);
    }

    #[test]
    fn lifted_tables_precede_their_cte() {
        let tree = apply("WITH c AS (SELECT * FROM (SELECT 1) AS d) SELECT * FROM c");

        assert_eq!(cte_names(&tree), vec!["d", "c"]);
    }

    #[test]
    fn expression_subqueries_stay_in_place() {
        let tree = apply("SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u)");

        assert!(tree.child("with").is_none());
    }

    #[test]
    fn rejects_non_query_roots() {
        let result = EliminateSubqueries::default().apply(Node::identifier("x"));

        assert!(matches!(
            result,
            Err(OptimizeError::UnexpectedShape {
                found: NodeKind::Identifier,
                ..
            })
        ));
    }
}
