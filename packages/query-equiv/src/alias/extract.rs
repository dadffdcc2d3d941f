use tracing::trace;

use super::AliasMap;
use crate::{
    ast::{Node, NodeKind, ParentIndex},
    ALIAS,
};

/// Collects every alias bound in `root`, in one pre-order pass.
///
/// - An expression alias (`expr AS name`) denotes the aliased expression.
/// - A CTE name denotes the whole CTE definition, not just its body.
/// - A table alias denotes the table reference it is attached to. Aliases of derived tables and
///   other sources are not collected.
pub fn extract_aliases(root: &Node) -> AliasMap<'_> {
    let index = ParentIndex::build(root);
    let mut aliases = AliasMap::default();

    for node in root.walk() {
        let binding = match node.kind() {
            NodeKind::Alias => node
                .child("alias")
                .and_then(Node::alias_name)
                .zip(node.child("this")),
            NodeKind::Cte => node
                .child("alias")
                .and_then(Node::alias_name)
                .map(|name| (name, node)),
            NodeKind::TableAlias => index
                .parent(node)
                .filter(|parent| parent.is(NodeKind::Table))
                .and_then(|table| node.alias_name().map(|name| (name, table))),
            _ => None,
        };

        if let Some((name, target)) = binding {
            trace!(target: ALIAS, msg = "Alias", name, kind = %target.kind());
            aliases.insert(name, target);
        }
    }

    aliases
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::optimized;
    use pretty_assertions::assert_eq;

    fn kinds(sql: &str) -> Vec<(String, NodeKind)> {
        let tree = optimized(sql);
        extract_aliases(&tree)
            .iter()
            .map(|(name, node)| (name.to_string(), node.kind()))
            .collect()
    }

    #[test]
    fn collects_expression_cte_and_table_aliases() {
        assert_eq!(
            kinds("WITH c AS (SELECT a AS x FROM t AS u) SELECT x FROM c"),
            vec![
                ("c".to_string(), NodeKind::Cte),
                ("x".to_string(), NodeKind::Column),
                ("u".to_string(), NodeKind::Table),
            ]
        );
    }

    #[test]
    fn derived_table_alias_binds_the_lifted_cte() {
        assert_eq!(
            kinds("SELECT * FROM (SELECT 1 AS one) AS d"),
            vec![
                ("d".to_string(), NodeKind::Cte),
                ("one".to_string(), NodeKind::Literal),
            ]
        );
    }

    #[test]
    fn duplicate_names_keep_last_binding() {
        let tree = optimized("SELECT a AS x, b AS x FROM t");
        let aliases = extract_aliases(&tree);

        assert_eq!(aliases.len(), 1);
        let column = aliases.get("x").and_then(|node| node.child("this"));
        assert_eq!(column.and_then(Node::name), Some("b"));
    }
}
