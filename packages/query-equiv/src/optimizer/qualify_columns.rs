use std::collections::HashSet;

use super::Rule;
use crate::{
    ast::{Node, NodeKind},
    OptimizeError,
};

/// Qualifies bare column references in a SELECT reading from exactly one source without joins.
///
/// The qualifier is the source's alias, or the table name when it has none. A bare reference that
/// names one of the SELECT's projection aliases is left alone in GROUP BY, HAVING and ORDER BY.
/// Nested queries are their own scope and are qualified independently.
#[derive(Debug, Default)]
pub(crate) struct QualifyColumns;

impl Rule for QualifyColumns {
    fn apply(&mut self, mut tree: Node) -> Result<Node, OptimizeError> {
        qualify(&mut tree);
        Ok(tree)
    }
}

fn qualify(node: &mut Node) {
    match node.kind() {
        NodeKind::Query => qualify_order_by(node),
        NodeKind::Select => qualify_select(node),
        _ => {}
    }

    for (_, arg) in node.args_mut() {
        for child in arg.nodes_mut() {
            qualify(child);
        }
    }
}

fn qualify_select(select: &mut Node) {
    let Some(qualifier) = qualifier(select) else {
        return;
    };
    let aliases = projection_aliases(select);
    let none = HashSet::new();

    for (key, arg) in select.args_mut() {
        let skip = match key {
            "expressions" | "distinct_on" | "where" | "qualify" => &none,
            "group" | "having" => &aliases,
            _ => continue,
        };
        for child in arg.nodes_mut() {
            qualify_scope(child, &qualifier, skip);
        }
    }
}

fn qualify_order_by(query: &mut Node) {
    let Some(select) = query.child("this").filter(|body| body.is(NodeKind::Select)) else {
        return;
    };
    let Some(qualifier) = qualifier(select) else {
        return;
    };
    let aliases = projection_aliases(select);

    if let Some(order) = query.arg_mut("order") {
        for child in order.nodes_mut() {
            qualify_scope(child, &qualifier, &aliases);
        }
    }
}

fn qualify_scope(node: &mut Node, qualifier: &str, skip: &HashSet<String>) {
    match node.kind() {
        NodeKind::Query | NodeKind::Subquery => return,
        NodeKind::Column if node.arg("table").is_none() => {
            let bare = node.child("this").and_then(Node::name);
            if !bare.is_some_and(|name| skip.contains(name)) {
                node.set("table", Node::identifier(qualifier));
            }
            return;
        }
        _ => {}
    }

    for (_, arg) in node.args_mut() {
        for child in arg.nodes_mut() {
            qualify_scope(child, qualifier, skip);
        }
    }
}

fn qualifier(select: &Node) -> Option<String> {
    let [from] = select.nodes("from") else {
        return None;
    };
    if from.arg("joins").is_some() {
        return None;
    }

    let source = from.child("this")?;
    let alias = source.child("alias").and_then(Node::alias_name);

    match source.kind() {
        NodeKind::Table => alias
            .or_else(|| source.child("this").and_then(Node::name))
            .map(str::to_string),
        NodeKind::Subquery => alias.map(str::to_string),
        _ => None,
    }
}

fn projection_aliases(select: &Node) -> HashSet<String> {
    select
        .nodes("expressions")
        .iter()
        .filter(|item| item.is(NodeKind::Alias))
        .filter_map(|item| item.child("alias").and_then(Node::name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::lower;
    use pretty_assertions::assert_eq;

    fn qualified(sql: &str) -> Node {
        QualifyColumns.apply(lower(sql)).unwrap()
    }

    fn tables(tree: &Node) -> Vec<Option<String>> {
        tree.walk()
            .filter(|node| node.is(NodeKind::Column))
            .map(|column| {
                column
                    .child("table")
                    .and_then(Node::name)
                    .map(str::to_string)
            })
            .collect()
    }

    #[test]
    fn qualifies_with_table_name_or_alias() {
        assert_eq!(
            tables(&qualified("SELECT a FROM t WHERE b = 1")),
            vec![Some("t".into()), Some("t".into())]
        );
        assert_eq!(
            tables(&qualified("SELECT a FROM t AS x")),
            vec![Some("x".into())]
        );
    }

    #[test]
    fn leaves_joins_alone() {
        assert_eq!(
            tables(&qualified("SELECT a FROM t JOIN u ON t.id = u.id")),
            vec![None, Some("t".into()), Some("u".into())]
        );
    }

    #[test]
    fn leaves_projection_alias_references_in_order_by() {
        let tree = qualified("SELECT a + 1 AS total FROM t ORDER BY total, a");

        assert_eq!(
            tables(&tree),
            vec![Some("t".into()), None, Some("t".into())]
        );
    }

    #[test]
    fn nested_queries_use_their_own_source() {
        let tree = qualified("SELECT a FROM t WHERE a IN (SELECT b FROM u)");

        assert_eq!(
            tables(&tree),
            vec![Some("t".into()), Some("t".into()), Some("u".into())]
        );
    }
}
