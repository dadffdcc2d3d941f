use super::Rule;
use crate::{
    ast::{Arg, Node, NodeKind},
    OptimizeError,
};

/// Collapses nested AND/OR chains into one connective whose operands form an unordered list, so
/// `a AND (b AND c)` and `(c AND a) AND b` compare equal.
#[derive(Debug, Default)]
pub(crate) struct FlattenConnectives;

impl Rule for FlattenConnectives {
    fn apply(&mut self, mut tree: Node) -> Result<Node, OptimizeError> {
        flatten(&mut tree);
        Ok(tree)
    }
}

fn flatten(node: &mut Node) {
    for (_, arg) in node.args_mut() {
        for child in arg.nodes_mut() {
            flatten(child);
        }
    }

    if !node.is(NodeKind::Connective) {
        return;
    }

    let op = node.text("op").map(str::to_string);
    let Some(Arg::List(operands)) = node.arg_mut("expressions") else {
        return;
    };

    let mut flat = Vec::with_capacity(operands.len());
    for mut operand in operands.drain(..) {
        if operand.is(NodeKind::Connective) && operand.text("op") == op.as_deref() {
            if let Some(Arg::List(inner)) = operand.remove("expressions") {
                flat.extend(inner);
                continue;
            }
        }
        flat.push(operand);
    }
    *operands = flat;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::lower;
    use pretty_assertions::assert_eq;

    fn predicate(sql: &str) -> Node {
        let tree = FlattenConnectives.apply(lower(sql)).unwrap();
        tree.child("this").and_then(|select| select.child("where")).unwrap().clone()
    }

    #[test]
    fn flattens_same_operator_chains() {
        let node = predicate("SELECT 1 FROM t WHERE a = 1 AND (b = 2 AND c = 3)");

        assert_eq!(node.nodes("expressions").len(), 3);
    }

    #[test]
    fn keeps_mixed_operators_nested() {
        let node = predicate("SELECT 1 FROM t WHERE a = 1 AND (b = 2 OR c = 3)");

        let operands = node.nodes("expressions");
        assert_eq!(operands.len(), 2);
        assert!(operands
            .iter()
            .any(|operand| operand.text("op") == Some("or")));
    }
}
