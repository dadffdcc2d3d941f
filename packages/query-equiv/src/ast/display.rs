use std::fmt::{Display, Formatter, Result};

use super::{Arg, Node};

/// Renders a node as an s-expression, e.g. `(column this=(identifier this='x'))`.
///
/// Unordered lists render in braces and ordered sequences in brackets.
impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "({}", self.kind())?;
        for (key, arg) in self.args() {
            write!(f, " {key}={arg}")?;
        }
        f.write_str(")")
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Arg::Node(node) => write!(f, "{node}"),
            Arg::List(nodes) => write!(f, "{{{}}}", Fmt(nodes)),
            Arg::Seq(nodes) => write!(f, "[{}]", Fmt(nodes)),
            Arg::Scalar(scalar) => write!(f, "{scalar}"),
        }
    }
}

struct Fmt<'a>(&'a [Node]);

impl Display for Fmt<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let rendered: Vec<String> = self.0.iter().map(Node::to_string).collect();
        f.write_str(&rendered.join(", "))
    }
}

#[cfg(test)]
mod test {
    use crate::ast::{Arg, Node, NodeKind, Scalar};

    #[test]
    fn renders_s_expression() {
        let node = Node::new(NodeKind::In)
            .with(
                "this",
                Node::new(NodeKind::Column).with("this", Node::identifier("x")),
            )
            .with(
                "expressions",
                Arg::List(vec![
                    Node::new(NodeKind::Literal).with("this", Scalar::Number("1".into())),
                    Node::new(NodeKind::Literal).with("this", Scalar::Null),
                ]),
            );

        assert_eq!(
            node.to_string(),
            "(in this=(column this=(identifier this='x')) expressions={(literal this=1), (literal this=NULL)})"
        );
    }
}
