use super::Rule;
use crate::{
    ast::{Arg, Node, NodeKind, Scalar},
    provider::canonical_number,
    OptimizeError,
};

/// Folds constant expressions over literals, bottom-up.
///
/// Covers arithmetic on numbers, concatenation of strings, unary sign and NOT, and TRUE/FALSE
/// identities inside AND/OR. Anything that would overflow, divide by zero or change SQL integer
/// division semantics is left as written.
#[derive(Debug, Default)]
pub(crate) struct FoldLiterals;

impl Rule for FoldLiterals {
    fn apply(&mut self, mut tree: Node) -> Result<Node, OptimizeError> {
        fold(&mut tree);
        Ok(tree)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    fn of(node: &Node) -> Option<Self> {
        if !node.is(NodeKind::Literal) {
            return None;
        }
        let Some(Scalar::Number(text)) = node.scalar("this") else {
            return None;
        };
        text.parse::<i64>()
            .map(Number::Integer)
            .or_else(|_| text.parse::<f64>().map(Number::Real))
            .ok()
    }

    fn as_real(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Real(value) => value,
        }
    }

    fn into_literal(self) -> Option<Node> {
        let text = match self {
            Number::Integer(value) => value.to_string(),
            Number::Real(value) if value.is_finite() => canonical_number(&value.to_string())?,
            Number::Real(_) => return None,
        };
        Some(Node::new(NodeKind::Literal).with("this", Scalar::Number(text)))
    }
}

fn fold(node: &mut Node) {
    for (_, arg) in node.args_mut() {
        for child in arg.nodes_mut() {
            fold(child);
        }
    }

    let folded = match node.kind() {
        NodeKind::Binary => fold_binary(node),
        NodeKind::Unary => fold_unary(node),
        NodeKind::Connective => fold_connective(node),
        _ => None,
    };

    if let Some(folded) = folded {
        *node = folded;
    }
}

fn fold_binary(node: &Node) -> Option<Node> {
    let op = node.text("op")?;
    let left = node.child("this")?;
    let right = node.child("expression")?;

    if op == "||" {
        let (Some(l), Some(r)) = (string(left), string(right)) else {
            return None;
        };
        return Some(string_literal(format!("{l}{r}")));
    }

    let result = match (Number::of(left)?, Number::of(right)?) {
        (Number::Integer(l), Number::Integer(r)) => match op {
            "+" => l.checked_add(r).map(Number::Integer),
            "-" => l.checked_sub(r).map(Number::Integer),
            "*" => l.checked_mul(r).map(Number::Integer),
            "/" if r != 0 && l.checked_rem(r) == Some(0) => l.checked_div(r).map(Number::Integer),
            "%" if r != 0 => l.checked_rem(r).map(Number::Integer),
            _ => None,
        },
        (l, r) => {
            let (l, r) = (l.as_real(), r.as_real());
            match op {
                "+" => Some(Number::Real(l + r)),
                "-" => Some(Number::Real(l - r)),
                "*" => Some(Number::Real(l * r)),
                "/" if r != 0.0 => Some(Number::Real(l / r)),
                _ => None,
            }
        }
    }?;

    result.into_literal()
}

fn fold_unary(node: &Node) -> Option<Node> {
    let op = node.text("op")?;
    let operand = node.child("this")?;

    match op {
        "-" => match Number::of(operand)? {
            Number::Integer(value) => value.checked_neg().map(Number::Integer),
            Number::Real(value) => Some(Number::Real(-value)),
        }
        .and_then(Number::into_literal),
        "+" => Number::of(operand)?.into_literal(),
        "not" => boolean(operand).map(|value| bool_literal(!value)),
        _ => None,
    }
}

fn fold_connective(node: &Node) -> Option<Node> {
    let conjunction = match node.text("op")? {
        "and" => true,
        "or" => false,
        _ => return None,
    };
    let operands = node.nodes("expressions");

    // FALSE absorbs an AND and TRUE absorbs an OR.
    if operands
        .iter()
        .any(|operand| boolean(operand) == Some(!conjunction))
    {
        return Some(bool_literal(!conjunction));
    }

    let remaining: Vec<Node> = operands
        .iter()
        .filter(|operand| boolean(operand) != Some(conjunction))
        .cloned()
        .collect();

    match remaining.len() {
        len if len == operands.len() => None,
        0 => Some(bool_literal(conjunction)),
        1 => remaining.into_iter().next(),
        _ => Some(node.clone().with("expressions", Arg::List(remaining))),
    }
}

fn boolean(node: &Node) -> Option<bool> {
    if node.is(NodeKind::Literal) {
        node.scalar("this").and_then(Scalar::as_bool)
    } else {
        None
    }
}

fn string(node: &Node) -> Option<&str> {
    if node.is(NodeKind::Literal) && node.flag("is_string") {
        node.text("this")
    } else {
        None
    }
}

fn bool_literal(value: bool) -> Node {
    Node::new(NodeKind::Literal).with("this", value)
}

fn string_literal(value: String) -> Node {
    Node::new(NodeKind::Literal)
        .with("this", value)
        .with("is_string", true)
}
