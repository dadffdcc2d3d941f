//! Structural equality of query trees.

mod multiset;

pub use multiset::*;

use std::fmt;

use derive_more::Display;
use tracing::trace;

use crate::{
    ast::{Arg, Node, NodeKind},
    COMPARE,
};

/// Argument keys that only carry naming or bookkeeping and never take part in comparison.
pub const IGNORED_ARGS: &[&str] = &["alias", "span", "parent", "comments", "ordinal", "recursive"];

/// The first disagreement found between two trees.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("at {path}: {reason}")]
pub struct Mismatch {
    pub path: String,
    pub reason: MismatchReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    Kind {
        left: NodeKind,
        right: NodeKind,
    },
    Keys {
        left: Vec<&'static str>,
        right: Vec<&'static str>,
    },
    Shape {
        key: &'static str,
        left: String,
        right: String,
    },
    Length {
        key: &'static str,
        left: usize,
        right: usize,
    },
    Unmatched {
        key: &'static str,
        element: String,
        left: String,
        right: String,
    },
    Value {
        key: &'static str,
        left: String,
        right: String,
    },
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::Kind { left, right } => {
                write!(f, "Type mismatch: {left} and {right}")
            }
            MismatchReason::Keys { left, right } => write!(
                f,
                "Match failed: [Keywords] {} and [Keywords] {} do not match.",
                left.join(", "),
                right.join(", ")
            ),
            MismatchReason::Shape { key, left, right } => write!(
                f,
                "Match failed: [{key}] {left} and [{key}] {right} have different shapes."
            ),
            MismatchReason::Length { key, left, right } => write!(
                f,
                "Match failed: [SubSQLList] {key} has {left} elements and {right} elements."
            ),
            MismatchReason::Unmatched {
                key,
                element,
                left,
                right,
            } => write!(
                f,
                "Match failed: [SubSQLList] {key} element {element} has no partner between {left} and {right}."
            ),
            MismatchReason::Value { key, left, right } => write!(
                f,
                "Match failed: [Value] {key}={left} and [Value] {key}={right} are not equal."
            ),
        }
    }
}

/// Compares trees for structural equality.
///
/// Node kinds must agree, argument key sets must agree once [`IGNORED_ARGS`] are removed, and every
/// remaining argument must agree: sub-nodes recursively, sequences pairwise, lists as multisets and
/// scalars exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    strategy: MatchStrategy,
}

impl Comparator {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn equal(&self, left: &Node, right: &Node) -> bool {
        self.compare(left, right).is_ok()
    }

    pub fn compare(&self, left: &Node, right: &Node) -> Result<(), Mismatch> {
        let mut path = vec!["$".to_string()];
        self.compare_node(left, right, &mut path)
            .map_err(|reason| Mismatch {
                path: path.join("."),
                reason,
            })
    }

    // On failure `path` is left pointing at the node where the disagreement was found.
    fn compare_node(
        &self,
        left: &Node,
        right: &Node,
        path: &mut Vec<String>,
    ) -> Result<(), MismatchReason> {
        if left.kind() != right.kind() {
            return Err(MismatchReason::Kind {
                left: left.kind(),
                right: right.kind(),
            });
        }

        let left_keys = compared_keys(left);
        let right_keys = compared_keys(right);

        if !same_keys(&left_keys, &right_keys) {
            return Err(MismatchReason::Keys {
                left: left_keys,
                right: right_keys,
            });
        }

        for key in left_keys {
            let (Some(l), Some(r)) = (left.arg(key), right.arg(key)) else {
                continue;
            };
            self.compare_arg(key, l, r, path)?;
        }

        Ok(())
    }

    fn compare_arg(
        &self,
        key: &'static str,
        left: &Arg,
        right: &Arg,
        path: &mut Vec<String>,
    ) -> Result<(), MismatchReason> {
        match (left, right) {
            (Arg::Node(l), Arg::Node(r)) => {
                path.push(key.to_string());
                self.compare_node(l, r, path)?;
                path.pop();
                Ok(())
            }
            (Arg::Seq(l), Arg::Seq(r)) => {
                if l.len() != r.len() {
                    return Err(MismatchReason::Length {
                        key,
                        left: l.len(),
                        right: r.len(),
                    });
                }
                for (position, (l, r)) in l.iter().zip(r).enumerate() {
                    path.push(format!("{key}[{position}]"));
                    self.compare_node(l, r, path)?;
                    path.pop();
                }
                Ok(())
            }
            (Arg::List(l), Arg::List(r)) => {
                if l.len() != r.len() {
                    return Err(MismatchReason::Length {
                        key,
                        left: l.len(),
                        right: r.len(),
                    });
                }
                match match_multiset(l, r, self.strategy, |l, r| self.equal(l, r)) {
                    Ok(_) => Ok(()),
                    Err(position) => {
                        trace!(target: COMPARE, msg = "Unordered list has no pairing", key, position);
                        Err(MismatchReason::Unmatched {
                            key,
                            element: l.get(position).map(Node::to_string).unwrap_or_default(),
                            left: left.to_string(),
                            right: right.to_string(),
                        })
                    }
                }
            }
            (Arg::Scalar(l), Arg::Scalar(r)) => {
                if l == r {
                    Ok(())
                } else {
                    Err(MismatchReason::Value {
                        key,
                        left: l.to_string(),
                        right: r.to_string(),
                    })
                }
            }
            _ => Err(MismatchReason::Shape {
                key,
                left: left.to_string(),
                right: right.to_string(),
            }),
        }
    }
}

fn compared_keys(node: &Node) -> Vec<&'static str> {
    node.args()
        .map(|(key, _)| key)
        .filter(|key| !IGNORED_ARGS.contains(key))
        .collect()
}

fn same_keys(left: &[&str], right: &[&str]) -> bool {
    left.len() == right.len() && left.iter().all(|key| right.contains(key))
}
