//! Rewrites identifier leaves according to an alias correspondence.

use crate::{
    alias::AliasCorrespondence,
    ast::{Node, NodeKind},
};

/// Returns a copy of `tree` in which every identifier leaf named by a key of `correspondence` carries
/// the mapped name instead. Nothing else changes: only the leaf text is rewritten.
pub fn normalize(tree: &Node, correspondence: &AliasCorrespondence) -> Node {
    let mut normalized = tree.clone();

    if correspondence.is_empty() {
        return normalized;
    }

    normalized.walk_mut(&mut |node| {
        if !node.is(NodeKind::Identifier) {
            return;
        }

        let renamed = node
            .name()
            .and_then(|name| correspondence.rename(name))
            .map(str::to_string);

        if let Some(renamed) = renamed {
            node.set("this", renamed);
        }
    });

    normalized
}
