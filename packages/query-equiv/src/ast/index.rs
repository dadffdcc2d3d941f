use std::{collections::HashMap, marker::PhantomData};

use super::Node;

/// Identifies a [`Node`] by address for the lifetime of the tree it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey<'ast> {
    addr: *const Node,
    _ast: PhantomData<&'ast Node>,
}

impl<'ast> NodeKey<'ast> {
    pub fn new(node: &'ast Node) -> Self {
        Self {
            addr: node as *const Node,
            _ast: PhantomData,
        }
    }
}

/// Where a node sits inside its parent.
#[derive(Debug, Clone, Copy)]
pub struct Location<'ast> {
    pub parent: &'ast Node,
    pub key: &'static str,
    pub position: Option<usize>,
}

/// Parent links for every node of a tree, built in one pass.
///
/// The tree itself holds no back-references. Lookups are keyed by [`NodeKey`], so the index is only
/// meaningful for the tree it was built from.
#[derive(Debug, Default)]
pub struct ParentIndex<'ast> {
    locations: HashMap<NodeKey<'ast>, Location<'ast>>,
}

impl<'ast> ParentIndex<'ast> {
    pub fn build(root: &'ast Node) -> Self {
        let mut locations = HashMap::new();

        for parent in root.walk() {
            for (key, arg) in parent.args() {
                let nodes = arg.nodes();
                let positional = arg.as_node().is_none();
                for (position, child) in nodes.iter().enumerate() {
                    locations.insert(
                        NodeKey::new(child),
                        Location {
                            parent,
                            key,
                            position: positional.then_some(position),
                        },
                    );
                }
            }
        }

        Self { locations }
    }

    pub fn location(&self, node: &'ast Node) -> Option<&Location<'ast>> {
        self.locations.get(&NodeKey::new(node))
    }

    pub fn parent(&self, node: &'ast Node) -> Option<&'ast Node> {
        self.location(node).map(|location| location.parent)
    }

    /// A dotted path from the root to `node`, such as `$.this.where.left`.
    pub fn path(&self, node: &'ast Node) -> String {
        let mut segments = Vec::new();
        let mut current = node;

        while let Some(location) = self.location(current) {
            segments.push(match location.position {
                Some(position) => format!("{}[{position}]", location.key),
                None => location.key.to_string(),
            });
            current = location.parent;
        }

        segments.push("$".to_string());
        segments.reverse();
        segments.join(".")
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
