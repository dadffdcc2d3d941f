//! Alias extraction and cross-query alias matching.

mod extract;
mod matcher;

pub use extract::*;
pub use matcher::*;

use tracing::debug;

use crate::{ast::Node, ALIAS};

/// Alias names bound in one query, each mapped to the subtree it denotes.
///
/// Entries keep the order in which they were first registered. Registering a name again replaces its
/// subtree but keeps its position: the last registration wins.
#[derive(Debug, Default, Clone)]
pub struct AliasMap<'ast> {
    entries: Vec<(String, &'ast Node)>,
}

impl<'ast> AliasMap<'ast> {
    /// Registers `name`, returning the subtree it previously denoted.
    pub fn insert(&mut self, name: impl Into<String>, node: &'ast Node) -> Option<&'ast Node> {
        let name = name.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => {
                debug!(target: ALIAS, msg = "Alias registered twice, keeping the last", name);
                Some(std::mem::replace(slot, node))
            }
            None => {
                self.entries.push((name, node));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&'ast Node> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, node)| *node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'ast Node)> + '_ {
        self.entries.iter().map(|(name, node)| (name.as_str(), *node))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_registration_wins_in_place() {
        let first = Node::identifier("first");
        let second = Node::identifier("second");
        let other = Node::identifier("other");

        let mut aliases = AliasMap::default();
        aliases.insert("a", &first);
        aliases.insert("b", &other);
        let replaced = aliases.insert("a", &second);

        assert_eq!(replaced, Some(&first));
        assert_eq!(aliases.get("a"), Some(&second));
        assert_eq!(aliases.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
