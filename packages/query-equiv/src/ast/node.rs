use derive_more::Display;

/// The kind tag of a [`Node`].
///
/// Two nodes can only be structurally equal when their kinds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    #[display("query")]
    Query,
    #[display("with")]
    With,
    #[display("cte")]
    Cte,
    #[display("select")]
    Select,
    #[display("set_operation")]
    SetOperation,
    #[display("values")]
    Values,
    #[display("tuple")]
    Tuple,
    #[display("from")]
    From,
    #[display("join")]
    Join,
    #[display("table")]
    Table,
    #[display("table_alias")]
    TableAlias,
    #[display("subquery")]
    Subquery,
    #[display("alias")]
    Alias,
    #[display("star")]
    Star,
    #[display("column")]
    Column,
    #[display("identifier")]
    Identifier,
    #[display("literal")]
    Literal,
    #[display("binary")]
    Binary,
    #[display("unary")]
    Unary,
    #[display("connective")]
    Connective,
    #[display("function")]
    Function,
    #[display("window")]
    Window,
    #[display("ordered")]
    Ordered,
    #[display("limit")]
    Limit,
    #[display("in")]
    In,
    #[display("between")]
    Between,
    #[display("exists")]
    Exists,
    #[display("is_null")]
    IsNull,
    /// Any expression form without a dedicated kind. Carries its operator name, its operands and a SQL
    /// template of everything that is not an operand.
    #[display("expression")]
    Expression,
}

/// A terminal value held directly by a node argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Scalar {
    #[display("'{_0}'")]
    Text(String),
    /// A number in canonical textual form, so `1.50` and `1.5` compare equal.
    #[display("{_0}")]
    Number(String),
    #[display("{_0}")]
    Bool(bool),
    #[display("NULL")]
    Null,
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// The value stored under one argument key of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Node(Box<Node>),
    /// An unordered collection, compared as a multiset.
    List(Vec<Node>),
    /// An ordered collection, compared position by position.
    Seq(Vec<Node>),
    Scalar(Scalar),
}

impl Arg {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Arg::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Arg::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// The child nodes held by this argument, in order.
    pub fn nodes(&self) -> &[Node] {
        match self {
            Arg::Node(node) => std::slice::from_ref(&**node),
            Arg::List(nodes) | Arg::Seq(nodes) => nodes,
            Arg::Scalar(_) => &[],
        }
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        match self {
            Arg::Node(node) => std::slice::from_mut(&mut **node),
            Arg::List(nodes) | Arg::Seq(nodes) => nodes,
            Arg::Scalar(_) => &mut [],
        }
    }
}

impl From<Node> for Arg {
    fn from(node: Node) -> Self {
        Arg::Node(Box::new(node))
    }
}

impl From<Scalar> for Arg {
    fn from(scalar: Scalar) -> Self {
        Arg::Scalar(scalar)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Scalar(Scalar::Bool(value))
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Scalar(Scalar::Text(text.to_owned()))
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Scalar(Scalar::Text(text))
    }
}

/// A node of the comparable query tree.
///
/// Arguments are kept in insertion order. Traversals visit them in that order, which makes every walk
/// pre-order and left to right. Comparison treats the argument keys as a set.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    args: Vec<(&'static str, Arg)>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    /// An identifier leaf holding `name`.
    pub fn identifier(name: impl Into<String>) -> Self {
        Node::new(NodeKind::Identifier).with("this", Scalar::Text(name.into()))
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    pub fn with(mut self, key: &'static str, arg: impl Into<Arg>) -> Self {
        self.set(key, arg);
        self
    }

    pub fn with_opt<A: Into<Arg>>(self, key: &'static str, arg: Option<A>) -> Self {
        match arg {
            Some(arg) => self.with(key, arg),
            None => self,
        }
    }

    /// Stores `nodes` as an unordered list under `key`, unless there are none.
    pub fn with_list(self, key: &'static str, nodes: Vec<Node>) -> Self {
        if nodes.is_empty() {
            self
        } else {
            self.with(key, Arg::List(nodes))
        }
    }

    /// Stores `nodes` as an ordered sequence under `key`, unless there are none.
    pub fn with_seq(self, key: &'static str, nodes: Vec<Node>) -> Self {
        if nodes.is_empty() {
            self
        } else {
            self.with(key, Arg::Seq(nodes))
        }
    }

    /// Stores `true` under `key` when `flag` is set; absent flags are simply left out.
    pub fn with_flag(self, key: &'static str, flag: bool) -> Self {
        if flag {
            self.with(key, true)
        } else {
            self
        }
    }

    /// Replaces the argument under `key` in place, or appends it.
    pub fn set(&mut self, key: &'static str, arg: impl Into<Arg>) {
        let arg = arg.into();
        match self.args.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = arg,
            None => self.args.push((key, arg)),
        }
    }

    /// Inserts the argument under `key` ahead of every other argument.
    pub fn prepend(&mut self, key: &'static str, arg: impl Into<Arg>) {
        self.remove(key);
        self.args.insert(0, (key, arg.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<Arg> {
        let position = self.args.iter().position(|(k, _)| *k == key)?;
        Some(self.args.remove(position).1)
    }

    pub fn arg(&self, key: &str) -> Option<&Arg> {
        self.args.iter().find(|(k, _)| *k == key).map(|(_, arg)| arg)
    }

    pub fn arg_mut(&mut self, key: &str) -> Option<&mut Arg> {
        self.args
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, arg)| arg)
    }

    pub fn args(&self) -> impl Iterator<Item = (&'static str, &Arg)> {
        self.args.iter().map(|(key, arg)| (*key, arg))
    }

    pub fn args_mut(&mut self) -> impl Iterator<Item = (&'static str, &mut Arg)> {
        self.args.iter_mut().map(|(key, arg)| (*key, arg))
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.arg(key).and_then(Arg::as_node)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        match self.arg_mut(key)? {
            Arg::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.arg(key).and_then(Arg::as_scalar)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.scalar(key).and_then(Scalar::as_text)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.scalar(key).and_then(Scalar::as_bool).unwrap_or(false)
    }

    /// The nodes stored under `key`, whether it holds one node or a collection.
    pub fn nodes(&self, key: &str) -> &[Node] {
        self.arg(key).map(Arg::nodes).unwrap_or(&[])
    }

    /// The text of an identifier leaf.
    pub fn name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Identifier => self.text("this"),
            _ => None,
        }
    }

    /// The name carried by an alias-like node: an [`NodeKind::Identifier`] or a
    /// [`NodeKind::TableAlias`] wrapping one.
    pub fn alias_name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Identifier => self.name(),
            NodeKind::TableAlias => self.child("this").and_then(Node::name),
            _ => None,
        }
    }

    /// Direct children, in argument order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.args.iter().flat_map(|(_, arg)| arg.nodes().iter())
    }

    /// Every node of the subtree rooted here, pre-order and left to right.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Calls `f` on every node of the subtree rooted here, pre-order and left to right.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for (_, arg) in self.args.iter_mut() {
            for child in arg.nodes_mut() {
                child.walk_mut(f);
            }
        }
    }
}

/// Pre-order iterator returned by [`Node::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let children: Vec<&Node> = node.children().collect();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(table: &str, name: &str) -> Node {
        Node::new(NodeKind::Column)
            .with("this", Node::identifier(name))
            .with("table", Node::identifier(table))
    }

    #[test]
    fn walk_is_pre_order_left_to_right() {
        let node = Node::new(NodeKind::Binary)
            .with("op", "=")
            .with("left", column("a", "x"))
            .with("right", column("b", "y"));

        let names: Vec<&str> = node.walk().filter_map(Node::name).collect();

        assert_eq!(names, vec!["x", "a", "y", "b"]);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut node = column("a", "x");
        node.set("this", Node::identifier("z"));

        let keys: Vec<&str> = node.args().map(|(key, _)| key).collect();

        assert_eq!(keys, vec!["this", "table"]);
        assert_eq!(node.child("this").and_then(Node::name), Some("z"));
    }

    #[test]
    fn prepend_moves_argument_to_front() {
        let mut node = column("a", "x");
        node.prepend("table", Node::identifier("b"));

        let keys: Vec<&str> = node.args().map(|(key, _)| key).collect();

        assert_eq!(keys, vec!["table", "this"]);
    }

    #[test]
    fn empty_collections_and_false_flags_are_omitted() {
        let node = Node::new(NodeKind::Select)
            .with_list("expressions", vec![])
            .with_seq("order", vec![])
            .with_flag("distinct", false);

        assert_eq!(node.args().count(), 0);
    }
}
