use crate::routing::Node;

/// A composite router with no behaviour of its own.
///
/// It forwards to its children, takes part in the shutdown handshake and
/// ignores every other verb addressed to it.
pub fn hub(name: impl Into<String>, width: u32, children: Vec<Node>) -> Node {
    children
        .into_iter()
        .fold(Node::new(name, width), Node::with_child)
}
