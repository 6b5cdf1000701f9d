//! Routing decision returned by `Node::run`.

/// What the graph runner should do after a node finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    /// Follow the linear edge order (or the sole outgoing edge).
    Continue,
    /// Jump directly to the named node, bypassing edge order.
    Node(String),
    /// Stop the run; the current state is the final state.
    End,
}
