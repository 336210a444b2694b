//! Display tree abstraction.
//!
//! The controller and items never touch a concrete UI toolkit. Everything
//! they need from the host view environment goes through [`ViewHost`].

mod memory;

pub use memory::MemoryTree;

use serde::{Deserialize, Serialize};

/// Opaque handle to a node in the host's display tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Operations the host view environment provides.
///
/// Node operations are assumed to succeed; calls referring to nodes the host
/// does not know are ignored by implementations.
pub trait ViewHost {
    /// Root node that generated containers are appended to.
    fn body(&self) -> NodeId;

    /// Create a detached element node.
    fn create_element(&mut self, tag: &str, classes: &[&str], text: Option<&str>) -> NodeId;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Insert `child` before the first child of `parent`, or append it when
    /// `parent` has no children.
    fn prepend_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach `child` from `parent` and release its subtree. The released
    /// ids are no longer valid.
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    /// Whether `node` is `ancestor` itself or somewhere in its subtree.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Whether `node` is currently reachable from [`ViewHost::body`].
    fn is_attached(&self, node: NodeId) -> bool;

    /// Whether `node` refers to an element known to the host.
    fn is_element(&self, node: NodeId) -> bool;

    /// Children of `node` in display order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;
}
