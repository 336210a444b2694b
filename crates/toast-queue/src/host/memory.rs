//! In-memory display tree.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::{NodeId, ViewHost};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A [`ViewHost`] backed by a plain node arena.
///
/// Created nodes live in the arena until [`ViewHost::remove_child`] drops
/// them along with their subtree.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: HashMap<NodeId, Node>,
    body: NodeId,
    next_id: u64,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let body = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                tag: "body".into(),
                classes: Vec::new(),
                text: None,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            body,
            next_id: 1,
        }
    }

    /// Class list of a node, empty for unknown nodes.
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes
            .get(&node)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    /// Number of nodes reachable from the body, body included.
    pub fn attached_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            count += 1;
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().copied());
            }
        }
        count
    }

    /// Nodes held by the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Indented outline of everything attached to the body.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.body, 0, &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let _ = write!(out, "{}<{}", "  ".repeat(depth), node.tag);
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        out.push('\n');
        for &child in &node.children {
            self.write_outline(child, depth + 1, out);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(&child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
    }

    fn drop_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
            }
        }
    }

    fn adopt(&mut self, parent: NodeId, child: NodeId, front: bool) {
        if parent == child
            || !self.nodes.contains_key(&parent)
            || !self.nodes.contains_key(&child)
            || self.contains(child, parent)
        {
            return;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            if front {
                p.children.insert(0, child);
            } else {
                p.children.push(child);
            }
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }
}

impl ViewHost for MemoryTree {
    fn body(&self) -> NodeId {
        self.body
    }

    fn create_element(&mut self, tag: &str, classes: &[&str], text: Option<&str>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_string(),
                classes: classes.iter().map(|c| c.to_string()).collect(),
                text: text.map(str::to_string),
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.adopt(parent, child, false);
    }

    fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.adopt(parent, child, true);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
            self.drop_subtree(child);
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node) && self.contains(self.body, node)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}
