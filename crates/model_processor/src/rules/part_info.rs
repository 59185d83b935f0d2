//! Snapshot of where a node sits in the hierarchy

use crate::scene::{NodeId, Scene};

/// Name, path and depth of a node at the moment it is visited
///
/// Taken fresh for every visit; earlier actions may have renamed ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// Node handle
    pub node: NodeId,
    /// Node name
    pub name: String,
    /// Slash-separated names from the root down, root included
    pub path: String,
    /// Number of ancestors, 0 for the root
    pub depth: usize,
}

impl PartInfo {
    /// Capture a live node, `None` once it is destroyed
    pub fn capture(scene: &Scene, node: NodeId) -> Option<Self> {
        let name = scene.node(node)?.name.clone();
        Some(Self {
            node,
            name,
            path: scene.hierarchy_path(node),
            depth: scene.depth(node),
        })
    }
}
