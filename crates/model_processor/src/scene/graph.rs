//! Scene graph arena
//!
//! Nodes live in a [`SlotMap`] and form a single tree under the root. All
//! traversal helpers are pre-order, children in insertion order.

use slotmap::SlotMap;

use super::components::{Camera, Collider, Light, MeshFilter, Renderer, StaticFlags};
use super::mesh::Mesh;
use super::{MeshId, NodeId, SceneError};
use crate::foundation::math::{Mat4, Quat, Transform};

/// Tag given to nodes that have not been tagged
pub const UNTAGGED: &str = "Untagged";

/// One node of the imported hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Self activation flag
    pub active: bool,
    /// Tag string
    pub tag: String,
    /// Layer index, 0..=31
    pub layer: u8,
    /// Static optimization flags
    pub static_flags: StaticFlags,
    /// Mesh filter component
    pub mesh_filter: Option<MeshFilter>,
    /// Renderer component
    pub renderer: Option<Renderer>,
    /// Light component
    pub light: Option<Light>,
    /// Camera component
    pub camera: Option<Camera>,
    /// Collider component
    pub collider: Option<Collider>,
    /// Additional components, by type name
    pub extensions: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Empty, active node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            active: true,
            tag: UNTAGGED.to_string(),
            layer: 0,
            static_flags: StaticFlags::empty(),
            mesh_filter: None,
            renderer: None,
            light: None,
            camera: None,
            collider: None,
            extensions: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder pattern: set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: attach a mesh filter and a plain renderer
    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh_filter = Some(MeshFilter::new(mesh));
        self.renderer = Some(Renderer::mesh());
        self
    }

    /// Builder pattern: attach a renderer
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Builder pattern: attach a light
    pub fn with_light(mut self, light: Light) -> Self {
        self.light = Some(light);
        self
    }

    /// Builder pattern: attach a camera
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Builder pattern: attach a collider
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    /// Builder pattern: set the activation flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Parent handle, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Mesh drawn by this node, from the mesh filter or the skinned renderer
    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh_filter
            .as_ref()
            .and_then(|filter| filter.mesh)
            .or_else(|| self.renderer.as_ref()?.skin()?.mesh)
    }

    /// Whether a renderer of any kind is attached
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Whether a skinned renderer is attached
    pub fn has_skinned_renderer(&self) -> bool {
        self.renderer.as_ref().is_some_and(|r| r.skin().is_some())
    }

    /// Number of components, the transform included
    pub fn component_count(&self) -> usize {
        1 + usize::from(self.mesh_filter.is_some())
            + usize::from(self.renderer.is_some())
            + usize::from(self.light.is_some())
            + usize::from(self.camera.is_some())
            + usize::from(self.collider.is_some())
            + self.extensions.len()
    }
}

/// Imported scene: a node tree plus the meshes its nodes share
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: SlotMap<NodeId, SceneNode>,
    meshes: SlotMap<MeshId, Mesh>,
    root: NodeId,
}

impl Scene {
    /// Scene holding only a root node
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root(SceneNode::new(root_name))
    }

    /// Scene holding the given root node
    pub fn with_root(mut root: SceneNode) -> Self {
        root.parent = None;
        root.children.clear();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            nodes,
            meshes: SlotMap::with_key(),
            root,
        }
    }

    /// Root handle; stops resolving once the root is destroyed
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Get a node mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Append a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Store a mesh so nodes can reference it
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    /// Get a mesh
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Get a mesh mutably
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id)
    }

    /// All stored meshes
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter()
    }

    /// Child handles of a node, empty for dead handles
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Parent handle of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Remove a node and its whole subtree
    ///
    /// Returns `false` when the handle was already dead.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(id).map(|node| node.parent) else {
            return false;
        };
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent_node.children.retain(|child| *child != id);
        }
        for dead in self.descendants(id) {
            self.nodes.remove(dead);
        }
        true
    }

    /// Number of ancestors, 0 for the root
    pub fn depth(&self, id: NodeId) -> usize {
        std::iter::successors(self.parent(id), |p| self.parent(*p)).count()
    }

    /// Slash-separated names from the root down to the node, root included
    pub fn hierarchy_path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self.ancestors_and_self(id)
            .filter_map(|n| self.nodes.get(n).map(|node| node.name.as_str()))
            .collect();
        names.reverse();
        names.join("/")
    }

    /// Pre-order handles of the subtree rooted at `id`, `id` first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Product of local matrices from the root down to the node
    pub fn local_to_world(&self, id: NodeId) -> Mat4 {
        self.ancestors_and_self(id)
            .filter_map(|n| self.nodes.get(n))
            .fold(Mat4::identity(), |acc, node| node.transform.to_matrix() * acc)
    }

    /// Product of local rotations from the root down to the node
    pub fn world_rotation(&self, id: NodeId) -> Quat {
        self.ancestors_and_self(id)
            .filter_map(|n| self.nodes.get(n))
            .fold(Quat::identity(), |acc, node| node.transform.rotation * acc)
    }

    /// Set the local rotation so that the world rotation becomes `rotation`
    pub fn set_world_rotation(&mut self, id: NodeId, rotation: Quat) {
        let parent_rotation = self.parent(id)
            .map_or_else(Quat::identity, |p| self.world_rotation(p));
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform.rotation = parent_rotation.inverse() * rotation;
        }
    }

    /// Whether the node and all of its ancestors are active
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        self.contains(id)
            && self.ancestors_and_self(id)
                .all(|n| self.nodes.get(n).is_some_and(|node| node.active))
    }

    fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |n| self.parent(*n))
    }
}
