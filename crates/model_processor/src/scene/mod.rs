//! Imported scene model
//!
//! An arena-backed scene graph as produced by a model importer. Nodes and
//! shared meshes are addressed through generational slotmap handles, so a
//! handle to a destroyed node simply stops resolving instead of aliasing a
//! new node.
//!
//! ## Layout
//!
//! ```text
//! Scene
//!  ├── nodes:  SlotMap<NodeId, SceneNode>   (tree via parent/children)
//!  └── meshes: SlotMap<MeshId, Mesh>        (shared by reference)
//! ```

mod components;
mod graph;
mod mesh;

pub use components::{
    Camera, Collider, ColliderShape, Light, LightType, MeshFilter, Renderer, RendererKind,
    ShadowCastingMode, SkinnedMesh, StaticFlags, UnknownShadowMode,
};
pub use graph::{Scene, SceneNode, UNTAGGED};
pub use mesh::{Mesh, AABB};

slotmap::new_key_type! {
    /// Handle to a node of a [`Scene`]
    pub struct NodeId;

    /// Handle to a mesh shared by nodes of a [`Scene`]
    pub struct MeshId;
}

/// Scene graph errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not resolve to a live node
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),
}
