//! Blender to engine orientation conversion
//!
//! Blender exports Z-up, the engine is Y-up. Conversion rewrites node
//! transforms, shared mesh data, bind poses and animation curves so the model
//! keeps its appearance after the axis change. With `match_axes` an extra
//! 180° yaw makes the model face the same way it did in Blender.
//!
//! None of these operations are idempotent; each must run exactly once per
//! imported asset.

mod animation;
mod lights;
mod orientation;

pub use animation::convert_animation_clip;
pub use lights::fix_lights;
pub use orientation::{convert_scene, convert_scene_observed};

use std::collections::HashMap;

use crate::foundation::math::{constants::SQRT2_HALF, Mat4, Quat, Quaternion, RawQuat};
use crate::scene::{MeshId, NodeId};

/// Fixed -90° rotation about X applied to nodes and meshes
pub fn rotation_fix() -> Quat {
    Quat::new_unchecked(Quaternion::new(SQRT2_HALF, -SQRT2_HALF, 0.0, 0.0))
}

/// Mesh rotation used when matching axes, 180° about Y after [`rotation_fix`]
pub fn rotation_fix_z_flip() -> Quat {
    Quat::new_unchecked(Quaternion::new(0.0, 0.0, SQRT2_HALF, SQRT2_HALF))
}

/// +90° rotation about X post-multiplied into rotation curves
pub fn anim_rotation_fix() -> RawQuat {
    Quaternion::new(SQRT2_HALF, SQRT2_HALF, 0.0, 0.0)
}

/// 180° rotation about Y used to mirror rotation curves
pub fn mirror_rotation() -> RawQuat {
    Quaternion::new(0.0, 0.0, 1.0, 0.0)
}

/// Conversion switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Add a 180° yaw so forward axes match the source
    pub match_axes: bool,
    /// Rebuild tangents after rotating meshes
    pub import_tangents: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            match_axes: false,
            import_tangents: true,
        }
    }
}

impl ConversionOptions {
    /// Builder pattern: set axis matching
    pub fn with_match_axes(mut self, match_axes: bool) -> Self {
        self.match_axes = match_axes;
        self
    }

    /// Builder pattern: set tangent import
    pub fn with_import_tangents(mut self, import_tangents: bool) -> Self {
        self.import_tangents = import_tangents;
        self
    }
}

/// Malformed animation data
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Some but not all curves of a channel group are animated
    #[error("Incomplete {group} curves on path '{path}'")]
    IncompleteGroup {
        /// Clip path
        path: String,
        /// "position" or "rotation"
        group: &'static str,
    },

    /// Curves of one group have different key counts
    #[error("Mismatched {group} key counts on path '{path}'")]
    KeyCountMismatch {
        /// Clip path
        path: String,
        /// "position" or "rotation"
        group: &'static str,
    },
}

/// Hook notified as conversion progresses
pub trait ConversionObserver {
    /// A node transform was rewritten; `delta` maps old world space to new
    fn node_fixed(&mut self, _node: NodeId, _delta: &Mat4) {}

    /// A shared mesh was rotated
    fn mesh_fixed(&mut self, _mesh: MeshId) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// What [`convert_scene`] changed
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// World-matrix delta per node, identity for an unfixed root
    pub node_deltas: HashMap<NodeId, Mat4>,
    /// Meshes in the order they were fixed
    pub fixed_meshes: Vec<MeshId>,
    /// Nodes whose transform was rewritten
    pub fixed_nodes: usize,
}
