//! Components that can be attached to scene nodes
//!
//! Pure data, mirroring what a model importer produces: mesh filters,
//! renderers, lights, cameras and colliders. Logic lives in the conversion
//! and rule systems.

use std::str::FromStr;

use bitflags::bitflags;

use super::{MeshId, NodeId};

bitflags! {
    /// Build-time optimization eligibility of a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StaticFlags: u32 {
        /// Contributes to global illumination
        const CONTRIBUTE_GI = 1 << 0;
        /// Occludes other objects
        const OCCLUDER_STATIC = 1 << 1;
        /// Eligible for static batching
        const BATCHING_STATIC = 1 << 2;
        /// Included in navigation baking
        const NAVIGATION_STATIC = 1 << 3;
        /// Can be occluded
        const OCCLUDEE_STATIC = 1 << 4;
        /// Generates off-mesh links
        const OFF_MESH_LINK_GENERATION = 1 << 5;
        /// Included in reflection probe baking
        const REFLECTION_PROBE_STATIC = 1 << 6;
    }
}

/// References the mesh that a renderer draws
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshFilter {
    /// Shared mesh, if any
    pub mesh: Option<MeshId>,
}

impl MeshFilter {
    /// Filter referencing a mesh
    pub fn new(mesh: MeshId) -> Self {
        Self { mesh: Some(mesh) }
    }
}

/// Skinning data of a skinned renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkinnedMesh {
    /// Shared mesh, if any
    pub mesh: Option<MeshId>,
    /// Bone nodes, one per bind pose
    pub bones: Vec<NodeId>,
}

/// Which kind of renderer is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererKind {
    /// Draws the mesh of the node's mesh filter
    Mesh,
    /// Draws a skinned mesh deformed by bones
    Skinned(SkinnedMesh),
}

/// How a renderer casts shadows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowCastingMode {
    /// No shadows
    Off,
    /// Regular shadows
    #[default]
    On,
    /// Shadows from both faces
    TwoSided,
    /// Invisible, only casts shadows
    ShadowsOnly,
}

impl ShadowCastingMode {
    const NAMES: [(&'static str, Self); 4] = [
        ("Off", Self::Off),
        ("On", Self::On),
        ("TwoSided", Self::TwoSided),
        ("ShadowsOnly", Self::ShadowsOnly),
    ];
}

/// Error returned when a shadow mode name is not recognized
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown shadow casting mode '{0}'")]
pub struct UnknownShadowMode(pub String);

impl FromStr for ShadowCastingMode {
    type Err = UnknownShadowMode;

    /// Accepts the member name or its numeric value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((_, mode)) = Self::NAMES.iter().find(|(name, _)| *name == trimmed) {
            return Ok(*mode);
        }
        match trimmed.parse::<u8>() {
            Ok(index) if usize::from(index) < Self::NAMES.len() => Ok(Self::NAMES[usize::from(index)].1),
            _ => Err(UnknownShadowMode(s.to_string())),
        }
    }
}

/// Renderer component
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    /// Plain or skinned
    pub kind: RendererKind,
    /// Disabled renderers draw nothing
    pub enabled: bool,
    /// Shadow casting mode
    pub shadow_casting: ShadowCastingMode,
    /// Whether the renderer receives shadows
    pub receive_shadows: bool,
    /// Lightmap texel scale
    pub lightmap_scale: f32,
}

impl Renderer {
    /// Plain mesh renderer
    pub fn mesh() -> Self {
        Self::with_kind(RendererKind::Mesh)
    }

    /// Skinned mesh renderer
    pub fn skinned(mesh: MeshId, bones: Vec<NodeId>) -> Self {
        Self::with_kind(RendererKind::Skinned(SkinnedMesh {
            mesh: Some(mesh),
            bones,
        }))
    }

    fn with_kind(kind: RendererKind) -> Self {
        Self {
            kind,
            enabled: true,
            shadow_casting: ShadowCastingMode::On,
            receive_shadows: true,
            lightmap_scale: 1.0,
        }
    }

    /// Skinning data when this is a skinned renderer
    pub fn skin(&self) -> Option<&SkinnedMesh> {
        match &self.kind {
            RendererKind::Skinned(skin) => Some(skin),
            RendererKind::Mesh => None,
        }
    }
}

/// Types of lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight) with parallel rays
    Directional,
    /// Point light that radiates in all directions from a position
    Point,
    /// Spot light that creates a cone of light from a position
    Spot,
    /// Rectangular area light
    Area,
}

/// Light component
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// The type of light
    pub light_type: LightType,
    /// RGB color (0.0 to 1.0 range)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Maximum range for point/spot lights
    pub range: f32,
}

impl Light {
    /// Create a light of the given type
    pub fn new(light_type: LightType, intensity: f32, range: f32) -> Self {
        Self {
            light_type,
            color: [1.0, 1.0, 1.0],
            intensity,
            range,
        }
    }

    /// Point light
    pub fn point(intensity: f32, range: f32) -> Self {
        Self::new(LightType::Point, intensity, range)
    }

    /// Directional light
    pub fn directional(intensity: f32) -> Self {
        Self::new(LightType::Directional, intensity, 0.0)
    }
}

/// Camera component
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

/// Collider shape
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    /// Box with half extents
    Box {
        /// Half size on each axis
        half_extents: [f32; 3],
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Collider built from a mesh
    Mesh(Option<MeshId>),
}

/// Collider component
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    /// Shape
    pub shape: ColliderShape,
    /// Trigger colliders report overlaps without physical response
    pub is_trigger: bool,
}

impl Collider {
    /// Solid collider of a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            is_trigger: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_mode_parses_names_and_numbers() {
        assert_eq!("TwoSided".parse::<ShadowCastingMode>(), Ok(ShadowCastingMode::TwoSided));
        assert_eq!("0".parse::<ShadowCastingMode>(), Ok(ShadowCastingMode::Off));
        assert!("twosided".parse::<ShadowCastingMode>().is_err());
        assert!("7".parse::<ShadowCastingMode>().is_err());
    }

    #[test]
    fn test_unknown_shadow_mode_message() {
        let err = "Sometimes".parse::<ShadowCastingMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown shadow casting mode 'Sometimes'");
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_static_flags_keep_unknown_bits() {
        let flags = StaticFlags::from_bits_retain(u32::MAX);
        assert!(flags.contains(StaticFlags::all()));
        assert_eq!(flags.bits(), u32::MAX);
    }
}
