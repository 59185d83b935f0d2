//! Animation clips and keyframe curves

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One key of a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Key time in seconds
    pub time: f32,
    /// Value at the key
    pub value: f32,
    /// Incoming slope
    pub in_tangent: f32,
    /// Outgoing slope
    pub out_tangent: f32,
}

impl Keyframe {
    /// Key with flat tangents
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    /// Builder pattern: set both tangents
    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

/// Sequence of keys animating one float property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationCurve {
    /// Keys ordered by time
    pub keys: Vec<Keyframe>,
}

impl AnimationCurve {
    /// Curve from keys
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the curve has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Local transform channels that axis conversion rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum TransformChannel {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    RotationW,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl TransformChannel {
    /// Position channels, x y z
    pub const POSITION: [Self; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];

    /// Rotation channels, x y z w
    pub const ROTATION: [Self; 4] = [Self::RotationX, Self::RotationY, Self::RotationZ, Self::RotationW];

    /// Scale channels, x y z
    pub const SCALE: [Self; 3] = [Self::ScaleX, Self::ScaleY, Self::ScaleZ];

    /// Serialized property name of the channel
    pub fn property_name(self) -> &'static str {
        match self {
            Self::PositionX => "m_LocalPosition.x",
            Self::PositionY => "m_LocalPosition.y",
            Self::PositionZ => "m_LocalPosition.z",
            Self::RotationX => "m_LocalRotation.x",
            Self::RotationY => "m_LocalRotation.y",
            Self::RotationZ => "m_LocalRotation.z",
            Self::RotationW => "m_LocalRotation.w",
            Self::ScaleX => "m_LocalScale.x",
            Self::ScaleY => "m_LocalScale.y",
            Self::ScaleZ => "m_LocalScale.z",
        }
    }

    /// Channel for a serialized property name
    pub fn from_property_name(name: &str) -> Option<Self> {
        Self::POSITION
            .into_iter()
            .chain(Self::ROTATION)
            .chain(Self::SCALE)
            .find(|channel| channel.property_name() == name)
    }
}

/// Property a curve animates
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurveTarget {
    /// One of the local transform channels
    Transform(TransformChannel),
    /// Any other property, kept verbatim
    Other(String),
}

impl CurveTarget {
    /// Classify a serialized property name
    pub fn from_property(name: &str) -> Self {
        TransformChannel::from_property_name(name)
            .map_or_else(|| Self::Other(name.to_string()), Self::Transform)
    }

    /// Serialized property name
    pub fn property_name(&self) -> &str {
        match self {
            Self::Transform(channel) => channel.property_name(),
            Self::Other(name) => name,
        }
    }
}

/// Node path plus animated property
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveBinding {
    /// Slash-separated path relative to the clip root, "" for the root
    pub path: String,
    /// Animated property
    pub target: CurveTarget,
}

impl CurveBinding {
    /// Binding for a path and serialized property name
    pub fn new(path: impl Into<String>, property: &str) -> Self {
        Self {
            path: path.into(),
            target: CurveTarget::from_property(property),
        }
    }

    /// Binding for a transform channel
    pub fn transform(path: impl Into<String>, channel: TransformChannel) -> Self {
        Self {
            path: path.into(),
            target: CurveTarget::Transform(channel),
        }
    }
}

impl fmt::Display for CurveBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.target.property_name())
    }
}

/// Number of segments of a clip path, 0 for the root path ""
pub fn path_depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}

/// Named set of curves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationClip {
    /// Clip name
    pub name: String,
    curves: BTreeMap<CurveBinding, AnimationCurve>,
}

impl AnimationClip {
    /// Empty clip
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: BTreeMap::new(),
        }
    }

    /// Insert or replace a curve
    pub fn set_curve(&mut self, path: impl Into<String>, property: &str, curve: AnimationCurve) {
        self.curves.insert(CurveBinding::new(path, property), curve);
    }

    /// Insert or replace the curve of a binding
    pub fn set_binding(&mut self, binding: CurveBinding, curve: AnimationCurve) {
        self.curves.insert(binding, curve);
    }

    /// Curve of a binding
    pub fn curve(&self, binding: &CurveBinding) -> Option<&AnimationCurve> {
        self.curves.get(binding)
    }

    /// Curve of a transform channel on a path
    pub fn channel(&self, path: &str, channel: TransformChannel) -> Option<&AnimationCurve> {
        self.curves.get(&CurveBinding::transform(path, channel))
    }

    /// Remove and return the curve of a binding
    pub fn remove_curve(&mut self, binding: &CurveBinding) -> Option<AnimationCurve> {
        self.curves.remove(binding)
    }

    /// All curves ordered by binding
    pub fn curves(&self) -> impl Iterator<Item = (&CurveBinding, &AnimationCurve)> {
        self.curves.iter()
    }

    /// Number of curves
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Distinct paths with at least one transform curve
    pub fn transform_paths(&self) -> BTreeSet<String> {
        self.curves
            .keys()
            .filter(|binding| matches!(binding.target, CurveTarget::Transform(_)))
            .map(|binding| binding.path.clone())
            .collect()
    }
}
