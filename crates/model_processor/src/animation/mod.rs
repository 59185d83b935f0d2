//! Animation model
//!
//! Clips hold float curves keyed by (node path, property). Only the ten local
//! transform channels are interpreted; every other property is carried through
//! untouched.

mod clip;

pub use clip::{
    path_depth, AnimationClip, AnimationCurve, CurveBinding, CurveTarget, Keyframe,
    TransformChannel,
};
