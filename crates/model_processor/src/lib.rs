//! # Model Processor
//!
//! Post-processing for models imported from Blender.
//!
//! ## Features
//!
//! - **Axis Conversion**: Z-up to Y-up for transforms, meshes, bind poses and animation
//! - **Light Units**: Scale Blender light intensity and range to engine units
//! - **Rules**: Data-driven conditions and actions over the imported scene graph
//! - **Settings**: JSON user-data or TOML/RON/JSON files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_processor::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     model_processor::foundation::logging::init();
//!
//!     let settings = ModelProcessorSettings::default().with_axis_conversion();
//!     let processor = ModelPostProcessor::new(settings, &HostEnvironment::new())?;
//!
//!     let mut scene = Scene::new("Tree");
//!     let root = scene.root();
//!     scene.add_child(root, SceneNode::new("Trunk"))?;
//!
//!     let outcome = processor.process_model(&mut scene, SourceKind::BlenderFbx);
//!     assert!(outcome.modified);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod animation;
pub mod conversion;
pub mod rules;
pub mod pipeline;

#[cfg(test)]
mod tests;

/// Common imports for processor users
pub mod prelude {
    pub use crate::{
        animation::{AnimationClip, AnimationCurve, CurveBinding, Keyframe, TransformChannel},
        config::{Config, ConfigError, ModelProcessorSettings, RuleAsset},
        conversion::{
            convert_animation_clip, convert_scene, fix_lights, ConversionError, ConversionOptions,
            ConversionReport,
        },
        foundation::{
            logging::ImportLog,
            math::{Mat4, Quat, Transform, Vec3},
        },
        pipeline::{ModelPostProcessor, ProcessError, ProcessOutcome, SourceKind},
        rules::{
            apply_rule_set, compile_rules, ActionConfig, ActionType, ConditionConfig, ConditionOperator,
            ConditionType, HostEnvironment, Rule, RuleConfig, RuleError, Strictness,
        },
        scene::{Light, LightType, Mesh, MeshId, NodeId, Scene, SceneNode, StaticFlags},
    };
}
