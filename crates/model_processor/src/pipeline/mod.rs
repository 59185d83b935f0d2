//! Post-processing pipeline
//!
//! Runs the stages configured in [`ModelProcessorSettings`] over one
//! imported model, in a fixed order:
//!
//! 1. axis conversion ([`convert_scene`])
//! 2. light unit fix ([`fix_lights`])
//! 3. rules ([`apply_rule_set`])
//!
//! Animation clips go through [`ModelPostProcessor::process_animation`]
//! separately, since the host imports them after the model.

mod source;

pub use source::{SourceKind, BLENDER_CREATOR_ID, HEADER_LEN};

use crate::animation::AnimationClip;
use crate::config::{ConfigError, ModelProcessorSettings};
use crate::conversion::{
    convert_animation_clip, convert_scene_observed, fix_lights, ConversionError, ConversionObserver,
    ConversionReport, NoopObserver,
};
use crate::foundation::logging::ImportLog;
use crate::rules::{apply_rule_set, compile_rules, HostEnvironment, Rule, RuleError, Strictness};
use crate::scene::Scene;

/// Pipeline errors
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    /// Settings could not be loaded or are out of range
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A rule failed to compile
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// An animation clip could not be converted
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// What one pipeline run did
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// Geometry, transforms or light values changed
    pub modified: bool,
    /// Present when the axis conversion ran
    pub conversion: Option<ConversionReport>,
}

/// Settings plus the rules compiled from them, reusable across imports
#[derive(Debug, Clone)]
pub struct ModelPostProcessor {
    settings: ModelProcessorSettings,
    rules: Vec<Rule>,
}

impl ModelPostProcessor {
    /// Validate settings and compile their rules against the host
    ///
    /// `strict_rules` in the settings overrides the host's strictness.
    pub fn new(settings: ModelProcessorSettings, host: &HostEnvironment) -> Result<Self, ProcessError> {
        settings.validate().map_err(ConfigError::Invalid)?;

        let rules = if settings.apply_rules {
            let strictness = if settings.strict_rules {
                Strictness::Strict
            } else {
                host.strictness()
            };
            let host = host.clone().with_strictness(strictness);
            compile_rules(settings.all_rules(), &host)?
        } else {
            Vec::new()
        };

        log::debug!("Compiled {} rules", rules.len());
        Ok(Self { settings, rules })
    }

    /// Build from importer user-data
    pub fn from_user_data(user_data: &str, host: &HostEnvironment) -> Result<Self, ProcessError> {
        Self::new(ModelProcessorSettings::from_user_data(user_data)?, host)
    }

    /// Settings in use
    pub fn settings(&self) -> &ModelProcessorSettings {
        &self.settings
    }

    /// Compiled rules, in application order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every enabled stage over an imported model
    pub fn process_model(&self, scene: &mut Scene, source: SourceKind) -> ProcessOutcome {
        self.process_model_observed(scene, source, &mut NoopObserver)
    }

    /// [`Self::process_model`] with a hook notified as nodes and meshes are fixed
    pub fn process_model_observed(
        &self,
        scene: &mut Scene,
        source: SourceKind,
        observer: &mut dyn ConversionObserver,
    ) -> ProcessOutcome {
        let log = self.log_for(scene);
        let mut outcome = ProcessOutcome::default();

        if self.settings.apply_axis_conversion {
            if !source.is_blender() {
                log.warn(format_args!("{:?} source was not authored in Blender, converting anyway", source));
            }
            let report = convert_scene_observed(scene, &self.settings.conversion_options(), &log, observer);
            outcome.modified = true;
            outcome.conversion = Some(report);
        }

        if self.settings.fix_lights {
            let changed = fix_lights(
                scene,
                self.settings.light_intensity_factor,
                self.settings.light_range_factor,
            );
            if changed {
                log.detail(format_args!("scaled light units"));
            }
            outcome.modified |= changed;
        }

        if !self.rules.is_empty() {
            apply_rule_set(&self.rules, scene, &log);
        }

        outcome
    }

    /// Convert an imported clip's transform curves
    ///
    /// The clip is untouched on error or when axis conversion is off.
    pub fn process_animation(
        &self,
        clip: &mut AnimationClip,
        source: SourceKind,
    ) -> Result<ProcessOutcome, ProcessError> {
        if !self.settings.apply_axis_conversion {
            return Ok(ProcessOutcome::default());
        }

        let log = self.settings.import_log(clip.name.clone());
        if !source.is_blender() {
            log.warn(format_args!("{:?} source was not authored in Blender, converting anyway", source));
        }
        convert_animation_clip(clip, self.settings.match_axes, &log)?;
        log.detail(format_args!("converted {} curves", clip.curve_count()));

        Ok(ProcessOutcome {
            modified: true,
            conversion: None,
        })
    }

    fn log_for(&self, scene: &Scene) -> ImportLog {
        let asset = scene
            .node(scene.root())
            .map(|root| root.name.clone())
            .unwrap_or_default();
        self.settings.import_log(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationCurve, CurveBinding};
    use crate::rules::{ActionConfig, ActionType, ConditionConfig, ConditionOperator, ConditionType, RuleConfig};
    use crate::scene::{Light, SceneNode};
    use approx::assert_relative_eq;

    fn processor(settings: ModelProcessorSettings) -> ModelPostProcessor {
        ModelPostProcessor::new(settings, &HostEnvironment::new()).unwrap()
    }

    #[test]
    fn test_default_settings_do_nothing() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let child = scene.add_child(root, SceneNode::new("Child")).unwrap();
        let before = scene.node(child).unwrap().transform.clone();

        let outcome = processor(ModelProcessorSettings::default()).process_model(&mut scene, SourceKind::BlenderFbx);

        assert!(!outcome.modified);
        assert!(outcome.conversion.is_none());
        assert_eq!(scene.node(child).unwrap().transform, before);
    }

    #[test]
    fn test_conversion_proceeds_for_other_sources() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        scene.add_child(root, SceneNode::new("Child")).unwrap();

        let outcome = processor(ModelProcessorSettings::default().with_axis_conversion())
            .process_model(&mut scene, SourceKind::OtherFbx);

        assert!(outcome.modified);
        assert_eq!(outcome.conversion.unwrap().fixed_nodes, 1);
    }

    #[test]
    fn test_light_fix_reports_modification() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let lamp = scene
            .add_child(root, SceneNode::new("Lamp").with_light(Light::point(1000.0, 10.0)))
            .unwrap();

        let outcome = processor(ModelProcessorSettings::default().with_light_fix(0.01, 0.1))
            .process_model(&mut scene, SourceKind::BlendFile);

        assert!(outcome.modified);
        let light = scene.node(lamp).unwrap().light.as_ref().unwrap();
        assert_relative_eq!(light.intensity, 10.0, epsilon = 1e-4);
        assert_relative_eq!(light.range, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rules_do_not_mark_modified() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let col = scene.add_child(root, SceneNode::new("COL_box")).unwrap();

        let settings = ModelProcessorSettings::default().with_rule(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(ConditionConfig::new(ConditionType::NameStartsWith, "COL_"))
                .with_action(ActionConfig::new(ActionType::SetGameObjectInactive, "")),
        );
        let outcome = processor(settings).process_model(&mut scene, SourceKind::BlenderFbx);

        assert!(!outcome.modified);
        assert!(!scene.node(col).unwrap().active);
    }

    #[test]
    fn test_rules_skipped_when_disabled() {
        let mut settings = ModelProcessorSettings::default()
            .with_rule(RuleConfig::new(ConditionOperator::And).with_action(ActionConfig::from_code(9999, "")));
        settings.apply_rules = false;
        settings.strict_rules = true;

        let processor = processor(settings);
        assert!(processor.rules().is_empty());
    }

    #[test]
    fn test_strict_settings_reject_unknown_codes() {
        let mut settings = ModelProcessorSettings::default()
            .with_rule(RuleConfig::new(ConditionOperator::And).with_action(ActionConfig::from_code(9999, "")));

        assert!(ModelPostProcessor::new(settings.clone(), &HostEnvironment::new()).is_ok());

        settings.strict_rules = true;
        let err = ModelPostProcessor::new(settings, &HostEnvironment::new()).unwrap_err();
        assert!(matches!(err, ProcessError::Rule(RuleError::InRule { index: 0, .. })));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = ModelProcessorSettings::default().with_light_fix(-0.5, 0.1);
        let err = ModelPostProcessor::new(settings, &HostEnvironment::new()).unwrap_err();
        assert!(matches!(err, ProcessError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_animation_untouched_without_conversion() {
        let mut clip = AnimationClip::new("Walk");
        clip.set_curve("Root/Hips", "m_LocalScale.y", AnimationCurve::new(Vec::new()));

        let outcome = processor(ModelProcessorSettings::default())
            .process_animation(&mut clip, SourceKind::BlenderFbx)
            .unwrap();

        assert!(!outcome.modified);
        assert!(clip.curve(&CurveBinding::new("Root/Hips", "m_LocalScale.y")).is_some());
    }
}
