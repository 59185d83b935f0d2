//! Per-asset processor settings
//!
//! Stored as JSON in the importer's user-data field, or as a standalone
//! TOML/RON/JSON file for tooling. Missing fields take their defaults, so
//! an empty user-data string yields the default settings.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::conversion::ConversionOptions;
use crate::foundation::logging::ImportLog;
use crate::rules::RuleConfig;

/// Named, shareable list of rules applied after an asset's own rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleAsset {
    /// Display name
    pub name: String,
    /// Disabled sets are skipped
    pub enabled: bool,
    /// Rules in order
    pub rules: Vec<RuleConfig>,
}

impl Default for RuleAsset {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            rules: Vec::new(),
        }
    }
}

impl RuleAsset {
    /// Enabled rule set
    pub fn new(name: impl Into<String>, rules: Vec<RuleConfig>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            rules,
        }
    }
}

/// Settings for processing one model asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelProcessorSettings {
    /// Convert from Blender's Z-up axes
    pub apply_axis_conversion: bool,
    /// Add a 180° yaw so forward axes match Blender
    pub match_axes: bool,
    /// Rebuild tangents of converted meshes
    pub import_tangents: bool,
    /// Scale light intensity and range
    pub fix_lights: bool,
    /// Light intensity multiplier
    pub light_intensity_factor: f32,
    /// Light range multiplier
    pub light_range_factor: f32,
    /// Run the rule engine
    pub apply_rules: bool,
    /// Log processing detail at info level
    pub verbose_logging: bool,
    /// Unknown condition or action codes are errors
    pub strict_rules: bool,
    /// The asset's own rules
    pub rules: Vec<RuleConfig>,
    /// Shared rule sets, applied after `rules`
    pub external_rules: Vec<RuleAsset>,
}

impl Default for ModelProcessorSettings {
    fn default() -> Self {
        Self {
            apply_axis_conversion: false,
            match_axes: false,
            import_tangents: true,
            fix_lights: false,
            light_intensity_factor: 0.01,
            light_range_factor: 0.1,
            apply_rules: true,
            verbose_logging: false,
            strict_rules: false,
            rules: Vec::new(),
            external_rules: Vec::new(),
        }
    }
}

impl Config for ModelProcessorSettings {}

impl ModelProcessorSettings {
    /// Parse importer user-data; blank data yields defaults
    pub fn from_user_data(user_data: &str) -> Result<Self, ConfigError> {
        if user_data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(user_data).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to importer user-data
    pub fn to_user_data(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Builder pattern: enable axis conversion
    pub fn with_axis_conversion(mut self) -> Self {
        self.apply_axis_conversion = true;
        self
    }

    /// Builder pattern: add the 180° yaw to axis conversion
    pub fn with_match_axes(mut self, match_axes: bool) -> Self {
        self.match_axes = match_axes;
        self
    }

    /// Builder pattern: enable the light fix with the given factors
    pub fn with_light_fix(mut self, intensity_factor: f32, range_factor: f32) -> Self {
        self.fix_lights = true;
        self.light_intensity_factor = intensity_factor;
        self.light_range_factor = range_factor;
        self
    }

    /// Builder pattern: add a rule
    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.rules.push(rule);
        self
    }

    /// Builder pattern: add a shared rule set
    pub fn with_external_rules(mut self, rules: RuleAsset) -> Self {
        self.external_rules.push(rules);
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        for (name, factor) in [
            ("lightIntensityFactor", self.light_intensity_factor),
            ("lightRangeFactor", self.light_range_factor),
        ] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(format!("{} must be a finite non-negative number, got {}", name, factor));
            }
        }
        if let Some(index) = self.external_rules.iter().position(|set| set.name.trim().is_empty()) {
            return Err(format!("external rule set {} has no name", index));
        }
        Ok(())
    }

    /// Rules to apply, the asset's own first, then enabled shared sets
    pub fn all_rules(&self) -> impl Iterator<Item = &RuleConfig> {
        self.rules.iter().chain(
            self.external_rules
                .iter()
                .filter(|set| set.enabled)
                .flat_map(|set| set.rules.iter()),
        )
    }

    /// Conversion switches derived from these settings
    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions::default()
            .with_match_axes(self.match_axes)
            .with_import_tangents(self.import_tangents)
    }

    /// Logging context for an asset
    pub fn import_log(&self, asset: impl Into<String>) -> ImportLog {
        ImportLog::quiet(asset).with_verbose(self.verbose_logging)
    }
}
