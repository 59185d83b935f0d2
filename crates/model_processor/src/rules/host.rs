//! Host environment that rules compile against

use std::collections::BTreeSet;

/// Number of layers a node can be on
pub const LAYER_COUNT: usize = 32;

/// Component type added by the helper-component action
pub const HELPER_COMPONENT: &str = "HelperComponent";

/// How unknown condition and action codes are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Unknown codes log an error and do nothing
    #[default]
    Lenient,
    /// Unknown codes fail compilation
    Strict,
}

/// Layer names and optional component types provided by the host
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    layers: [Option<String>; LAYER_COUNT],
    components: BTreeSet<String>,
    strictness: Strictness,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::empty()
            .with_layer(0, "Default")
            .with_layer(1, "TransparentFX")
            .with_layer(2, "Ignore Raycast")
            .with_layer(4, "Water")
            .with_layer(5, "UI")
    }
}

impl HostEnvironment {
    /// Built-in layers, no registered components
    pub fn new() -> Self {
        Self::default()
    }

    /// No layer names, no registered components
    pub fn empty() -> Self {
        Self {
            layers: Default::default(),
            components: BTreeSet::new(),
            strictness: Strictness::Lenient,
        }
    }

    /// Builder pattern: name a layer; out-of-range indices are ignored
    pub fn with_layer(mut self, index: usize, name: impl Into<String>) -> Self {
        if let Some(slot) = self.layers.get_mut(index) {
            *slot = Some(name.into());
        }
        self
    }

    /// Builder pattern: register a component type
    pub fn with_component(mut self, name: impl Into<String>) -> Self {
        self.components.insert(name.into());
        self
    }

    /// Builder pattern: register [`HELPER_COMPONENT`]
    pub fn with_helper_component(self) -> Self {
        self.with_component(HELPER_COMPONENT)
    }

    /// Builder pattern: set how unknown codes are treated
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Index of a named layer
    pub fn layer_index(&self, name: &str) -> Option<u8> {
        self.layers
            .iter()
            .position(|layer| layer.as_deref() == Some(name))
            .and_then(|index| u8::try_from(index).ok())
    }

    /// Name of a layer
    pub fn layer_name(&self, index: u8) -> Option<&str> {
        self.layers.get(usize::from(index))?.as_deref()
    }

    /// Whether a component type is available
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    /// How unknown codes are treated
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }
}
