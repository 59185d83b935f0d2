//! Serialized rule configuration
//!
//! This is the shape rules take in asset user-data and settings files.
//! Condition and action kinds are stored as their integer codes so that
//! configurations written by newer tools still load; [`Rule::compile`]
//! decides what to do with codes it does not know.
//!
//! [`Rule::compile`]: super::Rule::compile

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How the conditions of a rule combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionOperator {
    /// Every condition must hold
    #[default]
    And,
    /// At least one condition must hold
    Or,
}

impl ConditionOperator {
    fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::And),
            1 => Some(Self::Or),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if name.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }
}

impl Serialize for ConditionOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::And => "And",
            Self::Or => "Or",
        })
    }
}

impl<'de> Deserialize<'de> for ConditionOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OperatorVisitor;

        impl<'de> Visitor<'de> for OperatorVisitor {
            type Value = ConditionOperator;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("\"And\", \"Or\", 0 or 1")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ConditionOperator::from_name(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                ConditionOperator::from_code(v).ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(ConditionOperator::from_code)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }
        }

        deserializer.deserialize_any(OperatorVisitor)
    }
}

macro_rules! define_codes {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every known kind
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Serialized integer code
            pub fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Kind for an integer code
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

define_codes! {
    /// Known condition kinds
    ConditionType {
        /// Always true
        Always = 0,
        /// Node is the model root
        RootObject = 1,
        /// Name starts with the parameter
        NameStartsWith = 11,
        /// Name ends with the parameter
        NameEndsWith = 12,
        /// Name contains the parameter
        NameContains = 13,
        /// Name matches the parameter as a regex
        NameMatchesRegex = 14,
        /// Path starts with the parameter
        PathStartsWith = 15,
        /// Path ends with the parameter
        PathEndsWith = 16,
        /// Path contains the parameter
        PathContains = 17,
        /// Path matches the parameter as a regex
        PathMatchesRegex = 18,
        /// Name equals the parameter
        NameEquals = 19,
        /// Path equals the parameter
        PathEquals = 20,
        /// Depth == parameter
        ChildDepthEquals = 21,
        /// Depth > parameter
        ChildDepthGreaterThan = 22,
        /// Depth >= parameter
        ChildDepthGreaterOrEqual = 23,
        /// Depth < parameter
        ChildDepthLessThan = 24,
        /// Depth <= parameter
        ChildDepthLessOrEqual = 25,
        /// Node has at least one child
        HasChildren = 26,
        /// Any renderer attached
        HasMesh = 31,
        /// Skinned renderer attached
        HasSkinnedMesh = 32,
        /// Collider attached
        HasCollider = 35,
        /// Light attached
        HasLight = 36,
        /// Camera attached
        HasCamera = 37,
        /// Only the transform, not the root
        IsEmpty = 38,
        /// Empty and childless
        IsEmptyWithoutChildren = 39,
        /// Node itself is inactive
        GameObjectInactive = 41,
        /// Node or an ancestor is inactive
        InactiveInHierarchy = 42,
    }
}

define_codes! {
    /// Known action kinds
    ActionType {
        /// Does nothing
        None = 0,
        /// Deactivate the node
        SetGameObjectInactive = 1,
        /// Destroy the node and its subtree
        DestroyGameObject = 2,
        /// Destroy every child of the node
        DestroyChildObjects = 3,
        /// Set every static flag
        MarkStatic = 4,
        /// Set static flags from an integer mask
        SetStaticFlags = 5,
        /// Set the layer by index or name
        SetLayer = 10,
        /// Set the tag
        SetTag = 11,
        /// Replace the name
        SetName = 12,
        /// Prepend to the name
        PrependName = 13,
        /// Append to the name
        AppendName = 14,
        /// Remove renderer and mesh filter
        RemoveRenderer = 101,
        /// Remove the collider
        RemoveCollider = 102,
        /// Set the renderer's shadow casting mode
        SetCastShadowsMode = 201,
        /// Set whether the renderer receives shadows
        SetReceiveShadowsMode = 202,
        /// Set the renderer's lightmap scale
        SetLightmapScale = 203,
        /// Attach the registered helper component
        AddHelperComponent = 999,
    }
}

/// One serialized condition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionConfig {
    /// Negate the result
    pub invert: bool,
    /// Condition code, see [`ConditionType`]
    #[serde(rename = "type")]
    pub kind: i32,
    /// String parameter
    pub parameter: String,
}

impl ConditionConfig {
    /// Condition of a known kind
    pub fn new(kind: ConditionType, parameter: impl Into<String>) -> Self {
        Self::from_code(kind.code(), parameter)
    }

    /// Condition with a raw code
    pub fn from_code(kind: i32, parameter: impl Into<String>) -> Self {
        Self {
            invert: false,
            kind,
            parameter: parameter.into(),
        }
    }

    /// Builder pattern: negate the condition
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// One serialized action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionConfig {
    /// Action code, see [`ActionType`]
    #[serde(rename = "type")]
    pub kind: i32,
    /// String parameter
    pub parameter: String,
}

impl ActionConfig {
    /// Action of a known kind
    pub fn new(kind: ActionType, parameter: impl Into<String>) -> Self {
        Self::from_code(kind.code(), parameter)
    }

    /// Action with a raw code
    pub fn from_code(kind: i32, parameter: impl Into<String>) -> Self {
        Self {
            kind,
            parameter: parameter.into(),
        }
    }
}

/// One serialized rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    /// How conditions combine
    pub condition_operator: ConditionOperator,
    /// Run the actions on the whole subtree of a matching node
    pub apply_to_children: bool,
    /// Conditions, empty means always
    pub conditions: Vec<ConditionConfig>,
    /// Actions in order
    pub actions: Vec<ActionConfig>,
}

impl RuleConfig {
    /// Empty rule with the given operator
    pub fn new(condition_operator: ConditionOperator) -> Self {
        Self {
            condition_operator,
            ..Default::default()
        }
    }

    /// Builder pattern: add a condition
    pub fn with_condition(mut self, condition: ConditionConfig) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Builder pattern: add an action
    pub fn with_action(mut self, action: ActionConfig) -> Self {
        self.actions.push(action);
        self
    }

    /// Builder pattern: apply actions to the subtree of matching nodes
    pub fn with_apply_to_children(mut self, apply_to_children: bool) -> Self {
        self.apply_to_children = apply_to_children;
        self
    }
}
