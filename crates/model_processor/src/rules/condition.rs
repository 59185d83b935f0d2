//! Compiled rule conditions

use regex::Regex;

use super::host::{HostEnvironment, Strictness};
use super::part_info::PartInfo;
use super::schema::{ConditionConfig, ConditionType};
use super::RuleError;
use crate::scene::Scene;

/// How a string parameter is matched against a name or path
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Prefix match
    StartsWith(String),
    /// Suffix match
    EndsWith(String),
    /// Substring match
    Contains(String),
    /// Exact match
    Equals(String),
    /// Regex search anywhere in the text
    Regex(Regex),
}

impl TextPattern {
    /// Whether the text matches
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::StartsWith(p) => text.starts_with(p.as_str()),
            Self::EndsWith(p) => text.ends_with(p.as_str()),
            Self::Contains(p) => text.contains(p.as_str()),
            Self::Equals(p) => text == p,
            Self::Regex(re) => re.is_match(text),
        }
    }
}

/// Comparison of the child depth against a constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Comparison {
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    /// Compare `lhs` against `rhs`
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Equal => lhs == rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Less => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
        }
    }
}

/// Component whose presence is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Renderer of any kind
    Renderer,
    /// Skinned renderer
    SkinnedRenderer,
    /// Collider
    Collider,
    /// Light
    Light,
    /// Camera
    Camera,
}

/// Which activation state is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityScope {
    /// Only the node's own flag
    SelfOnly,
    /// The node and every ancestor
    Hierarchy,
}

/// Test performed by a condition before inversion
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Always true
    Always,
    /// Node is the root
    IsRoot,
    /// Name matches
    Name(TextPattern),
    /// Hierarchy path matches
    Path(TextPattern),
    /// Depth compares against a constant
    ChildDepth(Comparison, i32),
    /// Node has children
    HasChildren,
    /// Node carries a component
    HasComponent(ComponentKind),
    /// Only a transform, below the root
    IsEmpty,
    /// Empty and childless
    IsEmptyWithoutChildren,
    /// Node is inactive
    Inactive(ActivityScope),
    /// Unrecognized code, always false
    Unsupported(i32),
}

/// A compiled condition
#[derive(Debug, Clone)]
pub struct Condition {
    /// Negate the predicate
    pub invert: bool,
    /// Test to perform
    pub predicate: Predicate,
}

impl Condition {
    /// Condition from a predicate
    pub fn new(predicate: Predicate) -> Self {
        Self {
            invert: false,
            predicate,
        }
    }

    /// Builder pattern: negate the condition
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Resolve a serialized condition, parsing its parameter
    pub fn compile(config: &ConditionConfig, host: &HostEnvironment) -> Result<Self, RuleError> {
        let param = config.parameter.as_str();
        let predicate = match ConditionType::from_code(config.kind) {
            Some(kind) => Self::predicate(kind, param)?,
            None if host.strictness() == Strictness::Strict => {
                return Err(RuleError::UnsupportedCondition(config.kind));
            }
            None => {
                log::error!("Condition type {} is not implemented and never matches", config.kind);
                Predicate::Unsupported(config.kind)
            }
        };
        Ok(Self {
            invert: config.invert,
            predicate,
        })
    }

    fn predicate(kind: ConditionType, param: &str) -> Result<Predicate, RuleError> {
        use ConditionType as C;

        let depth = |comparison| parse_depth(param).map(|value| Predicate::ChildDepth(comparison, value));
        Ok(match kind {
            C::Always => Predicate::Always,
            C::RootObject => Predicate::IsRoot,
            C::NameStartsWith => Predicate::Name(TextPattern::StartsWith(param.to_string())),
            C::NameEndsWith => Predicate::Name(TextPattern::EndsWith(param.to_string())),
            C::NameContains => Predicate::Name(TextPattern::Contains(param.to_string())),
            C::NameEquals => Predicate::Name(TextPattern::Equals(param.to_string())),
            C::NameMatchesRegex => Predicate::Name(compile_regex(param)?),
            C::PathStartsWith => Predicate::Path(TextPattern::StartsWith(param.to_string())),
            C::PathEndsWith => Predicate::Path(TextPattern::EndsWith(param.to_string())),
            C::PathContains => Predicate::Path(TextPattern::Contains(param.to_string())),
            C::PathEquals => Predicate::Path(TextPattern::Equals(param.to_string())),
            C::PathMatchesRegex => Predicate::Path(compile_regex(param)?),
            C::ChildDepthEquals => depth(Comparison::Equal)?,
            C::ChildDepthGreaterThan => depth(Comparison::Greater)?,
            C::ChildDepthGreaterOrEqual => depth(Comparison::GreaterOrEqual)?,
            C::ChildDepthLessThan => depth(Comparison::Less)?,
            C::ChildDepthLessOrEqual => depth(Comparison::LessOrEqual)?,
            C::HasChildren => Predicate::HasChildren,
            C::HasMesh => Predicate::HasComponent(ComponentKind::Renderer),
            C::HasSkinnedMesh => Predicate::HasComponent(ComponentKind::SkinnedRenderer),
            C::HasCollider => Predicate::HasComponent(ComponentKind::Collider),
            C::HasLight => Predicate::HasComponent(ComponentKind::Light),
            C::HasCamera => Predicate::HasComponent(ComponentKind::Camera),
            C::IsEmpty => Predicate::IsEmpty,
            C::IsEmptyWithoutChildren => Predicate::IsEmptyWithoutChildren,
            C::GameObjectInactive => Predicate::Inactive(ActivityScope::SelfOnly),
            C::InactiveInHierarchy => Predicate::Inactive(ActivityScope::Hierarchy),
        })
    }

    /// Evaluate against a node; never mutates the scene
    pub fn evaluate(&self, scene: &Scene, part: &PartInfo) -> bool {
        self.check(scene, part) != self.invert
    }

    fn check(&self, scene: &Scene, part: &PartInfo) -> bool {
        let Some(node) = scene.node(part.node) else {
            return false;
        };
        let has_children = !node.children().is_empty();
        let is_empty = part.depth > 0 && node.component_count() == 1;

        match &self.predicate {
            Predicate::Always => true,
            Predicate::IsRoot => part.depth == 0,
            Predicate::Name(pattern) => pattern.matches(&part.name),
            Predicate::Path(pattern) => pattern.matches(&part.path),
            Predicate::ChildDepth(comparison, value) => {
                comparison.holds(part.depth as i64, i64::from(*value))
            }
            Predicate::HasChildren => has_children,
            Predicate::HasComponent(kind) => match kind {
                ComponentKind::Renderer => node.has_renderer(),
                ComponentKind::SkinnedRenderer => node.has_skinned_renderer(),
                ComponentKind::Collider => node.collider.is_some(),
                ComponentKind::Light => node.light.is_some(),
                ComponentKind::Camera => node.camera.is_some(),
            },
            Predicate::IsEmpty => is_empty,
            Predicate::IsEmptyWithoutChildren => is_empty && !has_children,
            Predicate::Inactive(ActivityScope::SelfOnly) => !node.active,
            Predicate::Inactive(ActivityScope::Hierarchy) => !scene.is_active_in_hierarchy(part.node),
            Predicate::Unsupported(_) => false,
        }
    }
}

fn parse_depth(param: &str) -> Result<i32, RuleError> {
    param.trim().parse().map_err(|_| RuleError::InvalidParameter {
        value: param.to_string(),
        expected: "an integer child depth",
    })
}

fn compile_regex(param: &str) -> Result<TextPattern, RuleError> {
    Regex::new(param)
        .map(TextPattern::Regex)
        .map_err(|source| RuleError::InvalidRegex {
            pattern: param.to_string(),
            source,
        })
}
