//! Rule engine
//!
//! Rules are authored as [`RuleConfig`] values (integer-coded conditions and
//! actions with string parameters), compiled once against a
//! [`HostEnvironment`] into typed [`Rule`]s, then applied to a scene in a
//! depth-first pre-order walk.
//!
//! ## Traversal
//!
//! ```text
//! visit(node)
//!   ├── no match                      → visit children
//!   ├── match, self only              → act on node, visit children
//!   └── match, apply to children      → act on whole subtree, stop
//!   (node destroyed                   → stop)
//! ```
//!
//! Children are snapshotted before descending and every handle is
//! re-validated before use, so actions may destroy anything.

mod action;
mod condition;
mod host;
mod part_info;
mod rule;
mod schema;

pub use action::Action;
pub use condition::{ActivityScope, Comparison, ComponentKind, Condition, Predicate, TextPattern};
pub use host::{HostEnvironment, Strictness, HELPER_COMPONENT, LAYER_COUNT};
pub use part_info::PartInfo;
pub use rule::{apply_rule_set, compile_rules, Rule};
pub use schema::{ActionConfig, ActionType, ConditionConfig, ConditionOperator, ConditionType, RuleConfig};

/// Rule configuration errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A parameter could not be parsed
    #[error("Invalid parameter '{value}': expected {expected}")]
    InvalidParameter {
        /// Parameter as written
        value: String,
        /// What the parameter should have been
        expected: &'static str,
    },

    /// A regex parameter does not compile
    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        /// Pattern as written
        pattern: String,
        /// Regex compiler error
        source: regex::Error,
    },

    /// A layer name the host does not define
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// Unknown condition code in strict mode
    #[error("Unsupported condition type: {0}")]
    UnsupportedCondition(i32),

    /// Unknown action code in strict mode
    #[error("Unsupported action type: {0}")]
    UnsupportedAction(i32),

    /// Error inside a rule of a list
    #[error("Rule {index}: {source}")]
    InRule {
        /// Position of the rule in its list
        index: usize,
        /// Underlying error
        source: Box<RuleError>,
    },
}
