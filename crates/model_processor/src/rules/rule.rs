//! Rule evaluation and traversal

use super::action::Action;
use super::condition::Condition;
use super::host::HostEnvironment;
use super::part_info::PartInfo;
use super::schema::{ConditionOperator, RuleConfig};
use super::RuleError;
use crate::foundation::logging::ImportLog;
use crate::scene::{NodeId, Scene};

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// How conditions combine
    pub operator: ConditionOperator,
    /// Conditions, empty means always
    pub conditions: Vec<Condition>,
    /// Actions in order
    pub actions: Vec<Action>,
    /// Run actions on the whole subtree of a matching node
    pub apply_to_children: bool,
}

impl Rule {
    /// Compile a serialized rule against the host environment
    pub fn compile(config: &RuleConfig, host: &HostEnvironment) -> Result<Self, RuleError> {
        Ok(Self {
            operator: config.condition_operator,
            conditions: config
                .conditions
                .iter()
                .map(|condition| Condition::compile(condition, host))
                .collect::<Result<_, _>>()?,
            actions: config
                .actions
                .iter()
                .map(|action| Action::compile(action, host))
                .collect::<Result<_, _>>()?,
            apply_to_children: config.apply_to_children,
        })
    }

    /// Whether the node satisfies the conditions; never mutates the scene
    pub fn evaluate(&self, scene: &Scene, part: &PartInfo) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.operator {
            ConditionOperator::And => self.conditions.iter().all(|c| c.evaluate(scene, part)),
            ConditionOperator::Or => self.conditions.iter().any(|c| c.evaluate(scene, part)),
        }
    }

    /// Walk the scene from the root, applying actions to matching nodes
    pub fn apply_to_model(&self, scene: &mut Scene, log: &ImportLog) {
        let root = scene.root();
        self.apply_recursively(scene, root, log);
    }

    fn apply_recursively(&self, scene: &mut Scene, id: NodeId, log: &ImportLog) {
        let Some(part) = PartInfo::capture(scene, id) else { return };
        let matched = self.apply_on_node(scene, &part, log);

        if !scene.contains(id) {
            return;
        }
        // The subtree was already handled
        if matched && self.apply_to_children {
            return;
        }
        for child in scene.children(id).to_vec() {
            self.apply_recursively(scene, child, log);
        }
    }

    /// Evaluate one node and run the actions if it matches
    ///
    /// Returns whether the node matched.
    pub fn apply_on_node(&self, scene: &mut Scene, part: &PartInfo, log: &ImportLog) -> bool {
        if !self.evaluate(scene, part) {
            return false;
        }
        log.detail(format_args!("rule matched '{}'", part.path));

        if self.apply_to_children {
            for node in scene.descendants(part.node) {
                self.apply_actions(scene, node, log);
            }
        } else {
            self.apply_actions(scene, part.node, log);
        }
        true
    }

    fn apply_actions(&self, scene: &mut Scene, id: NodeId, log: &ImportLog) {
        for action in &self.actions {
            // Earlier actions may have destroyed the node or renamed it
            let Some(part) = PartInfo::capture(scene, id) else { return };
            action.apply(scene, &part, log);
        }
    }
}

/// Compile every rule, reporting the index of the first bad one
pub fn compile_rules<'a>(
    configs: impl IntoIterator<Item = &'a RuleConfig>,
    host: &HostEnvironment,
) -> Result<Vec<Rule>, RuleError> {
    configs
        .into_iter()
        .enumerate()
        .map(|(index, config)| {
            Rule::compile(config, host).map_err(|source| RuleError::InRule {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Apply rules in order, each as a fresh traversal
///
/// Stops early once a rule destroys the root.
pub fn apply_rule_set(rules: &[Rule], scene: &mut Scene, log: &ImportLog) {
    for (index, rule) in rules.iter().enumerate() {
        if !scene.contains(scene.root()) {
            log.detail(format_args!("root destroyed, skipping {} remaining rules", rules.len() - index));
            return;
        }
        rule.apply_to_model(scene, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::schema::{ActionConfig, ActionType, ConditionConfig, ConditionType};
    use crate::scene::SceneNode;

    fn compile(config: RuleConfig) -> Rule {
        Rule::compile(&config, &HostEnvironment::new()).unwrap()
    }

    #[test]
    fn test_and_or_with_inversion() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let group = scene.add_child(root, SceneNode::new("Group")).unwrap();
        let foo = scene.add_child(group, SceneNode::new("Foo_bar")).unwrap();
        let part = PartInfo::capture(&scene, foo).unwrap();

        let starts = ConditionConfig::new(ConditionType::NameStartsWith, "Foo");
        let depth = ConditionConfig::new(ConditionType::ChildDepthEquals, "2");

        let and = compile(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(starts.clone())
                .with_condition(depth.clone()),
        );
        assert!(and.evaluate(&scene, &part));

        let and_inverted = compile(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(starts.clone().inverted())
                .with_condition(depth.clone()),
        );
        assert!(!and_inverted.evaluate(&scene, &part));

        let or_inverted = compile(
            RuleConfig::new(ConditionOperator::Or)
                .with_condition(starts.inverted())
                .with_condition(depth),
        );
        assert!(or_inverted.evaluate(&scene, &part));
    }

    #[test]
    fn test_empty_conditions_always_match() {
        let scene = Scene::new("Model");
        let part = PartInfo::capture(&scene, scene.root()).unwrap();
        assert!(compile(RuleConfig::new(ConditionOperator::Or)).evaluate(&scene, &part));
    }

    #[test]
    fn test_destroy_with_children() {
        let mut scene = Scene::new("Root");
        let root = scene.root();
        let a = scene.add_child(root, SceneNode::new("A")).unwrap();
        scene.add_child(a, SceneNode::new("B")).unwrap();
        scene.add_child(a, SceneNode::new("C")).unwrap();

        let rule = compile(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(ConditionConfig::new(ConditionType::NameContains, "A"))
                .with_action(ActionConfig::new(ActionType::DestroyGameObject, ""))
                .with_apply_to_children(true),
        );
        rule.apply_to_model(&mut scene, &ImportLog::default());

        assert!(scene.children(root).is_empty());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_apply_to_children_reaches_subtree_once() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let lod = scene.add_child(root, SceneNode::new("LOD")).unwrap();
        let inner = scene.add_child(lod, SceneNode::new("LOD_inner")).unwrap();

        let rule = compile(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(ConditionConfig::new(ConditionType::NameStartsWith, "LOD"))
                .with_action(ActionConfig::new(ActionType::AppendName, "_x"))
                .with_apply_to_children(true),
        );
        rule.apply_to_model(&mut scene, &ImportLog::default());

        // The inner node is not visited again after its ancestor matched
        assert_eq!(scene.node(lod).unwrap().name, "LOD_x");
        assert_eq!(scene.node(inner).unwrap().name, "LOD_inner_x");
    }

    #[test]
    fn test_self_only_rule_descends() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let col = scene.add_child(root, SceneNode::new("COL_a")).unwrap();
        let nested = scene.add_child(col, SceneNode::new("COL_b")).unwrap();

        let rule = compile(
            RuleConfig::new(ConditionOperator::And)
                .with_condition(ConditionConfig::new(ConditionType::NameStartsWith, "COL_"))
                .with_action(ActionConfig::new(ActionType::SetGameObjectInactive, "")),
        );
        rule.apply_to_model(&mut scene, &ImportLog::default());

        assert!(!scene.node(col).unwrap().active);
        assert!(!scene.node(nested).unwrap().active);
        assert!(scene.node(root).unwrap().active);
    }

    #[test]
    fn test_destroying_root_stops_rule_set() {
        let mut scene = Scene::new("Model");
        let rules = compile_rules(
            &[
                RuleConfig::new(ConditionOperator::And)
                    .with_condition(ConditionConfig::new(ConditionType::RootObject, ""))
                    .with_action(ActionConfig::new(ActionType::DestroyGameObject, "")),
                RuleConfig::new(ConditionOperator::And)
                    .with_action(ActionConfig::new(ActionType::SetName, "Unreachable")),
            ],
            &HostEnvironment::new(),
        )
        .unwrap();

        apply_rule_set(&rules, &mut scene, &ImportLog::default());

        assert!(!scene.contains(scene.root()));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn test_later_rules_see_earlier_changes() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let part = scene.add_child(root, SceneNode::new("Part")).unwrap();
        let rules = compile_rules(
            &[
                RuleConfig::new(ConditionOperator::And)
                    .with_condition(ConditionConfig::new(ConditionType::NameEquals, "Part"))
                    .with_action(ActionConfig::new(ActionType::PrependName, "SM_")),
                RuleConfig::new(ConditionOperator::And)
                    .with_condition(ConditionConfig::new(ConditionType::PathEquals, "Model/SM_Part"))
                    .with_action(ActionConfig::new(ActionType::SetTag, "Prop")),
            ],
            &HostEnvironment::new(),
        )
        .unwrap();

        apply_rule_set(&rules, &mut scene, &ImportLog::default());

        assert_eq!(scene.node(part).unwrap().tag, "Prop");
    }

    #[test]
    fn test_compile_error_names_rule_index() {
        let configs = [
            RuleConfig::default(),
            RuleConfig::new(ConditionOperator::And)
                .with_condition(ConditionConfig::new(ConditionType::ChildDepthLessThan, "deep")),
        ];

        let err = compile_rules(&configs, &HostEnvironment::new()).unwrap_err();
        assert!(matches!(err, RuleError::InRule { index: 1, .. }));
    }
}
