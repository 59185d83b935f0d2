//! Compiled rule actions

use super::host::{HostEnvironment, Strictness, HELPER_COMPONENT, LAYER_COUNT};
use super::part_info::PartInfo;
use super::schema::{ActionConfig, ActionType};
use super::RuleError;
use crate::foundation::logging::ImportLog;
use crate::scene::{Scene, ShadowCastingMode, StaticFlags, UNTAGGED};

/// A compiled action with its parameter already parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Does nothing
    None,
    /// Deactivate the node
    SetInactive,
    /// Destroy the node and its subtree
    Destroy,
    /// Destroy every child of the node
    DestroyChildren,
    /// Set static flags, `MarkStatic` compiles to all flags
    SetStaticFlags(StaticFlags),
    /// Move to a layer
    SetLayer(u8),
    /// Replace the tag
    SetTag(String),
    /// Replace the name
    SetName(String),
    /// Prepend to the name
    PrependName(String),
    /// Append to the name
    AppendName(String),
    /// Remove renderer and mesh filter
    RemoveRenderer,
    /// Remove the collider
    RemoveCollider,
    /// Renderer shadow casting mode
    SetCastShadows(ShadowCastingMode),
    /// Renderer receives shadows
    SetReceiveShadows(bool),
    /// Renderer lightmap scale
    SetLightmapScale(f32),
    /// Add a component type, `None` when the host does not provide it
    AddComponent(Option<String>),
    /// Unrecognized code, no-op
    Unsupported(i32),
}

impl Action {
    /// Resolve a serialized action, parsing its parameter
    pub fn compile(config: &ActionConfig, host: &HostEnvironment) -> Result<Self, RuleError> {
        use ActionType as A;

        let param = config.parameter.as_str();
        let Some(kind) = ActionType::from_code(config.kind) else {
            return match host.strictness() {
                Strictness::Strict => Err(RuleError::UnsupportedAction(config.kind)),
                Strictness::Lenient => Ok(Self::Unsupported(config.kind)),
            };
        };
        Ok(match kind {
            A::None => Self::None,
            A::SetGameObjectInactive => Self::SetInactive,
            A::DestroyGameObject => Self::Destroy,
            A::DestroyChildObjects => Self::DestroyChildren,
            A::MarkStatic => Self::SetStaticFlags(StaticFlags::all()),
            A::SetStaticFlags => Self::SetStaticFlags(parse_static_flags(param)?),
            A::SetLayer => Self::SetLayer(parse_layer(param, host)?),
            A::SetTag if param.trim().is_empty() => Self::SetTag(UNTAGGED.to_string()),
            A::SetTag => Self::SetTag(param.to_string()),
            A::SetName => Self::SetName(param.to_string()),
            A::PrependName => Self::PrependName(param.to_string()),
            A::AppendName => Self::AppendName(param.to_string()),
            A::RemoveRenderer => Self::RemoveRenderer,
            A::RemoveCollider => Self::RemoveCollider,
            A::SetCastShadowsMode => Self::SetCastShadows(param.parse().map_err(|_| {
                RuleError::InvalidParameter {
                    value: param.to_string(),
                    expected: "a shadow casting mode",
                }
            })?),
            A::SetReceiveShadowsMode => Self::SetReceiveShadows(parse_bool(param)?),
            A::SetLightmapScale => Self::SetLightmapScale(parse_float(param)?),
            A::AddHelperComponent => {
                Self::AddComponent(host.has_component(HELPER_COMPONENT).then(|| HELPER_COMPONENT.to_string()))
            }
        })
    }

    /// Apply to a live node; dead handles are ignored
    pub fn apply(&self, scene: &mut Scene, part: &PartInfo, log: &ImportLog) {
        let id = part.node;
        match self {
            Self::Destroy => {
                scene.destroy(id);
                return;
            }
            Self::DestroyChildren => {
                for child in scene.children(id).to_vec() {
                    scene.destroy(child);
                }
                return;
            }
            _ => {}
        }

        let Some(node) = scene.node_mut(id) else { return };
        match self {
            Self::None | Self::Destroy | Self::DestroyChildren => {}
            Self::SetInactive => node.active = false,
            Self::SetStaticFlags(flags) => node.static_flags = *flags,
            Self::SetLayer(layer) => node.layer = *layer,
            Self::SetTag(tag) => node.tag = tag.clone(),
            Self::SetName(name) => {
                if name.is_empty() {
                    log.error(format_args!("Attempted to give '{}' an empty name", part.path));
                }
                node.name = name.clone();
            }
            Self::PrependName(prefix) => node.name.insert_str(0, prefix),
            Self::AppendName(suffix) => node.name.push_str(suffix),
            Self::RemoveRenderer => {
                node.mesh_filter = None;
                node.renderer = None;
            }
            Self::RemoveCollider => node.collider = None,
            Self::SetCastShadows(mode) => {
                if let Some(renderer) = node.renderer.as_mut() {
                    renderer.shadow_casting = *mode;
                }
            }
            Self::SetReceiveShadows(receive) => {
                if let Some(renderer) = node.renderer.as_mut() {
                    renderer.receive_shadows = *receive;
                }
            }
            Self::SetLightmapScale(scale) => {
                if let Some(renderer) = node.renderer.as_mut() {
                    renderer.lightmap_scale = *scale;
                }
            }
            Self::AddComponent(Some(component)) => node.extensions.push(component.clone()),
            Self::AddComponent(None) => {
                log.warn(format_args!(
                    "Adding a helper component requires a '{}' component type in the host",
                    HELPER_COMPONENT
                ));
            }
            Self::Unsupported(code) => {
                log.error(format_args!("Model processor action of type '{}' is not implemented", code));
            }
        }
    }
}

fn parse_static_flags(param: &str) -> Result<StaticFlags, RuleError> {
    let bits: i32 = param.trim().parse().map_err(|_| RuleError::InvalidParameter {
        value: param.to_string(),
        expected: "an integer static flags mask",
    })?;
    Ok(StaticFlags::from_bits_retain(bits as u32))
}

fn parse_layer(param: &str, host: &HostEnvironment) -> Result<u8, RuleError> {
    let trimmed = param.trim();
    if let Ok(index) = trimmed.parse::<i64>() {
        return u8::try_from(index)
            .ok()
            .filter(|layer| usize::from(*layer) < LAYER_COUNT)
            .ok_or_else(|| RuleError::InvalidParameter {
                value: param.to_string(),
                expected: "a layer index between 0 and 31",
            });
    }
    host.layer_index(trimmed)
        .ok_or_else(|| RuleError::UnknownLayer(param.to_string()))
}

fn parse_bool(param: &str) -> Result<bool, RuleError> {
    match param.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        s if s.eq_ignore_ascii_case("true") => Ok(true),
        s if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(RuleError::InvalidParameter {
            value: param.to_string(),
            expected: "a boolean (0, 1, true or false)",
        }),
    }
}

fn parse_float(param: &str) -> Result<f32, RuleError> {
    param
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RuleError::InvalidParameter {
            value: param.to_string(),
            expected: "a decimal number",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Renderer, SceneNode};

    fn compile(kind: ActionType, param: &str) -> Result<Action, RuleError> {
        Action::compile(&ActionConfig::new(kind, param), &HostEnvironment::new())
    }

    fn apply(action: &Action, scene: &mut Scene, node: crate::scene::NodeId) {
        let part = PartInfo::capture(scene, node).unwrap();
        action.apply(scene, &part, &ImportLog::default());
    }

    #[test]
    fn test_parameters_are_parsed() {
        assert_eq!(compile(ActionType::SetLayer, "Water"), Ok(Action::SetLayer(4)));
        assert_eq!(compile(ActionType::SetLayer, "12"), Ok(Action::SetLayer(12)));
        assert_eq!(compile(ActionType::SetTag, "  "), Ok(Action::SetTag(UNTAGGED.to_string())));
        assert_eq!(compile(ActionType::SetReceiveShadowsMode, "FALSE"), Ok(Action::SetReceiveShadows(false)));
        assert_eq!(compile(ActionType::SetReceiveShadowsMode, "1"), Ok(Action::SetReceiveShadows(true)));
        assert_eq!(
            compile(ActionType::SetCastShadowsMode, "ShadowsOnly"),
            Ok(Action::SetCastShadows(ShadowCastingMode::ShadowsOnly))
        );
        assert_eq!(compile(ActionType::SetLightmapScale, "0.5"), Ok(Action::SetLightmapScale(0.5)));
        assert_eq!(
            compile(ActionType::SetStaticFlags, "5"),
            Ok(Action::SetStaticFlags(StaticFlags::CONTRIBUTE_GI | StaticFlags::BATCHING_STATIC))
        );
    }

    #[test]
    fn test_bad_parameters_are_errors() {
        assert_eq!(compile(ActionType::SetLayer, "Props"), Err(RuleError::UnknownLayer("Props".to_string())));
        assert!(matches!(compile(ActionType::SetLayer, "32"), Err(RuleError::InvalidParameter { .. })));
        assert!(matches!(compile(ActionType::SetStaticFlags, "all"), Err(RuleError::InvalidParameter { .. })));
        assert!(matches!(compile(ActionType::SetReceiveShadowsMode, "yes"), Err(RuleError::InvalidParameter { .. })));
        assert!(matches!(compile(ActionType::SetLightmapScale, "1,5"), Err(RuleError::InvalidParameter { .. })));
        assert!(matches!(compile(ActionType::SetCastShadowsMode, "Sometimes"), Err(RuleError::InvalidParameter { .. })));
    }

    #[test]
    fn test_name_and_renderer_actions() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let node = scene
            .add_child(root, SceneNode::new("Rock").with_renderer(Renderer::mesh()))
            .unwrap();

        apply(&Action::PrependName("SM_".to_string()), &mut scene, node);
        apply(&Action::AppendName("_01".to_string()), &mut scene, node);
        apply(&Action::SetCastShadows(ShadowCastingMode::Off), &mut scene, node);
        assert_eq!(scene.node(node).unwrap().name, "SM_Rock_01");
        assert_eq!(scene.node(node).unwrap().renderer.as_ref().unwrap().shadow_casting, ShadowCastingMode::Off);

        apply(&Action::RemoveRenderer, &mut scene, node);
        assert!(scene.node(node).unwrap().renderer.is_none());

        // Renderer actions on a node without renderer do nothing
        apply(&Action::SetLightmapScale(2.0), &mut scene, node);
        assert!(scene.node(node).unwrap().renderer.is_none());
    }

    #[test]
    fn test_destroy_children_keeps_node() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let parent = scene.add_child(root, SceneNode::new("Parent")).unwrap();
        let a = scene.add_child(parent, SceneNode::new("A")).unwrap();
        scene.add_child(a, SceneNode::new("A1")).unwrap();
        scene.add_child(parent, SceneNode::new("B")).unwrap();

        apply(&Action::DestroyChildren, &mut scene, parent);

        assert!(scene.contains(parent));
        assert!(scene.children(parent).is_empty());
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn test_helper_component_requires_host_support() {
        let config = ActionConfig::new(ActionType::AddHelperComponent, "");
        let missing = Action::compile(&config, &HostEnvironment::new()).unwrap();
        let present = Action::compile(&config, &HostEnvironment::new().with_helper_component()).unwrap();

        let mut scene = Scene::new("Model");
        let root = scene.root();
        apply(&missing, &mut scene, root);
        assert!(scene.node(root).unwrap().extensions.is_empty());

        apply(&present, &mut scene, root);
        assert_eq!(scene.node(root).unwrap().extensions, vec![HELPER_COMPONENT.to_string()]);
    }

    #[test]
    fn test_unknown_code_depends_on_strictness() {
        let config = ActionConfig::from_code(55, "x");
        assert_eq!(Action::compile(&config, &HostEnvironment::new()), Ok(Action::Unsupported(55)));

        let strict = HostEnvironment::new().with_strictness(Strictness::Strict);
        assert_eq!(Action::compile(&config, &strict), Err(RuleError::UnsupportedAction(55)));
    }
}
