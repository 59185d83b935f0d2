//! Light unit correction

use crate::scene::{LightType, Scene};

/// Scale intensity and range of every non-directional light
///
/// Inactive nodes are included. Returns whether any light changed.
pub fn fix_lights(scene: &mut Scene, intensity_factor: f32, range_factor: f32) -> bool {
    let mut modified = false;
    for id in scene.descendants(scene.root()) {
        let Some(light) = scene.node_mut(id).and_then(|node| node.light.as_mut()) else {
            continue;
        };
        if light.light_type == LightType::Directional {
            continue;
        }
        light.intensity *= intensity_factor;
        light.range *= range_factor;
        modified = true;
    }
    modified
}
