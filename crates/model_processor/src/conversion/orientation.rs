//! Scene graph and mesh re-orientation

use std::collections::HashSet;

use super::{rotation_fix, rotation_fix_z_flip, ConversionObserver, ConversionOptions, ConversionReport, NoopObserver};
use crate::foundation::logging::ImportLog;
use crate::foundation::math::{mirror_rotation_xz, mirror_xz, swap_yz, Mat4, Point3, Quat, QuatExt, Transform};
use crate::scene::{MeshId, NodeId, Scene};

/// A distinct mesh and the nodes drawing it
#[derive(Debug)]
struct MeshUsage {
    mesh: MeshId,
    static_nodes: Vec<NodeId>,
    skinned_nodes: Vec<NodeId>,
}

/// Convert a whole scene from Blender to engine axes
///
/// # Panics
///
/// Panics when a skinned renderer references a bone outside the scene or
/// when its mesh has a different number of bind poses than bones.
pub fn convert_scene(scene: &mut Scene, options: &ConversionOptions, log: &ImportLog) -> ConversionReport {
    convert_scene_observed(scene, options, log, &mut NoopObserver)
}

/// [`convert_scene`] reporting every node and mesh fix to `observer`
pub fn convert_scene_observed(
    scene: &mut Scene,
    options: &ConversionOptions,
    log: &ImportLog,
    observer: &mut dyn ConversionObserver,
) -> ConversionReport {
    let mut report = ConversionReport::default();
    let root = scene.root();
    let Some(root_node) = scene.node(root) else {
        log.warn(format_args!("scene has no root, nothing to convert"));
        return report;
    };
    let root_has_mesh = root_node.mesh().is_some() || root_node.has_skinned_renderer();
    let usages = collect_meshes(scene);

    // World matrices before anything moves, in pre-order
    let snapshots: Vec<(NodeId, Mat4)> = scene
        .descendants(root)
        .into_iter()
        .filter(|id| *id != root || root_has_mesh)
        .map(|id| (id, scene.local_to_world(id)))
        .collect();
    report.node_deltas.insert(root, Mat4::identity());

    for (id, _) in &snapshots {
        let depth = scene.depth(*id);
        fix_node(scene, *id, depth, root_has_mesh, options.match_axes);
    }
    // Runs once every descendant holds its converted transform
    for (id, _) in &snapshots {
        fix_light_or_camera(scene, *id, options.match_axes);
    }

    for (id, before) in &snapshots {
        let delta = match before.try_inverse() {
            Some(inverse) => inverse * scene.local_to_world(*id),
            None => {
                log.warn(format_args!(
                    "'{}' has a singular world matrix, recording identity delta",
                    scene.hierarchy_path(*id)
                ));
                Mat4::identity()
            }
        };
        observer.node_fixed(*id, &delta);
        report.node_deltas.insert(*id, delta);
        report.fixed_nodes += 1;
    }

    let fix = if options.match_axes { rotation_fix_z_flip() } else { rotation_fix() };
    let mut fixed: HashSet<MeshId> = HashSet::new();
    for usage in &usages {
        if !fixed.insert(usage.mesh) {
            continue;
        }
        fix_mesh(scene, usage, fix, options, &report, log);
        observer.mesh_fixed(usage.mesh);
        report.fixed_meshes.push(usage.mesh);
    }

    log.detail(format_args!(
        "converted {} nodes and {} meshes (match axes: {})",
        report.fixed_nodes,
        report.fixed_meshes.len(),
        options.match_axes
    ));
    report
}

/// Distinct meshes in pre-order of first reference
fn collect_meshes(scene: &Scene) -> Vec<MeshUsage> {
    let mut usages: Vec<MeshUsage> = Vec::new();
    for id in scene.descendants(scene.root()) {
        let Some(node) = scene.node(id) else { continue };

        let static_mesh = node.mesh_filter.as_ref().and_then(|filter| filter.mesh);
        let skinned_mesh = node.renderer.as_ref().and_then(|r| r.skin()).and_then(|skin| skin.mesh);

        for (mesh, skinned) in [(static_mesh, false), (skinned_mesh, true)] {
            let Some(mesh) = mesh.filter(|m| scene.mesh(*m).is_some()) else { continue };
            let index = match usages.iter().position(|u| u.mesh == mesh) {
                Some(index) => index,
                None => {
                    usages.push(MeshUsage {
                        mesh,
                        static_nodes: Vec::new(),
                        skinned_nodes: Vec::new(),
                    });
                    usages.len() - 1
                }
            };
            if skinned {
                usages[index].skinned_nodes.push(id);
            } else {
                usages[index].static_nodes.push(id);
            }
        }
    }
    usages
}

/// Rewrite one node's local transform
fn fix_node(scene: &mut Scene, id: NodeId, depth: usize, root_has_mesh: bool, match_axes: bool) {
    let fix = rotation_fix();

    // Children keep their world rotation while the parent turns
    let held: Vec<(NodeId, Quat)> = scene
        .children(id)
        .iter()
        .map(|child| (*child, scene.world_rotation(*child)))
        .collect();

    if let Some(node) = scene.node_mut(id) {
        if depth > 1 || root_has_mesh {
            node.transform.position = fix * node.transform.position;
        }
        node.transform.rotation *= fix.inverse();
    }
    for (child, rotation) in held {
        scene.set_world_rotation(child, rotation);
    }

    if let Some(node) = scene.node_mut(id) {
        let transform = &mut node.transform;
        if match_axes {
            transform.position = mirror_xz(transform.position);
            transform.rotation = mirror_rotation_xz(transform.rotation);
        }
        transform.scale = swap_yz(transform.scale);
    }
}

/// Lights and cameras face down a different default axis than geometry
///
/// Children keep their world position and rotation.
fn fix_light_or_camera(scene: &mut Scene, id: NodeId, match_axes: bool) {
    let oriented = scene
        .node(id)
        .is_some_and(|node| node.light.is_some() || node.camera.is_some());
    if !oriented {
        return;
    }

    let held: Vec<(NodeId, Point3, Quat)> = scene
        .children(id)
        .iter()
        .map(|child| {
            let position = scene.local_to_world(*child).transform_point(&Point3::origin());
            (*child, position, scene.world_rotation(*child))
        })
        .collect();

    if let Some(node) = scene.node_mut(id) {
        node.transform.rotation *= Quat::rotation_x_deg(-90.0);
        if match_axes {
            node.transform.rotation *= Quat::rotation_z_deg(180.0);
        }
    }

    let to_local = scene.local_to_world(id).try_inverse();
    for (child, position, rotation) in held {
        scene.set_world_rotation(child, rotation);
        if let (Some(to_local), Some(node)) = (to_local, scene.node_mut(child)) {
            node.transform.position = to_local.transform_point(&position).coords;
        }
    }
}

fn fix_mesh(
    scene: &mut Scene,
    usage: &MeshUsage,
    fix: Quat,
    options: &ConversionOptions,
    report: &ConversionReport,
    log: &ImportLog,
) {
    let bind_pose_count = scene
        .mesh(usage.mesh)
        .and_then(|mesh| mesh.bind_poses.as_ref())
        .map(Vec::len);
    for node in &usage.skinned_nodes {
        let Some(skin) = scene.node(*node).and_then(|n| n.renderer.as_ref()).and_then(|r| r.skin()) else {
            continue;
        };
        for bone in &skin.bones {
            assert!(
                report.node_deltas.contains_key(bone),
                "bone {:?} of '{}' was not converted with the scene",
                bone,
                scene.hierarchy_path(*node)
            );
        }
        if let Some(count) = bind_pose_count {
            assert_eq!(
                count,
                skin.bones.len(),
                "mesh of '{}' has {} bind poses for {} bones",
                scene.hierarchy_path(*node),
                count,
                skin.bones.len()
            );
        }
    }

    let Some(mesh) = scene.mesh_mut(usage.mesh) else { return };
    mesh.transform(&fix.to_homogeneous());

    if !usage.skinned_nodes.is_empty() {
        if let Some(bind_poses) = mesh.bind_poses.as_mut() {
            for pose in bind_poses.iter_mut() {
                *pose = fix_bind_pose(pose, fix);
            }
        }
    }

    if options.import_tangents && !mesh.recalculate_tangents() {
        log.detail(format_args!("'{}' cannot rebuild tangents, kept rotated ones", mesh.name));
    }
    mesh.recalculate_bounds();

    log.detail(format_args!(
        "fixed mesh '{}' ({} static, {} skinned references)",
        mesh.name,
        usage.static_nodes.len(),
        usage.skinned_nodes.len()
    ));
}

/// Rotate a bind pose into the converted mesh space
fn fix_bind_pose(pose: &Mat4, fix: Quat) -> Mat4 {
    let trs = Transform::from_matrix(*pose);
    Transform::from_trs(
        fix * trs.position,
        fix * trs.rotation * fix.inverse(),
        swap_yz(trs.scale),
    )
    .to_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use crate::scene::{Camera, Light, Mesh, Renderer, SceneNode};
    use approx::assert_relative_eq;

    fn triangle(name: &str) -> Mesh {
        Mesh::new(
            name,
            vec![Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        )
        .with_normals(vec![Vec3::z(); 3])
    }

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.coords.dot(&b.coords).abs() > 0.9999
    }

    /// Root
    ///  └── Body (mesh, position z=1)
    ///       └── Arm (position z=2, scale y=3)
    fn sample() -> (Scene, NodeId, NodeId, MeshId) {
        let mut scene = Scene::new("Model");
        let mesh = scene.add_mesh(triangle("Body"));
        let body = scene
            .add_child(
                scene.root(),
                SceneNode::new("Body")
                    .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 1.0)))
                    .with_mesh(mesh),
            )
            .unwrap();
        let arm = scene
            .add_child(
                body,
                SceneNode::new("Arm").with_transform(Transform::from_trs(
                    Vec3::new(0.0, 0.0, 2.0),
                    Quat::identity(),
                    Vec3::new(1.0, 3.0, 1.0),
                )),
            )
            .unwrap();
        (scene, body, arm, mesh)
    }

    #[derive(Default)]
    struct Counter {
        meshes: Vec<MeshId>,
        nodes: usize,
    }

    impl ConversionObserver for Counter {
        fn node_fixed(&mut self, _node: NodeId, _delta: &Mat4) {
            self.nodes += 1;
        }

        fn mesh_fixed(&mut self, mesh: MeshId) {
            self.meshes.push(mesh);
        }
    }

    #[test]
    fn test_meshless_root_is_left_alone() {
        let (mut scene, ..) = sample();
        let root = scene.root();
        let report = convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        assert_eq!(scene.node(root).unwrap().transform, Transform::identity());
        assert_eq!(report.node_deltas[&root], Mat4::identity());
        assert_eq!(report.fixed_nodes, 2);
    }

    #[test]
    fn test_depth_one_keeps_position_deeper_rotates() {
        let (mut scene, body, arm, _) = sample();
        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        let body_t = &scene.node(body).unwrap().transform;
        assert_relative_eq!(body_t.position, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert!(same_rotation(body_t.rotation, Quat::rotation_x_deg(90.0)));

        let arm_t = &scene.node(arm).unwrap().transform;
        assert_relative_eq!(arm_t.position, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(arm_t.scale, Vec3::new(1.0, 1.0, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_children_hold_world_rotation_during_parent_fix() {
        let (mut scene, body, arm, _) = sample();
        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        // Arm was identity in world space before; the body fix was undone on
        // it, then its own fix applied
        let expected = scene.world_rotation(body) * scene.node(arm).unwrap().transform.rotation;
        assert!(same_rotation(scene.world_rotation(arm), expected));
        assert!(same_rotation(scene.node(arm).unwrap().transform.rotation, Quat::identity()));
    }

    #[test]
    fn test_mesh_rotated_into_y_up() {
        let (mut scene, _, _, mesh) = sample();
        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        let mesh = scene.mesh(mesh).unwrap();
        assert_relative_eq!(mesh.vertices[0], Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(mesh.vertices[2], Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(mesh.normals.as_ref().unwrap()[0], Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(mesh.bounds().max, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_mesh_fix_round_trip() {
        let original = triangle("Tri");
        let mut mesh = original.clone();
        let matrix = rotation_fix_z_flip().to_homogeneous();

        mesh.transform(&matrix);
        mesh.transform(&matrix.try_inverse().unwrap());

        for (restored, expected) in mesh.vertices.iter().zip(&original.vertices) {
            assert_relative_eq!(restored, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let (scene, ..) = sample();
        let mut first = scene.clone();
        let mut second = scene.clone();
        let options = ConversionOptions::default().with_match_axes(true);

        convert_scene(&mut first, &options, &ImportLog::default());
        convert_scene(&mut second, &options, &ImportLog::default());

        for id in first.descendants(first.root()) {
            assert_eq!(first.node(id), second.node(id));
        }
        for (id, mesh) in first.meshes() {
            assert_eq!(Some(mesh), second.mesh(id));
        }
    }

    #[test]
    fn test_conversion_is_not_idempotent() {
        let (scene, _, arm, mesh) = sample();
        let mut once = scene.clone();
        convert_scene(&mut once, &ConversionOptions::default(), &ImportLog::default());
        let mut twice = once.clone();
        convert_scene(&mut twice, &ConversionOptions::default(), &ImportLog::default());

        assert_ne!(once.mesh(mesh).unwrap().vertices, twice.mesh(mesh).unwrap().vertices);
        assert_ne!(once.node(arm).unwrap().transform, twice.node(arm).unwrap().transform);
    }

    #[test]
    fn test_shared_mesh_fixed_once() {
        let mut scene = Scene::new("Model");
        let mesh = scene.add_mesh(triangle("Shared"));
        let root = scene.root();
        scene.add_child(root, SceneNode::new("Left").with_mesh(mesh)).unwrap();
        scene.add_child(root, SceneNode::new("Right").with_mesh(mesh)).unwrap();

        let mut counter = Counter::default();
        convert_scene_observed(&mut scene, &ConversionOptions::default(), &ImportLog::default(), &mut counter);

        assert_eq!(counter.meshes, vec![mesh]);
        assert_eq!(counter.nodes, 2);
        assert_relative_eq!(scene.mesh(mesh).unwrap().vertices[0], Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_root_with_mesh_is_fixed() {
        let mut scene = Scene::new("Model");
        let mesh = scene.add_mesh(triangle("Root"));
        let root = scene.root();
        let node = scene.node_mut(root).unwrap();
        *node = SceneNode::new("Model")
            .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 5.0)))
            .with_mesh(mesh);

        let report = convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        assert_eq!(report.fixed_nodes, 1);
        assert_relative_eq!(
            scene.node(root).unwrap().transform.position,
            Vec3::new(0.0, 5.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_match_axes_mirrors_position() {
        let (mut scene, _, arm, mesh) = sample();
        scene.node_mut(arm).unwrap().transform.position = Vec3::new(1.0, 0.0, 2.0);
        convert_scene(&mut scene, &ConversionOptions::default().with_match_axes(true), &ImportLog::default());

        assert_relative_eq!(
            scene.node(arm).unwrap().transform.position,
            Vec3::new(-1.0, 2.0, 0.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(scene.mesh(mesh).unwrap().vertices[1], Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_light_gets_extra_rotation() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let lamp = scene.add_child(root, SceneNode::new("Lamp").with_light(Light::point(1000.0, 10.0))).unwrap();
        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        // The node fix and the light fix cancel out
        assert!(same_rotation(scene.node(lamp).unwrap().transform.rotation, Quat::identity()));
    }

    #[test]
    fn test_skinned_bind_poses_follow_mesh() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let bone = scene.add_child(root, SceneNode::new("Bone")).unwrap();
        let pose = Transform::from_position(Vec3::new(0.0, 0.0, -1.0)).to_matrix();
        let mesh = scene.add_mesh(triangle("Skin").with_bind_poses(vec![pose]));
        scene
            .add_child(root, SceneNode::new("Skin").with_renderer(Renderer::skinned(mesh, vec![bone])))
            .unwrap();

        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());

        let fixed = scene.mesh(mesh).unwrap().bind_poses.as_ref().unwrap()[0];
        let translated = fixed * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(translated.xyz(), Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    #[should_panic(expected = "bind poses")]
    fn test_bind_pose_count_mismatch_panics() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let bone = scene.add_child(root, SceneNode::new("Bone")).unwrap();
        let mesh = scene.add_mesh(triangle("Skin").with_bind_poses(vec![Mat4::identity(); 2]));
        scene
            .add_child(root, SceneNode::new("Skin").with_renderer(Renderer::skinned(mesh, vec![bone])))
            .unwrap();

        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());
    }

    #[test]
    fn test_camera_gets_extra_rotation() {
        for (match_axes, expected) in [(false, Quat::identity()), (true, Quat::rotation_y_deg(180.0))] {
            let mut scene = Scene::new("Model");
            let root = scene.root();
            let camera = scene.add_child(root, SceneNode::new("Camera").with_camera(Camera::default())).unwrap();

            let options = ConversionOptions::default().with_match_axes(match_axes);
            convert_scene(&mut scene, &options, &ImportLog::default());

            let rotation = scene.node(camera).unwrap().transform.rotation;
            assert!(same_rotation(rotation, expected), "match_axes {}: {:?}", match_axes, rotation);
        }
    }

    #[test]
    fn test_light_with_match_axes_faces_back() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let lamp = scene.add_child(root, SceneNode::new("Lamp").with_light(Light::point(1000.0, 10.0))).unwrap();

        convert_scene(&mut scene, &ConversionOptions::default().with_match_axes(true), &ImportLog::default());

        assert!(same_rotation(scene.node(lamp).unwrap().transform.rotation, Quat::rotation_y_deg(180.0)));
    }

    /// Model
    ///  └── Holder (camera, light or nothing)
    ///       └── Prop (mesh, y=1)
    fn world_vertex_under(holder: SceneNode, match_axes: bool) -> Vec3 {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let mesh = scene.add_mesh(triangle("Prop"));
        let holder = scene.add_child(root, holder).unwrap();
        let prop = scene
            .add_child(
                holder,
                SceneNode::new("Prop")
                    .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
                    .with_mesh(mesh),
            )
            .unwrap();

        let options = ConversionOptions::default().with_match_axes(match_axes);
        convert_scene(&mut scene, &options, &ImportLog::default());

        let vertex = scene.mesh(mesh).unwrap().vertices[0];
        scene.local_to_world(prop).transform_point(&Point3::from(vertex)).coords
    }

    #[test]
    fn test_children_of_cameras_and_lights_stay_in_place() {
        for match_axes in [false, true] {
            let plain = world_vertex_under(SceneNode::new("Holder"), match_axes);
            let camera = world_vertex_under(SceneNode::new("Holder").with_camera(Camera::default()), match_axes);
            let light = world_vertex_under(
                SceneNode::new("Holder").with_light(Light::point(1.0, 1.0)),
                match_axes,
            );

            assert_relative_eq!(camera, plain, epsilon = 1e-5);
            assert_relative_eq!(light, plain, epsilon = 1e-5);
        }
        assert_relative_eq!(world_vertex_under(SceneNode::new("Holder"), false), Vec3::new(0.0, 1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_deltas_map_original_world_to_converted() {
        let (scene, body, arm, _) = sample();
        let mut converted = scene.clone();
        let report = convert_scene(&mut converted, &ConversionOptions::default(), &ImportLog::default());

        for id in [body, arm] {
            assert_relative_eq!(
                scene.local_to_world(id) * report.node_deltas[&id],
                converted.local_to_world(id),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    #[should_panic(expected = "bind poses")]
    fn test_bind_pose_count_checked_for_every_skin() {
        let mut scene = Scene::new("Model");
        let root = scene.root();
        let hip = scene.add_child(root, SceneNode::new("Hip")).unwrap();
        let knee = scene.add_child(hip, SceneNode::new("Knee")).unwrap();
        let mesh = scene.add_mesh(triangle("Skin").with_bind_poses(vec![Mat4::identity()]));
        scene
            .add_child(root, SceneNode::new("Wrong").with_renderer(Renderer::skinned(mesh, vec![hip, knee])))
            .unwrap();
        scene
            .add_child(root, SceneNode::new("Right").with_renderer(Renderer::skinned(mesh, vec![hip])))
            .unwrap();

        convert_scene(&mut scene, &ConversionOptions::default(), &ImportLog::default());
    }
}
