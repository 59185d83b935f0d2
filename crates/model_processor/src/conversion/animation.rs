//! Animation curve re-orientation

use super::{anim_rotation_fix, mirror_rotation, rotation_fix, ConversionError};
use crate::animation::{path_depth, AnimationClip, AnimationCurve, CurveBinding, Keyframe, TransformChannel};
use crate::foundation::logging::ImportLog;
use crate::foundation::math::{mirror_xz, RawQuat, Vec3};

/// Curves of one animated path, validated before anything is rewritten
struct PathCurves {
    path: String,
    position: Option<[AnimationCurve; 3]>,
    rotation: Option<[AnimationCurve; 4]>,
    has_scale: bool,
}

/// Convert every transform curve of a clip from Blender to engine axes
///
/// Each path is processed once. All paths are validated first, so on error
/// the clip is left untouched.
pub fn convert_animation_clip(
    clip: &mut AnimationClip,
    match_axes: bool,
    log: &ImportLog,
) -> Result<(), ConversionError> {
    let groups = clip
        .transform_paths()
        .into_iter()
        .map(|path| gather(clip, path))
        .collect::<Result<Vec<_>, _>>()?;

    for group in groups {
        let depth = path_depth(&group.path);
        if let Some(curves) = group.position {
            let converted = convert_position(curves, depth, match_axes);
            store(clip, &group.path, &TransformChannel::POSITION, converted);
        }
        if let Some(curves) = group.rotation {
            let converted = convert_rotation(curves, depth, match_axes);
            store(clip, &group.path, &TransformChannel::ROTATION, converted);
        }
        if group.has_scale {
            swap_scale_curves(clip, &group.path);
        }
        log.detail(format_args!("converted curves of '{}' in clip '{}'", group.path, clip.name));
    }
    Ok(())
}

fn gather(clip: &AnimationClip, path: String) -> Result<PathCurves, ConversionError> {
    let position = complete_group(clip, &path, TransformChannel::POSITION, "position")?;
    let rotation = complete_group(clip, &path, TransformChannel::ROTATION, "rotation")?;
    let has_scale = TransformChannel::SCALE
        .iter()
        .any(|channel| clip.channel(&path, *channel).is_some());
    Ok(PathCurves {
        path,
        position,
        rotation,
        has_scale,
    })
}

/// All curves of a group, `None` when none is animated
fn complete_group<const N: usize>(
    clip: &AnimationClip,
    path: &str,
    channels: [TransformChannel; N],
    group: &'static str,
) -> Result<Option<[AnimationCurve; N]>, ConversionError> {
    let found = channels.map(|channel| clip.channel(path, channel));
    let present = found.iter().filter(|curve| curve.is_some()).count();
    if present == 0 {
        return Ok(None);
    }
    if present != N {
        return Err(ConversionError::IncompleteGroup {
            path: path.to_string(),
            group,
        });
    }

    let curves = found.map(|curve| curve.cloned().unwrap_or_default());
    let keys = curves[0].len();
    if curves.iter().any(|curve| curve.len() != keys) {
        return Err(ConversionError::KeyCountMismatch {
            path: path.to_string(),
            group,
        });
    }
    Ok(Some(curves))
}

fn store<const N: usize>(clip: &mut AnimationClip, path: &str, channels: &[TransformChannel; N], curves: [AnimationCurve; N]) {
    for (channel, curve) in channels.iter().zip(curves) {
        clip.set_binding(CurveBinding::transform(path, *channel), curve);
    }
}

fn convert_position(mut curves: [AnimationCurve; 3], depth: usize, match_axes: bool) -> [AnimationCurve; 3] {
    let fix = rotation_fix();
    let convert = |v: Vec3| {
        let v = if depth > 0 { fix * v } else { v };
        if match_axes { mirror_xz(v) } else { v }
    };

    for i in 0..curves[0].len() {
        let [x, y, z] = [&curves[0].keys[i], &curves[1].keys[i], &curves[2].keys[i]];
        let value = convert(Vec3::new(x.value, y.value, z.value));
        let in_tangent = convert(Vec3::new(x.in_tangent, y.in_tangent, z.in_tangent));
        let out_tangent = convert(Vec3::new(x.out_tangent, y.out_tangent, z.out_tangent));

        for (axis, curve) in curves.iter_mut().enumerate() {
            let key = &mut curve.keys[i];
            *key = Keyframe {
                time: key.time,
                value: value[axis],
                in_tangent: in_tangent[axis],
                out_tangent: out_tangent[axis],
            };
        }
    }
    curves
}

fn convert_rotation(mut curves: [AnimationCurve; 4], depth: usize, match_axes: bool) -> [AnimationCurve; 4] {
    let post = anim_rotation_fix();
    let pre = post.conjugate();
    let mirror = mirror_rotation();
    let mirror_inverse = mirror.conjugate();
    let convert = |q: RawQuat| {
        let q = (if depth > 0 { pre * q } else { q }) * post;
        if match_axes { mirror * q * mirror_inverse } else { q }
    };

    for i in 0..curves[0].len() {
        let value = convert(read_quat(&curves, i, |k| k.value));
        let in_tangent = convert(read_quat(&curves, i, |k| k.in_tangent));
        let out_tangent = convert(read_quat(&curves, i, |k| k.out_tangent));

        for (component, curve) in curves.iter_mut().enumerate() {
            let key = &mut curve.keys[i];
            *key = Keyframe {
                time: key.time,
                value: value.coords[component],
                in_tangent: in_tangent.coords[component],
                out_tangent: out_tangent.coords[component],
            };
        }
    }
    curves
}

/// Curves are stored x, y, z, w; quaternion coords use the same order
fn read_quat(curves: &[AnimationCurve; 4], i: usize, field: impl Fn(&Keyframe) -> f32) -> RawQuat {
    RawQuat::new(
        field(&curves[3].keys[i]),
        field(&curves[0].keys[i]),
        field(&curves[1].keys[i]),
        field(&curves[2].keys[i]),
    )
}

/// Y and Z scale curves trade channels, values untouched
fn swap_scale_curves(clip: &mut AnimationClip, path: &str) {
    let y = clip.remove_curve(&CurveBinding::transform(path, TransformChannel::ScaleY));
    let z = clip.remove_curve(&CurveBinding::transform(path, TransformChannel::ScaleZ));
    if let Some(curve) = z {
        clip.set_binding(CurveBinding::transform(path, TransformChannel::ScaleY), curve);
    }
    if let Some(curve) = y {
        clip.set_binding(CurveBinding::transform(path, TransformChannel::ScaleZ), curve);
    }
}
