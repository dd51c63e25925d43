//! Transform sessions: the mutable record of an in-progress manipulation,
//! opened on pointer-down over a handle or body and closed on pointer-up.

use crate::controls::{Action, ControlHit};
use easel_core::geom::Point;
use easel_core::scene::Scene;
use easel_core::NodeIndex;

/// The target's property values at pointer-down. Handlers compute against
/// these, never against intermediate frames, so a session is stateless
/// with respect to pointer history.
#[derive(Debug, Clone, Copy)]
pub struct PropertySnapshot {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

#[derive(Debug)]
pub struct TransformSession {
    pub target: NodeIndex,
    pub action: Action,
    /// Origin fractions of the anchor held fixed for the whole session.
    /// Mutated only by a flip-through-zero, which mirrors it.
    pub anchor: Point,
    /// Pointer at session start, in the target's parent plane.
    pub start_parent: Point,
    /// Pointer at session start, anchor-relative and un-rotated.
    pub start_local: Point,
    /// L1 distance of the grabbed handle from the anchor at start, the
    /// denominator for proportional scaling.
    pub start_distance: f64,
    pub original: PropertySnapshot,
    /// Last seen pointer side per axis, for flip-through-zero detection.
    pub sign_x: f64,
    pub sign_y: f64,
    /// Rotation snap resolved at session start: (increment, threshold).
    pub snap: Option<(f64, f64)>,
    /// Whether any handler reported a change during this session.
    pub performed: bool,
}

impl TransformSession {
    /// Open a session for `hit` on `target`. `pointer` is in scene (world)
    /// coordinates, i.e. after the viewport transform was undone.
    pub fn begin(
        scene: &mut Scene,
        target: NodeIndex,
        hit: &ControlHit,
        pointer: Point,
        default_snap: Option<(f64, Option<f64>)>,
    ) -> Self {
        let start_parent = pointer_in_parent_plane(scene, target, pointer);
        let start_local = to_anchor_local(scene, target, hit.anchor, pointer);

        let node = scene.node_ref(target);
        let original = PropertySnapshot {
            left: node.left,
            top: node.top,
            scale_x: node.scale_x,
            scale_y: node.scale_y,
            skew_x: node.skew_x,
            skew_y: node.skew_y,
            angle: node.angle,
            flip_x: node.flip_x,
            flip_y: node.flip_y,
        };

        // Per-node snap settings override the engine default; the snap
        // window defaults to the increment itself.
        let snap = node
            .snap_angle
            .map(|inc| (inc, node.snap_threshold))
            .or(default_snap)
            .map(|(inc, th)| (inc, th.unwrap_or(inc)));

        let base = unscaled_dims(scene, target);
        let start_distance =
            base.x * original.scale_x.abs() + base.y * original.scale_y.abs();

        Self {
            target,
            action: hit.action,
            anchor: hit.anchor,
            start_parent,
            start_local,
            start_distance,
            original,
            sign_x: sign_or(start_local.x, 1.0),
            sign_y: sign_or(start_local.y, 1.0),
            snap,
            performed: false,
        }
    }
}

pub fn sign_or(v: f64, fallback: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        fallback
    }
}

/// Untransformed dimensions (stroke included when it scales), the
/// denominator turning local pointer offsets into scale factors.
pub fn unscaled_dims(scene: &Scene, idx: NodeIndex) -> Point {
    let node = scene.node_ref(idx);
    let stroke = if node.stroke_uniform { 0.0 } else { node.stroke_width };
    Point::new(node.width + stroke, node.height + stroke)
}

/// Re-express a world-plane pointer in the target's parent plane.
pub fn pointer_in_parent_plane(scene: &mut Scene, idx: NodeIndex, pointer: Point) -> Point {
    match scene.parent_of(idx) {
        Some(parent) if parent != scene.root() => {
            match scene.full_matrix(parent).invert() {
                Ok(inv) => inv.transform_point(pointer),
                Err(_) => pointer,
            }
        }
        _ => pointer,
    }
}

/// Pointer relative to the anchor origin, with the node's rotation undone:
/// the frame in which scale and skew handlers reason. Units are
/// parent-plane units (the node's scale is still in).
pub fn to_anchor_local(
    scene: &mut Scene,
    idx: NodeIndex,
    anchor: Point,
    pointer: Point,
) -> Point {
    let pp = pointer_in_parent_plane(scene, idx, pointer);
    let node = scene.node_ref(idx);
    let center = node.relative_center();
    let rad = node.angle.to_radians();
    let unrotated = pp.rotate_about(-rad, center);
    let anchor_unrotated = center + node.transformed_size().scale_by(anchor);
    unrotated - anchor_unrotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::node::{NodeKind, Origin, Prop, SceneNode};

    #[test]
    fn local_frame_undoes_rotation() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        n.set_many([
            Prop::Width(100.0),
            Prop::Height(100.0),
            Prop::OriginX(Origin::Near),
            Prop::OriginY(Origin::Near),
            Prop::Angle(90.0),
        ]);
        let idx = scene.add(root, n).unwrap();

        // The bottom-right corner in world space, for a 90°-rotated square
        // anchored at the world origin, sits at (-100, 100).
        let local = to_anchor_local(
            &mut scene,
            idx,
            Point::new(-0.5, -0.5),
            Point::new(-100.0, 100.0),
        );
        assert!(
            (local.x - 100.0).abs() < 1e-6 && (local.y - 100.0).abs() < 1e-6,
            "expected (100, 100), got {local}"
        );
    }

    #[test]
    fn parent_plane_conversion_inverts_group_transform() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        n.set_many([Prop::Width(10.0), Prop::Height(10.0)]);
        let idx = scene.add(root, n).unwrap();
        let group = scene.group_nodes(&[idx]).unwrap();
        scene.set_props(group, [Prop::ScaleX(2.0), Prop::ScaleY(2.0)]);

        // The group is centered at the world origin and scaled ×2, so a
        // world pointer at (10, 0) reads as (5, 0) inside the group plane.
        let pp = pointer_in_parent_plane(&mut scene, idx, Point::new(10.0, 0.0));
        assert!(
            pp.distance(Point::new(5.0, 0.0)) < 1e-6,
            "expected (5, 0), got {pp}"
        );
    }
}
