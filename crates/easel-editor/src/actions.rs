//! Transform action handlers.
//!
//! Each handler is a pure function of (session, current pointer) against
//! the session's starting snapshot, returning whether it changed the
//! target. Two wrappers apply to every handler: the fixed anchor — the
//! anchor origin's world position is recorded before and reasserted after,
//! so the held corner never drifts — and fire-on-change, which pushes the
//! matching scene event.

use crate::controls::Action;
use crate::session::{
    TransformSession, pointer_in_parent_plane, sign_or, to_anchor_local, unscaled_dims,
};
use easel_core::event::EventKind;
use easel_core::geom::{EPSILON, Point};
use easel_core::node::Prop;
use easel_core::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Both,
    X,
    Y,
}

/// Run the session's handler for the current pointer (scene coordinates).
/// Returns whether the target changed; no-change outcomes (locked axes,
/// degenerate geometry) are silent.
pub fn apply_action(scene: &mut Scene, session: &mut TransformSession, pointer: Point) -> bool {
    let changed = match session.action {
        Action::Drag => drag(scene, session, pointer),
        Action::ScaleEqually => anchored(scene, session, pointer, |s, ss, p| {
            scale(s, ss, p, Axis::Both)
        }),
        Action::ScaleX => anchored(scene, session, pointer, |s, ss, p| scale(s, ss, p, Axis::X)),
        Action::ScaleY => anchored(scene, session, pointer, |s, ss, p| scale(s, ss, p, Axis::Y)),
        Action::Rotate => anchored(scene, session, pointer, rotate),
        Action::SkewX => anchored(scene, session, pointer, skew_x),
        Action::SkewY => anchored(scene, session, pointer, skew_y),
    };
    if changed {
        session.performed = true;
        scene.set_coords(session.target);
        let kind = match session.action {
            Action::Drag => EventKind::Moving,
            Action::ScaleX | Action::ScaleY | Action::ScaleEqually => EventKind::Scaling,
            Action::Rotate => EventKind::Rotating,
            Action::SkewX | Action::SkewY => EventKind::Skewing,
        };
        scene.push_event(kind, session.target);
    }
    changed
}

/// Fixed-anchor wrapper: whatever the inner handler does to size, scale,
/// or angle, the anchor origin ends the event at the same world position.
/// The anchor is re-read after the handler because a flip-through-zero
/// mirrors it.
fn anchored(
    scene: &mut Scene,
    session: &mut TransformSession,
    pointer: Point,
    inner: fn(&mut Scene, &mut TransformSession, Point) -> bool,
) -> bool {
    let target = session.target;
    let before = scene.node_ref(target).position_at(session.anchor);
    let changed = inner(scene, session, pointer);
    if changed {
        scene
            .node_mut(target)
            .set_position_by_origin(before, session.anchor);
    }
    changed
}

// ─── Drag ────────────────────────────────────────────────────────────────

fn drag(scene: &mut Scene, session: &mut TransformSession, pointer: Point) -> bool {
    let idx = session.target;
    let locks = scene.node_ref(idx).locks;
    if locks.movement_x && locks.movement_y {
        return false;
    }
    let pp = pointer_in_parent_plane(scene, idx, pointer);
    let delta = pp - session.start_parent;
    let mut changed = false;
    if !locks.movement_x {
        changed |= scene.set_prop(idx, Prop::Left(session.original.left + delta.x));
    }
    if !locks.movement_y {
        changed |= scene.set_prop(idx, Prop::Top(session.original.top + delta.y));
    }
    changed
}

// ─── Scale ───────────────────────────────────────────────────────────────

fn scale(
    scene: &mut Scene,
    session: &mut TransformSession,
    pointer: Point,
    axis: Axis,
) -> bool {
    let idx = session.target;
    let locks = scene.node_ref(idx).locks;
    match axis {
        Axis::Both if locks.scaling_x && locks.scaling_y => return false,
        Axis::X if locks.scaling_x => return false,
        Axis::Y if locks.scaling_y => return false,
        _ => {}
    }

    let local = to_anchor_local(scene, idx, session.anchor, pointer);
    let mut flipped = false;

    // The pointer crossing the anchor flips the shape through zero — only
    // honored when flipping isn't locked. The anchor mirrors with it so
    // the drag stays continuous.
    if axis != Axis::Y {
        let sign = sign_or(local.x, session.sign_x);
        if sign != session.sign_x {
            if locks.scaling_flip {
                return false;
            }
            let flip = scene.node_ref(idx).flip_x;
            scene.set_prop(idx, Prop::FlipX(!flip));
            session.anchor.x = -session.anchor.x;
            session.sign_x = sign;
            flipped = true;
        }
    }
    if axis != Axis::X {
        let sign = sign_or(local.y, session.sign_y);
        if sign != session.sign_y {
            if locks.scaling_flip {
                return false;
            }
            let flip = scene.node_ref(idx).flip_y;
            scene.set_prop(idx, Prop::FlipY(!flip));
            session.anchor.y = -session.anchor.y;
            session.sign_y = sign;
            flipped = true;
        }
    }

    let base = unscaled_dims(scene, idx);
    let centered = session.anchor == Point::ZERO;
    let doubler = if centered { 2.0 } else { 1.0 };

    let (mut new_sx, mut new_sy) = {
        let n = scene.node_ref(idx);
        (n.scale_x, n.scale_y)
    };
    match axis {
        Axis::Both => {
            if session.start_distance <= EPSILON {
                return flipped;
            }
            let distance = local.x.abs() + local.y.abs();
            let factor = distance / session.start_distance * doubler;
            new_sx = session.original.scale_x.abs() * factor;
            new_sy = session.original.scale_y.abs() * factor;
        }
        Axis::X => {
            if base.x <= EPSILON {
                return flipped;
            }
            new_sx = local.x.abs() / base.x * doubler;
        }
        Axis::Y => {
            if base.y <= EPSILON {
                return flipped;
            }
            new_sy = local.y.abs() / base.y * doubler;
        }
    }

    let mut changed = flipped;
    if axis != Axis::Y && !locks.scaling_x {
        changed |= scene.set_prop(idx, Prop::ScaleX(new_sx));
    }
    if axis != Axis::X && !locks.scaling_y {
        changed |= scene.set_prop(idx, Prop::ScaleY(new_sy));
    }
    changed
}

// ─── Rotate ──────────────────────────────────────────────────────────────

fn rotate(scene: &mut Scene, session: &mut TransformSession, pointer: Point) -> bool {
    let idx = session.target;
    if scene.node_ref(idx).locks.rotation {
        return false;
    }
    let pp = pointer_in_parent_plane(scene, idx, pointer);
    let pivot = scene.node_ref(idx).position_at(session.anchor);

    let start = session.start_parent - pivot;
    let current = pp - pivot;
    if current.hypot() <= EPSILON {
        return false;
    }
    let delta = current.y.atan2(current.x) - start.y.atan2(start.x);
    let mut angle = delta.to_degrees() + session.original.angle;

    if let Some((increment, threshold)) = session.snap {
        let below = (angle / increment).floor() * increment;
        let above = (angle / increment).ceil() * increment;
        if (angle - below).abs() < threshold {
            angle = below;
        } else if (above - angle).abs() < threshold {
            angle = above;
        }
    }
    angle = angle.rem_euclid(360.0);
    scene.set_prop(idx, Prop::Angle(angle))
}

// ─── Skew ────────────────────────────────────────────────────────────────

/// Shear on X, driven by a top/bottom edge handle. Skew is applied before
/// scale in the composition, so the pointer offset divides by the scaled
/// lever arm to recover the shear angle.
fn skew_x(scene: &mut Scene, session: &mut TransformSession, pointer: Point) -> bool {
    let idx = session.target;
    if scene.node_ref(idx).locks.skewing_x {
        return false;
    }
    let base = unscaled_dims(scene, idx);
    // Object-space distance from the anchored edge to the dragged edge.
    let lever = -2.0 * session.anchor.y * base.y;
    if lever.abs() <= EPSILON {
        return false;
    }
    let local = to_anchor_local(scene, idx, session.anchor, pointer);
    let sx = scene.node_ref(idx).scale_x.abs().max(EPSILON);
    let degrees = (local.x / (sx * lever)).atan().to_degrees();
    scene.set_prop(idx, Prop::SkewX(degrees))
}

/// Shear on Y, driven by a left/right edge handle. Because skewY applies
/// before skewX, a change here alters the width skewX will later act on —
/// so `scale_x` is compensated by the width ratio, keeping the node
/// visually as wide as before.
fn skew_y(scene: &mut Scene, session: &mut TransformSession, pointer: Point) -> bool {
    let idx = session.target;
    if scene.node_ref(idx).locks.skewing_y {
        return false;
    }
    let base = unscaled_dims(scene, idx);
    let lever = -2.0 * session.anchor.x * base.x;
    if lever.abs() <= EPSILON {
        return false;
    }
    let local = to_anchor_local(scene, idx, session.anchor, pointer);
    let sy = scene.node_ref(idx).scale_y.abs().max(EPSILON);
    let degrees = (local.y / (sy * lever)).atan().to_degrees();

    let before_width = scene.node_ref(idx).transformed_size().x;
    let changed = scene.set_prop(idx, Prop::SkewY(degrees));
    if changed {
        let node = scene.node_ref(idx);
        let after_width = node.transformed_size().x;
        if after_width > EPSILON {
            let compensated = node.scale_x * before_width / after_width;
            scene.set_prop(idx, Prop::ScaleX(compensated));
        }
    }
    changed
}

// ─── Tests ───────────────────────────────────────────────────────────────
