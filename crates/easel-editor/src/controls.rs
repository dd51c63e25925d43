//! Control handles: the on-screen affordances around the active node.
//!
//! Eight handles ring the bounding quad (four corners, four edge
//! midpoints) plus a rotate handle floating past the top edge. Each handle
//! binds to one action; the middle handles are ambiguous between scaling
//! and skewing, resolved per pointer event by the Shift key.

use crate::input::Modifiers;
use easel_core::geom::Point;
use easel_core::scene::Scene;
use easel_core::NodeIndex;
use easel_render::pipeline::{HANDLE_SIZE, ROTATE_HANDLE_OFFSET};

/// Extra hit radius around a handle beyond its drawn size.
const HIT_SLACK: f64 = 2.0;

/// Interactive transform actions a control can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Drag,
    ScaleX,
    ScaleY,
    ScaleEqually,
    Rotate,
    SkewX,
    SkewY,
}

/// The nine handles around a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    MidTop,
    MidRight,
    MidBottom,
    MidLeft,
    Rotate,
}

impl Handle {
    /// The anchor origin held fixed while this handle drags: the opposite
    /// corner or edge, or the center for rotation.
    pub fn anchor(self) -> Point {
        match self {
            Handle::TopLeft => Point::new(0.5, 0.5),
            Handle::TopRight => Point::new(-0.5, 0.5),
            Handle::BottomLeft => Point::new(0.5, -0.5),
            Handle::BottomRight => Point::new(-0.5, -0.5),
            Handle::MidTop => Point::new(0.0, 0.5),
            Handle::MidBottom => Point::new(0.0, -0.5),
            Handle::MidLeft => Point::new(0.5, 0.0),
            Handle::MidRight => Point::new(-0.5, 0.0),
            Handle::Rotate => Point::ZERO,
        }
    }

    /// Resolve this handle to an action. The edge handles scale by default
    /// and skew while Shift is held.
    pub fn action(self, modifiers: &Modifiers) -> Action {
        match self {
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight => {
                Action::ScaleEqually
            }
            Handle::MidLeft | Handle::MidRight => {
                if modifiers.shift {
                    Action::SkewY
                } else {
                    Action::ScaleX
                }
            }
            Handle::MidTop | Handle::MidBottom => {
                if modifiers.shift {
                    Action::SkewX
                } else {
                    Action::ScaleY
                }
            }
            Handle::Rotate => Action::Rotate,
        }
    }

    /// CSS-style cursor for embedders. Rotation-aware refinement is the
    /// embedder's call.
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::TopLeft | Handle::BottomRight => "nwse-resize",
            Handle::TopRight | Handle::BottomLeft => "nesw-resize",
            Handle::MidLeft | Handle::MidRight => "ew-resize",
            Handle::MidTop | Handle::MidBottom => "ns-resize",
            Handle::Rotate => "crosshair",
        }
    }
}

/// A resolved handle hit: which control, what it does, where it anchors.
#[derive(Debug, Clone, Copy)]
pub struct ControlHit {
    pub handle: Handle,
    pub action: Action,
    /// Anchor origin fractions, already flipped to center when a centered
    /// transform applies.
    pub anchor: Point,
}

/// Device-space handle positions for a node, in a fixed probe order.
pub fn handle_positions(
    scene: &mut Scene,
    idx: NodeIndex,
    padding: f64,
) -> [(Handle, Point); 9] {
    let c = scene.screen_corners_padded(idx, padding);
    let [mt, mr, mb, ml] = c.edge_midpoints();
    [
        (Handle::Rotate, c.rotate_handle(ROTATE_HANDLE_OFFSET)),
        (Handle::TopLeft, c.tl),
        (Handle::TopRight, c.tr),
        (Handle::BottomLeft, c.bl),
        (Handle::BottomRight, c.br),
        (Handle::MidTop, mt),
        (Handle::MidRight, mr),
        (Handle::MidBottom, mb),
        (Handle::MidLeft, ml),
    ]
}

/// Hit-test the pointer against a node's handles. Returns the nearest
/// handle within reach, with its action resolved against the modifiers.
pub fn find_control(
    scene: &mut Scene,
    idx: NodeIndex,
    pointer: Point,
    modifiers: &Modifiers,
    padding: f64,
) -> Option<ControlHit> {
    let reach = HANDLE_SIZE / 2.0 + HIT_SLACK;
    let mut best: Option<(Handle, f64)> = None;
    for (handle, pos) in handle_positions(scene, idx, padding) {
        let d = pointer.distance(pos);
        if d <= reach && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((handle, d));
        }
    }
    let (handle, _) = best?;
    let action = handle.action(modifiers);
    let node = scene.node_ref(idx);
    let centered = matches!(
        action,
        Action::ScaleX | Action::ScaleY | Action::ScaleEqually
    ) && (modifiers.alt || node.centered_scaling);
    let anchor = if centered { Point::ZERO } else { handle.anchor() };
    Some(ControlHit {
        handle,
        action,
        anchor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::node::{NodeKind, Origin, Prop, SceneNode};

    fn scene_with_square() -> (Scene, NodeIndex) {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        n.set_many([
            Prop::Width(100.0),
            Prop::Height(100.0),
            Prop::OriginX(Origin::Near),
            Prop::OriginY(Origin::Near),
        ]);
        let idx = scene.add(root, n).unwrap();
        (scene, idx)
    }

    #[test]
    fn corner_handle_scales_equally_from_opposite_corner() {
        let (mut scene, idx) = scene_with_square();
        let hit = find_control(&mut scene, idx, Point::new(0.0, 0.0), &Modifiers::NONE, 0.0)
            .expect("top-left corner handle");
        assert_eq!(hit.handle, Handle::TopLeft);
        assert_eq!(hit.action, Action::ScaleEqually);
        assert_eq!(hit.anchor, Point::new(0.5, 0.5));
    }

    #[test]
    fn middle_handle_is_ambiguous_on_shift() {
        let (mut scene, idx) = scene_with_square();
        let mid_right = Point::new(100.0, 50.0);
        let hit = find_control(&mut scene, idx, mid_right, &Modifiers::NONE, 0.0).unwrap();
        assert_eq!(hit.action, Action::ScaleX);

        let shift = Modifiers { shift: true, ..Modifiers::NONE };
        let hit = find_control(&mut scene, idx, mid_right, &shift, 0.0).unwrap();
        assert_eq!(hit.action, Action::SkewY, "shift turns the edge into skew");
    }

    #[test]
    fn alt_recenters_scaling_anchor() {
        let (mut scene, idx) = scene_with_square();
        let alt = Modifiers { alt: true, ..Modifiers::NONE };
        let hit = find_control(&mut scene, idx, Point::new(100.0, 100.0), &alt, 0.0).unwrap();
        assert_eq!(hit.action, Action::ScaleEqually);
        assert_eq!(hit.anchor, Point::ZERO, "centered scaling anchors at center");
    }

    #[test]
    fn rotate_handle_floats_above_top_edge() {
        let (mut scene, idx) = scene_with_square();
        let probe = Point::new(50.0, -ROTATE_HANDLE_OFFSET);
        let hit = find_control(&mut scene, idx, probe, &Modifiers::NONE, 0.0).unwrap();
        assert_eq!(hit.handle, Handle::Rotate);
        assert_eq!(hit.action, Action::Rotate);
    }

    #[test]
    fn miss_returns_none() {
        let (mut scene, idx) = scene_with_square();
        assert!(find_control(&mut scene, idx, Point::new(400.0, 400.0), &Modifiers::NONE, 0.0).is_none());
    }
}
