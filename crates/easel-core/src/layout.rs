//! Group layout: recomputing a container's own bounds from its children.
//!
//! A layout pass may change the group's size and position but must never
//! move a child on screen — the group shifts, the children are compensated
//! in the opposite direction, and the absolute corner positions of every
//! member come out unchanged.

use crate::event::EventKind;
use crate::geom::Point;
use crate::intersect::bounds_of;
use crate::node::Prop;
use crate::scene::Scene;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// How a group derives its own width/height/position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutStrategy {
    /// Bounding box of the children, recomputed on membership changes.
    #[default]
    FitContent,
    /// Size is whatever the embedder set; membership changes leave it alone.
    Fixed,
    /// Bounding box of the group's clip shape.
    ClipPath,
    /// No automatic recomputation; the embedder drives bounds imperatively.
    Imperative,
}

/// Recompute `group`'s bounds according to its layout strategy. No-op for
/// non-groups and for strategies that do not auto-layout.
pub fn perform_layout(scene: &mut Scene, group: NodeIndex) {
    if group == scene.root() {
        return;
    }
    let Some(state) = scene.node(group).and_then(|n| n.group_state()) else {
        return;
    };
    let strategy = state.layout;
    let children = state.children.clone();
    let clip = state.clip_path;

    let bbox = match strategy {
        LayoutStrategy::Fixed | LayoutStrategy::Imperative => return,
        LayoutStrategy::FitContent => {
            if children.is_empty() {
                return;
            }
            let mut points = Vec::with_capacity(children.len() * 4);
            for &child in &children {
                let corners = scene.node_ref(child).parent_plane_corners();
                points.extend_from_slice(&corners.loop_points());
            }
            bounds_of(&points)
        }
        LayoutStrategy::ClipPath => {
            let Some(corners) = clip
                .and_then(|c| scene.node(c))
                .map(|n| n.parent_plane_corners())
            else {
                return;
            };
            bounds_of(&corners.loop_points())
        }
    };

    let (min, max) = bbox;
    let mid = min.midpoint(max);
    let extent = max - min;

    // Where the new center lands in the group's parent plane, measured with
    // the matrix the group had before this pass.
    let own = scene.node_mut(group).own_matrix();
    let new_center_parent = own.transform_point(mid);

    {
        let node = scene.node_mut(group);
        node.set_many([Prop::Width(extent.x), Prop::Height(extent.y)]);
    }

    // Children compensate so their absolute positions do not move.
    if strategy == LayoutStrategy::FitContent || strategy == LayoutStrategy::ClipPath {
        for &child in &children {
            let node = scene.node_mut(child);
            let (left, top) = (node.left - mid.x, node.top - mid.y);
            node.set_many([Prop::Left(left), Prop::Top(top)]);
        }
        if let Some(clip) = clip
            && scene.node(clip).is_some()
        {
            let node = scene.node_mut(clip);
            let (left, top) = (node.left - mid.x, node.top - mid.y);
            node.set_many([Prop::Left(left), Prop::Top(top)]);
        }
    }

    scene
        .node_mut(group)
        .set_position_by_origin(new_center_parent, Point::ZERO);

    let name = scene.node_ref(group).id;
    scene.events_mut().push(EventKind::Layout, group, name);
}
