//! Shape tessellation: node kinds to kurbo paths and paint calls.
//!
//! Every primitive draws in its own object plane, centered at the origin —
//! the caller has already pushed the node's transform onto the surface.

use crate::surface::{FillResolver, Surface};
use easel_core::geom::Point;
use easel_core::node::{NodeKind, SceneNode};
use kurbo::{BezPath, Shape as _};

/// Flattening tolerance for curve-to-path conversion.
const PATH_TOLERANCE: f64 = 0.1;

/// The node's outline in its object plane, centered at the origin. `None`
/// for kinds with nothing of their own to draw.
pub fn primitive_path(node: &SceneNode) -> Option<BezPath> {
    let (hw, hh) = (node.width / 2.0, node.height / 2.0);
    match &node.kind {
        NodeKind::Rect { rx } => {
            let rect = kurbo::Rect::new(-hw, -hh, hw, hh);
            if *rx > 0.0 {
                Some(rect.to_rounded_rect(*rx).to_path(PATH_TOLERANCE))
            } else {
                Some(rect.to_path(PATH_TOLERANCE))
            }
        }
        NodeKind::Ellipse => {
            Some(kurbo::Ellipse::new((0.0, 0.0), (hw, hh), 0.0).to_path(PATH_TOLERANCE))
        }
        NodeKind::Path(path) => Some(path.clone()),
        // A group draws only its background fill; children paint themselves.
        NodeKind::Group(_) => {
            if node.fill.is_some() || node.stroke.is_some() {
                Some(kurbo::Rect::new(-hw, -hh, hw, hh).to_path(PATH_TOLERANCE))
            } else {
                None
            }
        }
    }
}

/// Fill then stroke the node's primitive. `pixel_scale` is the effective
/// device scale of the current transform, used to keep uniform strokes at
/// constant screen thickness.
pub fn draw_primitive(
    surface: &mut dyn Surface,
    node: &SceneNode,
    fills: &dyn FillResolver,
    pixel_scale: Point,
) {
    let Some(path) = primitive_path(node) else {
        return;
    };
    if let Some(fill) = &node.fill
        && !fill.is_transparent()
    {
        surface.fill_path(&path, &fills.resolve(fill));
    }
    if let Some(stroke) = &node.stroke
        && node.stroke_width > 0.0
        && !stroke.is_transparent()
    {
        let width = if node.stroke_uniform {
            let avg = (pixel_scale.x + pixel_scale.y) / 2.0;
            if avg > 0.0 { node.stroke_width / avg } else { node.stroke_width }
        } else {
            node.stroke_width
        };
        surface.stroke_path(&path, width, &fills.resolve(stroke));
    }
}

/// Whether rendering can skip this node outright: nothing visible to draw.
pub fn skippable(node: &SceneNode, inherited_opacity: f32) -> bool {
    if !node.visible {
        return true;
    }
    if node.opacity * inherited_opacity <= 0.0 {
        return true;
    }
    let zero_sized = node.width == 0.0 && node.height == 0.0;
    zero_sized && node.stroke_width == 0.0 && !node.kind.is_group()
}
