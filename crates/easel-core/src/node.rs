//! The shape unit: properties, derived geometry, and per-node caches.
//!
//! A node's placement is `left/top` in its parent plane, anchored at an
//! origin fraction, with scale/skew/rotation/flip applied about the node's
//! center. Everything derived (own matrix, corner sets) is memoized against
//! a fingerprint of the contributing properties — there is no push-based
//! invalidation, only fingerprint mismatch.
//!
//! Anything that needs the ancestor chain (full matrix, absolute corners)
//! lives on [`crate::scene::Scene`].

use crate::geom::{Decomposed, Matrix, Point, finite_or};
use crate::id::NodeId;
use crate::layout::LayoutStrategy;
use crate::paint::{Paint, Shadow};
use kurbo::BezPath;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Scale magnitudes below this are clamped (sign preserved) so node
/// matrices stay invertible.
pub const MIN_SCALE: f64 = 1e-4;

// ─── Origin ──────────────────────────────────────────────────────────────

/// Anchor position along one axis, resolved to a fraction in [-0.5, 0.5]
/// relative to the node's center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Origin {
    /// Left or top edge: -0.5.
    Near,
    #[default]
    Center,
    /// Right or bottom edge: 0.5.
    Far,
    /// Arbitrary fraction, clamped to [-0.5, 0.5].
    Fraction(f64),
}

impl Origin {
    pub fn resolve(self) -> f64 {
        match self {
            Origin::Near => -0.5,
            Origin::Center => 0.0,
            Origin::Far => 0.5,
            Origin::Fraction(f) => f.clamp(-0.5, 0.5),
        }
    }

    /// The opposite anchor, used when a scale flips through zero.
    pub fn invert(self) -> Self {
        match self {
            Origin::Near => Origin::Far,
            Origin::Center => Origin::Center,
            Origin::Far => Origin::Near,
            Origin::Fraction(f) => Origin::Fraction(-f),
        }
    }
}

// ─── Corners ─────────────────────────────────────────────────────────────

/// The four transformed corners of a node's bounding quad.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Corners {
    pub tl: Point,
    pub tr: Point,
    pub bl: Point,
    pub br: Point,
}

impl Corners {
    /// Corners in edge-loop order, for containment and overlap tests.
    pub fn loop_points(&self) -> [Point; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    pub fn center(&self) -> Point {
        self.tl.midpoint(self.br)
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Point, Point) {
        let min = self.tl.min(self.tr).min(self.bl).min(self.br);
        let max = self.tl.max(self.tr).max(self.bl).max(self.br);
        (min, max)
    }

    pub fn map(&self, f: impl Fn(Point) -> Point) -> Corners {
        Corners {
            tl: f(self.tl),
            tr: f(self.tr),
            bl: f(self.bl),
            br: f(self.br),
        }
    }

    /// Edge midpoints in top/right/bottom/left order. Handle layout and
    /// border decorations both derive from these.
    pub fn edge_midpoints(&self) -> [Point; 4] {
        [
            self.tl.midpoint(self.tr),
            self.tr.midpoint(self.br),
            self.bl.midpoint(self.br),
            self.tl.midpoint(self.bl),
        ]
    }

    /// Where the rotate handle sits: `offset` past the top edge midpoint,
    /// away from the center.
    pub fn rotate_handle(&self, offset: f64) -> Point {
        let top = self.tl.midpoint(self.tr);
        let center = self.center();
        let dir = top - center;
        let len = dir.hypot();
        if len < crate::geom::EPSILON {
            return top + Point::new(0.0, -offset);
        }
        top + dir * (offset / len)
    }
}

// ─── Kind ────────────────────────────────────────────────────────────────

/// Restore record for a node absorbed into the ephemeral selection group:
/// where it came from and at which paint position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberRestore {
    pub member: NodeIndex,
    pub prior_parent: NodeIndex,
    pub prior_index: usize,
}

/// State carried by container nodes.
#[derive(Debug, Clone, Default)]
pub struct GroupState {
    /// Paint order, back to front. Mutated only through scene operations.
    pub children: Vec<NodeIndex>,
    pub layout: LayoutStrategy,
    /// Optional clip shape, a standalone node in the same arena.
    pub clip_path: Option<NodeIndex>,
    /// Rasterize the whole subtree into one bitmap instead of per child.
    pub subtree_caching: bool,
    /// True for the ephemeral selection aggregate.
    pub selection: bool,
    /// Populated only while `selection` is true.
    pub restore: SmallVec<[MemberRestore; 4]>,
}

/// Closed set of shape kinds; the draw routine, bounds, and serialization
/// variant are selected here at construction time.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Rect {
        /// Corner radius in object units.
        rx: f64,
    },
    Ellipse,
    Path(BezPath),
    Group(GroupState),
}

impl NodeKind {
    pub fn group() -> Self {
        NodeKind::Group(GroupState::default())
    }

    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group(_))
    }
}

// ─── Locks ───────────────────────────────────────────────────────────────

/// Per-axis interaction locks. A locked axis turns the corresponding
/// handler into a silent no-op for that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locks {
    pub movement_x: bool,
    pub movement_y: bool,
    pub scaling_x: bool,
    pub scaling_y: bool,
    pub rotation: bool,
    pub skewing_x: bool,
    pub skewing_y: bool,
    /// Forbid scale changing sign when the pointer crosses the anchor.
    pub scaling_flip: bool,
}

// ─── Property bag ────────────────────────────────────────────────────────

/// A single settable property. Bulk updates go through
/// [`SceneNode::set_many`].
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Left(f64),
    Top(f64),
    Width(f64),
    Height(f64),
    ScaleX(f64),
    ScaleY(f64),
    SkewX(f64),
    SkewY(f64),
    Angle(f64),
    FlipX(bool),
    FlipY(bool),
    OriginX(Origin),
    OriginY(Origin),
    StrokeWidth(f64),
    StrokeUniform(bool),
    Opacity(f32),
    Visible(bool),
    Fill(Option<Paint>),
    Stroke(Option<Paint>),
    Shadow(Option<Shadow>),
    CornerRadius(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MatrixMemo {
    /// Fingerprint of every contributing property at computation time.
    key: u64,
    value: Matrix,
}

// ─── SceneNode ───────────────────────────────────────────────────────────

/// One shape in the scene. Created standalone; enters a coordinate plane
/// when added to the canvas root or a group.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,

    // Placement in the parent plane.
    pub left: f64,
    pub top: f64,
    pub origin_x: Origin,
    pub origin_y: Origin,

    // Untransformed size.
    pub width: f64,
    pub height: f64,

    // Transform, applied about the center. Angles in degrees.
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,

    // Style.
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: f64,
    /// Keep stroke thickness constant in screen space instead of scaling
    /// with the shape.
    pub stroke_uniform: bool,
    pub shadow: Option<Shadow>,
    pub opacity: f32,
    pub visible: bool,

    // Interaction.
    pub locks: Locks,
    pub centered_scaling: bool,
    pub selectable: bool,
    pub snap_angle: Option<f64>,
    pub snap_threshold: Option<f64>,

    /// Per-node raster caching opt-out.
    pub cache_enabled: bool,

    // Dirty state. `dirty` covers geometry; `cache_dirty` covers painted
    // content, tracked separately so a pure move never repaints the cache.
    pub dirty: bool,
    pub cache_dirty: bool,

    // Memoized derived state.
    own_memo: Option<MatrixMemo>,
    full_memo: Option<MatrixMemo>,
    pub(crate) corners_memo: Option<(u64, Corners)>,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        let prefix = match &kind {
            NodeKind::Rect { .. } => "rect",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Path(_) => "path",
            NodeKind::Group(g) if g.selection => "selection",
            NodeKind::Group(_) => "group",
        };
        Self::named(NodeId::fresh(prefix), kind)
    }

    pub fn named(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            left: 0.0,
            top: 0.0,
            origin_x: Origin::Center,
            origin_y: Origin::Center,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            stroke_uniform: false,
            shadow: None,
            opacity: 1.0,
            visible: true,
            locks: Locks::default(),
            centered_scaling: false,
            selectable: true,
            snap_angle: None,
            snap_threshold: None,
            cache_enabled: true,
            dirty: true,
            cache_dirty: true,
            own_memo: None,
            full_memo: None,
            corners_memo: None,
        }
    }

    pub fn group_state(&self) -> Option<&GroupState> {
        match &self.kind {
            NodeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn group_state_mut(&mut self) -> Option<&mut GroupState> {
        match &mut self.kind {
            NodeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    // ─── Property setting ────────────────────────────────────────────

    /// Apply one property. Returns whether the stored value changed; an
    /// equal value is a no-op and does not re-mark any dirty flag.
    pub fn set(&mut self, prop: Prop) -> bool {
        let cache_relevant = Self::is_cache_relevant(&prop);
        let changed = self.apply(prop);
        if changed {
            self.dirty = true;
            if cache_relevant {
                self.cache_dirty = true;
            }
        }
        changed
    }

    /// Bulk update. Returns true when any property changed.
    pub fn set_many<I: IntoIterator<Item = Prop>>(&mut self, props: I) -> bool {
        let mut changed = false;
        for p in props {
            changed |= self.set(p);
        }
        changed
    }

    /// Properties whose change invalidates the painted cache content (as
    /// opposed to only the transform).
    fn is_cache_relevant(prop: &Prop) -> bool {
        matches!(
            prop,
            Prop::Width(_)
                | Prop::Height(_)
                | Prop::StrokeWidth(_)
                | Prop::StrokeUniform(_)
                | Prop::Fill(_)
                | Prop::Stroke(_)
                | Prop::Shadow(_)
                | Prop::CornerRadius(_)
        )
    }

    fn apply(&mut self, prop: Prop) -> bool {
        fn swap<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }
        match prop {
            Prop::Left(v) => swap(&mut self.left, finite_or(v, 0.0)),
            Prop::Top(v) => swap(&mut self.top, finite_or(v, 0.0)),
            Prop::Width(v) => swap(&mut self.width, finite_or(v, 0.0)),
            Prop::Height(v) => swap(&mut self.height, finite_or(v, 0.0)),
            Prop::ScaleX(v) => swap(&mut self.scale_x, clamp_scale(v)),
            Prop::ScaleY(v) => swap(&mut self.scale_y, clamp_scale(v)),
            Prop::SkewX(v) => swap(&mut self.skew_x, finite_or(v, 0.0)),
            Prop::SkewY(v) => swap(&mut self.skew_y, finite_or(v, 0.0)),
            Prop::Angle(v) => swap(&mut self.angle, finite_or(v, 0.0)),
            Prop::FlipX(v) => swap(&mut self.flip_x, v),
            Prop::FlipY(v) => swap(&mut self.flip_y, v),
            Prop::OriginX(v) => swap(&mut self.origin_x, v),
            Prop::OriginY(v) => swap(&mut self.origin_y, v),
            Prop::StrokeWidth(v) => swap(&mut self.stroke_width, finite_or(v, 0.0)),
            Prop::StrokeUniform(v) => swap(&mut self.stroke_uniform, v),
            Prop::Opacity(v) => swap(&mut self.opacity, v.clamp(0.0, 1.0)),
            Prop::Visible(v) => swap(&mut self.visible, v),
            Prop::Fill(v) => swap(&mut self.fill, v),
            Prop::Stroke(v) => swap(&mut self.stroke, v),
            Prop::Shadow(v) => swap(&mut self.shadow, v),
            Prop::CornerRadius(v) => match &mut self.kind {
                NodeKind::Rect { rx } => swap(rx, finite_or(v, 0.0)),
                _ => false,
            },
        }
    }

    // ─── Derived dimensions ──────────────────────────────────────────

    /// Size before any transform, stroke included when it scales with the
    /// shape.
    fn pre_scale_size(&self) -> Point {
        let stroke = if self.stroke_uniform { 0.0 } else { self.stroke_width };
        Point::new(self.width + stroke, self.height + stroke)
    }

    /// Size after scale, skew, and stroke. With zero skew this is exactly
    /// `(size + stroke) * scale`; a sheared rectangle needs its corner
    /// offsets pushed through the dimensional matrix because its
    /// axis-aligned box is wider than `width * scale`.
    pub fn transformed_size(&self) -> Point {
        self.transformed_size_with(self.scale_x, self.scale_y, self.skew_x, self.skew_y)
    }

    /// `transformed_size` with explicit transform components, used by
    /// interactive handlers probing "what would the size become".
    pub fn transformed_size_with(
        &self,
        scale_x: f64,
        scale_y: f64,
        skew_x: f64,
        skew_y: f64,
    ) -> Point {
        let base = self.pre_scale_size();
        let post_stroke = if self.stroke_uniform { self.stroke_width } else { 0.0 };
        let sized = if skew_x == 0.0 && skew_y == 0.0 {
            Point::new((base.x * scale_x).abs(), (base.y * scale_y).abs())
        } else {
            let m = Matrix::dimensional(scale_x, scale_y, skew_x, skew_y);
            size_after_transform(base.x, base.y, &m)
        };
        Point::new(sized.x + post_stroke, sized.y + post_stroke)
    }

    pub fn scaled_width(&self) -> f64 {
        self.transformed_size().x
    }

    pub fn scaled_height(&self) -> f64 {
        self.transformed_size().y
    }

    // ─── Anchors and center ──────────────────────────────────────────

    fn origin_fractions(&self) -> Point {
        Point::new(self.origin_x.resolve(), self.origin_y.resolve())
    }

    /// Center of the node in its parent plane. The anchor `(left, top)`
    /// stays fixed; the center swings around it when the node rotates.
    pub fn relative_center(&self) -> Point {
        self.center_from(Point::new(self.left, self.top), self.origin_fractions())
    }

    /// Center implied by `pos` sitting at origin fraction `o`.
    pub fn center_from(&self, pos: Point, o: Point) -> Point {
        let offset = self.transformed_size().scale_by(-o);
        pos + offset.rotate(self.angle.to_radians())
    }

    /// Where origin fraction `o` currently sits in the parent plane.
    pub fn position_at(&self, o: Point) -> Point {
        let offset = self.transformed_size().scale_by(o);
        self.relative_center() + offset.rotate(self.angle.to_radians())
    }

    /// Corners of the transformed bounding quad in the parent plane,
    /// before any ancestor transform: center plus rotated half-dimensions.
    pub fn parent_plane_corners(&self) -> Corners {
        let center = self.relative_center();
        let dims = self.transformed_size();
        let rad = self.angle.to_radians();
        let (hw, hh) = (dims.x / 2.0, dims.y / 2.0);
        Corners {
            tl: center + Point::new(-hw, -hh).rotate(rad),
            tr: center + Point::new(hw, -hh).rotate(rad),
            bl: center + Point::new(-hw, hh).rotate(rad),
            br: center + Point::new(hw, hh).rotate(rad),
        }
    }

    /// Move the node so that origin fraction `o` sits at `pos`, leaving
    /// every other property untouched. This is the primitive the
    /// fixed-anchor transform wrapper relies on.
    pub fn set_position_by_origin(&mut self, pos: Point, o: Point) {
        let center = self.center_from(pos, o);
        let own = self.origin_fractions();
        let offset = self.transformed_size().scale_by(own);
        let anchor = center + offset.rotate(self.angle.to_radians());
        self.set(Prop::Left(anchor.x));
        self.set(Prop::Top(anchor.y));
    }

    // ─── Own matrix ──────────────────────────────────────────────────

    /// Fingerprint of every property contributing to the own matrix.
    /// Ancestor-dependent callers chain this with the parent's key.
    pub fn transform_fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut h = std::hash::DefaultHasher::new();
        for v in [
            self.left,
            self.top,
            self.width,
            self.height,
            self.scale_x,
            self.scale_y,
            self.skew_x,
            self.skew_y,
            self.angle,
            self.stroke_width,
            self.origin_x.resolve(),
            self.origin_y.resolve(),
        ] {
            v.to_bits().hash(&mut h);
        }
        (self.flip_x, self.flip_y, self.stroke_uniform).hash(&mut h);
        h.finish()
    }

    /// The node-local transform: object plane → parent plane. Memoized
    /// against [`Self::transform_fingerprint`].
    pub fn own_matrix(&mut self) -> Matrix {
        let key = self.transform_fingerprint();
        if let Some(memo) = &self.own_memo
            && memo.key == key
        {
            return memo.value;
        }
        let center = self.relative_center();
        let value = Matrix::compose(&Decomposed {
            angle: self.angle,
            scale_x: if self.flip_x { -self.scale_x } else { self.scale_x },
            scale_y: if self.flip_y { -self.scale_y } else { self.scale_y },
            skew_x: self.skew_x,
            skew_y: self.skew_y,
            translate_x: finite_or(center.x, 0.0),
            translate_y: finite_or(center.y, 0.0),
        });
        self.own_memo = Some(MatrixMemo { key, value });
        value
    }

    /// Memoized ancestor-inclusive matrix, managed by the scene: the key is
    /// the chained fingerprint of the whole ancestor path.
    pub(crate) fn full_memo_get(&self, key: u64) -> Option<Matrix> {
        self.full_memo
            .as_ref()
            .filter(|m| m.key == key)
            .map(|m| m.value)
    }

    pub(crate) fn full_memo_put(&mut self, key: u64, value: Matrix) {
        self.full_memo = Some(MatrixMemo { key, value });
    }

    // ─── Serialization hooks ─────────────────────────────────────────

    /// Export the property bag. Structure (children, parents) is the
    /// embedder's to serialize; this is per-node state only.
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id,
            kind: match &self.kind {
                NodeKind::Rect { rx } => KindSnapshot::Rect { rx: *rx },
                NodeKind::Ellipse => KindSnapshot::Ellipse,
                NodeKind::Path(p) => KindSnapshot::Path(p.clone()),
                NodeKind::Group(_) => KindSnapshot::Group,
            },
            left: self.left,
            top: self.top,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            width: self.width,
            height: self.height,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            skew_x: self.skew_x,
            skew_y: self.skew_y,
            angle: self.angle,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
            stroke_uniform: self.stroke_uniform,
            shadow: self.shadow,
            opacity: self.opacity,
            visible: self.visible,
            locks: self.locks,
        }
    }

    /// Re-apply a property bag produced by [`Self::snapshot`]. The node's
    /// kind is replaced wholesale; group membership is untouched.
    pub fn apply_snapshot(&mut self, snap: &NodeSnapshot) {
        self.id = snap.id;
        if !matches!((&self.kind, &snap.kind), (NodeKind::Group(_), KindSnapshot::Group)) {
            self.kind = match &snap.kind {
                KindSnapshot::Rect { rx } => NodeKind::Rect { rx: *rx },
                KindSnapshot::Ellipse => NodeKind::Ellipse,
                KindSnapshot::Path(p) => NodeKind::Path(p.clone()),
                KindSnapshot::Group => NodeKind::group(),
            };
        }
        self.set_many([
            Prop::Left(snap.left),
            Prop::Top(snap.top),
            Prop::OriginX(snap.origin_x),
            Prop::OriginY(snap.origin_y),
            Prop::Width(snap.width),
            Prop::Height(snap.height),
            Prop::ScaleX(snap.scale_x),
            Prop::ScaleY(snap.scale_y),
            Prop::SkewX(snap.skew_x),
            Prop::SkewY(snap.skew_y),
            Prop::Angle(snap.angle),
            Prop::FlipX(snap.flip_x),
            Prop::FlipY(snap.flip_y),
            Prop::Fill(snap.fill.clone()),
            Prop::Stroke(snap.stroke.clone()),
            Prop::StrokeWidth(snap.stroke_width),
            Prop::StrokeUniform(snap.stroke_uniform),
            Prop::Shadow(snap.shadow),
            Prop::Opacity(snap.opacity),
            Prop::Visible(snap.visible),
        ]);
        self.locks = snap.locks;
    }
}

/// Clamp a scale factor away from zero, preserving sign.
pub fn clamp_scale(value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_SCALE;
    }
    if value.abs() < MIN_SCALE {
        if value < 0.0 { -MIN_SCALE } else { MIN_SCALE }
    } else {
        value
    }
}

/// Bounding-box size of a `w × h` box centered at the origin after `m`.
pub fn size_after_transform(w: f64, h: f64, m: &Matrix) -> Point {
    let hw = w / 2.0;
    let hh = h / 2.0;
    let corners = [
        m.transform_vector(Point::new(-hw, -hh)),
        m.transform_vector(Point::new(hw, -hh)),
        m.transform_vector(Point::new(-hw, hh)),
        m.transform_vector(Point::new(hw, hh)),
    ];
    let (min, max) = crate::intersect::bounds_of(&corners);
    max - min
}

// ─── Snapshot types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KindSnapshot {
    Rect { rx: f64 },
    Ellipse,
    Path(BezPath),
    Group,
}

/// The serializable property bag exchanged with external format
/// collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: KindSnapshot,
    pub left: f64,
    pub top: f64,
    pub origin_x: Origin,
    pub origin_y: Origin,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: f64,
    pub stroke_uniform: bool,
    pub shadow: Option<Shadow>,
    pub opacity: f32,
    pub visible: bool,
    pub locks: Locks,
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: f64, h: f64) -> SceneNode {
        let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        n.set_many([Prop::Width(w), Prop::Height(h)]);
        n
    }

    #[test]
    fn scaled_size_without_skew_is_exact() {
        let mut n = rect(100.0, 40.0);
        n.set_many([
            Prop::ScaleX(2.0),
            Prop::ScaleY(3.0),
            Prop::StrokeWidth(4.0),
        ]);
        assert_eq!(n.scaled_width(), (100.0 + 4.0) * 2.0);
        assert_eq!(n.scaled_height(), (40.0 + 4.0) * 3.0);

        // Rotation never affects the scaled size.
        n.set(Prop::Angle(37.0));
        assert_eq!(n.scaled_width(), (100.0 + 4.0) * 2.0);
    }

    #[test]
    fn uniform_stroke_is_added_after_scaling() {
        let mut n = rect(100.0, 40.0);
        n.set_many([
            Prop::ScaleX(2.0),
            Prop::StrokeWidth(4.0),
            Prop::StrokeUniform(true),
        ]);
        assert_eq!(n.scaled_width(), 100.0 * 2.0 + 4.0);
    }

    #[test]
    fn sheared_box_is_wider_than_scaled_width() {
        let mut n = rect(100.0, 100.0);
        n.set(Prop::SkewX(45.0));
        // tan(45°) adds the full height to the width.
        assert!((n.scaled_width() - 200.0).abs() < 1e-9);
        assert!((n.scaled_height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn setting_equal_value_does_not_remark_dirty() {
        let mut n = rect(100.0, 40.0);
        assert!(n.set(Prop::Width(50.0)));
        n.dirty = false;
        n.cache_dirty = false;
        assert!(!n.set(Prop::Width(50.0)));
        assert!(!n.dirty, "equal value must not re-mark dirty");
        assert!(!n.cache_dirty);
        assert!(n.set(Prop::Width(51.0)));
        assert!(n.dirty && n.cache_dirty);
    }

    #[test]
    fn move_is_not_cache_relevant() {
        let mut n = rect(10.0, 10.0);
        n.dirty = false;
        n.cache_dirty = false;
        assert!(n.set(Prop::Left(5.0)));
        assert!(n.dirty);
        assert!(!n.cache_dirty, "a move must not repaint the cache");
    }

    #[test]
    fn degenerate_scale_is_clamped() {
        let mut n = rect(10.0, 10.0);
        n.set(Prop::ScaleX(0.0));
        assert_eq!(n.scale_x, MIN_SCALE);
        n.set(Prop::ScaleY(-0.0));
        assert_eq!(n.scale_y, MIN_SCALE);
        n.set(Prop::ScaleX(-1e-12));
        assert_eq!(n.scale_x, -MIN_SCALE, "sign must be preserved");
    }

    #[test]
    fn center_for_near_origin() {
        let mut n = rect(100.0, 100.0);
        n.set_many([
            Prop::OriginX(Origin::Near),
            Prop::OriginY(Origin::Near),
            Prop::Left(0.0),
            Prop::Top(0.0),
            Prop::ScaleX(2.0),
            Prop::ScaleY(2.0),
        ]);
        // Anchor at the top-left corner: the center sits half the scaled
        // size away.
        assert_eq!(n.relative_center(), Point::new(100.0, 100.0));
        // With rotation, the center swings about the anchor.
        n.set(Prop::Angle(90.0));
        let c = n.relative_center();
        assert!((c.x - -100.0).abs() < 1e-9, "cx = {}", c.x);
        assert!((c.y - 100.0).abs() < 1e-9, "cy = {}", c.y);
    }

    #[test]
    fn position_by_origin_roundtrip() {
        let mut n = rect(80.0, 60.0);
        n.set_many([
            Prop::Left(10.0),
            Prop::Top(20.0),
            Prop::Angle(30.0),
            Prop::ScaleX(1.5),
        ]);
        let br = n.position_at(Point::new(0.5, 0.5));
        // Moving the bottom-right anchor to where it already is must not
        // move the node.
        n.set_position_by_origin(br, Point::new(0.5, 0.5));
        assert!((n.left - 10.0).abs() < 1e-9, "left = {}", n.left);
        assert!((n.top - 20.0).abs() < 1e-9, "top = {}", n.top);
    }

    #[test]
    fn own_matrix_memoized_until_fingerprint_changes() {
        let mut n = rect(50.0, 50.0);
        let m1 = n.own_matrix();
        let m2 = n.own_matrix();
        assert_eq!(m1, m2);
        n.set(Prop::Angle(10.0));
        let m3 = n.own_matrix();
        assert_ne!(m1, m3);
    }

    #[test]
    fn opacity_does_not_touch_transform_fingerprint() {
        let mut n = rect(50.0, 50.0);
        let before = n.transform_fingerprint();
        n.set(Prop::Opacity(0.5));
        assert_eq!(before, n.transform_fingerprint());
        n.set(Prop::ScaleX(2.0));
        assert_ne!(before, n.transform_fingerprint());
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut n = rect(100.0, 40.0);
        n.set_many([
            Prop::Angle(45.0),
            Prop::ScaleX(2.0),
            Prop::Fill(Some(Paint::Solid(crate::paint::Color::BLACK))),
        ]);
        let snap = n.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: NodeSnapshot = serde_json::from_str(&json).unwrap();
        let mut m = SceneNode::new(NodeKind::Ellipse);
        m.apply_snapshot(&back);
        assert_eq!(m.width, 100.0);
        assert_eq!(m.angle, 45.0);
        assert_eq!(m.scale_x, 2.0);
        assert!(matches!(m.kind, NodeKind::Rect { .. }));
        assert_eq!(m.fill, n.fill);
    }
}
