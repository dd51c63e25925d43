//! The render pipeline.
//!
//! One render pass: viewport transform, background, per-node painting with
//! off-screen culling, canvas clip-mask compositing, selection
//! decorations, overlay. Nodes draw from their raster cache when the cache
//! manager says so, directly otherwise.
//!
//! Render requests coalesce through [`FramePump`]: at most one pending
//! frame callback per renderer.

use crate::cache::{CacheRecord, RasterCache};
use crate::draw;
use crate::surface::{
    CompositeMode, FillResolver, FrameHandle, FramePump, FrameScheduler, OffscreenStore, Surface,
    pixel_scale,
};
use easel_core::config::{EngineConfig, Viewport};
use easel_core::geom::{Matrix, Point, plane_change};
use easel_core::scene::Scene;
use easel_core::NodeIndex;
use kurbo::Shape as _;
use peniko::{Brush, Color};

/// Side of a square selection handle, in device pixels.
pub const HANDLE_SIZE: f64 = 8.0;

/// How far past the top edge midpoint the rotate handle sits.
pub const ROTATE_HANDLE_OFFSET: f64 = 40.0;

fn selection_brush() -> Brush {
    Brush::Solid(Color::new([0.27, 0.51, 1.0, 1.0]))
}

fn opaque_brush() -> Brush {
    Brush::Solid(Color::new([1.0, 1.0, 1.0, 1.0]))
}

pub struct Renderer {
    config: EngineConfig,
    cache: RasterCache,
    pump: FramePump,
    rendering: bool,
    dispose_pending: bool,
    disposed: bool,
}

impl Renderer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: RasterCache::new(config),
            pump: FramePump::default(),
            rendering: false,
            dispose_pending: false,
            disposed: false,
        }
    }

    pub fn cache(&self) -> &RasterCache {
        &self.cache
    }

    // ─── Frame scheduling ────────────────────────────────────────────

    /// Ask for a render on the next display refresh. Requests while one is
    /// already pending are no-ops.
    pub fn request_render(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.disposed {
            return false;
        }
        self.pump.request(scheduler)
    }

    /// The scheduler fired. Returns whether the embedder should call
    /// [`Self::render`] now.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        !self.disposed && self.pump.on_frame(handle)
    }

    /// Tear down renderer resources. Requested mid-render, teardown is
    /// deferred until the in-flight pass completes.
    pub fn dispose(
        &mut self,
        store: &mut dyn OffscreenStore,
        scheduler: &mut dyn FrameScheduler,
    ) {
        if self.rendering {
            self.dispose_pending = true;
            return;
        }
        self.pump.cancel(scheduler);
        self.cache.release_all(store);
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ─── The pass ────────────────────────────────────────────────────

    pub fn render(
        &mut self,
        scene: &mut Scene,
        surface: &mut dyn Surface,
        store: &mut dyn OffscreenStore,
        fills: &dyn FillResolver,
        viewport: Viewport,
    ) {
        if self.disposed {
            return;
        }
        self.rendering = true;
        log::trace!("render pass start ({}x{})", viewport.width, viewport.height);

        surface.save();
        if let Some(bg) = scene.background.clone() {
            self.draw_backdrop(scene, surface, fills, &bg, viewport);
        }

        let top_level: Vec<NodeIndex> = scene.children(scene.root()).to_vec();
        for idx in top_level {
            if self.culled(scene, idx, viewport) {
                log::trace!("culled off-screen node {:?}", idx);
                continue;
            }
            self.render_node(scene, idx, surface, store, fills, 1.0);
        }

        if let Some(clip) = scene.clip_node() {
            self.composite_clip(scene, clip, surface);
        }

        if let Some(target) = scene.active_target() {
            self.draw_decorations(scene, target.index(), surface);
        }

        if let Some(ov) = scene.overlay.clone() {
            self.draw_backdrop(scene, surface, fills, &ov, viewport);
        }
        surface.restore();

        self.cache.sweep(scene, store);
        self.rendering = false;
        if self.dispose_pending {
            self.dispose_pending = false;
            self.cache.release_all(store);
            self.disposed = true;
        }
    }

    /// Off-screen test on the axis-aligned bounds of the screen corners. A
    /// node straddling the viewport edge always renders.
    fn culled(&self, scene: &mut Scene, idx: NodeIndex, viewport: Viewport) -> bool {
        let (min, max) = scene.screen_corners(idx).bounds();
        max.x < 0.0 || max.y < 0.0 || min.x > viewport.width || min.y > viewport.height
    }

    fn draw_backdrop(
        &self,
        scene: &Scene,
        surface: &mut dyn Surface,
        fills: &dyn FillResolver,
        backdrop: &easel_core::scene::Backdrop,
        viewport: Viewport,
    ) {
        surface.save();
        let rect = if backdrop.viewport_aware {
            // Pans and zooms with the content: fill the world-space region
            // the viewport currently shows.
            surface.set_transform(scene.viewport_transform());
            let tl = scene.restore_pointer_vpt(Point::ZERO);
            let br = scene.restore_pointer_vpt(Point::new(viewport.width, viewport.height));
            let min = tl.min(br);
            let max = tl.max(br);
            kurbo::Rect::new(min.x, min.y, max.x, max.y)
        } else {
            surface.set_transform(Matrix::IDENTITY);
            kurbo::Rect::new(0.0, 0.0, viewport.width, viewport.height)
        };
        surface.fill_path(&rect.to_path(0.1), &fills.resolve(&backdrop.paint));
        surface.restore();
    }

    fn render_node(
        &mut self,
        scene: &mut Scene,
        idx: NodeIndex,
        surface: &mut dyn Surface,
        store: &mut dyn OffscreenStore,
        fills: &dyn FillResolver,
        inherited_opacity: f32,
    ) {
        let node = scene.node_ref(idx);
        if draw::skippable(node, inherited_opacity) {
            return;
        }
        let opacity = node.opacity * inherited_opacity;
        let shadow = node.shadow;
        let is_group = node.kind.is_group();

        let full = scene.full_matrix(idx);
        let device = scene.viewport_transform().multiply(&full);

        surface.save();
        surface.set_opacity(opacity);
        surface.set_shadow(shadow.as_ref());

        if self.cache.should_cache(scene, idx) {
            let dirty = subtree_content_dirty(scene, idx);
            if let Some(out) = self.cache.ensure(scene, idx, store, dirty) {
                if out.repaint {
                    self.paint_cache_content(scene, idx, &out.record, store, fills);
                }
                let rec = out.record;
                let unzoom = Matrix::scaling(
                    1.0 / rec.zoom_x.max(f64::MIN_POSITIVE),
                    1.0 / rec.zoom_y.max(f64::MIN_POSITIVE),
                );
                surface.set_transform(device.multiply(&unzoom));
                surface.draw_bitmap(rec.bitmap, -rec.offset_x, -rec.offset_y);
                surface.restore();
                scene.node_mut(idx).dirty = false;
                return;
            }
            // Allocation failed: this node draws direct, nothing else fails.
        }

        surface.set_transform(device);
        let scale = pixel_scale(&device);
        draw::draw_primitive(surface, scene.node_ref(idx), fills, scale);
        if is_group {
            let children: Vec<NodeIndex> = scene.children(idx).to_vec();
            for child in children {
                self.render_node(scene, child, surface, store, fills, opacity);
            }
        }
        surface.restore();

        let node = scene.node_mut(idx);
        node.dirty = false;
        node.cache_dirty = false;
    }

    /// Repaint a node's cache bitmap: clear, draw the primitive (and, for
    /// a cached group, the whole subtree in group-relative planes), then
    /// composite the group clip mask.
    fn paint_cache_content(
        &mut self,
        scene: &mut Scene,
        idx: NodeIndex,
        rec: &CacheRecord,
        store: &mut dyn OffscreenStore,
        fills: &dyn FillResolver,
    ) {
        let group_plane = scene.full_matrix(idx);
        let clip = scene
            .node_ref(idx)
            .group_state()
            .and_then(|g| g.clip_path);
        let is_group = scene.node_ref(idx).kind.is_group();
        let base = Matrix::translation(rec.offset_x, rec.offset_y)
            .multiply(&Matrix::scaling(rec.zoom_x, rec.zoom_y));

        let surf = store.surface(rec.bitmap);
        surf.save();
        surf.set_transform(Matrix::IDENTITY);
        surf.clear_region(0.0, 0.0, rec.width as f64, rec.height as f64);

        surf.set_transform(base);
        draw::draw_primitive(
            surf,
            scene.node_ref(idx),
            fills,
            Point::new(rec.zoom_x, rec.zoom_y),
        );
        if is_group {
            paint_descendants(scene, idx, &group_plane, &base, surf, fills);
        }

        if let Some(clip) = clip
            && scene.node(clip).is_some()
        {
            surf.set_composite(CompositeMode::DestinationIn);
            let own = scene.node_mut(clip).own_matrix();
            surf.set_transform(base.multiply(&own));
            if let Some(path) = draw::primitive_path(scene.node_ref(clip)) {
                surf.fill_path(&path, &opaque_brush());
            }
            surf.set_composite(CompositeMode::SourceOver);
        }
        surf.restore();

        let node = scene.node_mut(idx);
        node.cache_dirty = false;
    }

    /// Canvas clip mask: keep existing pixels only where the clip shape is
    /// opaque.
    fn composite_clip(&mut self, scene: &mut Scene, clip: NodeIndex, surface: &mut dyn Surface) {
        if scene.node(clip).is_none() {
            return;
        }
        surface.set_composite(CompositeMode::DestinationIn);
        surface.save();
        let m = scene.viewport_transform().multiply(&scene.full_matrix(clip));
        surface.set_transform(m);
        if let Some(path) = draw::primitive_path(scene.node_ref(clip)) {
            surface.fill_path(&path, &opaque_brush());
        }
        surface.restore();
        surface.set_composite(CompositeMode::SourceOver);
    }

    /// Border and handle affordances for the active selection, drawn in
    /// device space on top of the content.
    fn draw_decorations(&self, scene: &mut Scene, idx: NodeIndex, surface: &mut dyn Surface) {
        if scene.node(idx).is_none() {
            return;
        }
        let corners = scene.screen_corners_padded(idx, self.config.control_padding);
        let brush = selection_brush();

        surface.save();
        surface.set_transform(Matrix::IDENTITY);

        let mut border = kurbo::BezPath::new();
        let pts = corners.loop_points();
        border.move_to(kurbo::Point::from(pts[0]));
        for p in &pts[1..] {
            border.line_to(kurbo::Point::from(*p));
        }
        border.close_path();
        surface.stroke_path(&border, 1.0, &brush);

        let mut handles: Vec<Point> = pts.to_vec();
        handles.extend(corners.edge_midpoints());
        handles.push(corners.rotate_handle(ROTATE_HANDLE_OFFSET));
        let half = HANDLE_SIZE / 2.0;
        for h in handles {
            let rect = kurbo::Rect::new(h.x - half, h.y - half, h.x + half, h.y + half);
            surface.fill_path(&rect.to_path(0.1), &brush);
        }
        surface.restore();
    }
}

/// Staleness signal for a node's cache: its own content dirt, plus — for a
/// cached subtree — any geometry or content change below it.
fn subtree_content_dirty(scene: &Scene, idx: NodeIndex) -> bool {
    let node = scene.node_ref(idx);
    if node.cache_dirty {
        return true;
    }
    scene
        .children(idx)
        .iter()
        .any(|&child| {
            let n = scene.node_ref(child);
            n.dirty || n.cache_dirty || subtree_content_dirty(scene, child)
        })
}

/// Paint every descendant of a cached group into its bitmap, each in its
/// plane relative to the group.
fn paint_descendants(
    scene: &mut Scene,
    container: NodeIndex,
    group_plane: &Matrix,
    base: &Matrix,
    surf: &mut dyn Surface,
    fills: &dyn FillResolver,
) {
    let children: Vec<NodeIndex> = scene.children(container).to_vec();
    for child in children {
        let full = scene.full_matrix(child);
        let rel = match plane_change(&full, group_plane) {
            Ok(m) => m,
            Err(_) => {
                log::warn!("skipping child {:?} of degenerate cached group", child);
                continue;
            }
        };
        let m = base.multiply(&rel);
        {
            let node = scene.node_ref(child);
            if node.visible && node.opacity > 0.0 {
                surf.set_transform(m);
                surf.set_opacity(node.opacity);
                draw::draw_primitive(surf, node, fills, pixel_scale(&m));
            }
        }
        paint_descendants(scene, child, group_plane, base, surf, fills);
        let node = scene.node_mut(child);
        node.dirty = false;
        node.cache_dirty = false;
    }
}
