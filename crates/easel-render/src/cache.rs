//! Per-node raster caching.
//!
//! A cached node pre-renders into an offscreen bitmap sized to its
//! effective on-screen resolution, clamped under a global side/area
//! budget. The bitmap is reused across frames and blitted back until its
//! content goes stale; small size fluctuations reuse the buffer instead of
//! reallocating.

use crate::surface::{BitmapId, OffscreenStore, pixel_scale};
use easel_core::config::EngineConfig;
use easel_core::node::NodeKind;
use easel_core::scene::Scene;
use easel_core::NodeIndex;
use std::collections::HashMap;

/// Extra pixels on each side of the content so antialiased edges don't
/// clip at the bitmap boundary.
pub const AA_MARGIN: f64 = 4.0;

/// A required size below this fraction of the allocated size triggers a
/// shrink; anything closer reuses the buffer to avoid thrashing.
pub const SHRINK_HYSTERESIS: f64 = 0.9;

const ZOOM_EPSILON: f64 = 1e-6;

/// Target bitmap geometry for one node at the current effective scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheDims {
    pub width: u32,
    pub height: u32,
    /// Zoom baked into the bitmap. Lower than the on-screen scale when the
    /// budget capped the size.
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub capped: bool,
}

/// Live cache state for one node. Owned by the manager, keyed by the
/// node's arena handle, exactly one per cached node.
#[derive(Debug, Clone, Copy)]
pub struct CacheRecord {
    pub bitmap: BitmapId,
    pub width: u32,
    pub height: u32,
    pub zoom_x: f64,
    pub zoom_y: f64,
    /// Translation that re-centers object-space content in the bitmap.
    pub offset_x: f64,
    pub offset_y: f64,
}

/// What the pipeline needs to know after [`RasterCache::ensure`]: where to
/// blit from and whether the bitmap must be repainted first.
#[derive(Debug, Clone, Copy)]
pub struct EnsureOutcome {
    pub record: CacheRecord,
    pub repaint: bool,
}

pub struct RasterCache {
    config: EngineConfig,
    records: HashMap<NodeIndex, CacheRecord>,
}

impl RasterCache {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    pub fn record(&self, idx: NodeIndex) -> Option<&CacheRecord> {
        self.records.get(&idx)
    }

    /// Whether this node should render through its own bitmap: caching is
    /// enabled for it, and it is either outside any cached ancestor or
    /// structurally requires isolation (clip mask, or fill + stroke with a
    /// shadow).
    pub fn should_cache(&self, scene: &Scene, idx: NodeIndex) -> bool {
        let node = scene.node_ref(idx);
        if !self.config.object_caching || !node.cache_enabled {
            return false;
        }
        // Groups rasterize as a unit only when asked to.
        if let Some(state) = node.group_state()
            && !state.subtree_caching
            && state.clip_path.is_none()
        {
            return false;
        }
        requires_isolation(scene, idx) || !self.inside_cached_ancestor(scene, idx)
    }

    fn inside_cached_ancestor(&self, scene: &Scene, idx: NodeIndex) -> bool {
        let mut current = idx;
        while let Some(parent) = scene.parent_of(current) {
            if parent == scene.root() {
                return false;
            }
            let node = scene.node_ref(parent);
            if node.cache_enabled
                && node
                    .group_state()
                    .is_some_and(|g| g.subtree_caching || g.clip_path.is_some())
            {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Desired bitmap geometry: untransformed size × total effective scale
    /// (own × ancestors × viewport zoom × device pixel ratio) plus the
    /// antialiasing margin, clamped under the budget.
    pub fn dims_for(&self, scene: &mut Scene, idx: NodeIndex) -> CacheDims {
        let full = scene.full_matrix(idx);
        let device = scene.viewport_transform().multiply(&full);
        let scale = pixel_scale(&device);
        let zoom_x = scale.x * self.config.device_pixel_ratio;
        let zoom_y = scale.y * self.config.device_pixel_ratio;

        let node = scene.node_ref(idx);
        let stroke = if node.stroke_uniform { 0.0 } else { node.stroke_width };
        let base_w = node.width + stroke;
        let base_h = node.height + stroke;

        self.limit_dims(
            base_w * zoom_x + 2.0 * AA_MARGIN,
            base_h * zoom_y + 2.0 * AA_MARGIN,
            zoom_x,
            zoom_y,
        )
    }

    /// Clamp ideal pixel dimensions into the configured budget, shrinking
    /// proportionally and recording the zoom actually baked in.
    fn limit_dims(&self, width: f64, height: f64, zoom_x: f64, zoom_y: f64) -> CacheDims {
        let min = self.config.min_cache_side as f64;
        let max = self.config.max_cache_side as f64;
        let max_area = self.config.max_cache_area as f64;

        let width = width.max(1.0);
        let height = height.max(1.0);

        if width <= max && height <= max && width * height <= max_area {
            return CacheDims {
                width: width.max(min).ceil() as u32,
                height: height.max(min).ceil() as u32,
                zoom_x,
                zoom_y,
                capped: false,
            };
        }

        // Over budget: shrink both axes proportionally. The aspect ratio
        // picks how the area budget splits between them.
        let ar = width / height;
        let rough_w = (max_area * ar).sqrt();
        let rough_h = max_area / rough_w;
        let cap_w = rough_w.clamp(min, max);
        let cap_h = rough_h.clamp(min, max);

        let mut out = CacheDims {
            width: width.max(min).ceil() as u32,
            height: height.max(min).ceil() as u32,
            zoom_x,
            zoom_y,
            capped: false,
        };
        if width > cap_w {
            out.zoom_x /= width / cap_w;
            out.width = cap_w.floor() as u32;
            out.capped = true;
        }
        if height > cap_h {
            out.zoom_y /= height / cap_h;
            out.height = cap_h.floor() as u32;
            out.capped = true;
        }
        out
    }

    /// Bring the node's cache record up to date with its current required
    /// geometry. Returns `None` when bitmap allocation fails — the caller
    /// falls back to direct drawing for this node only.
    ///
    /// `content_dirty` is the staleness signal from the node (and, for a
    /// cached subtree, its descendants).
    pub fn ensure(
        &mut self,
        scene: &mut Scene,
        idx: NodeIndex,
        store: &mut dyn OffscreenStore,
        content_dirty: bool,
    ) -> Option<EnsureOutcome> {
        let dims = self.dims_for(scene, idx);

        if let Some(rec) = self.records.get_mut(&idx) {
            let grew = dims.width > rec.width || dims.height > rec.height;
            let shrunk = (dims.width as f64) < rec.width as f64 * SHRINK_HYSTERESIS
                || (dims.height as f64) < rec.height as f64 * SHRINK_HYSTERESIS;
            let zoom_changed = (dims.zoom_x - rec.zoom_x).abs() > ZOOM_EPSILON
                || (dims.zoom_y - rec.zoom_y).abs() > ZOOM_EPSILON;

            let repaint;
            if grew || shrunk {
                store.resize(rec.bitmap, dims.width, dims.height);
                rec.width = dims.width;
                rec.height = dims.height;
                rec.zoom_x = dims.zoom_x;
                rec.zoom_y = dims.zoom_y;
                rec.offset_x = dims.width as f64 / 2.0;
                rec.offset_y = dims.height as f64 / 2.0;
                repaint = true;
                log::debug!(
                    "cache resize {:?} -> {}x{} (zoom {:.3}x{:.3})",
                    idx,
                    dims.width,
                    dims.height,
                    dims.zoom_x,
                    dims.zoom_y
                );
            } else if zoom_changed {
                // Same buffer, new bake resolution.
                rec.zoom_x = dims.zoom_x;
                rec.zoom_y = dims.zoom_y;
                repaint = true;
            } else {
                repaint = content_dirty;
            }
            return Some(EnsureOutcome {
                record: *rec,
                repaint,
            });
        }

        let bitmap = match store.allocate(dims.width, dims.height) {
            Some(id) => id,
            None => {
                log::warn!(
                    "offscreen allocation failed for {:?} ({}x{}), drawing direct",
                    idx,
                    dims.width,
                    dims.height
                );
                return None;
            }
        };
        let rec = CacheRecord {
            bitmap,
            width: dims.width,
            height: dims.height,
            zoom_x: dims.zoom_x,
            zoom_y: dims.zoom_y,
            offset_x: dims.width as f64 / 2.0,
            offset_y: dims.height as f64 / 2.0,
        };
        self.records.insert(idx, rec);
        Some(EnsureOutcome {
            record: rec,
            repaint: true,
        })
    }

    /// Release one node's bitmap, e.g. on disposal.
    pub fn release(&mut self, idx: NodeIndex, store: &mut dyn OffscreenStore) {
        if let Some(rec) = self.records.remove(&idx) {
            store.release(rec.bitmap);
        }
    }

    pub fn release_all(&mut self, store: &mut dyn OffscreenStore) {
        for (_, rec) in self.records.drain() {
            store.release(rec.bitmap);
        }
    }

    /// Drop records for nodes no longer in the scene.
    pub fn sweep(&mut self, scene: &Scene, store: &mut dyn OffscreenStore) {
        let stale: Vec<NodeIndex> = self
            .records
            .keys()
            .copied()
            .filter(|&idx| scene.node(idx).is_none())
            .collect();
        for idx in stale {
            self.release(idx, store);
        }
    }
}

/// Clip masks and shadowed fill+stroke pairs must composite in isolation,
/// which forces an own bitmap even inside a cached ancestor.
fn requires_isolation(scene: &Scene, idx: NodeIndex) -> bool {
    let node = scene.node_ref(idx);
    if let NodeKind::Group(state) = &node.kind
        && state.clip_path.is_some()
    {
        return true;
    }
    node.shadow.is_some() && node.fill.is_some() && node.stroke.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MemoryOffscreenStore;
    use easel_core::geom::Matrix;
    use easel_core::node::{NodeKind, Prop, SceneNode};
    use easel_core::paint::{Color, Paint, Shadow};

    fn scene_with_rect(w: f64, h: f64) -> (Scene, NodeIndex) {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        n.set_many([Prop::Width(w), Prop::Height(h)]);
        let idx = scene.add(root, n).unwrap();
        (scene, idx)
    }

    #[test]
    fn dims_respect_budget_at_any_zoom() {
        let config = EngineConfig::default();
        let cache = RasterCache::new(config);
        let (mut scene, idx) = scene_with_rect(100.0, 100.0);

        for zoom in [0.001, 0.5, 1.0, 10.0, 100.0, 1000.0] {
            scene.set_viewport_transform(Matrix::scaling(zoom, zoom));
            let dims = cache.dims_for(&mut scene, idx);
            assert!(
                dims.width <= config.max_cache_side && dims.height <= config.max_cache_side,
                "side over budget at zoom {zoom}: {}x{}",
                dims.width,
                dims.height
            );
            assert!(
                (dims.width as u64) * (dims.height as u64) <= config.max_cache_area,
                "area over budget at zoom {zoom}"
            );
            assert!(
                dims.width >= config.min_cache_side && dims.height >= config.min_cache_side,
                "side under minimum at zoom {zoom}"
            );
        }
    }

    #[test]
    fn capped_dims_record_reduced_zoom() {
        let cache = RasterCache::new(EngineConfig::default());
        let (mut scene, idx) = scene_with_rect(100.0, 100.0);
        scene.set_viewport_transform(Matrix::scaling(1000.0, 1000.0));
        let dims = cache.dims_for(&mut scene, idx);
        assert!(dims.capped);
        assert!(
            dims.zoom_x < 1000.0 && dims.zoom_y < 1000.0,
            "baked zoom must drop with the capped size"
        );
    }

    #[test]
    fn resize_hysteresis_avoids_thrash() {
        let mut cache = RasterCache::new(EngineConfig::default());
        let mut store = MemoryOffscreenStore::default();
        let (mut scene, idx) = scene_with_rect(500.0, 500.0);

        let first = cache.ensure(&mut scene, idx, &mut store, true).unwrap();
        assert!(first.repaint);
        let id = first.record.bitmap;
        assert_eq!(store.bitmap(id).unwrap().resize_count, 0);

        // Shrink slightly (95%): inside hysteresis, buffer reused.
        scene.set_viewport_transform(Matrix::scaling(0.95, 0.95));
        let out = cache.ensure(&mut scene, idx, &mut store, false).unwrap();
        assert!(out.repaint, "zoom changed, content re-bakes");
        assert_eq!(
            store.bitmap(id).unwrap().resize_count,
            0,
            "no reallocation inside the hysteresis band"
        );

        // Shrink far below 90%: reallocates smaller.
        scene.set_viewport_transform(Matrix::scaling(0.5, 0.5));
        let out = cache.ensure(&mut scene, idx, &mut store, false).unwrap();
        assert!(out.repaint);
        assert_eq!(store.bitmap(id).unwrap().resize_count, 1);

        // Grow: reallocates.
        scene.set_viewport_transform(Matrix::scaling(2.0, 2.0));
        cache.ensure(&mut scene, idx, &mut store, false).unwrap();
        assert_eq!(store.bitmap(id).unwrap().resize_count, 2);
    }

    #[test]
    fn unchanged_clean_node_skips_repaint() {
        let mut cache = RasterCache::new(EngineConfig::default());
        let mut store = MemoryOffscreenStore::default();
        let (mut scene, idx) = scene_with_rect(100.0, 100.0);

        cache.ensure(&mut scene, idx, &mut store, true).unwrap();
        let out = cache.ensure(&mut scene, idx, &mut store, false).unwrap();
        assert!(!out.repaint, "clean node with stable geometry reuses pixels");
        let out = cache.ensure(&mut scene, idx, &mut store, true).unwrap();
        assert!(out.repaint, "content dirt forces a repaint");
    }

    #[test]
    fn allocation_failure_degrades_gracefully() {
        let mut cache = RasterCache::new(EngineConfig::default());
        let mut store = MemoryOffscreenStore::default();
        store.fail_allocations = true;
        let (mut scene, idx) = scene_with_rect(100.0, 100.0);
        assert!(cache.ensure(&mut scene, idx, &mut store, true).is_none());
        assert!(cache.record(idx).is_none(), "no record on failure");
    }

    #[test]
    fn child_inside_cached_group_does_not_cache() {
        let config = EngineConfig::default();
        let cache = RasterCache::new(config);
        let mut scene = Scene::new();
        let root = scene.root();

        let mut group_node = SceneNode::new(NodeKind::group());
        group_node.group_state_mut().unwrap().subtree_caching = true;
        let group = scene.add(root, group_node).unwrap();

        let mut child = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        child.set_many([Prop::Width(10.0), Prop::Height(10.0)]);
        let child = scene.add(root, child).unwrap();
        scene.enter_group(child, group, true).unwrap();

        assert!(cache.should_cache(&scene, group));
        assert!(
            !cache.should_cache(&scene, child),
            "a node inside a cached ancestor never keeps its own cache"
        );
    }

    #[test]
    fn isolation_overrides_cached_ancestor() {
        let cache = RasterCache::new(EngineConfig::default());
        let mut scene = Scene::new();
        let root = scene.root();

        let mut group_node = SceneNode::new(NodeKind::group());
        group_node.group_state_mut().unwrap().subtree_caching = true;
        let group = scene.add(root, group_node).unwrap();

        // Fill + stroke + shadow needs its own compositing space.
        let mut child = SceneNode::new(NodeKind::Rect { rx: 0.0 });
        child.set_many([
            Prop::Width(10.0),
            Prop::Height(10.0),
            Prop::Fill(Some(Paint::Solid(Color::BLACK))),
            Prop::Stroke(Some(Paint::Solid(Color::BLACK))),
            Prop::StrokeWidth(2.0),
            Prop::Shadow(Some(Shadow {
                color: Color::BLACK,
                blur: 4.0,
                offset_x: 2.0,
                offset_y: 2.0,
            })),
        ]);
        let child = scene.add(root, child).unwrap();
        scene.enter_group(child, group, true).unwrap();

        assert!(cache.should_cache(&scene, child));
    }
}
