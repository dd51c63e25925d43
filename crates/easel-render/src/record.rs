//! Command-recording backend.
//!
//! `RecordingSurface` captures draw calls as a display list — the reference
//! backend for tests and a building block for embedders that replay
//! command streams. `MemoryOffscreenStore` pairs it with in-memory cache
//! bitmaps.

use crate::surface::{BitmapId, CompositeMode, OffscreenStore, Surface};
use easel_core::geom::Matrix;
use easel_core::paint::Shadow;
use kurbo::BezPath;
use peniko::Brush;
use std::collections::HashMap;

/// One recorded surface operation.
#[derive(Debug, Clone)]
pub enum DrawCmd {
    Save,
    Restore,
    SetTransform(Matrix),
    SetOpacity(f32),
    SetComposite(CompositeMode),
    SetShadow(Option<Shadow>),
    ClearRegion { x: f64, y: f64, width: f64, height: f64 },
    FillPath { path: BezPath, brush: Brush },
    StrokePath { path: BezPath, width: f64, brush: Brush },
    DrawBitmap { bitmap: BitmapId, x: f64, y: f64 },
}

/// A surface that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCmd>,
}

impl RecordingSurface {
    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Count of actual paint operations (fills, strokes, blits), ignoring
    /// state changes.
    pub fn paint_ops(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DrawCmd::FillPath { .. } | DrawCmd::StrokePath { .. } | DrawCmd::DrawBitmap { .. }
                )
            })
            .count()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.commands.push(DrawCmd::Save);
    }
    fn restore(&mut self) {
        self.commands.push(DrawCmd::Restore);
    }
    fn set_transform(&mut self, m: Matrix) {
        self.commands.push(DrawCmd::SetTransform(m));
    }
    fn set_opacity(&mut self, alpha: f32) {
        self.commands.push(DrawCmd::SetOpacity(alpha));
    }
    fn set_composite(&mut self, mode: CompositeMode) {
        self.commands.push(DrawCmd::SetComposite(mode));
    }
    fn set_shadow(&mut self, shadow: Option<&Shadow>) {
        self.commands.push(DrawCmd::SetShadow(shadow.copied()));
    }
    fn clear_region(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCmd::ClearRegion { x, y, width, height });
    }
    fn fill_path(&mut self, path: &BezPath, brush: &Brush) {
        self.commands.push(DrawCmd::FillPath {
            path: path.clone(),
            brush: brush.clone(),
        });
    }
    fn stroke_path(&mut self, path: &BezPath, width: f64, brush: &Brush) {
        self.commands.push(DrawCmd::StrokePath {
            path: path.clone(),
            width,
            brush: brush.clone(),
        });
    }
    fn draw_bitmap(&mut self, bitmap: BitmapId, x: f64, y: f64) {
        self.commands.push(DrawCmd::DrawBitmap { bitmap, x, y });
    }
}

/// In-memory offscreen bitmap record.
#[derive(Debug, Default)]
pub struct MemoryBitmap {
    pub width: u32,
    pub height: u32,
    pub surface: RecordingSurface,
    pub resize_count: u32,
}

/// In-memory store backing the raster cache in tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryOffscreenStore {
    bitmaps: HashMap<BitmapId, MemoryBitmap>,
    next: u64,
    /// Simulate allocation failure (budget exhaustion) in tests.
    pub fail_allocations: bool,
}

impl MemoryOffscreenStore {
    pub fn bitmap(&self, id: BitmapId) -> Option<&MemoryBitmap> {
        self.bitmaps.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}

impl OffscreenStore for MemoryOffscreenStore {
    fn allocate(&mut self, width: u32, height: u32) -> Option<BitmapId> {
        if self.fail_allocations {
            return None;
        }
        self.next += 1;
        let id = BitmapId(self.next);
        self.bitmaps.insert(
            id,
            MemoryBitmap {
                width,
                height,
                surface: RecordingSurface::default(),
                resize_count: 0,
            },
        );
        Some(id)
    }

    fn resize(&mut self, id: BitmapId, width: u32, height: u32) {
        if let Some(b) = self.bitmaps.get_mut(&id) {
            b.width = width;
            b.height = height;
            b.resize_count += 1;
            b.surface.clear_commands();
        }
    }

    fn surface(&mut self, id: BitmapId) -> &mut dyn Surface {
        &mut self
            .bitmaps
            .get_mut(&id)
            .expect("drawing into a released bitmap")
            .surface
    }

    fn release(&mut self, id: BitmapId) {
        self.bitmaps.remove(&id);
    }
}
