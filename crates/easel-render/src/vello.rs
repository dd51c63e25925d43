//! Vello scene-recording backend.
//!
//! Records fills, strokes, and clip compositing into a `vello::Scene` for
//! GPU presentation by the embedder. Vello has no CPU-side rasterization,
//! so this backend ships no offscreen store — pair it with
//! [`DisabledOffscreenStore`](crate::surface) and nodes draw direct, which
//! the cache manager's failure path already handles.

use crate::surface::{BitmapId, CompositeMode, Surface};
use easel_core::geom::Matrix;
use easel_core::paint::Shadow;
use kurbo::{Affine, BezPath};
use peniko::{BlendMode, Brush, Color, Compose, Fill, Mix};
use ::vello::Scene;

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Matrix,
    opacity: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            opacity: 1.0,
        }
    }
}

/// A [`Surface`] writing into a `vello::Scene`.
pub struct VelloSurface<'a> {
    scene: &'a mut Scene,
    state: DrawState,
    stack: Vec<DrawState>,
    clip_layers: u32,
}

impl<'a> VelloSurface<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self {
            scene,
            state: DrawState::default(),
            stack: Vec::new(),
            clip_layers: 0,
        }
    }

    fn affine(&self) -> Affine {
        Affine::from(self.state.transform)
    }

    /// Fold the tracked opacity into solid brushes; gradient alpha is the
    /// resolver's business.
    fn with_opacity(&self, brush: &Brush) -> Brush {
        if self.state.opacity >= 1.0 {
            return brush.clone();
        }
        match brush {
            Brush::Solid(c) => {
                let mut components = c.components;
                components[3] *= self.state.opacity;
                Brush::Solid(Color::new(components))
            }
            other => other.clone(),
        }
    }
}

impl Surface for VelloSurface<'_> {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_transform(&mut self, m: Matrix) {
        self.state.transform = m;
    }

    fn set_opacity(&mut self, alpha: f32) {
        self.state.opacity = alpha;
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        match mode {
            CompositeMode::DestinationIn => {
                // Everything drawn until the reset becomes a mask: on pop,
                // existing pixels survive only where the layer is opaque.
                self.scene.push_layer(
                    BlendMode::new(Mix::Normal, Compose::DestIn),
                    1.0,
                    Affine::IDENTITY,
                    &kurbo::Rect::new(-1e7, -1e7, 1e7, 1e7),
                );
                self.clip_layers += 1;
            }
            CompositeMode::SourceOver => {
                if self.clip_layers > 0 {
                    self.scene.pop_layer();
                    self.clip_layers -= 1;
                }
            }
        }
    }

    fn set_shadow(&mut self, shadow: Option<&Shadow>) {
        if shadow.is_some() {
            // Vello has no shadow primitive; embedders that need shadows
            // pre-blur through their own backend.
            log::trace!("shadow ignored by vello backend");
        }
    }

    fn clear_region(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
        // A vello scene starts empty every frame; there is nothing to clear.
    }

    fn fill_path(&mut self, path: &BezPath, brush: &Brush) {
        let brush = self.with_opacity(brush);
        self.scene
            .fill(Fill::NonZero, self.affine(), &brush, None, path);
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, brush: &Brush) {
        let brush = self.with_opacity(brush);
        let stroke = kurbo::Stroke::new(width);
        self.scene.stroke(&stroke, self.affine(), &brush, None, path);
    }

    fn draw_bitmap(&mut self, bitmap: BitmapId, _x: f64, _y: f64) {
        log::trace!("bitmap {:?} ignored: vello backend has no offscreen store", bitmap);
    }
}
