//! The drawing-surface boundary.
//!
//! The engine draws through these interfaces and never talks to a backend
//! directly: a [`Surface`] receives paths and bitmaps, an
//! [`OffscreenStore`] hands out offscreen bitmaps for the raster cache, a
//! [`FillResolver`] turns paint descriptors into backend brushes, and a
//! [`FrameScheduler`] provides display-refresh callbacks.

use easel_core::geom::{Matrix, Point};
use easel_core::paint::{Paint, Shadow};
use kurbo::BezPath;
use peniko::{Brush, Color, ColorStop, Gradient};

/// Opaque handle to an offscreen bitmap owned by an [`OffscreenStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapId(pub u64);

/// Compositing modes the pipeline needs from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Keep existing pixels only where the incoming content is opaque.
    /// Used for clip-mask compositing.
    DestinationIn,
}

/// Minimal retained-state drawing target. Transform, opacity, shadow, and
/// composite mode are surface state bracketed by `save`/`restore`.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn set_transform(&mut self, m: Matrix);
    fn set_opacity(&mut self, alpha: f32);
    fn set_composite(&mut self, mode: CompositeMode);
    fn set_shadow(&mut self, shadow: Option<&Shadow>);
    fn clear_region(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_path(&mut self, path: &BezPath, brush: &Brush);
    fn stroke_path(&mut self, path: &BezPath, width: f64, brush: &Brush);
    /// Draw a cached bitmap with its top-left at `(x, y)` in the current
    /// transform's space, one unit per bitmap pixel.
    fn draw_bitmap(&mut self, bitmap: BitmapId, x: f64, y: f64);
}

/// Offscreen bitmap allocator for the raster cache. `allocate` may fail;
/// the pipeline degrades the affected node to direct drawing.
pub trait OffscreenStore {
    fn allocate(&mut self, width: u32, height: u32) -> Option<BitmapId>;
    fn resize(&mut self, id: BitmapId, width: u32, height: u32);
    fn surface(&mut self, id: BitmapId) -> &mut dyn Surface;
    fn release(&mut self, id: BitmapId);
}

/// Paint descriptor → backend brush. Color parsing and pattern resolution
/// live entirely behind this boundary.
pub trait FillResolver {
    fn resolve(&self, paint: &Paint) -> Brush;
}

/// Straightforward resolver for solid colors and the built-in gradient
/// descriptors. Embedders with pattern fills supply their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFillResolver;

fn convert_color(c: easel_core::paint::Color) -> Color {
    Color::new([c.r, c.g, c.b, c.a])
}

fn convert_stops(stops: &[easel_core::paint::GradientStop]) -> Vec<ColorStop> {
    stops
        .iter()
        .map(|s| ColorStop::from((s.offset, convert_color(s.color))))
        .collect()
}

impl FillResolver for BasicFillResolver {
    fn resolve(&self, paint: &Paint) -> Brush {
        match paint {
            Paint::Solid(c) => Brush::Solid(convert_color(*c)),
            Paint::LinearGradient { start, end, stops } => {
                let stops = convert_stops(stops);
                Brush::Gradient(
                    Gradient::new_linear(
                        kurbo::Point::from(*start),
                        kurbo::Point::from(*end),
                    )
                    .with_stops(stops.as_slice()),
                )
            }
            Paint::RadialGradient {
                center,
                radius,
                stops,
            } => {
                let stops = convert_stops(stops);
                Brush::Gradient(
                    Gradient::new_radial(kurbo::Point::from(*center), *radius as f32)
                        .with_stops(stops.as_slice()),
                )
            }
        }
    }
}

/// An [`OffscreenStore`] for backends without offscreen bitmaps (e.g.
/// vello scene recording): every allocation fails, so the pipeline draws
/// each node directly.
#[derive(Default)]
pub struct DisabledOffscreenStore {
    // Never drawn into; exists so `surface()` has something to return.
    sink: crate::record::RecordingSurface,
}

impl OffscreenStore for DisabledOffscreenStore {
    fn allocate(&mut self, _width: u32, _height: u32) -> Option<BitmapId> {
        None
    }
    fn resize(&mut self, _id: BitmapId, _width: u32, _height: u32) {}
    fn surface(&mut self, _id: BitmapId) -> &mut dyn Surface {
        &mut self.sink
    }
    fn release(&mut self, _id: BitmapId) {}
}

/// Handle to a pending display-refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub u64);

/// Display-refresh callback source. The embedder calls back into the
/// renderer exactly once per granted frame.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Coalesces render requests: at most one frame callback is outstanding at
/// a time, duplicate requests are no-ops, and cancellation forgets the
/// pending callback.
#[derive(Debug, Default)]
pub struct FramePump {
    pending: Option<FrameHandle>,
}

impl FramePump {
    /// Ask for a frame unless one is already pending. Returns whether a new
    /// request was issued.
    pub fn request(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(scheduler.request_frame());
        true
    }

    /// The scheduler fired. Returns whether a render should run now.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        match self.pending {
            Some(pending) if pending == handle => {
                self.pending = None;
                true
            }
            // A canceled or stale callback: ignore it.
            _ => false,
        }
    }

    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Decompose a device-space matrix into per-axis pixel scale, for uniform
/// strokes and cache zoom.
pub fn pixel_scale(m: &Matrix) -> Point {
    let d = m.decompose();
    Point::new(d.scale_x.abs(), d.scale_y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingScheduler {
        next: u64,
        canceled: Vec<FrameHandle>,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            FrameHandle(self.next)
        }
        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.canceled.push(handle);
        }
    }

    #[test]
    fn duplicate_requests_coalesce() {
        let mut sched = CountingScheduler::default();
        let mut pump = FramePump::default();
        assert!(pump.request(&mut sched));
        assert!(!pump.request(&mut sched), "second request is a no-op");
        assert!(!pump.request(&mut sched));
        assert_eq!(sched.next, 1, "exactly one frame requested");

        assert!(pump.on_frame(FrameHandle(1)));
        assert!(!pump.is_pending());
        assert!(pump.request(&mut sched), "new request allowed after fire");
    }

    #[test]
    fn cancel_forgets_pending_frame() {
        let mut sched = CountingScheduler::default();
        let mut pump = FramePump::default();
        pump.request(&mut sched);
        pump.cancel(&mut sched);
        assert_eq!(sched.canceled, vec![FrameHandle(1)]);
        // The canceled callback firing anyway must not trigger a render.
        assert!(!pump.on_frame(FrameHandle(1)));
    }

    #[test]
    fn solid_resolution() {
        let brush = BasicFillResolver.resolve(&Paint::Solid(easel_core::paint::Color::rgba(
            1.0, 0.5, 0.0, 1.0,
        )));
        assert!(matches!(brush, Brush::Solid(_)));
    }
}
