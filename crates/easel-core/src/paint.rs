//! Fill, stroke, and shadow descriptors.
//!
//! These are plain data. Parsing color syntax and resolving gradients or
//! patterns into backend paint handles is the job of an external fill
//! resolver — the engine only stores and forwards the descriptors.

use crate::geom::Point;
use serde::{Deserialize, Serialize};

/// RGBA color, 4 × f32 in [0.0, 1.0]. No parsing here; embedders hand us
/// already-decoded components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

/// A gradient stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// Fill or stroke descriptor. Gradients are expressed in the node's own
/// coordinate plane; the resolver maps them to the active backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        center: Point,
        radius: f64,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    /// Fully transparent paints draw nothing and let render skip work.
    pub fn is_transparent(&self) -> bool {
        match self {
            Paint::Solid(c) => c.a == 0.0,
            Paint::LinearGradient { stops, .. } | Paint::RadialGradient { stops, .. } => {
                stops.iter().all(|s| s.color.a == 0.0)
            }
        }
    }
}

/// Drop-shadow parameters forwarded to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: Color,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}
