//! Engine configuration.
//!
//! One explicit value passed to the renderer and the raster cache at
//! construction — nothing here is ambient global state. The cache limits
//! implement a budget policy: rasterize at the highest resolution that
//! fits, never thrash on small fluctuations, never upscale past budget.

use serde::{Deserialize, Serialize};

/// Canvas pixel dimensions, the basis for culling and background fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Device pixels per logical pixel, folded into cache zoom.
    pub device_pixel_ratio: f64,

    /// Master switch for per-node raster caching.
    pub object_caching: bool,

    /// Smallest side a cache bitmap may have, in pixels. Avoids degenerate
    /// tiny buffers that would be reallocated constantly.
    pub min_cache_side: u32,

    /// Largest side a cache bitmap may have, in pixels.
    pub max_cache_side: u32,

    /// Total pixel budget per cache bitmap. When exceeded, both dimensions
    /// shrink proportionally and the baked zoom drops with them.
    pub max_cache_area: u64,

    /// Minimum magnitude a scale factor may reach. Keeps every node matrix
    /// invertible.
    pub min_scale: f64,

    /// Default rotation snap increment in degrees; `None` disables snapping.
    pub snap_angle: Option<f64>,

    /// Snap window in degrees. `None` means "equal to the increment".
    pub snap_threshold: Option<f64>,

    /// Screen-space padding around a node's border used for handle hit
    /// regions, not for containment tests.
    pub control_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            object_caching: true,
            min_cache_side: 256,
            max_cache_side: 4096,
            max_cache_area: 2_097_152,
            min_scale: 1e-4,
            snap_angle: None,
            snap_threshold: None,
            control_padding: 0.0,
        }
    }
}

impl EngineConfig {
    /// Clamp a scale factor away from zero, preserving its sign. Zero is
    /// treated as positive.
    pub fn clamp_scale(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min_scale;
        }
        if value.abs() < self.min_scale {
            if value < 0.0 { -self.min_scale } else { self.min_scale }
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_clamp_preserves_sign() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_scale(0.0), cfg.min_scale);
        assert_eq!(cfg.clamp_scale(1e-9), cfg.min_scale);
        assert_eq!(cfg.clamp_scale(-1e-9), -cfg.min_scale);
        assert_eq!(cfg.clamp_scale(2.0), 2.0);
        assert_eq!(cfg.clamp_scale(f64::NAN), cfg.min_scale);
    }
}
