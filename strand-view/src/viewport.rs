//! Pannable/zoomable visible range, bounded by the data extent.
//!
//! The controller owns two extents: the immutable data extent (replaced
//! only when a new specification compiles) and the mutable current range,
//! always a sub-extent of it. Every mutation is compute-then-commit: a
//! candidate range that would be non-finite, inverted, or narrower than
//! the zoom limit is silently rolled back — that is the interaction
//! hitting its bounds, not an error.

use log::trace;
use serde::{Deserialize, Serialize};

use strand_scale::Extent;

/// A plot dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Tunable interaction constants. Empirically chosen, not load-bearing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Fraction of a normalized wheel step applied per zoom event.
    pub wheel_dampening: f64,
    /// Clamp on the per-event interpolation factor.
    pub max_zoom_step: f64,
    /// Minimum visible span, as a fraction of the extent span. Zooming
    /// in converges here instead of inverting.
    pub min_span_ratio: f64,
    /// Fewest points a lasso selection needs to form a polygon.
    pub lasso_min_points: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            wheel_dampening: 0.1,
            max_zoom_step: 0.5,
            min_span_ratio: 1e-6,
            lasso_min_points: 3,
        }
    }
}

/// The uniform block the render loop hands to the backend each dirty
/// frame: current range as clip-space corners, plus a point-size
/// multiplier so points stay visible when zoomed far in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpuViewport {
    /// `[x_min, x_max, y_min, y_max]` in clip space, derived from the
    /// data extent (not the current range).
    pub corners: [f32; 4],
    pub point_scale: f32,
}

pub struct ViewportController {
    extent: Extent,
    current: Extent,
    lock_x: bool,
    lock_y: bool,
    config: InteractionConfig,
}

impl ViewportController {
    /// Start fully zoomed out: current range == data extent.
    pub fn new(extent: Extent) -> Self {
        Self::with_config(extent, InteractionConfig::default())
    }

    pub fn with_config(extent: Extent, config: InteractionConfig) -> Self {
        Self {
            extent,
            current: extent,
            lock_x: false,
            lock_y: false,
            config,
        }
    }

    /// Replace the data extent (new specification) and zoom out.
    pub fn reset(&mut self, extent: Extent) {
        self.extent = extent;
        self.current = extent;
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn current(&self) -> &Extent {
        &self.current
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn set_lock(&mut self, axis: Axis, locked: bool) {
        match axis {
            Axis::X => self.lock_x = locked,
            Axis::Y => self.lock_y = locked,
        }
    }

    /// Zoom toward (positive delta) or away from (negative) a focal point
    /// in data coordinates. Returns whether the range changed.
    pub fn zoom(&mut self, focal: (f64, f64), delta_normalized: f64) -> bool {
        let f = (delta_normalized * self.config.wheel_dampening)
            .clamp(-self.config.max_zoom_step, self.config.max_zoom_step);

        let x = if self.lock_x {
            self.current.x
        } else {
            [
                self.current.x[0] + (focal.0 - self.current.x[0]) * f,
                self.current.x[1] + (focal.0 - self.current.x[1]) * f,
            ]
        };
        let y = if self.lock_y {
            self.current.y
        } else {
            [
                self.current.y[0] + (focal.1 - self.current.y[0]) * f,
                self.current.y[1] + (focal.1 - self.current.y[1]) * f,
            ]
        };

        self.commit(Extent::new(x, y))
    }

    /// Pan by pixel deltas, scaled by the visible range per canvas pixel.
    /// Returns whether the range changed.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64, canvas_px: (f64, f64)) -> bool {
        let dx = if self.lock_x {
            0.0
        } else {
            dx_px * self.current.width() / canvas_px.0.max(1.0)
        };
        let dy = if self.lock_y {
            0.0
        } else {
            dy_px * self.current.height() / canvas_px.1.max(1.0)
        };

        self.commit(Extent::new(
            [self.current.x[0] + dx, self.current.x[1] + dx],
            [self.current.y[0] + dy, self.current.y[1] + dy],
        ))
    }

    /// Clamp to the extent, then commit if the result is valid; roll back
    /// otherwise.
    fn commit(&mut self, candidate: Extent) -> bool {
        let clamped = self.extent.clamp(&candidate);
        let min_w = self.extent.width() * self.config.min_span_ratio;
        let min_h = self.extent.height() * self.config.min_span_ratio;

        if !clamped.is_valid() || clamped.width() < min_w || clamped.height() < min_h {
            trace!("interaction rolled back: candidate {candidate:?}");
            return false;
        }
        if clamped == self.current {
            return false;
        }
        self.current = clamped;
        true
    }

    /// Map the current range through the extent-derived clip scale on
    /// both axes.
    pub fn to_gpu_viewport(&self) -> GpuViewport {
        let to_clip = |range: [f64; 2], v: f64| -> f32 {
            ((v - range[0]) / (range[1] - range[0]).max(f64::EPSILON) * 2.0 - 1.0) as f32
        };

        let nw = self.current.width() / self.extent.width().max(f64::EPSILON);
        let nh = self.current.height() / self.extent.height().max(f64::EPSILON);
        let point_scale = (1.0 / nw).min(1.0 / nh).max(1.0) as f32;

        GpuViewport {
            corners: [
                to_clip(self.extent.x, self.current.x[0]),
                to_clip(self.extent.x, self.current.x[1]),
                to_clip(self.extent.y, self.current.y[0]),
                to_clip(self.extent.y, self.current.y[1]),
            ],
            point_scale,
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewportController {
        ViewportController::new(Extent::new([0.0, 100.0], [0.0, 10.0]))
    }

    #[test]
    fn test_starts_zoomed_out() {
        let vp = controller();
        assert_eq!(vp.current(), vp.extent());
        let gpu = vp.to_gpu_viewport();
        assert_eq!(gpu.corners, [-1.0, 1.0, -1.0, 1.0]);
        assert_eq!(gpu.point_scale, 1.0);
    }

    #[test]
    fn test_zoom_shrinks_toward_focal() {
        let mut vp = controller();
        assert!(vp.zoom((50.0, 5.0), 1.0));
        let cur = vp.current();
        assert!(cur.x[0] > 0.0 && cur.x[1] < 100.0);
        assert!(cur.x[0] < cur.x[1]);
        // Focal point stays inside the range.
        assert!(cur.x[0] < 50.0 && 50.0 < cur.x[1]);
    }

    #[test]
    fn test_zoom_out_clamps_to_extent() {
        let mut vp = controller();
        vp.zoom((50.0, 5.0), 1.0);
        for _ in 0..50 {
            vp.zoom((50.0, 5.0), -1.0);
        }
        assert_eq!(vp.current(), vp.extent());
    }

    #[test]
    fn test_repeated_zoom_in_converges_without_inverting() {
        let mut vp = controller();
        for _ in 0..10_000 {
            vp.zoom((50.0, 5.0), 1.0);
            let cur = vp.current();
            assert!(cur.x[0] <= cur.x[1], "range inverted: {cur:?}");
            assert!(cur.is_valid());
        }
        // Converged to a fixed minimal range.
        let before = *vp.current();
        vp.zoom((50.0, 5.0), 1.0);
        assert_eq!(before, *vp.current());
        assert!(vp.current().width() > 0.0);
    }

    #[test]
    fn test_pan_scales_by_canvas_width() {
        let mut vp = controller();
        vp.zoom((50.0, 5.0), 1.0); // make room to pan
        let before = *vp.current();
        // Full canvas width == full visible range.
        assert!(vp.pan(-50.0, 0.0, (1000.0, 500.0)));
        let cur = vp.current();
        let expected = before.x[0] - before.width() * 0.05;
        assert!((cur.x[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_pan_never_escapes_extent() {
        let mut vp = controller();
        vp.zoom((50.0, 5.0), 1.0);
        for _ in 0..100 {
            vp.pan(10_000.0, 10_000.0, (100.0, 100.0));
        }
        let cur = vp.current();
        assert!(vp.extent().contains(cur));
        assert!(cur.x[1] <= 100.0 && cur.y[1] <= 10.0);
    }

    #[test]
    fn test_locked_axis_unchanged_by_zoom_and_pan() {
        let mut vp = controller();
        vp.set_lock(Axis::Y, true);
        vp.zoom((50.0, 5.0), 1.0);
        assert_eq!(vp.current().y, [0.0, 10.0]);
        vp.pan(0.0, 50.0, (100.0, 100.0));
        assert_eq!(vp.current().y, [0.0, 10.0]);
        assert!(vp.current().x[0] > 0.0);
    }

    #[test]
    fn test_point_scale_grows_when_zoomed_in() {
        let mut vp = controller();
        for _ in 0..20 {
            vp.zoom((50.0, 5.0), 1.0);
        }
        let gpu = vp.to_gpu_viewport();
        assert!(gpu.point_scale > 1.0);
        // Corners narrow around the focal point, still inside clip space.
        assert!(gpu.corners[0] > -1.0 && gpu.corners[1] < 1.0);
        assert!(gpu.corners[0] < gpu.corners[1]);
    }

    #[test]
    fn test_gpu_viewport_derives_from_extent_not_current() {
        let mut vp = controller();
        vp.zoom((25.0, 5.0), 1.0);
        let cur = vp.current();
        let gpu = vp.to_gpu_viewport();
        // Corner positions are the current bounds mapped through the
        // *extent* scale.
        let expected = (cur.x[0] / 100.0 * 2.0 - 1.0) as f32;
        assert!((gpu.corners[0] - expected).abs() < 1e-6);
    }
}
