//! Overlay synchronization.
//!
//! Axes, labels, and selection shapes render outside the GPU path —
//! behind [`OverlayRenderer`], a pure side-effect sink. The core never
//! knows what presentation technology sits on the other side; it only
//! pushes the current range, tick sets, and selection polygon whenever
//! the viewport or selection changes.

use strand_core::{AxisOrientation, AxisSpecs, LabelSpec};
use strand_scale::{GenomeScale, LinearScale, ScaleError, Tick};

use crate::selection::Selection;
use crate::viewport::{Axis, ViewportController};

/// Interface the external vector-overlay renderer implements. Tick
/// positions are in data units; the overlay maps them to pixels with the
/// viewport it was last given.
pub trait OverlayRenderer {
    fn set_viewport(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        width_px: f64,
        height_px: f64,
    );
    fn set_axis(&mut self, axis: Axis, orientation: AxisOrientation, ticks: &[Tick]);
    fn set_selection_polygon(&mut self, points: &[f64]);
    fn set_labels(&mut self, labels: &[LabelSpec]);
}

/// Pushes viewport/axis/selection state into an [`OverlayRenderer`].
pub struct OverlaySync {
    canvas_px: (f64, f64),
    axes: AxisSpecs,
}

impl OverlaySync {
    pub fn new(canvas_px: (f64, f64), axes: AxisSpecs) -> Self {
        Self { canvas_px, axes }
    }

    pub fn set_canvas(&mut self, canvas_px: (f64, f64)) {
        self.canvas_px = canvas_px;
    }

    /// Push the current range and explicit per-axis tick sets.
    pub fn sync_viewport(
        &self,
        overlay: &mut dyn OverlayRenderer,
        viewport: &ViewportController,
        x_ticks: &[Tick],
        y_ticks: &[Tick],
    ) {
        let cur = viewport.current();
        overlay.set_viewport(
            cur.x[0],
            cur.x[1],
            cur.y[0],
            cur.y[1],
            self.canvas_px.0,
            self.canvas_px.1,
        );
        overlay.set_axis(Axis::X, self.axes.x, x_ticks);
        overlay.set_axis(Axis::Y, self.axes.y, y_ticks);
    }

    /// Push the current range with ticks generated over the visible
    /// quantitative range of both axes.
    pub fn sync_quantitative(
        &self,
        overlay: &mut dyn OverlayRenderer,
        viewport: &ViewportController,
    ) -> Result<(), ScaleError> {
        let cur = viewport.current();
        let x_ticks = LinearScale::to_clip(cur.x)?.ticks();
        let y_ticks = LinearScale::to_clip(cur.y)?.ticks();
        self.sync_viewport(overlay, viewport, &x_ticks, &y_ticks);
        Ok(())
    }

    /// Push the current range with genomic x ticks (visible-range
    /// restricted) and quantitative y ticks.
    pub fn sync_genomic(
        &self,
        overlay: &mut dyn OverlayRenderer,
        viewport: &ViewportController,
        x_scale: &GenomeScale,
    ) -> Result<(), ScaleError> {
        let cur = viewport.current();
        let x_ticks: Vec<Tick> = x_scale
            .ticks()
            .into_iter()
            .filter(|t| t.position >= cur.x[0] && t.position <= cur.x[1])
            .collect();
        let y_ticks = LinearScale::to_clip(cur.y)?.ticks();
        self.sync_viewport(overlay, viewport, &x_ticks, &y_ticks);
        Ok(())
    }

    /// Mirror an emitted or in-progress selection shape.
    pub fn sync_selection(&self, overlay: &mut dyn OverlayRenderer, selection: &Selection) {
        overlay.set_selection_polygon(&selection.points);
    }

    pub fn clear_selection(&self, overlay: &mut dyn OverlayRenderer) {
        overlay.set_selection_polygon(&[]);
    }

    pub fn sync_labels(&self, overlay: &mut dyn OverlayRenderer, labels: &[LabelSpec]) {
        overlay.set_labels(labels);
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use strand_scale::{Extent, Genome};

    #[derive(Default)]
    struct RecordingOverlay {
        viewport: Option<(f64, f64, f64, f64)>,
        x_ticks: Vec<Tick>,
        y_ticks: Vec<Tick>,
        polygon: Vec<f64>,
        labels: Vec<LabelSpec>,
    }

    impl OverlayRenderer for RecordingOverlay {
        fn set_viewport(
            &mut self,
            min_x: f64,
            max_x: f64,
            min_y: f64,
            max_y: f64,
            _width_px: f64,
            _height_px: f64,
        ) {
            self.viewport = Some((min_x, max_x, min_y, max_y));
        }

        fn set_axis(&mut self, axis: Axis, _orientation: AxisOrientation, ticks: &[Tick]) {
            match axis {
                Axis::X => self.x_ticks = ticks.to_vec(),
                Axis::Y => self.y_ticks = ticks.to_vec(),
            }
        }

        fn set_selection_polygon(&mut self, points: &[f64]) {
            self.polygon = points.to_vec();
        }

        fn set_labels(&mut self, labels: &[LabelSpec]) {
            self.labels = labels.to_vec();
        }
    }

    #[test]
    fn test_sync_pushes_current_range_and_ticks() {
        let viewport = ViewportController::new(Extent::new([0.0, 10.0], [0.0, 10.0]));
        let sync = OverlaySync::new((800.0, 600.0), AxisSpecs::default());
        let mut overlay = RecordingOverlay::default();

        sync.sync_quantitative(&mut overlay, &viewport).unwrap();
        assert_eq!(overlay.viewport, Some((0.0, 10.0, 0.0, 10.0)));
        assert_eq!(overlay.x_ticks.len(), 11);
        assert_eq!(overlay.y_ticks.len(), 11);
    }

    #[test]
    fn test_sync_follows_zoom() {
        let mut viewport = ViewportController::new(Extent::new([0.0, 10.0], [0.0, 10.0]));
        let sync = OverlaySync::new((800.0, 600.0), AxisSpecs::default());
        let mut overlay = RecordingOverlay::default();

        viewport.zoom((5.0, 5.0), 1.0);
        sync.sync_quantitative(&mut overlay, &viewport).unwrap();
        let (min_x, max_x, _, _) = overlay.viewport.unwrap();
        assert!(min_x > 0.0 && max_x < 10.0);
        // Ticks regenerate over the visible range only.
        assert!(overlay.x_ticks.iter().all(|t| t.position >= min_x));
    }

    #[test]
    fn test_sync_genomic_restricts_ticks_to_visible() {
        let genome = Genome::custom("toy", &[("chr1", 1_000), ("chr2", 1_000)]);
        let scale = GenomeScale::new(genome, ["chr1:0", "chr2:1000"]).unwrap();
        let viewport = ViewportController::new(Extent::new([0.0, 2_000.0], [0.0, 1.0]));
        let sync = OverlaySync::new((800.0, 600.0), AxisSpecs::default());
        let mut overlay = RecordingOverlay::default();

        sync.sync_genomic(&mut overlay, &viewport, &scale).unwrap();
        let labels: Vec<&str> = overlay.x_ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_selection_polygon_mirrored_and_cleared() {
        let sync = OverlaySync::new((800.0, 600.0), AxisSpecs::default());
        let mut overlay = RecordingOverlay::default();

        let sel = Selection {
            points: vec![0.0, 0.0, 1.0, 1.0],
        };
        sync.sync_selection(&mut overlay, &sel);
        assert_eq!(overlay.polygon, vec![0.0, 0.0, 1.0, 1.0]);

        sync.clear_selection(&mut overlay);
        assert!(overlay.polygon.is_empty());
    }
}
