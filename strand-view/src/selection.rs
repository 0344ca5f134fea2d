//! Box/lasso point-collection state machine.
//!
//! The engine owns point accumulation and mode dispatch only. Point
//! coordinates arrive already converted to data space, and hit-testing
//! the emitted shape against marks is an external geometry concern.

use log::trace;

/// The active interaction tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pan,
    Box,
    Lasso,
    Tooltip,
}

/// An emitted selection shape: flat `[x0, y0, x1, y1, ...]` data-space
/// scalars. Box selections are the 2-point rectangle diagonal; lasso
/// selections are a polygon of 3 or more points.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub points: Vec<f64>,
}

impl Selection {
    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }
}

pub struct SelectionEngine {
    tool: Tool,
    points: Vec<f64>,
    active: bool,
    lasso_min_points: usize,
}

impl SelectionEngine {
    pub fn new(lasso_min_points: usize) -> Self {
        Self {
            tool: Tool::default(),
            points: Vec::new(),
            active: false,
            lasso_min_points,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switching tools drops any in-progress collection.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.points.clear();
        self.active = false;
    }

    /// Points collected so far (for the overlay's live shape).
    pub fn in_progress(&self) -> &[f64] {
        &self.points
    }

    /// Pointer-down in box/lasso mode resets the accumulator to the
    /// single point under the pointer. Other tools ignore it.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !matches!(self.tool, Tool::Box | Tool::Lasso) {
            return;
        }
        self.points.clear();
        self.points.push(x);
        self.points.push(y);
        self.active = true;
    }

    /// Box mode replaces the trailing point, keeping a 2-point rectangle
    /// diagonal; lasso mode appends, growing the polygon.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.active {
            return;
        }
        match self.tool {
            Tool::Box => {
                self.points.truncate(2);
                self.points.push(x);
                self.points.push(y);
            }
            Tool::Lasso => {
                self.push_if_new(x, y);
            }
            Tool::Pan | Tool::Tooltip => {}
        }
    }

    /// Finish the collection. A box needs exactly 2 distinct points, a
    /// lasso at least the configured polygon minimum; anything less is
    /// discarded silently. The engine resets only by handing the finished
    /// selection to the caller.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<Selection> {
        if !self.active {
            return None;
        }
        self.pointer_move(x, y);
        self.active = false;

        let valid = match self.tool {
            Tool::Box => {
                self.points.len() == 4
                    && (self.points[0] != self.points[2] || self.points[1] != self.points[3])
            }
            Tool::Lasso => self.points.len() >= 2 * self.lasso_min_points,
            Tool::Pan | Tool::Tooltip => false,
        };

        if !valid {
            trace!("selection discarded: {} scalar(s)", self.points.len());
            self.points.clear();
            return None;
        }
        Some(Selection {
            points: std::mem::take(&mut self.points),
        })
    }

    fn push_if_new(&mut self, x: f64, y: f64) {
        let n = self.points.len();
        if n >= 2 && self.points[n - 2] == x && self.points[n - 1] == y {
            return;
        }
        self.points.push(x);
        self.points.push(y);
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(tool: Tool) -> SelectionEngine {
        let mut e = SelectionEngine::new(3);
        e.set_tool(tool);
        e
    }

    #[test]
    fn test_box_emits_diagonal() {
        let mut e = engine(Tool::Box);
        e.pointer_down(1.0, 2.0);
        e.pointer_move(3.0, 3.5);
        e.pointer_move(5.0, 6.0);
        let sel = e.pointer_up(5.0, 6.0).expect("box selection");
        assert_eq!(sel.points, vec![1.0, 2.0, 5.0, 6.0]);
        // Consumed: accumulator is reset.
        assert!(e.in_progress().is_empty());
    }

    #[test]
    fn test_box_identical_points_discarded() {
        let mut e = engine(Tool::Box);
        e.pointer_down(1.0, 2.0);
        assert_eq!(e.pointer_up(1.0, 2.0), None);
        assert!(e.in_progress().is_empty());
    }

    #[test]
    fn test_lasso_grows_polygon() {
        let mut e = engine(Tool::Lasso);
        e.pointer_down(0.0, 0.0);
        e.pointer_move(1.0, 0.0);
        e.pointer_move(1.0, 1.0);
        let sel = e.pointer_up(0.0, 1.0).expect("lasso selection");
        assert_eq!(sel.point_count(), 4);
        assert_eq!(&sel.points[0..2], &[0.0, 0.0]);
    }

    #[test]
    fn test_lasso_below_minimum_discarded() {
        let mut e = engine(Tool::Lasso);
        e.pointer_down(0.0, 0.0);
        assert_eq!(e.pointer_up(1.0, 0.0), None);
    }

    #[test]
    fn test_pan_and_tooltip_collect_nothing() {
        for tool in [Tool::Pan, Tool::Tooltip] {
            let mut e = engine(tool);
            e.pointer_down(0.0, 0.0);
            e.pointer_move(1.0, 1.0);
            assert_eq!(e.pointer_up(2.0, 2.0), None);
            assert!(e.in_progress().is_empty());
        }
    }

    #[test]
    fn test_pointer_down_resets_previous_collection() {
        let mut e = engine(Tool::Lasso);
        e.pointer_down(0.0, 0.0);
        e.pointer_move(1.0, 1.0);
        // New gesture starts over from a single point.
        e.pointer_down(9.0, 9.0);
        assert_eq!(e.in_progress(), &[9.0, 9.0]);
    }

    #[test]
    fn test_tool_switch_drops_in_progress_points() {
        let mut e = engine(Tool::Lasso);
        e.pointer_down(0.0, 0.0);
        e.pointer_move(1.0, 1.0);
        e.set_tool(Tool::Box);
        assert!(e.in_progress().is_empty());
        assert_eq!(e.pointer_up(5.0, 5.0), None);
    }

    #[test]
    fn test_lasso_deduplicates_stationary_moves() {
        let mut e = engine(Tool::Lasso);
        e.pointer_down(0.0, 0.0);
        e.pointer_move(1.0, 0.0);
        e.pointer_move(1.0, 0.0);
        e.pointer_move(1.0, 1.0);
        let sel = e.pointer_up(1.0, 1.0).expect("lasso selection");
        assert_eq!(sel.point_count(), 3);
    }
}
