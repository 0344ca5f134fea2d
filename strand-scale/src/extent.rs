//! Two-axis min/max ranges.
//!
//! `Extent` is the shared currency between the compiler (which derives the
//! union data extent from track domains) and the viewport controller
//! (whose visible range is always a sub-extent of it).

/// Inclusive min/max per axis. Invariant: `x[0] <= x[1]`, `y[0] <= y[1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Extent {
    pub fn new(x: [f64; 2], y: [f64; 2]) -> Self {
        Self { x, y }
    }

    /// The empty starting point for a union fold: every merge replaces it.
    pub fn inverted() -> Self {
        Self {
            x: [f64::INFINITY, f64::NEG_INFINITY],
            y: [f64::INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            x: [self.x[0].min(other.x[0]), self.x[1].max(other.x[1])],
            y: [self.y[0].min(other.y[0]), self.y[1].max(other.y[1])],
        }
    }

    pub fn width(&self) -> f64 {
        self.x[1] - self.x[0]
    }

    pub fn height(&self) -> f64 {
        self.y[1] - self.y[0]
    }

    /// Both axes ordered and finite.
    pub fn is_valid(&self) -> bool {
        self.x[0].is_finite()
            && self.x[1].is_finite()
            && self.y[0].is_finite()
            && self.y[1].is_finite()
            && self.x[0] <= self.x[1]
            && self.y[0] <= self.y[1]
    }

    /// True when `other` fits inside this extent on both axes.
    pub fn contains(&self, other: &Extent) -> bool {
        other.x[0] >= self.x[0]
            && other.x[1] <= self.x[1]
            && other.y[0] >= self.y[0]
            && other.y[1] <= self.y[1]
    }

    /// Clamp `other` into this extent, preserving its span where possible.
    pub fn clamp(&self, other: &Extent) -> Extent {
        Extent {
            x: clamp_axis(self.x, other.x),
            y: clamp_axis(self.y, other.y),
        }
    }
}

fn clamp_axis(outer: [f64; 2], inner: [f64; 2]) -> [f64; 2] {
    let span = (inner[1] - inner[0]).min(outer[1] - outer[0]);
    let lo = inner[0].clamp(outer[0], outer[1] - span);
    [lo, lo + span]
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = Extent::new([0.0, 5.0], [1.0, 2.0]);
        let b = Extent::new([-1.0, 3.0], [0.0, 9.0]);
        assert_eq!(a.union(&b), Extent::new([-1.0, 5.0], [0.0, 9.0]));
    }

    #[test]
    fn test_union_from_inverted_identity() {
        let a = Extent::new([0.0, 5.0], [1.0, 2.0]);
        assert_eq!(Extent::inverted().union(&a), a);
    }

    #[test]
    fn test_clamp_preserves_span() {
        let outer = Extent::new([0.0, 10.0], [0.0, 10.0]);
        let shifted = Extent::new([8.0, 12.0], [0.0, 4.0]);
        let clamped = outer.clamp(&shifted);
        assert_eq!(clamped.x, [6.0, 10.0]);
        assert_eq!(clamped.y, [0.0, 4.0]);
    }

    #[test]
    fn test_clamp_oversized_span_shrinks_to_outer() {
        let outer = Extent::new([0.0, 10.0], [0.0, 10.0]);
        let huge = Extent::new([-5.0, 25.0], [0.0, 10.0]);
        assert_eq!(outer.clamp(&huge).x, [0.0, 10.0]);
    }

    #[test]
    fn test_contains() {
        let outer = Extent::new([0.0, 10.0], [0.0, 10.0]);
        assert!(outer.contains(&Extent::new([2.0, 8.0], [0.0, 10.0])));
        assert!(!outer.contains(&Extent::new([2.0, 11.0], [0.0, 10.0])));
    }
}
