//! Per-mark vertex geometry.
//!
//! Converts one data record into the flat clip-space coordinate run its
//! mark kind requires. Vertex counts per record are fixed by the mark:
//! point = 1, rect = 6 (two triangles), arc = 2·segments (a line list, so
//! many arcs batch into one draw call without connector artifacts).
//!
//! Every non-position channel buffer must receive the record's value once
//! per emitted vertex; [`crate::compiler`] checks that after each track
//! build — a mismatch desynchronizes attributes from positions and aborts
//! the compile.

/// Emit a single point vertex. Returns the vertex count (1).
#[inline]
pub fn point(x: f64, y: f64, out: &mut Vec<f32>) -> usize {
    out.push(x as f32);
    out.push(y as f32);
    1
}

/// Emit the 6 vertices (two triangles) of an axis-aligned rect spanning
/// `[x0, x1] × [y0, y1]`. Returns the vertex count (6).
pub fn rect(x0: f64, x1: f64, y0: f64, y1: f64, out: &mut Vec<f32>) -> usize {
    let (x0, x1) = (x0 as f32, x1 as f32);
    let (y0, y1) = (y0 as f32, y1 as f32);
    out.extend_from_slice(&[
        x0, y0, //
        x1, y0, //
        x0, y1, //
        x0, y1, //
        x1, y0, //
        x1, y1, //
    ]);
    6
}

/// Emit a quadratic Bezier arc from `(x0, y0)` to `(x1, y1)` as a line
/// list of `segments` segments. The control point is the chord midpoint
/// pushed perpendicular by `bulge` · chord length. Returns the vertex
/// count (2 · segments).
pub fn arc(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    segments: usize,
    bulge: f64,
    out: &mut Vec<f32>,
) -> usize {
    debug_assert!(segments >= 1, "an arc needs at least one segment");

    let dx = x1 - x0;
    let dy = y1 - y0;
    let len = (dx * dx + dy * dy).sqrt();
    // Perpendicular offset of the control point; zero-length chords
    // degenerate to a point and that is fine.
    let cx = (x0 + x1) * 0.5 - dy / len.max(f64::EPSILON) * bulge * len;
    let cy = (y0 + y1) * 0.5 + dx / len.max(f64::EPSILON) * bulge * len;

    let bezier = |t: f64| -> (f32, f32) {
        let u = 1.0 - t;
        let x = u * u * x0 + 2.0 * u * t * cx + t * t * x1;
        let y = u * u * y0 + 2.0 * u * t * cy + t * t * y1;
        (x as f32, y as f32)
    };

    let mut prev = bezier(0.0);
    for i in 1..=segments {
        let t = i as f64 / segments as f64;
        let next = bezier(t);
        out.push(prev.0);
        out.push(prev.1);
        out.push(next.0);
        out.push(next.1);
        prev = next;
    }
    2 * segments
}

/// Replicate a channel value once per emitted vertex. A 6-vertex rect
/// gets 6 copies, not 1.
#[inline]
pub fn replicate(value: f32, vertices: usize, out: &mut Vec<f32>) {
    out.extend(std::iter::repeat(value).take(vertices));
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_emits_one_vertex() {
        let mut out = Vec::new();
        assert_eq!(point(0.25, -0.5, &mut out), 1);
        assert_eq!(out, vec![0.25, -0.5]);
    }

    #[test]
    fn test_rect_emits_two_triangles() {
        let mut out = Vec::new();
        assert_eq!(rect(-1.0, 1.0, -0.5, 0.5, &mut out), 6);
        assert_eq!(out.len(), 12);
        // Both triangles cover the four corners.
        assert_eq!(&out[0..2], &[-1.0, -0.5]);
        assert_eq!(&out[10..12], &[1.0, 0.5]);
    }

    #[test]
    fn test_arc_endpoints_and_count() {
        let mut out = Vec::new();
        let verts = arc(-1.0, 0.0, 1.0, 0.0, 16, 0.25, &mut out);
        assert_eq!(verts, 32);
        assert_eq!(out.len(), 64);
        // First vertex is the start, last is the end.
        assert_eq!(&out[0..2], &[-1.0, 0.0]);
        assert_eq!(&out[62..64], &[1.0, 0.0]);
    }

    #[test]
    fn test_arc_bulges_off_the_chord() {
        let mut out = Vec::new();
        arc(-1.0, 0.0, 1.0, 0.0, 2, 0.25, &mut out);
        // Midpoint vertex leaves the y=0 chord.
        let mid_y = out[3];
        assert!(mid_y.abs() > 0.1, "expected a bulge, got {mid_y}");
    }

    #[test]
    fn test_arc_segment_count_trades_fidelity() {
        let mut coarse = Vec::new();
        let mut fine = Vec::new();
        arc(-1.0, 0.0, 1.0, 0.0, 4, 0.25, &mut coarse);
        arc(-1.0, 0.0, 1.0, 0.0, 32, 0.25, &mut fine);
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn test_replicate_one_per_vertex() {
        let mut out = Vec::new();
        replicate(7.0, 6, &mut out);
        assert_eq!(out, vec![7.0; 6]);
    }
}
