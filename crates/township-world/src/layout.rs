//! Jittered grid layout for location coordinates.
//!
//! The canvas is divided into a grid whose aspect ratio follows the canvas,
//! with just enough cells for the requested node count. Each node lands in
//! its own cell and is jittered within the middle of that cell, so no two
//! nodes can coincide and the spread never degenerates into a line.

use rand::Rng;
use township_types::Point;

/// Fraction of a cell's extent the jitter may use (centred).
const JITTER_SPAN: f64 = 0.6;

/// Grid dimensions chosen for a node count and canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    /// Number of columns.
    pub cols: usize,
    /// Number of rows.
    pub rows: usize,
    /// Width of one cell.
    pub cell_width: f64,
    /// Height of one cell.
    pub cell_height: f64,
}

impl GridShape {
    /// Size a grid for `count` nodes on a `width` x `height` canvas.
    pub fn for_count(count: usize, width: f64, height: f64) -> Self {
        let count = count.max(1);
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        let ideal = (count as f64 * aspect).sqrt().ceil();
        let cols = (ideal as usize).clamp(1, count);
        let rows = count.div_ceil(cols);
        Self {
            cols,
            rows,
            cell_width: width / cols as f64,
            cell_height: height / rows as f64,
        }
    }

    /// Smallest possible distance between two laid-out nodes.
    pub fn min_separation(&self) -> f64 {
        (1.0 - JITTER_SPAN) * self.cell_width.min(self.cell_height)
    }
}

/// Lay out `count` nodes on a `width` x `height` canvas.
///
/// Consumes two values from `rng` per node, in node order.
pub fn grid_layout(count: usize, width: f64, height: f64, rng: &mut impl Rng) -> Vec<Point> {
    let shape = GridShape::for_count(count, width, height);
    (0..count)
        .map(|i| {
            let col = i % shape.cols;
            let row = i / shape.cols;
            let jx: f64 = rng.random::<f64>() - 0.5;
            let jy: f64 = rng.random::<f64>() - 0.5;
            let cx = (col as f64 + 0.5) * shape.cell_width;
            let cy = (row as f64 + 0.5) * shape.cell_height;
            Point::new(
                jx.mul_add(shape.cell_width * JITTER_SPAN, cx),
                jy.mul_add(shape.cell_height * JITTER_SPAN, cy),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn shape_follows_aspect_ratio() {
        let wide = GridShape::for_count(20, 2000.0, 500.0);
        assert!(wide.cols > wide.rows);
        assert!(wide.cols * wide.rows >= 20);

        let single = GridShape::for_count(1, 100.0, 100.0);
        assert_eq!((single.cols, single.rows), (1, 1));
    }

    #[test]
    fn points_stay_on_canvas_and_apart() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let points = grid_layout(23, 1000.0, 800.0, &mut rng);
        assert_eq!(points.len(), 23);
        for p in &points {
            assert!(p.x > 0.0 && p.x < 1000.0);
            assert!(p.y > 0.0 && p.y < 800.0);
        }
        let min_sep = GridShape::for_count(23, 1000.0, 800.0).min_separation();
        for (i, a) in points.iter().enumerate() {
            for b in points.iter().skip(i + 1) {
                assert!(a.distance(*b) >= min_sep - 1e-9);
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = grid_layout(10, 500.0, 500.0, &mut ChaCha8Rng::seed_from_u64(4));
        let b = grid_layout(10, 500.0, 500.0, &mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(a, b);
    }
}
