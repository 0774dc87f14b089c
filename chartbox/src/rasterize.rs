//! Polygon, path, and box fill, implemented once as free functions over the
//! [`Layer`] trait rather than duplicated per layer type, so every per-cell
//! operation goes through the same cell-access contract.
//!
//! Scanline fill and row sampling both walk rows west-to-east, south-to-north
//! in local coordinates.

use tracing::instrument;

use crate::geometry::{Local, Path, Point, Polygon};
use crate::layer::Layer;

pub use crate::layer::fill_box;

fn cell_center_at_or_after(lower: f64, grid_origin: f64, precision: f64) -> f64 {
    let index = ((lower - grid_origin) / precision).ceil();
    grid_origin + index.max(0.0) * precision + precision / 2.0
}

/// Scanline-fills `polygon`'s interior with `v`, clipped to
/// `layer.visible_bounds()`.
///
/// Per row: collects every edge intersection with that row's y, dedupes
/// intersections within `1e-6 * precision` of each other, sorts
/// left-to-right, and treats consecutive pairs as interior spans. A cell
/// whose center falls in `[x_left, x_right)` is interior -- the row-center-
/// on-edge case is resolved toward "interior" by this half-open test.
///
/// `polygon` must already be [`Polygon::complete`]d (closed, CCW) for the
/// parity rule to match a well-defined interior.
#[instrument(skip_all)]
pub fn fill_polygon(layer: &mut dyn Layer, polygon: &Polygon<Local>, v: u8) {
    let visible = layer.visible_bounds();
    let precision = layer.precision();
    let poly_bounds = polygon.bounds();

    let min_y = poly_bounds.min.y.max(visible.min.y);
    let max_y = poly_bounds.max.y.min(visible.max.y);
    if min_y >= max_y {
        return;
    }

    let epsilon = precision * 1e-6;
    let vertices = polygon.vertices();
    if vertices.len() < 2 {
        return;
    }

    let mut y = cell_center_at_or_after(min_y, visible.min.y, precision);
    while y < max_y {
        let mut crossings: Vec<f64> = Vec::new();
        for edge in vertices.windows(2) {
            let (p1, p2) = (edge[0], edge[1]);
            let (lo, hi) = if p1.y <= p2.y { (p1, p2) } else { (p2, p1) };
            if (hi.y - lo.y).abs() <= f64::EPSILON {
                continue; // horizontal edge contributes no crossing
            }
            if y >= lo.y && y < hi.y {
                let t = (y - lo.y) / (hi.y - lo.y);
                crossings.push(lo.x + t * (hi.x - lo.x));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).expect("polygon x is finite"));
        crossings.dedup_by(|a, b| (*a - *b).abs() <= epsilon);

        for pair in crossings.chunks_exact(2) {
            let (x_left, x_right) = (pair[0], pair[1]);
            let clipped_left = x_left.max(visible.min.x);
            let clipped_right = x_right.min(visible.max.x);
            let mut x = cell_center_at_or_after(clipped_left, visible.min.x, precision);
            while x < clipped_right {
                layer.store(Point::new(x, y), v);
                x += precision;
            }
        }
        y += precision;
    }
}

/// Bresenham line traversal over grid indices: writes `v` into every cell a
/// straight segment intersects. Points outside the view are silently
/// skipped by [`Layer::store`].
fn fill_segment(layer: &mut dyn Layer, p0: Point<Local>, p1: Point<Local>, v: u8) {
    let visible = layer.visible_bounds();
    let precision = layer.precision();
    let to_index = |p: Point<Local>| {
        (
            ((p.x - visible.min.x) / precision).floor() as i64,
            ((p.y - visible.min.y) / precision).floor() as i64,
        )
    };
    let (mut col, mut row) = to_index(p0);
    let (col1, row1) = to_index(p1);

    let dx = (col1 - col).abs();
    let dy = -(row1 - row).abs();
    let step_x = if col < col1 { 1 } else { -1 };
    let step_y = if row < row1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let center = Point::new(
            visible.min.x + (col as f64 + 0.5) * precision,
            visible.min.y + (row as f64 + 0.5) * precision,
        );
        layer.store(center, v);
        if col == col1 && row == row1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            col += step_x;
        }
        if doubled <= dx {
            err += dx;
            row += step_y;
        }
    }
}

/// Fills every cell along `path`'s segments with `v`.
#[instrument(skip_all)]
pub fn fill_path(layer: &mut dyn Layer, path: &Path<Local>, v: u8) {
    for edge in path.vertices().windows(2) {
        fill_segment(layer, edge[0], edge[1], v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::static_grid::StaticGridLayer;
    use crate::geometry::BoundBox;

    fn layer() -> StaticGridLayer<16> {
        StaticGridLayer::new(
            BoundBox::new(Point::new(0.0, 0.0), Point::new(16.0, 16.0)),
            1.0,
        )
    }

    #[test]
    fn fill_polygon_diamond_marks_interior_cells_block_and_exterior_unknown() {
        let mut l = layer();
        let mut diamond = Polygon::new(vec![
            Point::new(8.0, 1.0),
            Point::new(15.0, 8.0),
            Point::new(8.0, 15.0),
            Point::new(1.0, 8.0),
        ])
        .unwrap();
        diamond.complete(1e-6);
        fill_polygon(&mut l, &diamond, crate::cell::BLOCK);

        assert_eq!(l.get(Point::new(8.5, 8.5)), crate::cell::BLOCK);
        assert_eq!(l.get(Point::new(1.5, 1.5)), crate::cell::UNKNOWN);
        assert_eq!(l.get(Point::new(8.5, 0.5)), crate::cell::UNKNOWN);
    }

    #[test]
    fn fill_path_covers_endpoints() {
        let mut l = layer();
        let path = Path::new(vec![Point::new(0.5, 0.5), Point::new(5.5, 5.5)]);
        fill_path(&mut l, &path, crate::cell::BLOCK);
        assert_eq!(l.get(Point::new(0.5, 0.5)), crate::cell::BLOCK);
        assert_eq!(l.get(Point::new(5.5, 5.5)), crate::cell::BLOCK);
    }
}
