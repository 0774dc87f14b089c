//! The uniform cell-access contract shared by [`rolling::RollingGridLayer`]
//! and [`static_grid::StaticGridLayer`].
//!
//! Rasterization and planning are written once, generically, against this
//! trait, rather than duplicated per concrete layer type.

mod cache;
pub mod rolling;
pub mod static_grid;

pub use rolling::RollingGridLayer;
pub use static_grid::StaticGridLayer;

use crate::cell::UNKNOWN;
use crate::error::Error;
use crate::geometry::{BoundBox, Local, Point};

/// A layer materializes some window of a cell grid in the local frame.
pub trait Layer {
    /// `UNKNOWN` if `p` is outside [`Layer::visible_bounds`]
    fn get(&self, p: Point<Local>) -> u8;

    /// `false` (no-op) if `p` is outside [`Layer::visible_bounds`]
    fn store(&mut self, p: Point<Local>, v: u8) -> bool;

    /// meters per cell edge
    fn precision(&self) -> f64;

    /// the full logical extent this layer represents
    fn tracked_bounds(&self) -> BoundBox<Local>;

    /// the window currently materialized in memory
    fn visible_bounds(&self) -> BoundBox<Local>;

    /// sets every in-view cell to `v`
    fn fill_all(&mut self, v: u8);
}

/// Clips `cells_box` to `layer.visible_bounds()` and sets every cell center
/// inside it to `v`. A pure row/column scan.
pub fn fill_box(layer: &mut dyn Layer, cells_box: &BoundBox<Local>, v: u8) {
    let visible = layer.visible_bounds();
    let precision = layer.precision();

    let clip_min_x = cells_box.min.x.max(visible.min.x);
    let clip_min_y = cells_box.min.y.max(visible.min.y);
    let clip_max_x = cells_box.max.x.min(visible.max.x);
    let clip_max_y = cells_box.max.y.min(visible.max.y);
    if clip_min_x >= clip_max_x || clip_min_y >= clip_max_y {
        return;
    }

    let mut y = cell_center_at_or_after(clip_min_y, visible.min.y, precision);
    while y < clip_max_y {
        let mut x = cell_center_at_or_after(clip_min_x, visible.min.x, precision);
        while x < clip_max_x {
            layer.store(Point::new(x, y), v);
            x += precision;
        }
        y += precision;
    }
}

fn cell_center_at_or_after(lower: f64, grid_origin: f64, precision: f64) -> f64 {
    let index = ((lower - grid_origin) / precision).ceil();
    grid_origin + index.max(0.0) * precision + precision / 2.0
}

/// Never returns `UNKNOWN` to a caller that asked `store`/`get` directly --
/// `UNKNOWN` is only ever a *value*, produced by default-fill, never a
/// sentinel error code.
#[must_use]
pub const fn default_fill() -> u8 {
    UNKNOWN
}

pub(crate) fn io_error(path: std::path::PathBuf, source: std::io::Error) -> Error {
    Error::IoError { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::static_grid::StaticGridLayer;

    #[test]
    fn fill_box_clips_to_visible_bounds() {
        let mut layer: StaticGridLayer<16> = StaticGridLayer::new(
            BoundBox::new(Point::new(0.0, 0.0), Point::new(16.0, 16.0)),
            1.0,
        );
        fill_box(
            &mut layer,
            &BoundBox::new(Point::new(-5.0, -5.0), Point::new(4.0, 4.0)),
            crate::cell::BLOCK,
        );
        assert_eq!(layer.get(Point::new(0.5, 0.5)), crate::cell::BLOCK);
        assert_eq!(layer.get(Point::new(4.5, 4.5)), UNKNOWN);
    }
}
