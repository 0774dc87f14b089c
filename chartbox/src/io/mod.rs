//! External-interface boundary: a [`FeatureSource`] trait any file format
//! can implement, a [`RasterSink`] trait any image/blob writer can
//! implement, and one concrete implementation of each --
//! `text::TextFeatureSource` and `png::PngRasterSink`.
//!
//! Neither concrete type is the point; general GeoJSON/Shapefile ingest and
//! arbitrary raster output formats are out of scope. What matters is the
//! *interface* the core (`ChartBox::ingest`) depends on.

pub mod png;
pub mod text;

use crate::chart_box::Role;
use crate::error::Error;
use crate::geometry::{BoundBox, Global, Local, Point, Polygon};

pub use png::PngRasterSink;
pub use text::TextFeatureSource;

/// One ingested feature: an outer ring in the global frame, optional hole
/// rings, the [`Role`] it belongs to, and the cell value to fill its
/// interior with.
///
/// The outer ring is filled with `fill_value`; each hole, when
/// [`crate::chart_box::ChartBox::fill_holes`] is enabled, is re-filled with
/// [`crate::cell::CLEAR`].
#[derive(Clone, Debug)]
pub struct Feature {
    pub role: Role,
    pub outer: Polygon<Global>,
    pub holes: Vec<Polygon<Global>>,
    pub fill_value: u8,
}

/// A source of chart features: one bounding box, then a stream of
/// [`Feature`]s.
///
/// Implementations are pull-based (`next_feature` returns `None` at
/// end-of-stream) rather than push/callback-based, so `ChartBox::ingest`
/// can drive the loop itself and remain the single place that knows how to
/// rasterize a feature into a layer.
pub trait FeatureSource {
    /// The one bounding box used to call [`crate::frame::FrameMapping::move_to_corners`].
    ///
    /// # Errors
    /// [`Error::IoError`] if the underlying file cannot be read;
    /// [`Error::InvalidGeometry`] if no usable bbox is present.
    fn bounding_box(&mut self) -> Result<BoundBox<Global>, Error>;

    /// The next feature, or `Ok(None)` at end of stream.
    ///
    /// # Errors
    /// [`Error::IoError`] or [`Error::InvalidGeometry`] on a malformed record.
    fn next_feature(&mut self) -> Result<Option<Feature>, Error>;
}

/// A sink for a rectangular sample of `classify` values.
pub trait RasterSink {
    /// Samples `classify` over `bounds` at `precision` meters/cell,
    /// west-to-east then south-to-north, with output row 0 the north row,
    /// and writes the result.
    ///
    /// # Errors
    /// [`Error::IoError`] if the output cannot be written.
    fn write(
        &mut self,
        classify: &dyn Fn(Point<Local>) -> u8,
        bounds: &BoundBox<Local>,
        precision: f64,
    ) -> Result<(), Error>;
}

/// `width = ceil(bounds.width/precision)`, `height = ceil(bounds.height/precision)`.
#[must_use]
pub fn sample_dimensions(bounds: &BoundBox<Local>, precision: f64) -> (u32, u32) {
    (
        (bounds.width() / precision).ceil() as u32,
        (bounds.height() / precision).ceil() as u32,
    )
}

/// Samples `classify` into a row-major grayscale buffer, row 0 = north row.
/// Shared by every [`RasterSink`] implementation so the sampling order is
/// defined once.
#[must_use]
pub fn sample_grid(
    classify: &dyn Fn(Point<Local>) -> u8,
    bounds: &BoundBox<Local>,
    precision: f64,
) -> Vec<u8> {
    let (width, height) = sample_dimensions(bounds, precision);
    let mut buffer = vec![0u8; (width as usize) * (height as usize)];
    for row in 0..height {
        // output row 0 is the northmost row of the sampled box
        let northing = bounds.max.y - precision / 2.0 - precision * f64::from(row);
        for col in 0..width {
            let easting = bounds.min.x + precision / 2.0 + precision * f64::from(col);
            let value = classify(Point::new(easting, northing));
            buffer[(row as usize) * (width as usize) + col as usize] = value;
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{BLOCK, CLEAR};

    #[test]
    fn sample_grid_row_zero_is_north() {
        let bounds = BoundBox::new(Point::new(0.0, 0.0), Point::new(4.0, 4.0));
        let classify = |p: Point<Local>| if p.y > 2.0 { BLOCK } else { CLEAR };
        let buffer = sample_grid(&classify, &bounds, 1.0);
        assert_eq!(buffer[0], BLOCK); // row 0 samples northing ~3.5
        assert_eq!(buffer[buffer.len() - 1], CLEAR); // last row samples northing ~0.5
    }

    #[test]
    fn sample_dimensions_rounds_up() {
        let bounds = BoundBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert_eq!(sample_dimensions(&bounds, 3.0), (4, 4));
    }
}
