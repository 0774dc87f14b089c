//! [`PngRasterSink`]: writes a sampled `classify` grid as a grayscale PNG.
//!
//! Samples row-by-row from the north and writes into a single-band
//! grayscale raster via the `image` crate's
//! `image::codecs::png::PngEncoder` + `ImageEncoder::write_image`.

use std::fs::File;
use std::path::PathBuf;

use image::codecs::png::PngEncoder;
use image::ImageEncoder;
use tracing::{info, instrument};

use crate::error::Error;
use crate::geometry::{BoundBox, Local, Point};
use crate::io::{sample_dimensions, sample_grid, RasterSink};

/// Writes one grayscale PNG per [`RasterSink::write`] call, to a fixed path.
pub struct PngRasterSink {
    output_path: PathBuf,
}

impl PngRasterSink {
    #[must_use]
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl RasterSink for PngRasterSink {
    #[instrument(skip(self, classify))]
    fn write(
        &mut self,
        classify: &dyn Fn(Point<Local>) -> u8,
        bounds: &BoundBox<Local>,
        precision: f64,
    ) -> Result<(), Error> {
        let (width, height) = sample_dimensions(bounds, precision);
        let buffer = sample_grid(classify, bounds, precision);

        let file = File::options()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.output_path)
            .map_err(|source| Error::IoError {
                path: self.output_path.clone(),
                source,
            })?;

        let encoder = PngEncoder::new(file);
        encoder
            .write_image(&buffer, width, height, image::ExtendedColorType::L8)
            .map_err(|e| Error::IoError {
                path: self.output_path.clone(),
                source: std::io::Error::other(e),
            })?;

        info!(path = %self.output_path.display(), width, height, "wrote raster sink PNG");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{BLOCK, CLEAR};

    #[test]
    fn writes_a_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chart.png");
        let mut sink = PngRasterSink::new(out.clone());
        let bounds = BoundBox::new(Point::new(0.0, 0.0), Point::new(8.0, 8.0));
        let classify = |p: Point<Local>| if p.x > 4.0 { BLOCK } else { CLEAR };
        sink.write(&classify, &bounds, 1.0).unwrap();

        let decoded = image::open(&out).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }
}
