//! Coordinate-frame mapping: global (lat/lon) <-> UTM (meters) <-> local
//! (meters, origin at the chart's southwest corner).
//!
//! Reprojection goes through the `gdal` crate's safe wrapper
//! (`SpatialRef` + `CoordTransform`) over GDAL/PROJ.

use std::sync::Once;

use gdal::spatial_ref::{CoordTransform, CoordTransformOptions, SpatialRef};
use tracing::{instrument, warn};

use crate::error::Error;
use crate::geometry::{BoundBox, Global, Point, Polygon, Utm};

/// Smallest allowed local/UTM chart span, in meters.
pub const MIN_LOCAL_WIDTH: f64 = 128.0;
/// Largest allowed local/UTM chart span, in meters.
pub const MAX_LOCAL_WIDTH: f64 = 16384.0;

static PROJ_DATA_INIT: Once = Once::new();

/// Configures PROJ's resource directory, exactly once per process, before
/// any [`FrameMapping`] is constructed.
///
/// The reprojection library's global state is deliberately never touched
/// from inside `FrameMapping` itself -- callers own this one-shot
/// initialization instead.
pub fn init_proj_data(resource_dir: impl AsRef<std::path::Path>) {
    let path = resource_dir.as_ref().to_owned();
    PROJ_DATA_INIT.call_once(|| {
        // SAFETY: called once, before any other thread has constructed a
        // FrameMapping or otherwise touched PROJ.
        std::env::set_var("PROJ_LIB", &path);
    });
}

/// Establishes the global/UTM/local coordinate frames for one chart.
///
/// Constructed empty (no usable bounds); [`FrameMapping::move_to_corners`]
/// is called exactly once per chart and is immutable thereafter.
pub struct FrameMapping {
    global_to_utm: CoordTransform,
    utm_to_global: CoordTransform,
    global_bounds: BoundBox<Global>,
    utm_bounds: BoundBox<Utm>,
    local_width: f64,
}

impl FrameMapping {
    /// Constructs a mapping fixed to the given UTM zone.
    ///
    /// # Errors
    /// Returns [`Error::ProjectionFailure`] if the GDAL/PROJ transform
    /// objects cannot be constructed (e.g. `PROJ_LIB` was never configured
    /// via [`init_proj_data`]).
    #[instrument(skip_all, fields(zone, northern))]
    pub fn new(zone: u32, northern: bool) -> Result<Self, Error> {
        let epsg_base = if northern { 32600 } else { 32700 };
        let global_srs = SpatialRef::from_epsg(4326)
            .map_err(|e| Error::ProjectionFailure(format!("EPSG:4326: {e}")))?;
        let utm_srs = SpatialRef::from_epsg(epsg_base + zone)
            .map_err(|e| Error::ProjectionFailure(format!("UTM zone {zone}: {e}")))?;

        let mut options = CoordTransformOptions::new()
            .map_err(|e| Error::ProjectionFailure(format!("transform options: {e}")))?;
        options
            .set_ballpark_allowed(false)
            .map_err(|e| Error::ProjectionFailure(format!("transform options: {e}")))?;

        let global_to_utm = CoordTransform::new_with_options(&global_srs, &utm_srs, &options)
            .map_err(|e| Error::ProjectionFailure(format!("global->utm: {e}")))?;
        let utm_to_global = CoordTransform::new_with_options(&utm_srs, &global_srs, &options)
            .map_err(|e| Error::ProjectionFailure(format!("utm->global: {e}")))?;

        Ok(Self {
            global_to_utm,
            utm_to_global,
            global_bounds: BoundBox::default(),
            utm_bounds: BoundBox::default(),
            local_width: 0.0,
        })
    }

    fn project(transform: &CoordTransform, x: f64, y: f64) -> Option<(f64, f64)> {
        let mut xs = [x];
        let mut ys = [y];
        let mut zs: [f64; 1] = [0.0];
        if transform.transform_coords(&mut xs, &mut ys, &mut zs).is_err() {
            return None;
        }
        if !xs[0].is_finite() || !ys[0].is_finite() {
            return None;
        }
        Some((xs[0], ys[0]))
    }

    /// Reprojects the two corners of `bounds` to UTM, clamps the span to
    /// `[MIN_LOCAL_WIDTH, MAX_LOCAL_WIDTH]`, rounds it up to the next power
    /// of two, sets UTM bounds to that square anchored at the floor of the
    /// reprojected min corner, and recomputes global bounds by
    /// reverse-projecting the new UTM max corner.
    ///
    /// On failure, `self` is left exactly as it was before the call.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if the requested span exceeds
    /// [`MAX_LOCAL_WIDTH`]; [`Error::ProjectionFailure`] if either
    /// direction's reprojection fails.
    #[instrument(skip(self))]
    pub fn move_to_corners(&mut self, bounds: &BoundBox<Global>) -> Result<(), Error> {
        // NOTE: GDAL/OGR's EPSG:4326 axis order is (latitude, longitude).
        let (min_x, min_y) = Self::project(
            &self.global_to_utm,
            bounds.min.latitude(),
            bounds.min.longitude(),
        )
        .ok_or_else(|| Error::ProjectionFailure("min corner: non-finite result".into()))?;
        let (max_x, max_y) = Self::project(
            &self.global_to_utm,
            bounds.max.latitude(),
            bounds.max.longitude(),
        )
        .ok_or_else(|| Error::ProjectionFailure("max corner: non-finite result".into()))?;

        let raw_width = (max_x - min_x).abs().max((max_y - min_y).abs());
        if raw_width > MAX_LOCAL_WIDTH {
            return Err(Error::OutOfRange(format!(
                "requested span {raw_width}m exceeds max {MAX_LOCAL_WIDTH}m"
            )));
        }

        let floored_x = min_x.floor();
        let floored_y = min_y.floor();
        let snap_width = Self::snap_power_2(raw_width.max(MIN_LOCAL_WIDTH));

        let accept_min = Point::<Utm>::new(floored_x, floored_y);
        let accept_max = Point::<Utm>::new(floored_x + snap_width, floored_y + snap_width);

        let (reverse_lat, reverse_lon) =
            Self::project(&self.utm_to_global, accept_max.x, accept_max.y)
                .ok_or_else(|| Error::ProjectionFailure("reverse-project max corner".into()))?;

        self.global_bounds = BoundBox::new(bounds.min, Point::from_lat_lon(reverse_lat, reverse_lon));
        self.utm_bounds = BoundBox::new(accept_min, accept_max);
        self.local_width = snap_width;
        Ok(())
    }

    /// smallest power of two `>= target`
    fn snap_power_2(target: f64) -> f64 {
        let mut threshold = 2.0_f64;
        while threshold < target {
            threshold *= 2.0;
        }
        threshold
    }

    /// Forward-projects a global point, then subtracts the UTM min corner.
    /// Returns `None` if the reprojection is non-finite -- the NaN sentinel
    /// from the reprojection adapter is converted to `None` here and never
    /// threaded further into the core.
    #[must_use]
    pub fn map_to_local(&self, global: Point<Global>) -> Option<Point<crate::geometry::Local>> {
        let utm = self.map_to_utm(global)?;
        Some(Point::new(
            utm.x - self.utm_bounds.min.x,
            utm.y - self.utm_bounds.min.y,
        ))
    }

    /// pointwise [`FrameMapping::map_to_local`]; a feature whose majority of
    /// points fail to reproject is dropped by the caller rather than kept
    /// with holes punched in it
    #[must_use]
    pub fn map_polygon_to_local(
        &self,
        global: &Polygon<Global>,
    ) -> Option<Polygon<crate::geometry::Local>> {
        let mut mapped = Vec::with_capacity(global.vertices().len());
        let mut failures = 0usize;
        for &v in global.vertices() {
            match self.map_to_local(v) {
                Some(p) => mapped.push(p),
                None => {
                    failures += 1;
                    mapped.push(Point::new(f64::NAN, f64::NAN));
                }
            }
        }
        if failures * 2 > mapped.len() {
            warn!(failures, total = mapped.len(), "dropping feature: majority of points failed to reproject");
            return None;
        }
        let mapped: Vec<_> = mapped.into_iter().filter(|p| p.is_finite()).collect();
        Polygon::new(mapped).ok()
    }

    #[must_use]
    pub fn map_to_utm(&self, global: Point<Global>) -> Option<Point<Utm>> {
        Self::project(&self.global_to_utm, global.latitude(), global.longitude())
            .map(|(x, y)| Point::new(x, y))
    }

    #[must_use]
    pub fn map_to_global(&self, utm: Point<Utm>) -> Option<Point<Global>> {
        Self::project(&self.utm_to_global, utm.x, utm.y).map(|(lat, lon)| Point::from_lat_lon(lat, lon))
    }

    #[must_use]
    pub fn local_bounds(&self) -> BoundBox<crate::geometry::Local> {
        BoundBox::new(
            Point::new(0.0, 0.0),
            Point::new(self.local_width, self.local_width),
        )
    }

    #[must_use]
    pub fn global_bounds(&self) -> &BoundBox<Global> {
        &self.global_bounds
    }

    #[must_use]
    pub fn utm_bounds(&self) -> &BoundBox<Utm> {
        &self.utm_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_power_2_rounds_up() {
        assert_eq!(FrameMapping::snap_power_2(100.0), 128.0);
        assert_eq!(FrameMapping::snap_power_2(128.0), 128.0);
        assert_eq!(FrameMapping::snap_power_2(129.0), 256.0);
        assert_eq!(FrameMapping::snap_power_2(16384.0), 16384.0);
    }
}
