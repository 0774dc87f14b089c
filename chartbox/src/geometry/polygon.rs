use super::bound_box::BoundBox;
use super::point::{Frame, Point};
use crate::error::Error;

/// An ordered, eventually-closed, counter-clockwise sequence of vertices in
/// frame `F`.
///
/// Vertices are loaded raw, then [`Polygon::complete`] closes the ring,
/// recomputes the bounding box, and reverses winding if the shoelace sum
/// says the polygon is clockwise.
#[derive(Clone, Debug)]
pub struct Polygon<F: Frame> {
    points: Vec<Point<F>>,
    bounds: BoundBox<F>,
}

impl<F: Frame> Polygon<F> {
    /// # Errors
    /// returns [`Error::InvalidGeometry`] if `points` has fewer than 4 vertices
    pub fn new(points: Vec<Point<F>>) -> Result<Self, Error> {
        if points.len() < 4 {
            return Err(Error::InvalidGeometry(format!(
                "polygon needs >= 4 vertices, got {}",
                points.len()
            )));
        }
        let mut bounds = BoundBox::default();
        for p in &points {
            bounds.grow(*p);
        }
        Ok(Self { points, bounds })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point<F>] {
        &self.points
    }

    #[must_use]
    pub fn bounds(&self) -> &BoundBox<F> {
        &self.bounds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// bounding-box overlap test; a cheap pre-filter, not an exact polygon
    /// intersection test
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.bounds.overlaps(&other.bounds)
    }

    /// appends the first vertex if the ring is not already closed, within
    /// the frame's nearby-tolerance
    pub fn enclose(&mut self, tolerance: f64) {
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            if !first.nearby(&last, tolerance) {
                self.points.push(first);
            }
        }
    }

    fn recalculate_bounds(&mut self) {
        let mut bounds = BoundBox::default();
        for p in &self.points {
            bounds.grow(*p);
        }
        self.bounds = bounds;
    }

    /// shoelace-formula sign; positive means counter-clockwise (right-handed)
    #[must_use]
    fn is_counter_clockwise(&self) -> bool {
        let mut sum = 0.0;
        for window in self.points.windows(2) {
            let (p1, p2) = (window[0], window[1]);
            sum += (p1.x * p2.y) - (p1.y * p2.x);
        }
        sum >= 0.0
    }

    /// idempotent: encloses the ring, recomputes the bounding box, and
    /// reverses winding if the polygon is clockwise
    pub fn complete(&mut self, tolerance: f64) {
        self.enclose(tolerance);
        self.recalculate_bounds();
        if !self.is_counter_clockwise() {
            self.points.reverse();
        }
    }

    #[must_use]
    pub fn translated(&self, delta: Point<F>) -> Self {
        let points = self.points.iter().map(|&p| p + delta).collect();
        Self::new(points).expect("translation preserves vertex count")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Local;

    fn square(points: &[(f64, f64)]) -> Polygon<Local> {
        Polygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn fewer_than_four_vertices_errors() {
        let pts = vec![Point::<Local>::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!(Polygon::new(pts).is_err());
    }

    #[test]
    fn complete_closes_and_orients_ccw() {
        // clockwise winding should get flipped to counter-clockwise
        let mut poly = square(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        poly.complete(1e-6);
        assert_eq!(poly.vertices().first(), poly.vertices().last());
        assert!(poly.is_counter_clockwise());
    }

    #[test]
    fn complete_is_idempotent() {
        let mut poly = square(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        poly.complete(1e-6);
        let after_first = poly.vertices().to_vec();
        poly.complete(1e-6);
        assert_eq!(poly.vertices(), after_first.as_slice());
    }

    #[test]
    fn bounds_match_vertex_extent_after_complete() {
        let mut poly = square(&[(1.0, 2.0), (1.0, 8.0), (9.0, 8.0), (9.0, 2.0)]);
        poly.complete(1e-6);
        assert_eq!(poly.bounds().min, Point::new(1.0, 2.0));
        assert_eq!(poly.bounds().max, Point::new(9.0, 8.0));
    }
}
