//! Property-based tests for `BoundBox::snap` and the `Layer` get/store
//! contract.

use chartbox::cell::UNKNOWN;
use chartbox::geometry::{BoundBox, Local, Point};
use chartbox::layer::static_grid::StaticGridLayer;
use chartbox::layer::Layer;
use proptest::prelude::*;

proptest! {
    #[test]
    fn snap_floors_min_and_contains_original_min(
        min_x in -1000.0f64..1000.0,
        min_y in -1000.0f64..1000.0,
        interval in 1.0f64..64.0,
        new_size in 1.0f64..256.0,
    ) {
        let original = BoundBox::<Local>::new(
            Point::new(min_x, min_y),
            Point::new(min_x + 1.0, min_y + 1.0),
        );
        let snapped = original.snap(interval, new_size);
        prop_assert!((snapped.min.x - (min_x / interval).floor() * interval).abs() < 1e-9);
        prop_assert!((snapped.min.y - (min_y / interval).floor() * interval).abs() < 1e-9);
        prop_assert!(snapped.min.x <= original.min.x);
        prop_assert!(snapped.min.y <= original.min.y);
    }

    #[test]
    fn store_then_get_round_trips_anywhere_in_bounds(
        x in 0.0f64..32.0,
        y in 0.0f64..32.0,
        value in 0u8..=255,
    ) {
        let bounds = BoundBox::<Local>::new(Point::new(0.0, 0.0), Point::new(32.0, 32.0));
        let mut layer: StaticGridLayer<32> = StaticGridLayer::new(bounds, 1.0);
        let p = Point::new(x, y);
        prop_assert!(layer.store(p, value));
        prop_assert_eq!(layer.get(p), value);
    }

    #[test]
    fn points_outside_bounds_are_unknown_and_reject_store(
        x in 32.1f64..100.0,
        y in 32.1f64..100.0,
        value in 0u8..=255,
    ) {
        let bounds = BoundBox::<Local>::new(Point::new(0.0, 0.0), Point::new(32.0, 32.0));
        let mut layer: StaticGridLayer<32> = StaticGridLayer::new(bounds, 1.0);
        let p = Point::new(x, y);
        prop_assert_eq!(layer.get(p), UNKNOWN);
        prop_assert!(!layer.store(p, value));
    }
}
