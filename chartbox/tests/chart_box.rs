//! End-to-end coverage of `ChartBox::from_source` against a real UTM zone:
//! a bounding box and a boundary polygon in lat/lon are projected into the
//! local frame and rasterized, then sampled back out.

use chartbox::cell::{CLEAR, UNKNOWN};
use chartbox::chart_box::ChartBox;
use chartbox::frame::{init_proj_data, FrameMapping};
use chartbox::geometry::Point;
use chartbox::io::TextFeatureSource;

const SQUARE_HARBOR: &str = "\
BBOX 41.20 -70.30 41.30 -70.20
FEATURE BOUNDARY CLEAR
41.20 -70.30
41.20 -70.20
41.30 -70.20
41.30 -70.30
END
";

fn zone_19n() -> FrameMapping {
    let resource_dir = std::env::var("PROJ_LIB").unwrap_or_else(|_| "/usr/share/proj".to_string());
    init_proj_data(resource_dir);
    FrameMapping::new(19, true).expect("constructing a UTM zone 19N mapping")
}

#[test]
fn from_source_classifies_boundary_interior_clear() {
    let mut source = TextFeatureSource::from_str(SQUARE_HARBOR).unwrap();
    let chart = ChartBox::from_source(zone_19n(), &mut source).unwrap();

    let bounds = chart.mapping().local_bounds();
    let center = Point::new(bounds.width() / 2.0, bounds.height() / 2.0);
    assert_eq!(chart.classify(center), CLEAR);
}

#[test]
fn from_source_classifies_outside_local_bounds_unknown() {
    let mut source = TextFeatureSource::from_str(SQUARE_HARBOR).unwrap();
    let chart = ChartBox::from_source(zone_19n(), &mut source).unwrap();
    assert_eq!(chart.classify(Point::new(-1.0, -1.0)), UNKNOWN);
}
