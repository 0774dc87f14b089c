//! # chartbox
//!
//! A multi-layer navigational chart engine for marine/autonomous-vehicle
//! route planning: geospatial polygons in lat/lon are projected into a
//! local metric frame, rasterized into layered occupancy grids, composited
//! into a per-point classification, and searched with an A* planner.
//!
//! The load-bearing pieces are the tiled rolling-grid raster engine with
//! its persistent sector cache ([`layer::RollingGridLayer`]), the
//! coordinate-frame mapping it depends on ([`frame::FrameMapping`]), the
//! polygon-to-grid rasterizer ([`rasterize`]), and the A*-over-grid planner
//! ([`planner::AStarPlanner`]). Concrete file-format ingest
//! (GeoJSON/Shapefile) and image output are explicitly out of scope; only
//! the [`io::FeatureSource`]/[`io::RasterSink`] interfaces to them are
//! specified, plus one minimal concrete implementation of each.
//!
//! ### Architecture
//!
//! Reprojection goes through GDAL/OGR. The rolling grid is a ring-buffer
//! view over a much larger tracked extent, with sector eviction/reload on
//! scroll; the rolling and static grid layers share one cell-access trait
//! generic over `N`/`K` const generics rather than each re-implementing
//! their own grid indexing.
//!
//! ### Usage
//!
//! ```no_run
//! use chartbox::chart_box::ChartBox;
//! use chartbox::frame::{init_proj_data, FrameMapping};
//! use chartbox::io::{FeatureSource, TextFeatureSource};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_proj_data("/usr/share/proj");
//!     let mapping = FrameMapping::new(19, true)?;
//!     let mut source = TextFeatureSource::from_path("chart.txt")?;
//!     let chart = ChartBox::from_source(mapping, &mut source)?;
//!
//!     let local = chart
//!         .mapping()
//!         .map_to_local(chartbox::geometry::Point::from_lat_lon(41.25, -70.25))
//!         .expect("point reprojects");
//!     println!("classification: {:#x}", chart.classify(local));
//!     Ok(())
//! }
//! ```
//!
//! #### Unstable API
//!
//! This crate is still a work in progress; expect breaking changes between
//! minor releases until `v1.0`.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, rustdoc::broken_intra_doc_links)]

pub mod cell;
pub mod chart_box;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod layer;
pub mod planner;
pub mod rasterize;
pub mod sector;

pub use chart_box::ChartBox;
pub use error::Error;
pub use frame::FrameMapping;
pub use layer::Layer;
pub use planner::AStarPlanner;
