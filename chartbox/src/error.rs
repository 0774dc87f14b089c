use thiserror::Error;

/// Possible `chartbox` errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A polygon had fewer than 4 vertices, or a bounding box had `min > max`
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A span/extent was outside an allowed range (e.g. `move_to_corners`
    /// span > 16384m, or `view()` outside tracked bounds)
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A cache or input file could not be opened/read/written
    #[error("io error for {path}")]
    IoError {
        /// path that failed
        path: std::path::PathBuf,
        /// underlying error
        #[source]
        source: std::io::Error,
    },

    /// Reprojection returned non-finite coordinates
    #[error("projection failure: {0}")]
    ProjectionFailure(String),
}
