//! Sector cache file naming and I/O.
//!
//! The cache is modeled as a value -- a directory path and a filename
//! convention -- not a long-lived object graph: free functions over a
//! `&Path`, no struct, no back-reference to the layer that owns the cache
//! handle.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::geometry::{Local, Point};
use crate::sector::Sector;

/// `sector_%010dE_%010dN_N%u_p%u.bin`: southwest corner in millimeters
/// (10 digits), sector side `N` (4 digits), precision in millimeters
/// (5 digits).
#[must_use]
pub fn filename(sw: Point<Local>, n: usize, meters_per_cell: f64) -> String {
    let east_mm = (sw.x * 1000.0).round().max(0.0) as u64;
    let north_mm = (sw.y * 1000.0).round().max(0.0) as u64;
    let precision_mm = (meters_per_cell * 1000.0).round().max(0.0) as u64;
    format!("sector_{east_mm:010}E_{north_mm:010}N_N{n:04}_p{precision_mm:05}.bin")
}

#[must_use]
pub fn path_for(cache_root: &Path, sw: Point<Local>, n: usize, meters_per_cell: f64) -> PathBuf {
    cache_root.join(filename(sw, n, meters_per_cell))
}

/// Writes a sector's raw bytes. I/O errors here are fatal to the caller's
/// scroll/view call -- a silently-dropped save would corrupt the cache's
/// picture of what's actually on disk.
///
/// # Errors
/// [`crate::Error::IoError`] if the write fails.
pub fn save<const N: usize>(
    cache_root: &Path,
    sw: Point<Local>,
    meters_per_cell: f64,
    sector: &Sector<N>,
) -> Result<(), crate::Error> {
    let path = path_for(cache_root, sw, N, meters_per_cell);
    std::fs::write(&path, sector.as_bytes()).map_err(|source| super::io_error(path, source))
}

/// Loads a sector's raw bytes, if a cache file exists for this position.
///
/// Load failures are logged and the slot is filled `UNKNOWN` instead of
/// propagated -- this never returns an error; a missing file, a truncated
/// file, or a read failure are all just `None`.
#[must_use]
pub fn load<const N: usize>(
    cache_root: &Path,
    sw: Point<Local>,
    meters_per_cell: f64,
) -> Option<Sector<N>> {
    let path = path_for(cache_root, sw, N, meters_per_cell);
    match std::fs::read(&path) {
        Ok(bytes) if bytes.len() == Sector::<N>::LEN => Some(Sector::from_bytes(&bytes)),
        Ok(bytes) => {
            warn!(path = %path.display(), expected = Sector::<N>::LEN, got = bytes.len(), "sector cache file has wrong size, discarding");
            None
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "sector cache read failed, filling UNKNOWN");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_matches_expected_shape() {
        let name = filename(Point::new(4.096, 8.192), 64, 1.0);
        assert_eq!(name, "sector_0000004096E_0000008192N_N0064_p01000.bin");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut sector: Sector<4> = Sector::default();
        sector.set(2, 1, 0x77);
        save(dir.path(), Point::new(0.0, 0.0), 1.0, &sector).unwrap();
        let loaded: Sector<4> = load(dir.path(), Point::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(loaded.get(2, 1), 0x77);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Sector<4>> = load(dir.path(), Point::new(99.0, 99.0), 1.0);
        assert!(loaded.is_none());
    }
}
