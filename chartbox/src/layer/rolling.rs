//! [`RollingGridLayer`]: a logical raster covering a large tracked extent,
//! materializing only a `K x K` torus of `N x N` sectors as its "view".
//!
//! [`RollingGridLayer::locate`] maps a local-frame point to a sector slot
//! through a ring buffer rather than a flat array, so scrolling the view
//! never has to shift the sectors already in memory; scrolling always
//! saves the trailing column/row of sectors before loading the leading one
//! (see [`RollingGridLayer::scroll_column`]/[`RollingGridLayer::scroll_row`]).

use std::path::PathBuf;

use tracing::instrument;

use super::{cache, Layer};
use crate::error::Error;
use crate::geometry::{BoundBox, Local, Point};
use crate::sector::Sector;

/// A `K x K` ring buffer of `N x N` sectors, sliding over a `tracked_bounds`
/// extent larger than any single view.
pub struct RollingGridLayer<const N: usize, const K: usize> {
    meters_per_cell: f64,
    tracked_bounds: BoundBox<Local>,
    visible_bounds: BoundBox<Local>,
    sectors: Vec<Sector<N>>,
    /// `(col, row)` index of the ring-buffer slot currently representing
    /// the southwest sector of the view.
    anchor: (usize, usize),
    cache_root: Option<PathBuf>,
}

impl<const N: usize, const K: usize> RollingGridLayer<N, K> {
    /// `tracked_bounds` must be at least as large as one view
    /// (`N*K*meters_per_cell` on a side); the initial view is anchored at
    /// `tracked_bounds.min`.
    #[must_use]
    pub fn new(tracked_bounds: BoundBox<Local>, meters_per_cell: f64) -> Self {
        let view_side = Self::view_side(meters_per_cell);
        let side = view_side
            .min(tracked_bounds.width())
            .min(tracked_bounds.height());
        let visible_bounds = BoundBox::new(
            tracked_bounds.min,
            Point::new(tracked_bounds.min.x + side, tracked_bounds.min.y + side),
        );
        Self {
            meters_per_cell,
            tracked_bounds,
            visible_bounds,
            sectors: (0..K * K).map(|_| Sector::default()).collect(),
            anchor: (0, 0),
            cache_root: None,
        }
    }

    /// enables sector persistence to `root`; each sector evicted by a
    /// scroll is saved there and reloaded on re-entry
    #[must_use]
    pub fn with_cache_root(mut self, root: PathBuf) -> Self {
        self.cache_root = Some(root);
        self
    }

    const fn view_side(meters_per_cell: f64) -> f64 {
        (N * K) as f64 * meters_per_cell
    }

    fn sector_side(&self) -> f64 {
        N as f64 * self.meters_per_cell
    }

    /// The single source of truth for the torus index map: returns
    /// `(storage_offset, col_in_sector, row_in_sector)` for `p`, or `None`
    /// if `p` falls outside the current view.
    fn locate(&self, p: Point<Local>) -> Option<(usize, usize, usize)> {
        if !self.visible_bounds.contains(&p) {
            return None;
        }
        let v_x = p.x - self.visible_bounds.min.x;
        let v_y = p.y - self.visible_bounds.min.y;
        let cell_in_view_x = (v_x / self.meters_per_cell) as usize;
        let cell_in_view_y = (v_y / self.meters_per_cell) as usize;
        let span = N * K;
        if cell_in_view_x >= span || cell_in_view_y >= span {
            return None;
        }
        let sector_in_view = (cell_in_view_x / N, cell_in_view_y / N);
        let cell_in_sector = (cell_in_view_x % N, cell_in_view_y % N);
        let sector_slot = (
            (sector_in_view.0 + self.anchor.0) % K,
            (sector_in_view.1 + self.anchor.1) % K,
        );
        let storage_offset = sector_slot.1 * K + sector_slot.0;
        Some((storage_offset, cell_in_sector.0, cell_in_sector.1))
    }

    /// Repositions the view so its center lands as close as possible to
    /// `target`, snapped to the sector grid and clipped inside
    /// `tracked_bounds`. Invalidates every sector in the view and reloads
    /// each one from cache (or `UNKNOWN` if no cache entry exists).
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if no placement of the view fits inside
    /// `tracked_bounds`.
    #[instrument(skip(self))]
    pub fn view(&mut self, target: Point<Local>) -> Result<(), Error> {
        let sector_side = self.sector_side();
        let view_side = Self::view_side(self.meters_per_cell);
        if view_side > self.tracked_bounds.width() || view_side > self.tracked_bounds.height() {
            return Err(Error::OutOfRange(
                "view window larger than tracked bounds".into(),
            ));
        }
        let half = view_side / 2.0;
        let raw = BoundBox::new(
            Point::new(target.x - half, target.y - half),
            Point::new(target.x + half, target.y + half),
        )
        .snap(sector_side, view_side);

        let min_x = raw
            .min
            .x
            .max(self.tracked_bounds.min.x)
            .min(self.tracked_bounds.max.x - view_side);
        let min_y = raw
            .min
            .y
            .max(self.tracked_bounds.min.y)
            .min(self.tracked_bounds.max.y - view_side);
        let new_visible = BoundBox::new(
            Point::new(min_x, min_y),
            Point::new(min_x + view_side, min_y + view_side),
        );
        if !self.tracked_bounds.contains_box(&new_visible) {
            return Err(Error::OutOfRange("view target outside tracked bounds".into()));
        }

        self.anchor = (0, 0);
        for row in 0..K {
            for col in 0..K {
                let origin = Point::new(
                    new_visible.min.x + col as f64 * sector_side,
                    new_visible.min.y + row as f64 * sector_side,
                );
                let loaded = self
                    .cache_root
                    .as_deref()
                    .and_then(|root| cache::load::<N>(root, origin, self.meters_per_cell));
                self.sectors[row * K + col] = loaded.unwrap_or_default();
            }
        }
        self.visible_bounds = new_visible;
        Ok(())
    }

    /// Moves the view east by exactly one sector width.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if the new view would escape `tracked_bounds`;
    /// [`Error::IoError`] if saving an evicted sector fails, leaving the
    /// view unchanged.
    pub fn scroll_east(&mut self) -> Result<(), Error> {
        self.scroll_column(true)
    }

    /// Moves the view west by exactly one sector width. See
    /// [`RollingGridLayer::scroll_east`] for error semantics.
    pub fn scroll_west(&mut self) -> Result<(), Error> {
        self.scroll_column(false)
    }

    /// Moves the view north by exactly one sector width. See
    /// [`RollingGridLayer::scroll_east`] for error semantics.
    pub fn scroll_north(&mut self) -> Result<(), Error> {
        self.scroll_row(true)
    }

    /// Moves the view south by exactly one sector width. See
    /// [`RollingGridLayer::scroll_east`] for error semantics.
    pub fn scroll_south(&mut self) -> Result<(), Error> {
        self.scroll_row(false)
    }

    #[instrument(skip(self))]
    fn scroll_column(&mut self, forward: bool) -> Result<(), Error> {
        let sector_side = self.sector_side();
        let delta = if forward { sector_side } else { -sector_side };
        let new_visible = self.visible_bounds.translate(Point::new(delta, 0.0));
        if !self.tracked_bounds.contains_box(&new_visible) {
            return Err(Error::OutOfRange("scroll escapes tracked bounds".into()));
        }
        let old_visible = self.visible_bounds;

        let trailing_view_col = if forward { 0 } else { K - 1 };
        for row in 0..K {
            let slot_col = (trailing_view_col + self.anchor.0) % K;
            let slot_row = (row + self.anchor.1) % K;
            let storage_offset = slot_row * K + slot_col;
            let origin = Point::new(
                old_visible.min.x + trailing_view_col as f64 * sector_side,
                old_visible.min.y + row as f64 * sector_side,
            );
            if let Some(cache_root) = self.cache_root.clone() {
                cache::save(&cache_root, origin, self.meters_per_cell, &self.sectors[storage_offset])?;
            }
        }

        self.anchor.0 = if forward {
            (self.anchor.0 + 1) % K
        } else {
            (self.anchor.0 + K - 1) % K
        };

        let leading_view_col = if forward { K - 1 } else { 0 };
        for row in 0..K {
            let slot_col = (leading_view_col + self.anchor.0) % K;
            let slot_row = (row + self.anchor.1) % K;
            let storage_offset = slot_row * K + slot_col;
            let origin = Point::new(
                new_visible.min.x + leading_view_col as f64 * sector_side,
                new_visible.min.y + row as f64 * sector_side,
            );
            let loaded = self
                .cache_root
                .as_deref()
                .and_then(|root| cache::load::<N>(root, origin, self.meters_per_cell));
            self.sectors[storage_offset] = loaded.unwrap_or_default();
        }

        self.visible_bounds = new_visible;
        Ok(())
    }

    #[instrument(skip(self))]
    fn scroll_row(&mut self, forward: bool) -> Result<(), Error> {
        let sector_side = self.sector_side();
        let delta = if forward { sector_side } else { -sector_side };
        let new_visible = self.visible_bounds.translate(Point::new(0.0, delta));
        if !self.tracked_bounds.contains_box(&new_visible) {
            return Err(Error::OutOfRange("scroll escapes tracked bounds".into()));
        }
        let old_visible = self.visible_bounds;

        let trailing_view_row = if forward { 0 } else { K - 1 };
        for col in 0..K {
            let slot_col = (col + self.anchor.0) % K;
            let slot_row = (trailing_view_row + self.anchor.1) % K;
            let storage_offset = slot_row * K + slot_col;
            let origin = Point::new(
                old_visible.min.x + col as f64 * sector_side,
                old_visible.min.y + trailing_view_row as f64 * sector_side,
            );
            if let Some(cache_root) = self.cache_root.clone() {
                cache::save(&cache_root, origin, self.meters_per_cell, &self.sectors[storage_offset])?;
            }
        }

        self.anchor.1 = if forward {
            (self.anchor.1 + 1) % K
        } else {
            (self.anchor.1 + K - 1) % K
        };

        let leading_view_row = if forward { K - 1 } else { 0 };
        for col in 0..K {
            let slot_col = (col + self.anchor.0) % K;
            let slot_row = (leading_view_row + self.anchor.1) % K;
            let storage_offset = slot_row * K + slot_col;
            let origin = Point::new(
                new_visible.min.x + col as f64 * sector_side,
                new_visible.min.y + leading_view_row as f64 * sector_side,
            );
            let loaded = self
                .cache_root
                .as_deref()
                .and_then(|root| cache::load::<N>(root, origin, self.meters_per_cell));
            self.sectors[storage_offset] = loaded.unwrap_or_default();
        }

        self.visible_bounds = new_visible;
        Ok(())
    }
}

impl<const N: usize, const K: usize> Layer for RollingGridLayer<N, K> {
    fn get(&self, p: Point<Local>) -> u8 {
        self.locate(p)
            .map_or(crate::cell::UNKNOWN, |(offset, col, row)| {
                self.sectors[offset].get(col, row)
            })
    }

    fn store(&mut self, p: Point<Local>, v: u8) -> bool {
        match self.locate(p) {
            Some((offset, col, row)) => {
                self.sectors[offset].set(col, row, v);
                true
            }
            None => false,
        }
    }

    fn precision(&self) -> f64 {
        self.meters_per_cell
    }

    fn tracked_bounds(&self) -> BoundBox<Local> {
        self.tracked_bounds
    }

    fn visible_bounds(&self) -> BoundBox<Local> {
        self.visible_bounds
    }

    fn fill_all(&mut self, v: u8) {
        for sector in &mut self.sectors {
            sector.fill(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> RollingGridLayer<4, 3> {
        RollingGridLayer::new(
            BoundBox::new(Point::new(0.0, 0.0), Point::new(48.0, 48.0)),
            1.0,
        )
    }

    #[test]
    fn view_snaps_to_sector_grid() {
        let mut l = layer();
        l.view(Point::new(20.0, 20.0)).unwrap();
        // view side = N*K*precision = 4*3*1 = 12; centered on (20,20) and
        // snapped to the 4m sector grid gives [12,12]..[24,24].
        assert_eq!(l.visible_bounds().min, Point::new(12.0, 12.0));
        assert_eq!(l.visible_bounds().max, Point::new(24.0, 24.0));
    }

    #[test]
    fn scroll_east_then_west_round_trips_in_view_cells() {
        let mut l = layer();
        l.view(Point::new(20.0, 20.0)).unwrap();

        // unique per-sector pattern
        for row in 0..3 {
            for col in 0..3 {
                let p = Point::new(12.0 + col as f64 * 4.0 + 0.5, 12.0 + row as f64 * 4.0 + 0.5);
                l.store(p, (row * 3 + col) as u8);
            }
        }
        let before: Vec<u8> = (0..9)
            .map(|i| {
                let row = i / 3;
                let col = i % 3;
                l.get(Point::new(12.0 + col as f64 * 4.0 + 0.5, 12.0 + row as f64 * 4.0 + 0.5))
            })
            .collect();

        l.scroll_east().unwrap();
        l.scroll_west().unwrap();

        for i in 0..9 {
            let row = i / 3;
            let col = i % 3;
            let p = Point::new(12.0 + col as f64 * 4.0 + 0.5, 12.0 + row as f64 * 4.0 + 0.5);
            assert_eq!(l.get(p), before[i], "cell {i} did not round-trip");
        }
    }

    #[test]
    fn scroll_east_evicts_trailing_column() {
        let mut l = layer();
        l.view(Point::new(20.0, 20.0)).unwrap();
        l.store(Point::new(14.5, 14.5), 0x11);
        l.scroll_east().unwrap();
        assert_eq!(l.visible_bounds().min, Point::new(16.0, 16.0));
        assert_eq!(l.get(Point::new(14.5, 14.5)), crate::cell::UNKNOWN);
        l.scroll_west().unwrap();
        assert_eq!(l.visible_bounds().min, Point::new(12.0, 12.0));
        assert_eq!(l.get(Point::new(14.5, 14.5)), 0x11);
    }

    #[test]
    fn scroll_past_tracked_bounds_errors() {
        let mut l = layer();
        l.view(Point::new(20.0, 20.0)).unwrap();
        for _ in 0..10 {
            let _ = l.scroll_east();
        }
        assert!(l.scroll_east().is_err());
    }

    #[test]
    fn cache_persists_sectors_across_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = RollingGridLayer::<4, 3>::new(
            BoundBox::new(Point::new(0.0, 0.0), Point::new(96.0, 48.0)),
            1.0,
        )
        .with_cache_root(dir.path().to_path_buf());
        l.view(Point::new(20.0, 20.0)).unwrap();
        l.store(Point::new(14.5, 14.5), 0x33);

        // scroll east far enough that the original sector is evicted and the
        // window later returns to cover it again.
        for _ in 0..4 {
            l.scroll_east().unwrap();
        }
        for _ in 0..4 {
            l.scroll_west().unwrap();
        }
        assert_eq!(l.get(Point::new(14.5, 14.5)), 0x33);
    }
}
