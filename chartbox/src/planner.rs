//! [`AStarPlanner`]: 8-connected A* search over any [`Layer`].
//!
//! Euclidean distance to goal is used as both the step cost and the
//! heuristic; the open set is a `BinaryHeap` ordered by estimated total
//! cost, and the closed set is a packed-byte predecessor grid rather than
//! a doubly-linked parent chain.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::instrument;

use crate::cell::is_passable;
use crate::geometry::{BoundBox, Local, Path, Point};
use crate::layer::Layer;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// `(delta_col, delta_row)` for the 8 neighbors, indexed 0..8. Direction
/// `i`'s opposite is `(i + 4) % 8` -- used to encode "the direction back to
/// my predecessor" without a second table.
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const DIR_MASK: u8 = 0b0000_0111;
const VISITED_FLAG: u8 = 0b0000_1000;
const START_FLAG: u8 = 0b0001_0000;

/// Post-processing options for [`AStarPlanner::plan`].
///
/// Simplification defaults **on**, with a default minimum waypoint
/// separation of one cell -- a planner's typical consumer (a steering
/// controller) wants sparse waypoints, not one per grid cell.
#[derive(Clone, Copy, Debug)]
pub struct AStarPlanner {
    /// collapse consecutive collinear cells into their endpoints
    pub simplify: bool,
    /// minimum number of cells between retained waypoints after simplification
    pub min_waypoint_separation: usize,
}

impl Default for AStarPlanner {
    fn default() -> Self {
        Self {
            simplify: true,
            min_waypoint_separation: 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
struct ScoredCell {
    estimated_total: f64,
    cost_so_far: f64,
    col: i64,
    row: i64,
}

impl Eq for ScoredCell {}

impl Ord for ScoredCell {
    // reversed: BinaryHeap is a max-heap, and we want the smallest
    // estimated_total (g + h) popped first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimated_total
            .partial_cmp(&self.estimated_total)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ScoredCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AStarPlanner {
    /// Euclidean distance from `p` to `goal` -- admissible for 8-connected
    /// Euclidean step cost.
    #[must_use]
    pub fn heuristic(p: Point<Local>, goal: Point<Local>) -> f64 {
        p.distance(&goal)
    }

    /// Searches `layer` for a path from `start` to `goal`, both in local
    /// coordinates. Returns an empty [`Path`] if the start is out of
    /// bounds, either endpoint is non-passable, or the open set exhausts
    /// before reaching the goal -- the planner never returns an error.
    #[instrument(skip(self, layer))]
    pub fn plan(&self, layer: &dyn Layer, start: Point<Local>, goal: Point<Local>) -> Path<Local> {
        let visible = layer.visible_bounds();
        let precision = layer.precision();
        let side = cells_across(&visible, precision);

        let Some(start_cell) = to_cell(&visible, precision, start) else {
            return Path::new(Vec::new());
        };
        let Some(goal_cell) = to_cell(&visible, precision, goal) else {
            return Path::new(Vec::new());
        };
        if !is_passable(layer.get(cell_center(&visible, precision, start_cell)))
            || !is_passable(layer.get(cell_center(&visible, precision, goal_cell)))
        {
            return Path::new(Vec::new());
        }
        if start_cell == goal_cell {
            return Path::new(vec![start, goal]);
        }

        let n = side * side;
        let index = |(col, row): (i64, i64)| (row * side + col) as usize;

        let mut predecessor = vec![0u8; n as usize];
        let mut best_cost = vec![f64::INFINITY; n as usize];
        best_cost[index(start_cell)] = 0.0;
        predecessor[index(start_cell)] = VISITED_FLAG | START_FLAG;

        let mut open = BinaryHeap::new();
        open.push(ScoredCell {
            estimated_total: Self::heuristic(start, goal),
            cost_so_far: 0.0,
            col: start_cell.0,
            row: start_cell.1,
        });

        while let Some(current) = open.pop() {
            let current_cell = (current.col, current.row);
            if current.cost_so_far > best_cost[index(current_cell)] {
                continue; // stale entry; a cheaper path to this cell was already found
            }
            if current_cell == goal_cell {
                let cells = reconstruct(&predecessor, side, goal_cell);
                return build_path(&cells, &visible, precision, start, goal, self);
            }

            for (dir, &(dc, dr)) in DIRECTIONS.iter().enumerate() {
                let neighbor = (current_cell.0 + dc, current_cell.1 + dr);
                if neighbor.0 < 0 || neighbor.1 < 0 || neighbor.0 >= side || neighbor.1 >= side {
                    continue;
                }
                let center = cell_center(&visible, precision, neighbor);
                if !is_passable(layer.get(center)) {
                    continue;
                }
                let step = if dc != 0 && dr != 0 { SQRT_2 } else { 1.0 } * precision;
                let tentative = current.cost_so_far + step;
                let idx = index(neighbor);
                if tentative < best_cost[idx] {
                    best_cost[idx] = tentative;
                    predecessor[idx] = VISITED_FLAG | (((dir + 4) % 8) as u8 & DIR_MASK);
                    open.push(ScoredCell {
                        estimated_total: tentative + Self::heuristic(center, goal),
                        cost_so_far: tentative,
                        col: neighbor.0,
                        row: neighbor.1,
                    });
                }
            }
        }

        Path::new(Vec::new())
    }
}

fn cells_across(visible: &BoundBox<Local>, precision: f64) -> i64 {
    (visible.width() / precision).round() as i64
}

fn to_cell(visible: &BoundBox<Local>, precision: f64, p: Point<Local>) -> Option<(i64, i64)> {
    if !visible.contains(&p) {
        return None;
    }
    let col = ((p.x - visible.min.x) / precision).floor() as i64;
    let row = ((p.y - visible.min.y) / precision).floor() as i64;
    let side = cells_across(visible, precision);
    if col < 0 || row < 0 || col >= side || row >= side {
        return None;
    }
    Some((col, row))
}

fn cell_center(visible: &BoundBox<Local>, precision: f64, (col, row): (i64, i64)) -> Point<Local> {
    Point::new(
        visible.min.x + (col as f64 + 0.5) * precision,
        visible.min.y + (row as f64 + 0.5) * precision,
    )
}

/// Walks predecessors from `goal_cell` back to the start-sentinel cell,
/// returning cells in start-to-goal order.
fn reconstruct(predecessor: &[u8], side: i64, goal_cell: (i64, i64)) -> Vec<(i64, i64)> {
    let index = |(col, row): (i64, i64)| (row * side + col) as usize;
    let mut cells = vec![goal_cell];
    let mut current = goal_cell;
    loop {
        let byte = predecessor[index(current)];
        if byte & START_FLAG != 0 {
            break;
        }
        let (dc, dr) = DIRECTIONS[(byte & DIR_MASK) as usize];
        current = (current.0 + dc, current.1 + dr);
        cells.push(current);
    }
    cells.reverse();
    cells
}

fn build_path(
    cells: &[(i64, i64)],
    visible: &BoundBox<Local>,
    precision: f64,
    start: Point<Local>,
    goal: Point<Local>,
    planner: &AStarPlanner,
) -> Path<Local> {
    let mut points: Vec<Point<Local>> = cells
        .iter()
        .map(|&c| cell_center(visible, precision, c))
        .collect();
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if let Some(last) = points.last_mut() {
        *last = goal;
    }

    if planner.simplify {
        points = collapse_collinear(&points);
    }
    if planner.min_waypoint_separation > 1 {
        points = enforce_min_separation(&points, planner.min_waypoint_separation, precision);
    }
    Path::new(points)
}

/// Collapses consecutive collinear points into their endpoints, always
/// keeping the first and last point.
fn collapse_collinear(points: &[Point<Local>]) -> Vec<Point<Local>> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut kept = vec![points[0]];
    for window in points.windows(3) {
        let (a, b, c) = (window[0], window[1], window[2]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross.abs() > 1e-9 {
            kept.push(b);
        }
    }
    kept.push(*points.last().expect("points is non-empty"));
    kept
}

/// Drops waypoints that fall closer than `min_cells * precision` to the
/// previously retained one, always keeping the first and last.
fn enforce_min_separation(
    points: &[Point<Local>],
    min_cells: usize,
    precision: f64,
) -> Vec<Point<Local>> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let min_distance = min_cells as f64 * precision;
    let mut kept = vec![points[0]];
    for &p in &points[1..points.len() - 1] {
        if p.distance(kept.last().expect("kept is non-empty")) >= min_distance {
            kept.push(p);
        }
    }
    kept.push(*points.last().expect("points is non-empty"));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{BLOCK, CLEAR};
    use crate::layer::static_grid::StaticGridLayer;

    fn clear_layer() -> StaticGridLayer<32> {
        let mut layer = StaticGridLayer::new(
            BoundBox::new(Point::new(0.0, 0.0), Point::new(32.0, 32.0)),
            1.0,
        );
        layer.fill_all(CLEAR);
        layer
    }

    #[test]
    fn straight_line_on_clear_layer() {
        let layer = clear_layer();
        let planner = AStarPlanner::default();
        let path = planner.plan(&layer, Point::new(0.5, 0.5), Point::new(30.5, 30.5));
        assert!(!path.is_empty());
        assert_eq!(*path.vertices().first().unwrap(), Point::new(0.5, 0.5));
        assert_eq!(*path.vertices().last().unwrap(), Point::new(30.5, 30.5));
        let max_len = (2.0_f64.sqrt() * 30.0).ceil() + 1.0;
        assert!(path.length() <= max_len, "path length {}", path.length());
    }

    #[test]
    fn routes_around_a_centered_block() {
        let mut layer = clear_layer();
        crate::layer::fill_box(
            &mut layer,
            &BoundBox::new(Point::new(12.0, 12.0), Point::new(20.0, 20.0)),
            BLOCK,
        );
        let planner = AStarPlanner::default();
        let path = planner.plan(&layer, Point::new(2.5, 2.5), Point::new(30.5, 30.5));
        assert!(!path.is_empty());
        for p in path.vertices() {
            assert!(layer.get(*p) != BLOCK, "waypoint fell on a blocked cell");
        }
        let straight_line = Point::new(2.5, 2.5).distance(&Point::new(30.5, 30.5));
        assert!(path.length() <= 1.6 * straight_line);
    }

    #[test]
    fn non_passable_start_returns_empty() {
        let mut layer = clear_layer();
        layer.store(Point::new(0.5, 0.5), BLOCK);
        let planner = AStarPlanner::default();
        let path = planner.plan(&layer, Point::new(0.5, 0.5), Point::new(10.5, 10.5));
        assert!(path.is_empty());
    }

    #[test]
    fn out_of_bounds_start_returns_empty() {
        let layer = clear_layer();
        let planner = AStarPlanner::default();
        let path = planner.plan(&layer, Point::new(-5.0, -5.0), Point::new(10.5, 10.5));
        assert!(path.is_empty());
    }

    #[test]
    fn fully_blocked_layer_returns_empty() {
        let mut layer = clear_layer();
        layer.fill_all(BLOCK);
        layer.store(Point::new(0.5, 0.5), CLEAR);
        layer.store(Point::new(30.5, 30.5), CLEAR);
        let planner = AStarPlanner::default();
        let path = planner.plan(&layer, Point::new(0.5, 0.5), Point::new(30.5, 30.5));
        assert!(path.is_empty());
    }
}
