//! Per-cell path occupancy.

use crate::geometry::{AxisAlignedLine, ADJACENT_DX, ADJACENT_DZ};
use crate::grid2::Grid2;
use crate::point::Point2;
use crate::tiles::{path_tile, PathTile, Rotation};

/// All paths on the map, one boolean per cell.
#[derive(Debug, Clone)]
pub struct PathLayer {
    cells: Grid2<bool>,
}

impl PathLayer {
    pub fn new(count_x: usize, count_z: usize) -> Self {
        PathLayer {
            cells: Grid2::new(count_x, count_z, false),
        }
    }

    /// Rebuilds the layer from a saved occupancy grid.
    pub fn restore(cells: Grid2<bool>) -> Self {
        PathLayer { cells }
    }

    pub fn at(&self, pos: Point2) -> bool {
        self.cells.get(pos.x, pos.z)
    }

    pub fn cells(&self) -> &Grid2<bool> {
        &self.cells
    }

    /// Marks every cell along the line as path. Returns the cells whose tile
    /// may have changed: the line plus a one-ring border.
    pub fn construct(&mut self, line: &AxisAlignedLine) -> Vec<Point2> {
        for p in line.points() {
            self.cells.set(p.x, p.z, true);
        }
        self.scan_ring(line.start, line.end, 1)
    }

    /// Marks a single cell as path. Used by lot construction to derive the
    /// lot perimeter without an axis-aligned line.
    pub fn mark(&mut self, pos: Point2) {
        self.cells.set(pos.x, pos.z, true);
    }

    pub fn clear(&mut self, pos: Point2) {
        self.cells.set(pos.x, pos.z, false);
    }

    /// Removes the path at `pos`. Returns the one-ring neighborhood.
    pub fn destroy_at(&mut self, pos: Point2) -> Vec<Point2> {
        self.cells.set(pos.x, pos.z, false);
        self.scan_ring(pos, pos, 1)
    }

    /// Picks the tile for a path cell from its four neighbors.
    pub fn tile(&self, pos: Point2) -> (PathTile, Rotation) {
        let mut mask = 0u8;
        for i in 0..4 {
            let x = pos.x + ADJACENT_DX[i];
            let z = pos.z + ADJACENT_DZ[i];
            if self.cells.in_bounds(x, z) && self.cells.get(x, z) {
                mask |= 1 << i;
            }
        }
        path_tile(mask)
    }

    fn scan_ring(&self, a: Point2, b: Point2, ring: i32) -> Vec<Point2> {
        let mut affected = Vec::new();
        for x in (a.x.min(b.x) - ring)..=(a.x.max(b.x) + ring) {
            for z in (a.z.min(b.z) - ring)..=(a.z.max(b.z) + ring) {
                if self.cells.in_bounds(x, z) {
                    affected.push(Point2::new(x, z));
                }
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_marks_line_and_returns_ring() {
        let mut paths = PathLayer::new(8, 8);
        let line = AxisAlignedLine::new(Point2::new(2, 3), Point2::new(5, 3));
        let affected = paths.construct(&line);

        assert!(paths.at(Point2::new(2, 3)));
        assert!(paths.at(Point2::new(5, 3)));
        assert!(!paths.at(Point2::new(6, 3)));
        // 6 columns x 3 rows around the line
        assert_eq!(affected.len(), 18);
        assert!(affected.contains(&Point2::new(1, 2)));
        assert!(affected.contains(&Point2::new(6, 4)));
    }

    #[test]
    fn test_ring_is_clipped_at_the_map_edge() {
        let mut paths = PathLayer::new(8, 8);
        let line = AxisAlignedLine::point(Point2::new(0, 0));
        let affected = paths.construct(&line);
        assert_eq!(affected.len(), 4); // (0..1, 0..1)
    }

    #[test]
    fn test_tile_selection_from_neighbors() {
        let mut paths = PathLayer::new(8, 8);
        paths.construct(&AxisAlignedLine::new(Point2::new(2, 3), Point2::new(5, 3)));

        // middle of the run: east and west neighbors
        assert_eq!(
            paths.tile(Point2::new(3, 3)),
            (PathTile::TwoAdjacentStraight, Rotation::Deg90)
        );
        // west end: only an east neighbor
        assert_eq!(
            paths.tile(Point2::new(2, 3)),
            (PathTile::OneAdjacent, Rotation::Deg90)
        );
        // isolated cell elsewhere
        paths.mark(Point2::new(0, 7));
        assert_eq!(
            paths.tile(Point2::new(0, 7)),
            (PathTile::NoAdjacent, Rotation::Deg0)
        );
    }

    #[test]
    fn test_destroy_clears_and_rescans() {
        let mut paths = PathLayer::new(8, 8);
        paths.construct(&AxisAlignedLine::new(Point2::new(2, 3), Point2::new(4, 3)));
        let affected = paths.destroy_at(Point2::new(3, 3));
        assert!(!paths.at(Point2::new(3, 3)));
        assert!(paths.at(Point2::new(2, 3)));
        assert_eq!(affected.len(), 9);
    }
}
