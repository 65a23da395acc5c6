//! Per-vertex road occupancy and shortest-route queries over it.

use pathfinding::prelude::astar;

use crate::geometry::{
    AxisAlignedLine, ADJACENT_DX, ADJACENT_DZ, CELL_TO_VERTEX_DX, CELL_TO_VERTEX_DZ,
};
use crate::grid2::Grid2;
use crate::point::Point2;
use crate::tiles::{road_tile, RoadAdj, RoadTilePick};

/// All roads on the map, one boolean per vertex.
///
/// Roads live on the vertex lattice, so a single road segment renders across
/// the cells on both of its sides.
#[derive(Debug, Clone)]
pub struct RoadLayer {
    vertices: Grid2<bool>,
}

impl RoadLayer {
    pub fn new(count_x: usize, count_z: usize) -> Self {
        RoadLayer {
            vertices: Grid2::new(count_x + 1, count_z + 1, false),
        }
    }

    /// Rebuilds the layer from a saved vertex grid.
    pub fn restore(vertices: Grid2<bool>) -> Self {
        RoadLayer { vertices }
    }

    pub fn at_vertex(&self, pos: Point2) -> bool {
        self.vertices.get(pos.x, pos.z)
    }

    /// True when any corner vertex of the cell holds a road.
    pub fn at_cell(&self, pos: Point2) -> bool {
        (0..4).any(|i| {
            self.vertices
                .get(pos.x + CELL_TO_VERTEX_DX[i], pos.z + CELL_TO_VERTEX_DZ[i])
        })
    }

    pub fn vertices(&self) -> &Grid2<bool> {
        &self.vertices
    }

    pub fn vertex_in_bounds(&self, pos: Point2) -> bool {
        self.vertices.in_bounds(pos.x, pos.z)
    }

    /// Marks every vertex along the line as road. Returns the cells whose
    /// tile may have changed: intersection status reaches one vertex out, so
    /// the scan is one cell wider than for paths.
    pub fn construct(&mut self, line: &AxisAlignedLine) -> Vec<Point2> {
        for p in line.points() {
            self.vertices.set(p.x, p.z, true);
        }
        self.scan(
            line.start.x.min(line.end.x) - 2,
            line.start.z.min(line.end.z) - 2,
            line.start.x.max(line.end.x) + 1,
            line.start.z.max(line.end.z) + 1,
        )
    }

    /// Marks a single vertex as road. Used by lot construction to derive the
    /// lot interior.
    pub fn mark_vertex(&mut self, pos: Point2) {
        self.vertices.set(pos.x, pos.z, true);
    }

    pub fn clear_vertex(&mut self, pos: Point2) {
        self.vertices.set(pos.x, pos.z, false);
    }

    /// Removes the road under the cell at `pos` by clearing its four corner
    /// vertices. Returns the two-ring neighborhood of cells to re-tile.
    pub fn destroy_at(&mut self, pos: Point2) -> Vec<Point2> {
        for i in 0..4 {
            self.vertices
                .set(pos.x + CELL_TO_VERTEX_DX[i], pos.z + CELL_TO_VERTEX_DZ[i], false);
        }
        self.scan(pos.x - 2, pos.z - 2, pos.x + 2, pos.z + 2)
    }

    /// Road state of one vertex as seen from tile selection: empty, plain
    /// road, or intersection (more than two adjacent road vertices).
    pub fn vertex_adjacency(&self, x: i32, z: i32) -> RoadAdj {
        if !self.vertices.in_bounds(x, z) || !self.vertices.get(x, z) {
            return RoadAdj::None;
        }
        let mut neighbors = 0;
        for i in 0..4 {
            let nx = x + ADJACENT_DX[i];
            let nz = z + ADJACENT_DZ[i];
            if self.vertices.in_bounds(nx, nz) && self.vertices.get(nx, nz) {
                neighbors += 1;
            }
        }
        if neighbors > 2 {
            RoadAdj::Intersection
        } else {
            RoadAdj::Road
        }
    }

    /// Picks the tile for a cell from its four corner vertices.
    pub fn tile(&self, pos: Point2) -> RoadTilePick {
        let adj = [
            self.vertex_adjacency(pos.x + 1, pos.z + 1), // top-right
            self.vertex_adjacency(pos.x + 1, pos.z),     // bottom-right
            self.vertex_adjacency(pos.x, pos.z),         // bottom-left
            self.vertex_adjacency(pos.x, pos.z + 1),     // top-left
        ];
        road_tile(adj)
    }

    /// Shortest route between two road vertices, walking road-occupied
    /// vertex neighbors. Returns the inclusive vertex sequence.
    pub fn find_route(&self, start: Point2, goal: Point2) -> Option<Vec<Point2>> {
        if !self.at_vertex(start) || !self.at_vertex(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let result = astar(
            &start,
            |&node| {
                self.road_neighbors(node)
                    .into_iter()
                    .map(|n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |node| heuristic(node, &goal),
            |&node| node == goal,
        );

        result.map(|(route, _cost)| route)
    }

    /// Nearest road vertex to a position, by expanding Manhattan rings up to
    /// radius 3. Ties inside a ring resolve to the first hit in scan order.
    pub fn nearest_road_vertex(&self, pos: Point2) -> Option<Point2> {
        if self.vertices.in_bounds(pos.x, pos.z) && self.vertices.get(pos.x, pos.z) {
            return Some(pos);
        }
        for radius in 1..=3i32 {
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() + dz.abs() != radius {
                        continue;
                    }
                    let x = pos.x + dx;
                    let z = pos.z + dz;
                    if self.vertices.in_bounds(x, z) && self.vertices.get(x, z) {
                        return Some(Point2::new(x, z));
                    }
                }
            }
        }
        None
    }

    pub fn road_neighbors(&self, at: Point2) -> Vec<Point2> {
        let mut neighbors = Vec::with_capacity(4);
        for i in 0..4 {
            let x = at.x + ADJACENT_DX[i];
            let z = at.z + ADJACENT_DZ[i];
            if self.vertices.in_bounds(x, z) && self.vertices.get(x, z) {
                neighbors.push(Point2::new(x, z));
            }
        }
        neighbors
    }

    fn scan(&self, min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Vec<Point2> {
        let mut affected = Vec::new();
        let cell_max_x = self.vertices.size_x() as i32 - 2;
        let cell_max_z = self.vertices.size_z() as i32 - 2;
        for x in min_x..=max_x {
            for z in min_z..=max_z {
                if x >= 0 && z >= 0 && x <= cell_max_x && z <= cell_max_z {
                    affected.push(Point2::new(x, z));
                }
            }
        }
        affected
    }
}

fn heuristic(a: &Point2, b: &Point2) -> u32 {
    (a.x - b.x).unsigned_abs() + (a.z - b.z).unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{Mirror, RoadTile, Rotation};

    #[test]
    fn test_construct_marks_vertices() {
        let mut roads = RoadLayer::new(8, 8);
        let line = AxisAlignedLine::new(Point2::new(2, 2), Point2::new(2, 6));
        roads.construct(&line);

        assert!(roads.at_vertex(Point2::new(2, 4)));
        assert!(!roads.at_vertex(Point2::new(3, 4)));
        // both cells flanking the vertex line see the road
        assert!(roads.at_cell(Point2::new(1, 3)));
        assert!(roads.at_cell(Point2::new(2, 3)));
        assert!(!roads.at_cell(Point2::new(4, 3)));
    }

    #[test]
    fn test_straight_road_tiles() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(2, 2), Point2::new(2, 6)));

        // cell to the west of a mid-run vertex pair: TR + BR corners
        assert_eq!(
            roads.tile(Point2::new(1, 3)),
            RoadTilePick::Tile(RoadTile::TwoAdjacentStraight, Rotation::Deg0, Mirror::None)
        );
        // cell to the east: BL + TL corners
        assert_eq!(
            roads.tile(Point2::new(2, 3)),
            RoadTilePick::Tile(RoadTile::TwoAdjacentStraight, Rotation::Deg180, Mirror::None)
        );
        assert_eq!(roads.tile(Point2::new(5, 5)), RoadTilePick::Empty);
    }

    #[test]
    fn test_intersection_detection() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(2, 0), Point2::new(2, 4)));
        roads.construct(&AxisAlignedLine::new(Point2::new(0, 2), Point2::new(4, 2)));

        assert_eq!(roads.vertex_adjacency(2, 2), RoadAdj::Intersection);
        assert_eq!(roads.vertex_adjacency(2, 1), RoadAdj::Road);
        assert_eq!(roads.vertex_adjacency(5, 5), RoadAdj::None);
    }

    #[test]
    fn test_find_route_follows_the_road() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(1, 1), Point2::new(1, 5)));
        roads.construct(&AxisAlignedLine::new(Point2::new(1, 5), Point2::new(6, 5)));

        let route = roads
            .find_route(Point2::new(1, 1), Point2::new(6, 5))
            .unwrap();
        assert_eq!(route.first(), Some(&Point2::new(1, 1)));
        assert_eq!(route.last(), Some(&Point2::new(6, 5)));
        // L-shaped road: 4 steps up, 5 steps across
        assert_eq!(route.len(), 10);
    }

    #[test]
    fn test_find_route_rejects_off_road_endpoints() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(1, 1), Point2::new(1, 5)));
        assert!(roads
            .find_route(Point2::new(1, 1), Point2::new(4, 4))
            .is_none());
    }

    #[test]
    fn test_nearest_road_vertex_spiral() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(2, 2), Point2::new(2, 6)));

        assert_eq!(
            roads.nearest_road_vertex(Point2::new(2, 4)),
            Some(Point2::new(2, 4))
        );
        assert_eq!(
            roads.nearest_road_vertex(Point2::new(4, 4)),
            Some(Point2::new(2, 4))
        );
        // more than three rings away
        assert_eq!(roads.nearest_road_vertex(Point2::new(7, 0)), None);
    }

    #[test]
    fn test_destroy_clears_cell_corners() {
        let mut roads = RoadLayer::new(8, 8);
        roads.construct(&AxisAlignedLine::new(Point2::new(2, 2), Point2::new(2, 6)));
        roads.destroy_at(Point2::new(2, 3));
        assert!(!roads.at_vertex(Point2::new(2, 3)));
        assert!(!roads.at_vertex(Point2::new(2, 4)));
        assert!(roads.at_vertex(Point2::new(2, 2)));
        assert!(roads.at_vertex(Point2::new(2, 5)));
    }
}
