//! Building footprints and their path entry points.

use std::collections::HashMap;

use crate::grid2::Grid2;
use crate::point::{Point2, Point3};

/// Handle to a constructed building, assigned in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildingId(pub u32);

/// A placed building: where it sits, which cells it covers, and the cells
/// outside the footprint a path may connect to.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: BuildingId,
    pub origin: Point3,
    pub footprint: Grid2<bool>,
    pub entry_points: Vec<Point2>,
}

/// All buildings on the map.
#[derive(Debug, Clone)]
pub struct BuildingLayer {
    cells: Grid2<Option<BuildingId>>,
    buildings: HashMap<BuildingId, Building>,
    next_id: u32,
}

impl BuildingLayer {
    pub fn new(count_x: usize, count_z: usize) -> Self {
        BuildingLayer {
            cells: Grid2::new(count_x, count_z, None),
            buildings: HashMap::new(),
            next_id: 0,
        }
    }

    /// Rebuilds the layer from saved buildings, keeping their saved ids.
    pub fn restore(count_x: usize, count_z: usize, buildings: Vec<Building>) -> Self {
        let mut layer = BuildingLayer::new(count_x, count_z);
        for building in buildings {
            layer.next_id = layer.next_id.max(building.id.0 + 1);
            for x in 0..building.footprint.size_x() as i32 {
                for z in 0..building.footprint.size_z() as i32 {
                    if building.footprint.get(x, z) {
                        layer.cells.set(
                            building.origin.x + x,
                            building.origin.z + z,
                            Some(building.id),
                        );
                    }
                }
            }
            layer.buildings.insert(building.id, building);
        }
        layer
    }

    pub fn at(&self, pos: Point2) -> bool {
        self.cells.get(pos.x, pos.z).is_some()
    }

    pub fn building_id_at(&self, pos: Point2) -> Option<BuildingId> {
        self.cells.get(pos.x, pos.z)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Building ids in construction order.
    pub fn building_ids(&self) -> Vec<BuildingId> {
        let mut ids: Vec<BuildingId> = self.buildings.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Claims every true footprint cell, with the footprint's lower-left
    /// corner at `origin`. Returns the id and the occupied cells.
    pub fn construct(
        &mut self,
        origin: Point3,
        footprint: Grid2<bool>,
        entry_points: Vec<Point2>,
    ) -> (BuildingId, Vec<Point2>) {
        let id = BuildingId(self.next_id);
        self.next_id += 1;

        let mut occupied = Vec::new();
        for x in 0..footprint.size_x() as i32 {
            for z in 0..footprint.size_z() as i32 {
                if footprint.get(x, z) {
                    let cell = Point2::new(origin.x + x, origin.z + z);
                    self.cells.set(cell.x, cell.z, Some(id));
                    occupied.push(cell);
                }
            }
        }

        self.buildings.insert(
            id,
            Building {
                id,
                origin,
                footprint,
                entry_points,
            },
        );
        (id, occupied)
    }

    /// Removes the building covering `pos`, if any. Returns it and the cells
    /// it occupied.
    pub fn destroy_at(&mut self, pos: Point2) -> Option<(Building, Vec<Point2>)> {
        let id = self.cells.get(pos.x, pos.z)?;
        let building = self.buildings.remove(&id)?;

        let mut freed = Vec::new();
        for x in 0..building.footprint.size_x() as i32 {
            for z in 0..building.footprint.size_z() as i32 {
                if building.footprint.get(x, z) {
                    let cell = Point2::new(building.origin.x + x, building.origin.z + z);
                    self.cells.set(cell.x, cell.z, None);
                    freed.push(cell);
                }
            }
        }
        Some((building, freed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shaped_footprint() -> Grid2<bool> {
        let mut footprint = Grid2::new(2, 2, true);
        footprint.set(1, 1, false);
        footprint
    }

    #[test]
    fn test_construct_marks_only_footprint_cells() {
        let mut buildings = BuildingLayer::new(8, 8);
        let (id, occupied) = buildings.construct(
            Point3::new(3, 0, 3),
            l_shaped_footprint(),
            vec![Point2::new(2, 3)],
        );

        assert_eq!(occupied.len(), 3);
        assert!(buildings.at(Point2::new(3, 3)));
        assert!(buildings.at(Point2::new(4, 3)));
        assert!(buildings.at(Point2::new(3, 4)));
        // the notch stays free
        assert!(!buildings.at(Point2::new(4, 4)));
        assert_eq!(buildings.building_id_at(Point2::new(3, 4)), Some(id));
    }

    #[test]
    fn test_ids_follow_construction_order() {
        let mut buildings = BuildingLayer::new(8, 8);
        let (a, _) = buildings.construct(Point3::new(0, 0, 0), Grid2::new(1, 1, true), vec![]);
        let (b, _) = buildings.construct(Point3::new(5, 0, 5), Grid2::new(1, 1, true), vec![]);
        assert!(a < b);
        assert_eq!(buildings.building_ids(), vec![a, b]);
    }

    #[test]
    fn test_destroy_frees_footprint() {
        let mut buildings = BuildingLayer::new(8, 8);
        let (id, _) = buildings.construct(
            Point3::new(3, 0, 3),
            l_shaped_footprint(),
            vec![Point2::new(2, 3)],
        );

        let (building, freed) = buildings.destroy_at(Point2::new(3, 4)).unwrap();
        assert_eq!(building.id, id);
        assert_eq!(freed.len(), 3);
        assert!(!buildings.at(Point2::new(3, 3)));
        assert!(buildings.destroy_at(Point2::new(3, 3)).is_none());
    }
}
