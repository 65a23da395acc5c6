//! The serialized form of a city grid.
//!
//! Save structs carry primitives and raw grids only; everything a loaded map
//! can derive (center heights, vertex anchors, lot stripes, connectivity) is
//! rebuilt on restore instead of being persisted.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use terrain::buildings::Building;
use terrain::city::{CityGrid, CityRestore};
use terrain::geometry::GridRect;
use terrain::grid2::Grid2;
use terrain::heightfield::CellTile;
use terrain::{Point2, Point3};

/// Current payload schema version. Bump on any change to the save structs.
pub const CURRENT_SAVE_VERSION: u32 = 1;

/// A lot footprint as two corner cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct SaveRect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl From<GridRect> for SaveRect {
    fn from(rect: GridRect) -> Self {
        SaveRect {
            min_x: rect.min.x,
            min_z: rect.min.z,
            max_x: rect.max.x,
            max_z: rect.max.z,
        }
    }
}

impl From<SaveRect> for GridRect {
    fn from(rect: SaveRect) -> Self {
        GridRect::new(
            Point2::new(rect.min_x, rect.min_z),
            Point2::new(rect.max_x, rect.max_z),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SaveBuilding {
    pub id: u32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub origin_z: i32,
    pub footprint: Grid2<bool>,
    pub entry_points: Vec<(i32, i32)>,
}

impl From<&Building> for SaveBuilding {
    fn from(building: &Building) -> Self {
        SaveBuilding {
            id: building.id.0,
            origin_x: building.origin.x,
            origin_y: building.origin.y,
            origin_z: building.origin.z,
            footprint: building.footprint.clone(),
            entry_points: building
                .entry_points
                .iter()
                .map(|p| (p.x, p.z))
                .collect(),
        }
    }
}

impl From<SaveBuilding> for Building {
    fn from(saved: SaveBuilding) -> Self {
        Building {
            id: terrain::buildings::BuildingId(saved.id),
            origin: Point3::new(saved.origin_x, saved.origin_y, saved.origin_z),
            footprint: saved.footprint,
            entry_points: saved
                .entry_points
                .into_iter()
                .map(|(x, z)| Point2::new(x, z))
                .collect(),
        }
    }
}

/// The raw terrain arrays: heights, tile metadata, anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TerrainSaveState {
    pub count_y: u32,
    pub max_depth: i32,
    pub vertex_heights: Grid2<i32>,
    pub tiles: Grid2<CellTile>,
    pub cell_anchored: Grid2<bool>,
}

/// Full serialized state of one map: the terrain arrays plus every network
/// layer's occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CitySaveState {
    pub version: u32,
    pub terrain: TerrainSaveState,
    pub path_cells: Grid2<bool>,
    pub road_vertices: Grid2<bool>,
    pub lots: Vec<SaveRect>,
    pub buildings: Vec<SaveBuilding>,
}

impl CitySaveState {
    /// Snapshots a live grid.
    pub fn capture(city: &CityGrid) -> Self {
        CitySaveState {
            version: CURRENT_SAVE_VERSION,
            terrain: TerrainSaveState {
                count_y: city.field.count_y() as u32,
                max_depth: city.field.max_depth(),
                vertex_heights: city.field.vertex_heights().clone(),
                tiles: city.field.tiles().clone(),
                cell_anchored: city.editor.cell_anchored().clone(),
            },
            path_cells: city.paths.cells().clone(),
            road_vertices: city.roads.vertices().clone(),
            lots: city
                .parking
                .lot_ids()
                .into_iter()
                .filter_map(|id| city.parking.lot(id))
                .map(|lot| SaveRect::from(lot.footprint))
                .collect(),
            buildings: city
                .buildings
                .building_ids()
                .into_iter()
                .filter_map(|id| city.buildings.building(id))
                .map(SaveBuilding::from)
                .collect(),
        }
    }

    /// Converts into the raw restore input consumed by [`CityGrid::restore`].
    pub fn into_restore(self) -> CityRestore {
        CityRestore {
            count_y: self.terrain.count_y as usize,
            max_depth: self.terrain.max_depth,
            vertex_heights: self.terrain.vertex_heights,
            tiles: self.terrain.tiles,
            cell_anchored: self.terrain.cell_anchored,
            path_cells: self.path_cells,
            road_vertices: self.road_vertices,
            lot_footprints: self.lots.into_iter().map(GridRect::from).collect(),
            buildings: self.buildings.into_iter().map(Building::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain::geometry::AxisAlignedLine;

    fn built_up_city() -> CityGrid {
        let mut city = CityGrid::new(8, 8, 8, 2);
        city.safe_set_height(6, 6, 1).unwrap();
        city.construct_road(&AxisAlignedLine::new(Point2::new(0, 0), Point2::new(0, 5)))
            .unwrap();
        city.construct_parking_lot(GridRect::new(Point2::new(2, 2), Point2::new(4, 4)))
            .unwrap()
            .unwrap();
        city.construct_building(
            Point3::new(6, 1, 6),
            Grid2::new(1, 1, true),
            vec![Point2::new(5, 6)],
        )
        .unwrap()
        .unwrap();
        city
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let city = built_up_city();
        let state = CitySaveState::capture(&city);
        let restored = CityGrid::restore(state.into_restore()).unwrap();

        assert_eq!(restored.field, city.field);
        assert_eq!(restored.parking.lot_ids(), city.parking.lot_ids());
        assert_eq!(restored.buildings.building_ids(), city.buildings.building_ids());
        for x in 0..8 {
            for z in 0..8 {
                let p = Point2::new(x, z);
                assert_eq!(restored.grid_use(p), city.grid_use(p), "cell {p}");
            }
        }
        // derived stripes come back with the lot
        let lot = restored.parking.lot_ids()[0];
        assert_eq!(
            restored.parking.lot(lot).unwrap().spot_count,
            city.parking.lot(lot).unwrap().spot_count
        );
    }

    #[test]
    fn test_building_entry_points_survive() {
        let city = built_up_city();
        let state = CitySaveState::capture(&city);
        let restored = CityGrid::restore(state.into_restore()).unwrap();

        let id = restored.buildings.building_ids()[0];
        let building = restored.buildings.building(id).unwrap();
        assert_eq!(building.entry_points, vec![Point2::new(5, 6)]);
        assert_eq!(building.origin, Point3::new(6, 1, 6));
    }

    #[test]
    fn test_capture_is_stable() {
        let city = built_up_city();
        assert_eq!(CitySaveState::capture(&city), CitySaveState::capture(&city));
    }
}
