//! The city grid: single owner of the height field, the anchor editor and
//! every occupancy layer, enforcing mutual exclusion between them.

use bevy::prelude::*;

use crate::buildings::{Building, BuildingId, BuildingLayer};
use crate::editor::SafeEditor;
use crate::error::TerrainError;
use crate::geometry::{
    AxisAlignedLine, GridRect, ADJACENT_DX, ADJACENT_DZ, CELL_TO_VERTEX_DX, CELL_TO_VERTEX_DZ,
};
use crate::grid2::Grid2;
use crate::heightfield::{CellTile, Corner, HeightField};
use crate::parking::{LotId, ParkingLayer, ParkingLot};
use crate::paths::PathLayer;
use crate::point::{Point2, Point3};
use crate::roads::RoadLayer;
use crate::tiles::{RoadTilePick, TileCatalog};

/// What occupies a cell, as a small bit set.
///
/// A cell belongs to at most one feature a player can place. Parking lots are
/// the one sanctioned overlap: their construction derives a perimeter path
/// and interior road, so lot cells may carry those bits alongside `PARKING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridUse(u8);

impl GridUse {
    pub const EMPTY: GridUse = GridUse(0);
    pub const PATH: GridUse = GridUse(1);
    pub const ROAD: GridUse = GridUse(1 << 1);
    pub const PARKING: GridUse = GridUse(1 << 2);
    pub const BUILDING: GridUse = GridUse(1 << 3);

    pub fn contains(&self, other: GridUse) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn union(self, other: GridUse) -> GridUse {
        GridUse(self.0 | other.0)
    }

    /// The combinations a well-formed grid can produce: empty, exactly one
    /// feature, or a parking lot composed with its derived path/road.
    fn is_valid_combo(&self) -> bool {
        self.0.count_ones() <= 1
            || (self.contains(GridUse::PARKING) && !self.contains(GridUse::BUILDING))
    }
}

/// Raw state needed to rebuild a [`CityGrid`], as captured by a save layer.
///
/// Grid shapes are validated on restore; everything derivable (center
/// heights, vertex anchors, lot stripes, connectivity) is recomputed.
#[derive(Debug, Clone)]
pub struct CityRestore {
    pub count_y: usize,
    pub max_depth: i32,
    pub vertex_heights: Grid2<i32>,
    pub tiles: Grid2<CellTile>,
    pub cell_anchored: Grid2<bool>,
    pub path_cells: Grid2<bool>,
    pub road_vertices: Grid2<bool>,
    pub lot_footprints: Vec<GridRect>,
    pub buildings: Vec<Building>,
}

/// Everything on and under the terrain of one map.
///
/// All mutation funnels through here so the shared-vertex, anchoring and
/// mutual-exclusion invariants are enforced in one place. Network edits set
/// `connections_dirty`; the connectivity graph consumes the flag when it
/// recomputes.
#[derive(Resource, Debug, Clone)]
pub struct CityGrid {
    pub field: HeightField,
    pub editor: SafeEditor,
    pub paths: PathLayer,
    pub roads: RoadLayer,
    pub parking: ParkingLayer,
    pub buildings: BuildingLayer,
    pub catalog: TileCatalog,
    connections_dirty: bool,
}

impl CityGrid {
    pub fn new(count_x: usize, count_z: usize, count_y: usize, max_depth: i32) -> Self {
        CityGrid {
            field: HeightField::new(count_x, count_z, count_y, max_depth),
            editor: SafeEditor::new(count_x, count_z),
            paths: PathLayer::new(count_x, count_z),
            roads: RoadLayer::new(count_x, count_z),
            parking: ParkingLayer::new(count_x, count_z),
            buildings: BuildingLayer::new(count_x, count_z),
            catalog: TileCatalog::default(),
            connections_dirty: true,
        }
    }

    /// Rebuilds the grid from saved state. The cell grids must all share one
    /// shape and the vertex grids must be one larger per axis.
    pub fn restore(data: CityRestore) -> Result<Self, TerrainError> {
        let count_x = data.tiles.size_x();
        let count_z = data.tiles.size_z();
        let cells = count_x * count_z;
        let vertices = (count_x + 1) * (count_z + 1);

        for found in [
            data.cell_anchored.size_x() * data.cell_anchored.size_z(),
            data.path_cells.size_x() * data.path_cells.size_z(),
        ] {
            if found != cells {
                return Err(TerrainError::DimensionMismatch {
                    expected: cells,
                    found,
                });
            }
        }
        for found in [
            data.vertex_heights.size_x() * data.vertex_heights.size_z(),
            data.road_vertices.size_x() * data.road_vertices.size_z(),
        ] {
            if found != vertices {
                return Err(TerrainError::DimensionMismatch {
                    expected: vertices,
                    found,
                });
            }
        }

        // decoded footprints are untrusted; reject them before any layer
        // indexes its grids
        let cell_in_bounds = |x: i32, z: i32| {
            x >= 0 && z >= 0 && (x as usize) < count_x && (z as usize) < count_z
        };
        for rect in &data.lot_footprints {
            for corner in [rect.min, rect.max] {
                if !cell_in_bounds(corner.x, corner.z) {
                    return Err(TerrainError::OutOfBounds {
                        x: corner.x,
                        z: corner.z,
                        bound_x: count_x,
                        bound_z: count_z,
                    });
                }
            }
        }
        for building in &data.buildings {
            for x in 0..building.footprint.size_x() as i32 {
                for z in 0..building.footprint.size_z() as i32 {
                    if building.footprint.get(x, z)
                        && !cell_in_bounds(building.origin.x + x, building.origin.z + z)
                    {
                        return Err(TerrainError::OutOfBounds {
                            x: building.origin.x + x,
                            z: building.origin.z + z,
                            bound_x: count_x,
                            bound_z: count_z,
                        });
                    }
                }
            }
        }

        Ok(CityGrid {
            field: HeightField::restore(
                count_x,
                count_z,
                data.count_y,
                data.max_depth,
                data.vertex_heights,
                data.tiles,
            ),
            editor: SafeEditor::restore(data.cell_anchored),
            paths: PathLayer::restore(data.path_cells),
            roads: RoadLayer::restore(data.road_vertices),
            parking: ParkingLayer::restore(count_x, count_z, &data.lot_footprints),
            buildings: BuildingLayer::restore(count_x, count_z, data.buildings),
            catalog: TileCatalog::default(),
            connections_dirty: true,
        })
    }

    pub fn count_x(&self) -> usize {
        self.field.count_x()
    }

    pub fn count_z(&self) -> usize {
        self.field.count_z()
    }

    pub fn connections_dirty(&self) -> bool {
        self.connections_dirty
    }

    pub fn take_connections_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.connections_dirty, false)
    }

    /// Composite use of one cell across every layer.
    pub fn grid_use(&self, pos: Point2) -> GridUse {
        let mut use_ = GridUse::EMPTY;
        if self.paths.at(pos) {
            use_ = use_.union(GridUse::PATH);
        }
        if self.roads.at_cell(pos) {
            use_ = use_.union(GridUse::ROAD);
        }
        if self.parking.at(pos) {
            use_ = use_.union(GridUse::PARKING);
        }
        if self.buildings.at(pos) {
            use_ = use_.union(GridUse::BUILDING);
        }
        debug_assert!(use_.is_valid_combo(), "impossible grid use at {pos}: {use_:?}");
        use_
    }

    /// Use of one vertex. Only roads occupy vertices.
    pub fn vertex_use(&self, pos: Point2) -> GridUse {
        if self.roads.at_vertex(pos) {
            GridUse::ROAD
        } else {
            GridUse::EMPTY
        }
    }

    // ========================================================================
    // Placement validity
    // ========================================================================

    /// Validity of a building footprint at `origin`: every footprint cell in
    /// bounds, flat at the origin height, and empty. Returns overall validity
    /// plus the per-cell array for placement cursors.
    pub fn is_valid_for_building(
        &self,
        origin: Point3,
        footprint: &Grid2<bool>,
    ) -> (bool, Grid2<bool>) {
        let mut valid_cells = Grid2::new(footprint.size_x(), footprint.size_z(), false);
        let mut valid = true;
        for x in 0..footprint.size_x() as i32 {
            for z in 0..footprint.size_z() as i32 {
                if !footprint.get(x, z) {
                    continue;
                }
                let cell = Point2::new(origin.x + x, origin.z + z);
                let ok = self.field.cell_in_bounds(cell.x, cell.z)
                    && self.field.is_cell_flat(cell.x, cell.z)
                    && self.field.cell_height(cell.x, cell.z, Corner::BottomLeft) == origin.y
                    && self.grid_use(cell).is_empty();
                valid_cells.set(x, z, ok);
                valid = valid && ok;
            }
        }
        (valid, valid_cells)
    }

    /// Validity of a path along a cell line: smooth along the travel axis
    /// and empty (or already path, which re-lays harmlessly).
    pub fn is_valid_for_path(&self, line: &AxisAlignedLine) -> (bool, Vec<bool>) {
        let mut valid = true;
        let per_cell: Vec<bool> = line
            .points()
            .map(|p| {
                let terrain_ok = self.field.cell_in_bounds(p.x, p.z)
                    && self.field.is_cell_smooth(p.x, p.z, line.alignment);
                let use_ = self.grid_use(p);
                let available = use_.is_empty() || use_ == GridUse::PATH;
                let ok = terrain_ok && available;
                valid = valid && ok;
                ok
            })
            .collect();
        (valid, per_cell)
    }

    /// Validity of a road along a vertex line, checked on the two flanking
    /// cell lines. Both flanks must be smooth and empty (or road), and no
    /// cell may end up with all four corners on a road (a tight turn).
    pub fn is_valid_for_road(&self, line: &AxisAlignedLine) -> (bool, [Vec<bool>; 2]) {
        let (flank_a, flank_b) = line.surrounding_grid_lines(self.count_x(), self.count_z());

        let mut valid = true;
        let mut check_flank = |flank: &AxisAlignedLine| -> Vec<bool> {
            flank
                .points()
                .map(|p| {
                    let terrain_ok = self.field.cell_in_bounds(p.x, p.z)
                        && self.field.is_cell_smooth(p.x, p.z, flank.alignment);
                    let use_ = self.grid_use(p);
                    // lot cells carry the lot's derived road bit, which is
                    // what lets a road run up to a parking lot edge
                    let available = use_.is_empty() || use_.contains(GridUse::ROAD);

                    let mut tight_turn = false;
                    if terrain_ok && available {
                        // all four corners on a road makes an undrivable cell
                        let mut road_corners = 0;
                        for i in 0..4 {
                            let v = Point2::new(
                                p.x + CELL_TO_VERTEX_DX[i],
                                p.z + CELL_TO_VERTEX_DZ[i],
                            );
                            if self.roads.vertex_in_bounds(v)
                                && (self.roads.at_vertex(v) || line.contains(v))
                            {
                                road_corners += 1;
                            }
                        }
                        tight_turn = road_corners == 4;
                    }

                    let ok = terrain_ok && available && !tight_turn;
                    valid = valid && ok;
                    ok
                })
                .collect()
        };

        let per_cell = [check_flank(&flank_a), check_flank(&flank_b)];
        (valid, per_cell)
    }

    /// Validity of a parking lot footprint: at least 2x2 cells, every cell
    /// flat and empty, all at one height.
    pub fn is_valid_for_parking_lot(&self, footprint: GridRect) -> (bool, Grid2<bool>) {
        let mut valid_cells = Grid2::new(footprint.size_x(), footprint.size_z(), false);
        let mut valid = footprint.size_x() >= 2 && footprint.size_z() >= 2;

        let base_height = self
            .field
            .cell_in_bounds(footprint.min.x, footprint.min.z)
            .then(|| self.field.vertex_height(footprint.min.x, footprint.min.z));

        for cell in footprint.cells() {
            let ok = self.field.cell_in_bounds(cell.x, cell.z)
                && self.field.is_cell_flat(cell.x, cell.z)
                && Some(self.field.cell_height(cell.x, cell.z, Corner::BottomLeft)) == base_height
                && self.grid_use(cell).is_empty();
            valid_cells.set(cell.x - footprint.min.x, cell.z - footprint.min.z, ok);
            valid = valid && ok;
        }
        (valid, valid_cells)
    }

    // ========================================================================
    // Construction / destruction
    // ========================================================================

    /// Lays a path along the line. Returns `Ok(false)` with nothing changed
    /// when the placement is invalid.
    pub fn construct_path(&mut self, line: &AxisAlignedLine) -> Result<bool, TerrainError> {
        let (valid, _) = self.is_valid_for_path(line);
        if !valid {
            return Ok(false);
        }
        let affected = self.paths.construct(line);
        self.update_cells(&affected)?;
        self.connections_dirty = true;
        debug!("constructed path {} -> {}", line.start, line.end);
        Ok(true)
    }

    /// Lays a road along the vertex line.
    pub fn construct_road(&mut self, line: &AxisAlignedLine) -> Result<bool, TerrainError> {
        let (valid, _) = self.is_valid_for_road(line);
        if !valid {
            return Ok(false);
        }
        let affected = self.roads.construct(line);
        self.update_cells(&affected)?;
        self.connections_dirty = true;
        debug!("constructed road {} -> {}", line.start, line.end);
        Ok(true)
    }

    /// Builds a parking lot over the footprint, deriving its perimeter path
    /// and interior road.
    pub fn construct_parking_lot(
        &mut self,
        footprint: GridRect,
    ) -> Result<Option<LotId>, TerrainError> {
        let (valid, _) = self.is_valid_for_parking_lot(footprint);
        if !valid {
            return Ok(None);
        }

        let (id, affected) = self.parking.construct(footprint);

        // Derived composition: the lot's edge cells walk like a path and its
        // inner vertices drive like a road, so both connectivity searches
        // can reach the lot. These writes go straight to the layers; the
        // exclusivity check above already claimed the whole footprint.
        for cell in footprint.cells() {
            let on_edge = cell.x == footprint.min.x
                || cell.x == footprint.max.x
                || cell.z == footprint.min.z
                || cell.z == footprint.max.z;
            if on_edge {
                self.paths.mark(cell);
            }
        }
        for x in (footprint.min.x + 1)..=footprint.max.x {
            for z in (footprint.min.z + 1)..=footprint.max.z {
                self.roads.mark_vertex(Point2::new(x, z));
            }
        }

        self.update_cells(&affected)?;
        self.connections_dirty = true;
        debug!(
            "constructed parking lot {:?} at {} -> {}",
            id, footprint.min, footprint.max
        );
        Ok(Some(id))
    }

    /// Places a building. Returns the id, or `None` if the placement is
    /// invalid.
    pub fn construct_building(
        &mut self,
        origin: Point3,
        footprint: Grid2<bool>,
        entry_points: Vec<Point2>,
    ) -> Result<Option<BuildingId>, TerrainError> {
        let (valid, _) = self.is_valid_for_building(origin, &footprint);
        if !valid {
            return Ok(None);
        }
        let (id, occupied) = self.buildings.construct(origin, footprint, entry_points);
        self.update_cells(&occupied)?;
        self.connections_dirty = true;
        debug!("constructed building {:?} at {}", id, origin);
        Ok(Some(id))
    }

    /// Destroys whatever occupies `pos`, most specific feature first. With a
    /// `filter`, only that feature kind is destroyed. Returns whether
    /// anything was removed.
    pub fn destroy_at(
        &mut self,
        pos: Point2,
        filter: Option<GridUse>,
    ) -> Result<bool, TerrainError> {
        let use_ = self.grid_use(pos);

        // a lot cell also carries its derived path/road bits; the owning
        // feature decides what a destroy here means
        let kind = if use_.contains(GridUse::BUILDING) {
            GridUse::BUILDING
        } else if use_.contains(GridUse::PARKING) {
            GridUse::PARKING
        } else if use_.contains(GridUse::PATH) {
            GridUse::PATH
        } else if use_.contains(GridUse::ROAD) {
            GridUse::ROAD
        } else {
            return Ok(false);
        };
        if filter.is_some_and(|wanted| wanted != kind) {
            return Ok(false);
        }

        let affected = if kind == GridUse::BUILDING {
            match self.buildings.destroy_at(pos) {
                Some((_, freed)) => freed,
                None => return Ok(false),
            }
        } else if kind == GridUse::PARKING {
            match self.parking.destroy_at(pos) {
                Some((lot, affected)) => {
                    self.clear_lot_derivatives(&lot);
                    affected
                }
                None => return Ok(false),
            }
        } else if kind == GridUse::PATH {
            self.paths.destroy_at(pos)
        } else {
            self.roads.destroy_at(pos)
        };

        self.update_cells(&affected)?;
        self.connections_dirty = true;
        Ok(true)
    }

    fn clear_lot_derivatives(&mut self, lot: &ParkingLot) {
        for cell in lot.footprint.cells() {
            self.paths.clear(cell);
        }
        for x in (lot.footprint.min.x + 1)..=lot.footprint.max.x {
            for z in (lot.footprint.min.z + 1)..=lot.footprint.max.z {
                self.roads.clear_vertex(Point2::new(x, z));
            }
        }
    }

    /// Attempts a safe height edit through the anchor-aware editor.
    pub fn safe_set_height(&mut self, x: i32, z: i32, height: i32) -> Result<bool, TerrainError> {
        self.editor.safe_set_height(&mut self.field, x, z, height)
    }

    /// Re-derives the tile and the anchor state of every listed cell.
    /// Called after each layer edit with that layer's affected region.
    fn update_cells(&mut self, cells: &[Point2]) -> Result<(), TerrainError> {
        for &pos in cells {
            let tile = self.tile_for(pos);
            self.field.set_tile(pos.x, pos.z, tile);

            let occupied = !self.grid_use(pos).is_empty();
            if occupied != self.editor.is_cell_anchored(pos.x, pos.z) {
                if occupied {
                    self.editor.set_anchored(pos.x, pos.z)?;
                } else {
                    self.editor.remove_anchor(pos.x, pos.z)?;
                }
            }
        }
        Ok(())
    }

    /// Tile for a cell, honoring layer precedence: parking lots first (their
    /// derived path/road marks are rendering details of the lot), then
    /// paths, then roads. Buildings and empty cells show grass.
    fn tile_for(&self, pos: Point2) -> CellTile {
        if self.parking.at(pos) {
            let mut adj_path = [false; 4];
            let mut adj_road = [false; 4];
            for i in 0..4 {
                // the same offsets probe the neighbor cell and, on the
                // vertex lattice, the side vertex
                let next = Point2::new(pos.x + ADJACENT_DX[i], pos.z + ADJACENT_DZ[i]);
                adj_path[i] = self.field.cell_in_bounds(next.x, next.z)
                    && self.grid_use(next).contains(GridUse::PATH);
                adj_road[i] = self.roads.vertex_in_bounds(next) && self.roads.at_vertex(next);
            }
            return match self.parking.tile(pos, adj_path, adj_road) {
                Some((tile, rotation, mirror)) => CellTile {
                    submaterial: self.catalog.parking(tile),
                    rotation,
                    mirror,
                },
                None => CellTile {
                    submaterial: self.catalog.invalid,
                    ..CellTile::default()
                },
            };
        }

        if self.paths.at(pos) {
            let (tile, rotation) = self.paths.tile(pos);
            return CellTile {
                submaterial: self.catalog.path(tile),
                rotation,
                ..CellTile::default()
            };
        }

        match self.roads.tile(pos) {
            RoadTilePick::Tile(tile, rotation, mirror) => CellTile {
                submaterial: self.catalog.road(tile),
                rotation,
                mirror,
            },
            RoadTilePick::Invalid => CellTile {
                submaterial: self.catalog.invalid,
                ..CellTile::default()
            },
            RoadTilePick::Empty => CellTile {
                submaterial: self.catalog.grass,
                ..CellTile::default()
            },
        }
    }

    /// All parking lots, for the connectivity search.
    pub fn lot_at(&self, pos: Point2) -> Option<LotId> {
        self.parking.lot_id_at(pos)
    }

    pub fn building_at(&self, pos: Point2) -> Option<&Building> {
        self.buildings
            .building_id_at(pos)
            .and_then(|id| self.buildings.building(id))
    }
}
