//! Rectangular parking lots with derived lot-line striping.

use std::collections::HashMap;

use crate::geometry::{AxisAlignment, GridRect, ADJACENT_DX, ADJACENT_DZ};
use crate::grid2::Grid2;
use crate::point::Point2;
use crate::tiles::{parking_tile, Mirror, ParkingTile, Rotation};

/// Stable lot handle derived from the footprint corners, so the same lot
/// keeps its identity across save and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LotId(pub u64);

impl LotId {
    pub fn from_footprint(footprint: GridRect) -> Self {
        LotId(footprint.min.packed() | (footprint.max.packed() << 32))
    }
}

/// One parking lot: its footprint and the painted parking-spot stripes.
#[derive(Debug, Clone)]
pub struct ParkingLot {
    pub id: LotId,
    pub footprint: GridRect,
    lot_lines: Grid2<bool>,
    pub spot_count: usize,
}

impl ParkingLot {
    pub fn new(footprint: GridRect) -> Self {
        let (lot_lines, spot_count) = generate_lot_lines(footprint);
        ParkingLot {
            id: LotId::from_footprint(footprint),
            footprint,
            lot_lines,
            spot_count,
        }
    }

    /// True when the stripes cross the given cell (footprint coordinates).
    pub fn on_stripe(&self, pos: Point2) -> bool {
        self.lot_lines
            .get(pos.x - self.footprint.min.x, pos.z - self.footprint.min.z)
    }
}

/// Paints parking stripes over the footprint: full rows of spots along the
/// major axis, with every third row across the minor axis left blank as a
/// driving lane (parity-adjusted so the lanes sit symmetrically). Returns
/// the stripe grid and the spot count.
fn generate_lot_lines(footprint: GridRect) -> (Grid2<bool>, usize) {
    let size_x = footprint.size_x();
    let size_z = footprint.size_z();
    let mut stripes = Grid2::new(size_x, size_z, false);

    let alignment = if size_x > size_z {
        AxisAlignment::XAxis
    } else {
        AxisAlignment::ZAxis
    };
    let (minor, major) = match alignment {
        AxisAlignment::XAxis => (size_z, size_x),
        _ => (size_x, size_z),
    };

    let mut count = 0;
    let parity = minor % 2;
    for i in 0..minor {
        if (i + parity) % 3 == 0 {
            continue;
        }
        for j in 0..major {
            count += 1;
            match alignment {
                AxisAlignment::XAxis => stripes.set(j as i32, i as i32, true),
                _ => stripes.set(i as i32, j as i32, true),
            }
        }
    }

    (stripes, count)
}

/// All parking lots on the map.
#[derive(Debug, Clone)]
pub struct ParkingLayer {
    cells: Grid2<Option<LotId>>,
    lots: HashMap<LotId, ParkingLot>,
}

impl ParkingLayer {
    pub fn new(count_x: usize, count_z: usize) -> Self {
        ParkingLayer {
            cells: Grid2::new(count_x, count_z, None),
            lots: HashMap::new(),
        }
    }

    /// Rebuilds the layer from saved footprints. Everything else about a lot
    /// (id, stripes, spot count) derives from its footprint.
    pub fn restore(count_x: usize, count_z: usize, footprints: &[GridRect]) -> Self {
        let mut layer = ParkingLayer::new(count_x, count_z);
        for &footprint in footprints {
            layer.construct(footprint);
        }
        layer
    }

    pub fn at(&self, pos: Point2) -> bool {
        self.cells.get(pos.x, pos.z).is_some()
    }

    pub fn lot_id_at(&self, pos: Point2) -> Option<LotId> {
        self.cells.get(pos.x, pos.z)
    }

    pub fn lot(&self, id: LotId) -> Option<&ParkingLot> {
        self.lots.get(&id)
    }

    /// Lot ids in deterministic (footprint corner) order.
    pub fn lot_ids(&self) -> Vec<LotId> {
        let mut ids: Vec<LotId> = self.lots.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Claims every footprint cell for a new lot. Returns the footprint plus
    /// a one-ring border for re-tiling.
    pub fn construct(&mut self, footprint: GridRect) -> (LotId, Vec<Point2>) {
        let lot = ParkingLot::new(footprint);
        let id = lot.id;
        for cell in footprint.cells() {
            self.cells.set(cell.x, cell.z, Some(id));
        }
        self.lots.insert(id, lot);
        (id, self.scan_ring(footprint))
    }

    /// Removes the whole lot covering `pos`, if any. Returns the cells the
    /// lot occupied and the ring around them.
    pub fn destroy_at(&mut self, pos: Point2) -> Option<(ParkingLot, Vec<Point2>)> {
        let id = self.cells.get(pos.x, pos.z)?;
        let lot = self.lots.remove(&id)?;
        for cell in lot.footprint.cells() {
            self.cells.set(cell.x, cell.z, None);
        }
        let affected = self.scan_ring(lot.footprint);
        Some((lot, affected))
    }

    /// Picks the tile for a lot cell. `adj_path` and `adj_road` describe the
    /// surrounding path cells and road vertices per side (north, east,
    /// south, west), supplied by the owner since those live in other layers.
    pub fn tile(
        &self,
        pos: Point2,
        adj_path: [bool; 4],
        adj_road: [bool; 4],
    ) -> Option<(ParkingTile, Rotation, Mirror)> {
        let id = self.cells.get(pos.x, pos.z)?;
        let lot = &self.lots[&id];

        let mut adj_lot = [false; 4];
        for i in 0..4 {
            let x = pos.x + ADJACENT_DX[i];
            let z = pos.z + ADJACENT_DZ[i];
            adj_lot[i] = self.cells.in_bounds(x, z) && lot.footprint.contains(Point2::new(x, z));
        }

        parking_tile(adj_lot, adj_path, adj_road, lot.on_stripe(pos))
    }

    fn scan_ring(&self, footprint: GridRect) -> Vec<Point2> {
        let mut affected = Vec::new();
        for x in (footprint.min.x - 1)..=(footprint.max.x + 1) {
            for z in (footprint.min.z - 1)..=(footprint.max.z + 1) {
                if self.cells.in_bounds(x, z) {
                    affected.push(Point2::new(x, z));
                }
            }
        }
        affected
    }
}
