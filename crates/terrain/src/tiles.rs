//! Submaterial selection for cells based on what occupies their neighbors.
//!
//! Each occupancy layer looks at its four neighbors (cells for paths and
//! parking lots, corner vertices for roads) and maps the pattern to a tile
//! from the texture atlas plus a rotation and an optional mirror.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{ATLAS_COLUMNS, ATLAS_ROWS};

/// Quarter-turn applied to a tile's UVs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_index(i: usize) -> Rotation {
        match i % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }
}

/// Axis flip applied to a tile's UVs after rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum Mirror {
    #[default]
    None,
    FlipX,
    FlipZ,
}

// ============================================================================
// Paths
// ============================================================================

/// Path tile variants, keyed by how many neighboring cells also hold a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTile {
    NoAdjacent,
    OneAdjacent,
    TwoAdjacentAngled,
    TwoAdjacentStraight,
    ThreeAdjacent,
    FourAdjacent,
}

/// Picks the path tile for a cell from its neighbor mask.
///
/// Bit layout of `mask`: bit 0 = north (z+1), bit 1 = east, bit 2 = south,
/// bit 3 = west. Every one of the 16 patterns maps to a tile.
pub fn path_tile(mask: u8) -> (PathTile, Rotation) {
    use PathTile::*;
    use Rotation::*;
    debug_assert!(mask < 16, "path neighbor mask out of range: {mask}");
    match mask & 0xF {
        0b0000 => (NoAdjacent, Deg0),
        // one adjacent
        0b0001 => (OneAdjacent, Deg0),
        0b0010 => (OneAdjacent, Deg90),
        0b0100 => (OneAdjacent, Deg180),
        0b1000 => (OneAdjacent, Deg270),
        // two adjacent, angled
        0b0011 => (TwoAdjacentAngled, Deg0),
        0b0110 => (TwoAdjacentAngled, Deg90),
        0b1100 => (TwoAdjacentAngled, Deg180),
        0b1001 => (TwoAdjacentAngled, Deg270),
        // two adjacent, straight
        0b0101 => (TwoAdjacentStraight, Deg0),
        0b1010 => (TwoAdjacentStraight, Deg90),
        // three adjacent, rotation keyed by the missing side
        0b0111 => (ThreeAdjacent, Deg0),
        0b1110 => (ThreeAdjacent, Deg90),
        0b1101 => (ThreeAdjacent, Deg180),
        0b1011 => (ThreeAdjacent, Deg270),
        _ => (FourAdjacent, Deg0),
    }
}

// ============================================================================
// Roads
// ============================================================================

/// State of one corner vertex as seen by road tile selection.
///
/// A vertex with more than two adjacent road vertices is an intersection and
/// gets its own tile shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadAdj {
    None,
    Road,
    Intersection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadTile {
    OneAdjacent,
    TwoAdjacentStraight,
    TwoAdjacentAngled,
    ThreeAdjacent,
    TwoAdjacentStraightIntersection,
    ThreeAdjacentCenterIntersection,
    ThreeAdjacentCornerIntersection,
    ThreeAdjacentStraightIntersection,
    ThreeAdjacentAngledIntersection,
}

/// Outcome of road tile selection for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadTilePick {
    /// No corner vertex holds a road; the cell stays grass.
    Empty,
    /// The corner pattern has no drawable tile (e.g. all four corners).
    Invalid,
    Tile(RoadTile, Rotation, Mirror),
}

/// Picks the road tile for a cell from its four corner vertices in
/// top-right, bottom-right, bottom-left, top-left order.
pub fn road_tile(adj: [RoadAdj; 4]) -> RoadTilePick {
    use Mirror::{FlipX, FlipZ};
    use RoadTile::*;
    use Rotation::*;

    let key = adj.map(|a| match a {
        RoadAdj::None => 0u8,
        RoadAdj::Road => 1,
        RoadAdj::Intersection => 2,
    });

    let (tile, rot, mirror) = match key {
        [0, 0, 0, 0] => return RoadTilePick::Empty,
        // one adjacent
        [1, 0, 0, 0] => (OneAdjacent, Deg0, Mirror::None),
        [0, 1, 0, 0] => (OneAdjacent, Deg90, Mirror::None),
        [0, 0, 1, 0] => (OneAdjacent, Deg180, Mirror::None),
        [0, 0, 0, 1] => (OneAdjacent, Deg270, Mirror::None),
        // two adjacent along one edge
        [1, 1, 0, 0] => (TwoAdjacentStraight, Deg0, Mirror::None),
        [0, 1, 1, 0] => (TwoAdjacentStraight, Deg90, Mirror::None),
        [0, 0, 1, 1] => (TwoAdjacentStraight, Deg180, Mirror::None),
        [1, 0, 0, 1] => (TwoAdjacentStraight, Deg270, Mirror::None),
        // two adjacent diagonally
        [1, 0, 1, 0] => (TwoAdjacentAngled, Deg0, Mirror::None),
        [0, 1, 0, 1] => (TwoAdjacentAngled, Deg90, Mirror::None),
        // three adjacent
        [1, 1, 1, 0] => (ThreeAdjacent, Deg0, Mirror::None),
        [0, 1, 1, 1] => (ThreeAdjacent, Deg90, Mirror::None),
        [1, 0, 1, 1] => (ThreeAdjacent, Deg180, Mirror::None),
        [1, 1, 0, 1] => (ThreeAdjacent, Deg270, Mirror::None),
        // two adjacent along one edge, one an intersection
        [2, 1, 0, 0] => (TwoAdjacentStraightIntersection, Deg0, Mirror::None),
        [1, 2, 0, 0] => (TwoAdjacentStraightIntersection, Deg0, FlipZ),
        [0, 2, 1, 0] => (TwoAdjacentStraightIntersection, Deg90, Mirror::None),
        [0, 1, 2, 0] => (TwoAdjacentStraightIntersection, Deg90, FlipX),
        [0, 0, 2, 1] => (TwoAdjacentStraightIntersection, Deg180, Mirror::None),
        [0, 0, 1, 2] => (TwoAdjacentStraightIntersection, Deg180, FlipZ),
        [1, 0, 0, 2] => (TwoAdjacentStraightIntersection, Deg270, Mirror::None),
        [2, 0, 0, 1] => (TwoAdjacentStraightIntersection, Deg270, FlipX),
        // three adjacent, middle corner an intersection
        [1, 2, 1, 0] => (ThreeAdjacentCenterIntersection, Deg0, Mirror::None),
        [0, 1, 2, 1] => (ThreeAdjacentCenterIntersection, Deg90, Mirror::None),
        [1, 0, 1, 2] => (ThreeAdjacentCenterIntersection, Deg180, Mirror::None),
        [2, 1, 0, 1] => (ThreeAdjacentCenterIntersection, Deg270, Mirror::None),
        // three adjacent, one end an intersection
        [2, 1, 1, 0] => (ThreeAdjacentCornerIntersection, Deg0, Mirror::None),
        [1, 1, 2, 0] => (ThreeAdjacentCornerIntersection, Deg90, FlipX),
        [0, 2, 1, 1] => (ThreeAdjacentCornerIntersection, Deg90, Mirror::None),
        [0, 1, 1, 2] => (ThreeAdjacentCornerIntersection, Deg180, FlipZ),
        [1, 0, 2, 1] => (ThreeAdjacentCornerIntersection, Deg180, Mirror::None),
        [2, 0, 1, 1] => (ThreeAdjacentCornerIntersection, Deg270, FlipX),
        [1, 1, 0, 2] => (ThreeAdjacentCornerIntersection, Deg270, Mirror::None),
        [1, 2, 0, 1] => (ThreeAdjacentCornerIntersection, Deg0, FlipZ),
        // three adjacent, two intersections side by side
        [2, 2, 1, 0] => (ThreeAdjacentStraightIntersection, Deg0, Mirror::None),
        [1, 2, 2, 0] => (ThreeAdjacentStraightIntersection, Deg90, FlipX),
        [0, 2, 2, 1] => (ThreeAdjacentStraightIntersection, Deg90, Mirror::None),
        [0, 1, 2, 2] => (ThreeAdjacentStraightIntersection, Deg180, FlipZ),
        [1, 0, 2, 2] => (ThreeAdjacentStraightIntersection, Deg180, Mirror::None),
        [2, 0, 1, 2] => (ThreeAdjacentStraightIntersection, Deg270, FlipX),
        [2, 1, 0, 2] => (ThreeAdjacentStraightIntersection, Deg270, Mirror::None),
        [2, 2, 0, 1] => (ThreeAdjacentStraightIntersection, Deg0, FlipZ),
        // three adjacent, two intersections across the diagonal
        [2, 1, 2, 0] => (ThreeAdjacentAngledIntersection, Deg0, Mirror::None),
        [0, 2, 1, 2] => (ThreeAdjacentAngledIntersection, Deg90, Mirror::None),
        [2, 0, 2, 1] => (ThreeAdjacentAngledIntersection, Deg180, Mirror::None),
        [1, 2, 0, 2] => (ThreeAdjacentAngledIntersection, Deg270, Mirror::None),
        _ => return RoadTilePick::Invalid,
    };
    RoadTilePick::Tile(tile, rot, mirror)
}

// ============================================================================
// Parking lots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingTile {
    CornerEdge,
    CornerEdgeOnePath,
    CornerEdgeTwoPath,
    StraightEdge,
    LotBlank,
    LotParkingSpots,
    StraightEdgeOnePath,
    StraightEdgeRoad,
}

/// Picks the parking lot tile for a cell inside a lot footprint.
///
/// Adjacency arrays run north, east, south, west. `adj_lot` marks neighbors
/// inside the same footprint, `adj_path` path cells, and `adj_road` road
/// vertices beside each open side. `on_stripe` marks cells crossed by the
/// painted lot lines. Returns `None` when the footprint shape has no drawable
/// tile, e.g. a one-cell-wide strip.
pub fn parking_tile(
    adj_lot: [bool; 4],
    adj_path: [bool; 4],
    adj_road: [bool; 4],
    on_stripe: bool,
) -> Option<(ParkingTile, Rotation, Mirror)> {
    use ParkingTile::*;

    if adj_lot == [true; 4] {
        let tile = if on_stripe { LotParkingSpots } else { LotBlank };
        return Some((tile, Rotation::Deg0, Mirror::None));
    }

    // Rotate the edge and corner patterns through the four orientations.
    for i in 0..4 {
        let i0 = i;
        let i1 = (i + 1) % 4;
        let i2 = (i + 2) % 4;
        let i3 = (i + 3) % 4;

        // straight edge: three lot neighbors, one open side
        if adj_lot[i0] && adj_lot[i1] && adj_lot[i2] && !adj_lot[i3] {
            let rot = Rotation::from_index(i);
            let tile = if adj_road[i3] {
                StraightEdgeRoad
            } else if adj_path[i3] {
                StraightEdgeOnePath
            } else {
                StraightEdge
            };
            return Some((tile, rot, Mirror::None));
        }

        // corner: two neighboring lot sides, two open sides
        if adj_lot[i0] && adj_lot[i1] && !adj_lot[i2] && !adj_lot[i3] {
            if adj_path[i2] && adj_path[i3] {
                return Some((CornerEdgeTwoPath, Rotation::from_index(i), Mirror::None));
            }
            if adj_path[i2] {
                return Some((CornerEdgeOnePath, Rotation::from_index(i), Mirror::None));
            }
            if adj_path[i3] {
                // The path sits on the other open side; the one-path corner
                // art covers it when rotated back and mirrored.
                let rot = Rotation::from_index((i + 3) % 4);
                let mirror = if i % 2 == 0 { Mirror::FlipX } else { Mirror::FlipZ };
                return Some((CornerEdgeOnePath, rot, mirror));
            }
            return Some((CornerEdge, Rotation::from_index(i), Mirror::None));
        }
    }

    None
}

// ============================================================================
// Atlas layout
// ============================================================================

/// Fixed layout of submaterials on the terrain texture atlas.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    pub grass: u16,
    pub invalid: u16,
    paths_base: u16,
    roads_base: u16,
    parking_base: u16,
}

impl Default for TileCatalog {
    fn default() -> Self {
        TileCatalog {
            grass: 0,
            invalid: 1,
            paths_base: 2,
            roads_base: 8,
            parking_base: 17,
        }
    }
}

impl TileCatalog {
    pub fn path(&self, tile: PathTile) -> u16 {
        self.paths_base + tile as u16
    }

    pub fn road(&self, tile: RoadTile) -> u16 {
        self.roads_base + tile as u16
    }

    pub fn parking(&self, tile: ParkingTile) -> u16 {
        self.parking_base + tile as u16
    }

    /// Number of atlas slots the catalog can address.
    pub fn capacity(&self) -> u16 {
        ATLAS_COLUMNS * ATLAS_ROWS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_tile_covers_every_mask() {
        // every mask yields a tile; spot-check the interesting shapes
        for mask in 0..16u8 {
            let _ = path_tile(mask);
        }
        assert_eq!(path_tile(0b0000), (PathTile::NoAdjacent, Rotation::Deg0));
        assert_eq!(path_tile(0b0010), (PathTile::OneAdjacent, Rotation::Deg90));
        assert_eq!(
            path_tile(0b0101),
            (PathTile::TwoAdjacentStraight, Rotation::Deg0)
        );
        assert_eq!(
            path_tile(0b1001),
            (PathTile::TwoAdjacentAngled, Rotation::Deg270)
        );
        assert_eq!(path_tile(0b1011), (PathTile::ThreeAdjacent, Rotation::Deg270));
        assert_eq!(path_tile(0b1111), (PathTile::FourAdjacent, Rotation::Deg0));
    }

    #[test]
    fn test_road_tile_straight_segment() {
        use RoadAdj::*;
        assert_eq!(
            road_tile([Road, Road, None, None]),
            RoadTilePick::Tile(RoadTile::TwoAdjacentStraight, Rotation::Deg0, Mirror::None)
        );
        assert_eq!(
            road_tile([Road, None, None, Road]),
            RoadTilePick::Tile(RoadTile::TwoAdjacentStraight, Rotation::Deg270, Mirror::None)
        );
    }

    #[test]
    fn test_road_tile_intersection_mirrors() {
        use RoadAdj::*;
        // intersection on the leading corner vs the trailing corner of the
        // same edge picks the same tile with opposite mirroring
        assert_eq!(
            road_tile([Intersection, Road, None, None]),
            RoadTilePick::Tile(
                RoadTile::TwoAdjacentStraightIntersection,
                Rotation::Deg0,
                Mirror::None
            )
        );
        assert_eq!(
            road_tile([Road, Intersection, None, None]),
            RoadTilePick::Tile(
                RoadTile::TwoAdjacentStraightIntersection,
                Rotation::Deg0,
                Mirror::FlipZ
            )
        );
    }

    #[test]
    fn test_road_tile_empty_and_invalid() {
        use RoadAdj::*;
        assert_eq!(road_tile([None; 4]), RoadTilePick::Empty);
        assert_eq!(road_tile([Road; 4]), RoadTilePick::Invalid);
        assert_eq!(
            road_tile([Intersection, Intersection, Intersection, None]),
            RoadTilePick::Invalid
        );
    }

    #[test]
    fn test_road_tile_never_panics() {
        use RoadAdj::*;
        let states = [None, Road, Intersection];
        for &a in &states {
            for &b in &states {
                for &c in &states {
                    for &d in &states {
                        let _ = road_tile([a, b, c, d]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_parking_tile_interior() {
        assert_eq!(
            parking_tile([true; 4], [false; 4], [false; 4], false),
            Some((ParkingTile::LotBlank, Rotation::Deg0, Mirror::None))
        );
        assert_eq!(
            parking_tile([true; 4], [false; 4], [false; 4], true),
            Some((ParkingTile::LotParkingSpots, Rotation::Deg0, Mirror::None))
        );
    }

    #[test]
    fn test_parking_tile_straight_edge_variants() {
        // open side is west (index 3) relative to orientation 0
        let lots = [true, true, true, false];
        assert_eq!(
            parking_tile(lots, [false; 4], [false; 4], false),
            Some((ParkingTile::StraightEdge, Rotation::Deg0, Mirror::None))
        );
        assert_eq!(
            parking_tile(lots, [false, false, false, true], [false; 4], false),
            Some((ParkingTile::StraightEdgeOnePath, Rotation::Deg0, Mirror::None))
        );
        // a road beside the open side wins over a path
        assert_eq!(
            parking_tile(
                lots,
                [false, false, false, true],
                [false, false, false, true],
                false
            ),
            Some((ParkingTile::StraightEdgeRoad, Rotation::Deg0, Mirror::None))
        );
    }

    #[test]
    fn test_parking_tile_corner_one_path_mirrored() {
        // lot to the north and east, path on the west: the corner art is
        // rotated back one step and mirrored
        let lots = [true, true, false, false];
        let paths = [false, false, false, true];
        assert_eq!(
            parking_tile(lots, paths, [false; 4], false),
            Some((ParkingTile::CornerEdgeOnePath, Rotation::Deg270, Mirror::FlipX))
        );
        // path on the south instead picks the unmirrored variant
        let paths = [false, false, true, false];
        assert_eq!(
            parking_tile(lots, paths, [false; 4], false),
            Some((ParkingTile::CornerEdgeOnePath, Rotation::Deg0, Mirror::None))
        );
    }

    #[test]
    fn test_parking_tile_degenerate_strip() {
        // a single-cell-wide lot has opposing open sides and no tile
        assert_eq!(
            parking_tile([true, false, true, false], [false; 4], [false; 4], false),
            None
        );
    }

    #[test]
    fn test_catalog_indices_fit_the_atlas() {
        let catalog = TileCatalog::default();
        assert!(catalog.path(PathTile::FourAdjacent) < catalog.capacity());
        assert!(catalog.road(RoadTile::ThreeAdjacentAngledIntersection) < catalog.capacity());
        assert!(catalog.parking(ParkingTile::StraightEdgeRoad) < catalog.capacity());
        assert_eq!(catalog.path(PathTile::NoAdjacent), 2);
        assert_eq!(catalog.road(RoadTile::OneAdjacent), 8);
        assert_eq!(catalog.parking(ParkingTile::CornerEdge), 17);
    }
}
