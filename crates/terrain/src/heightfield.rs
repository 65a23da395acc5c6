//! The terrain height field: vertex heights in discrete steps, derived cell
//! center heights, and the per-cell tile assignment the mesh is textured from.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::grid2::Grid2;
use crate::tiles::{Mirror, Rotation};

/// Named corner of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

/// Texture assignment for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CellTile {
    pub submaterial: u16,
    pub rotation: Rotation,
    pub mirror: Mirror,
}

/// A rectangular grid of cells with a height value at every vertex.
///
/// The vertex lattice is one larger than the cell grid on each axis, so
/// adjacent cells share their edge vertices by construction. Each cell also
/// carries a derived center height used by the render mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    count_x: usize,
    count_z: usize,
    count_y: usize,
    max_depth: i32,
    vertex_heights: Grid2<i32>,
    center_heights: Grid2<f32>,
    tiles: Grid2<CellTile>,
    mesh_dirty: bool,
}

impl HeightField {
    /// Creates a field of `count_x` by `count_z` cells, flattened to height 0.
    /// `count_y` is the number of height steps above 0; `max_depth` the number
    /// below.
    pub fn new(count_x: usize, count_z: usize, count_y: usize, max_depth: i32) -> Self {
        HeightField {
            count_x,
            count_z,
            count_y,
            max_depth,
            vertex_heights: Grid2::new(count_x + 1, count_z + 1, 0),
            center_heights: Grid2::new(count_x, count_z, 0.0),
            tiles: Grid2::new(count_x, count_z, CellTile::default()),
            mesh_dirty: true,
        }
    }

    pub fn count_x(&self) -> usize {
        self.count_x
    }

    pub fn count_z(&self) -> usize {
        self.count_z
    }

    pub fn count_y(&self) -> usize {
        self.count_y
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn cell_in_bounds(&self, x: i32, z: i32) -> bool {
        self.tiles.in_bounds(x, z)
    }

    pub fn vertex_in_bounds(&self, x: i32, z: i32) -> bool {
        self.vertex_heights.in_bounds(x, z)
    }

    pub fn vertex_height(&self, x: i32, z: i32) -> i32 {
        self.vertex_heights.get(x, z)
    }

    pub fn vertex_heights(&self) -> &Grid2<i32> {
        &self.vertex_heights
    }

    pub fn cell_height(&self, x: i32, z: i32, corner: Corner) -> i32 {
        match corner {
            Corner::BottomLeft => self.vertex_heights.get(x, z),
            Corner::BottomRight => self.vertex_heights.get(x + 1, z),
            Corner::TopRight => self.vertex_heights.get(x + 1, z + 1),
            Corner::TopLeft => self.vertex_heights.get(x, z + 1),
        }
    }

    pub fn center_height(&self, x: i32, z: i32) -> f32 {
        self.center_heights.get(x, z)
    }

    pub fn tile(&self, x: i32, z: i32) -> CellTile {
        self.tiles.get(x, z)
    }

    pub fn tiles(&self) -> &Grid2<CellTile> {
        &self.tiles
    }

    pub fn set_tile(&mut self, x: i32, z: i32, tile: CellTile) {
        if self.tiles.get(x, z) != tile {
            self.tiles.set(x, z, tile);
            self.mesh_dirty = true;
        }
    }

    /// True when every corner of the cell sits at the same height.
    pub fn is_cell_flat(&self, x: i32, z: i32) -> bool {
        let h = self.vertex_heights.get(x, z);
        h == self.vertex_heights.get(x + 1, z)
            && h == self.vertex_heights.get(x, z + 1)
            && h == self.vertex_heights.get(x + 1, z + 1)
    }

    /// True when the cell forms a clean slope (or plane) along the given axis.
    ///
    /// With no alignment either pair of opposing edges being level is enough;
    /// with an axis, the edges running across that axis must each be level.
    pub fn is_cell_smooth(&self, x: i32, z: i32, alignment: crate::geometry::AxisAlignment) -> bool {
        use crate::geometry::AxisAlignment;
        let bl = self.vertex_heights.get(x, z);
        let br = self.vertex_heights.get(x + 1, z);
        let tl = self.vertex_heights.get(x, z + 1);
        let tr = self.vertex_heights.get(x + 1, z + 1);
        match alignment {
            AxisAlignment::None => (bl == tl && br == tr) || (bl == br && tl == tr),
            AxisAlignment::XAxis => bl == tl && br == tr,
            AxisAlignment::ZAxis => bl == br && tl == tr,
        }
    }

    /// Writes a patch of vertex heights with its lower-left corner at
    /// `(x_base, z_base)` and refreshes the derived center heights.
    ///
    /// The whole patch is validated before any vertex changes, so a failed
    /// call leaves the field untouched.
    pub fn set_vertex_heights(
        &mut self,
        x_base: i32,
        z_base: i32,
        heights: &Grid2<i32>,
    ) -> Result<(), TerrainError> {
        let far_x = x_base + heights.size_x() as i32 - 1;
        let far_z = z_base + heights.size_z() as i32 - 1;
        if !self.vertex_in_bounds(x_base, z_base) || !self.vertex_in_bounds(far_x, far_z) {
            return Err(TerrainError::OutOfBounds {
                x: far_x,
                z: far_z,
                bound_x: self.count_x + 1,
                bound_z: self.count_z + 1,
            });
        }
        self.write_heights(x_base, z_base, heights);
        Ok(())
    }

    /// Sets all four corners of one cell to `height`.
    pub fn set_cell_height(&mut self, x: i32, z: i32, height: i32) -> Result<(), TerrainError> {
        if !self.cell_in_bounds(x, z) {
            return Err(TerrainError::OutOfBounds {
                x,
                z,
                bound_x: self.count_x,
                bound_z: self.count_z,
            });
        }
        let patch = Grid2::new(2, 2, height);
        self.write_heights(x, z, &patch);
        Ok(())
    }

    /// Resets every vertex to `height`.
    pub fn flatten(&mut self, height: i32) {
        let patch = Grid2::new(self.count_x + 1, self.count_z + 1, height);
        self.write_heights(0, 0, &patch);
    }

    /// Bounds-checked core shared by the public setters.
    fn write_heights(&mut self, x_base: i32, z_base: i32, heights: &Grid2<i32>) {
        for x in 0..heights.size_x() as i32 {
            for z in 0..heights.size_z() as i32 {
                self.vertex_heights
                    .set(x_base + x, z_base + z, heights.get(x, z));
            }
        }

        // Center heights depend on all four corners, so the refresh covers
        // one extra ring of cells around the patch.
        for x in (x_base - 1)..(x_base + heights.size_x() as i32 + 1) {
            for z in (z_base - 1)..(z_base + heights.size_z() as i32 + 1) {
                if self.cell_in_bounds(x, z) {
                    let center = majority_or_average([
                        self.vertex_heights.get(x, z),
                        self.vertex_heights.get(x + 1, z),
                        self.vertex_heights.get(x + 1, z + 1),
                        self.vertex_heights.get(x, z + 1),
                    ]);
                    self.center_heights.set(x, z, center);
                }
            }
        }

        self.mesh_dirty = true;
    }

    /// Rebuilds the field from saved raw data. The caller is responsible for
    /// shape validation; this only restores state and re-derives centers.
    pub fn restore(
        count_x: usize,
        count_z: usize,
        count_y: usize,
        max_depth: i32,
        vertex_heights: Grid2<i32>,
        tiles: Grid2<CellTile>,
    ) -> Self {
        let mut field = HeightField {
            count_x,
            count_z,
            count_y,
            max_depth,
            center_heights: Grid2::new(count_x, count_z, 0.0),
            vertex_heights,
            tiles,
            mesh_dirty: true,
        };
        let all = field.vertex_heights.clone();
        field.write_heights(0, 0, &all);
        field
    }

    /// Returns whether the render mesh needs rebuilding and clears the flag.
    pub fn take_mesh_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.mesh_dirty, false)
    }
}

/// Height of a cell center given its four corner heights.
///
/// If one height occurs more often than every other it wins; otherwise (a
/// tie, or all distinct) the center falls back to the mean.
pub fn majority_or_average(corners: [i32; 4]) -> f32 {
    let mut best = corners[0];
    let mut best_count = 0;
    let mut tied = false;
    for &candidate in &corners {
        let count = corners.iter().filter(|&&h| h == candidate).count();
        match count.cmp(&best_count) {
            std::cmp::Ordering::Greater => {
                best = candidate;
                best_count = count;
                tied = false;
            }
            std::cmp::Ordering::Equal => {
                if candidate != best {
                    tied = true;
                }
            }
            std::cmp::Ordering::Less => {}
        }
    }

    if best_count >= 2 && !tied {
        best as f32
    } else {
        corners.iter().sum::<i32>() as f32 / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AxisAlignment;

    #[test]
    fn test_majority_or_average() {
        assert_eq!(majority_or_average([2, 2, 2, 2]), 2.0);
        assert_eq!(majority_or_average([2, 2, 2, 5]), 2.0);
        assert_eq!(majority_or_average([1, 1, 2, 3]), 1.0);
        // two-two tie falls back to the average
        assert_eq!(majority_or_average([1, 1, 2, 2]), 1.5);
        // all distinct falls back to the average
        assert_eq!(majority_or_average([1, 2, 3, 4]), 2.5);
    }

    #[test]
    fn test_new_field_is_flat_and_dirty() {
        let mut field = HeightField::new(4, 4, 8, 2);
        assert!(field.is_cell_flat(0, 0));
        assert!(field.is_cell_flat(3, 3));
        assert_eq!(field.center_height(2, 2), 0.0);
        assert!(field.take_mesh_dirty());
        assert!(!field.take_mesh_dirty());
    }

    #[test]
    fn test_shared_vertex_updates_both_cells() {
        let mut field = HeightField::new(4, 4, 8, 2);
        let patch = Grid2::new(1, 1, 3);
        field.set_vertex_heights(2, 2, &patch).unwrap();

        // the vertex is the TR corner of (1,1) and the BL corner of (2,2)
        assert_eq!(field.cell_height(1, 1, Corner::TopRight), 3);
        assert_eq!(field.cell_height(2, 2, Corner::BottomLeft), 3);
        assert_eq!(field.vertex_height(2, 2), 3);

        // centers of all four touching cells picked up the change
        assert_eq!(field.center_height(1, 1), 0.0); // majority of {0,0,0,3}
        assert_eq!(field.center_height(2, 2), 0.0);
        assert!(!field.is_cell_flat(1, 1));
        assert!(field.is_cell_flat(0, 0));
    }

    #[test]
    fn test_out_of_bounds_patch_leaves_field_unchanged() {
        let mut field = HeightField::new(4, 4, 8, 2);
        let before = field.clone();
        let patch = Grid2::new(3, 3, 1);
        let err = field.set_vertex_heights(3, 3, &patch).unwrap_err();
        assert!(matches!(err, TerrainError::OutOfBounds { .. }));
        assert_eq!(field, before);
    }

    #[test]
    fn test_flatten_round_trip() {
        let mut field = HeightField::new(4, 4, 8, 2);
        let patch = Grid2::new(2, 2, 4);
        field.set_vertex_heights(1, 1, &patch).unwrap();
        // the patch covers all four corners of cell (1, 1), so that cell is
        // flat at 4 while the cells it only clips become ramps
        assert!(field.is_cell_flat(1, 1));
        assert!(!field.is_cell_flat(0, 0));

        field.flatten(2);
        for x in 0..4 {
            for z in 0..4 {
                assert!(field.is_cell_flat(x, z));
                assert_eq!(field.center_height(x, z), 2.0);
            }
        }
        assert_eq!(field.vertex_height(4, 4), 2);
    }

    #[test]
    fn test_set_cell_height_levels_one_cell() {
        let mut field = HeightField::new(4, 4, 8, 2);
        field.set_cell_height(1, 2, 3).unwrap();
        assert!(field.is_cell_flat(1, 2));
        assert_eq!(field.cell_height(1, 2, Corner::BottomLeft), 3);
        assert_eq!(field.center_height(1, 2), 3.0);
        // the neighbor sharing an edge is now a ramp
        assert!(!field.is_cell_flat(0, 2));
    }

    #[test]
    fn test_smoothness_by_alignment() {
        let mut field = HeightField::new(4, 4, 8, 2);
        // raise the z=1 vertex line over cells (0..4, 0): a ramp along z
        let patch = Grid2::new(5, 1, 1);
        field.set_vertex_heights(0, 1, &patch).unwrap();

        assert!(field.is_cell_smooth(1, 0, AxisAlignment::ZAxis));
        assert!(!field.is_cell_smooth(1, 0, AxisAlignment::XAxis));
        assert!(field.is_cell_smooth(1, 0, AxisAlignment::None));
        field.flatten(0);
        assert!(field.is_cell_smooth(1, 0, AxisAlignment::XAxis));
    }
}
