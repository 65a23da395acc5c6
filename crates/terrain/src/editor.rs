//! Constrained terrain editing: anchors plus bounded breadth-first smoothing.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::SMOOTH_VISIT_LIMIT;
use crate::error::TerrainError;
use crate::geometry::{
    AxisAlignedLine, GridRect, ADJACENT_DX, ADJACENT_DZ, CELL_TO_VERTEX_DX, CELL_TO_VERTEX_DZ,
    VERTEX_TO_CELL_DX, VERTEX_TO_CELL_DZ,
};
use crate::grid2::Grid2;
use crate::heightfield::HeightField;
use crate::point::Point2;

/// Guards a [`HeightField`] with anchor bitsets and smooths every height edit.
///
/// Anchored cells hold constructed features; their vertices and the map
/// border may never move. Edits ripple outward so that no two neighboring
/// vertices end up more than one step apart, and an edit that would have to
/// move an anchored vertex is rejected whole.
#[derive(Debug, Clone)]
pub struct SafeEditor {
    cell_anchored: Grid2<bool>,
    vertex_anchored: Grid2<bool>,
}

impl SafeEditor {
    /// Creates an editor for a `count_x` by `count_z` cell grid with the
    /// border vertices permanently anchored.
    pub fn new(count_x: usize, count_z: usize) -> Self {
        let mut vertex_anchored = Grid2::new(count_x + 1, count_z + 1, false);
        for x in 0..=count_x as i32 {
            for z in 0..=count_z as i32 {
                if x == 0 || z == 0 || x == count_x as i32 || z == count_z as i32 {
                    vertex_anchored.set(x, z, true);
                }
            }
        }
        SafeEditor {
            cell_anchored: Grid2::new(count_x, count_z, false),
            vertex_anchored,
        }
    }

    /// Rebuilds the editor from a saved cell-anchor grid. Vertex anchors are
    /// derived rather than persisted.
    pub fn restore(cell_anchored: Grid2<bool>) -> Self {
        let count_x = cell_anchored.size_x();
        let count_z = cell_anchored.size_z();
        let mut editor = SafeEditor::new(count_x, count_z);
        for x in 0..count_x as i32 {
            for z in 0..count_z as i32 {
                if cell_anchored.get(x, z) {
                    editor.cell_anchored.set(x, z, true);
                    for i in 0..4 {
                        editor
                            .vertex_anchored
                            .set(x + CELL_TO_VERTEX_DX[i], z + CELL_TO_VERTEX_DZ[i], true);
                    }
                }
            }
        }
        editor
    }

    pub fn is_vertex_anchored(&self, x: i32, z: i32) -> bool {
        self.vertex_anchored.get(x, z)
    }

    pub fn is_cell_anchored(&self, x: i32, z: i32) -> bool {
        self.cell_anchored.get(x, z)
    }

    pub fn cell_anchored(&self) -> &Grid2<bool> {
        &self.cell_anchored
    }

    /// Anchors a cell and its four vertices. Anchoring an already anchored
    /// cell is a bug in the calling layer.
    pub fn set_anchored(&mut self, x: i32, z: i32) -> Result<(), TerrainError> {
        if !self.cell_anchored.in_bounds(x, z) {
            return Err(self.cell_out_of_bounds(x, z));
        }
        if self.cell_anchored.get(x, z) {
            return Err(TerrainError::AnchorStateConflict {
                x,
                z,
                anchored: true,
            });
        }
        self.cell_anchored.set(x, z, true);
        for i in 0..4 {
            self.vertex_anchored
                .set(x + CELL_TO_VERTEX_DX[i], z + CELL_TO_VERTEX_DZ[i], true);
        }
        Ok(())
    }

    /// Removes a cell anchor. Each of the four vertices stays anchored only
    /// while the border or another anchored cell still touches it.
    pub fn remove_anchor(&mut self, x: i32, z: i32) -> Result<(), TerrainError> {
        if !self.cell_anchored.in_bounds(x, z) {
            return Err(self.cell_out_of_bounds(x, z));
        }
        if !self.cell_anchored.get(x, z) {
            return Err(TerrainError::AnchorStateConflict {
                x,
                z,
                anchored: false,
            });
        }
        self.cell_anchored.set(x, z, false);
        for i in 0..4 {
            let vert_x = x + CELL_TO_VERTEX_DX[i];
            let vert_z = z + CELL_TO_VERTEX_DZ[i];
            let mut still_anchored = self.is_border_vertex(vert_x, vert_z);
            for j in 0..4 {
                let cell_x = vert_x + VERTEX_TO_CELL_DX[j];
                let cell_z = vert_z + VERTEX_TO_CELL_DZ[j];
                still_anchored = still_anchored
                    || (self.cell_anchored.in_bounds(cell_x, cell_z)
                        && self.cell_anchored.get(cell_x, cell_z));
            }
            self.vertex_anchored.set(vert_x, vert_z, still_anchored);
        }
        Ok(())
    }

    /// Attempts to level the cell at `(x, z)` to `height`, rippling the
    /// minimum surrounding changes needed to keep every neighboring vertex
    /// pair within one step of each other.
    ///
    /// Returns `Ok(false)` without touching the field when the edit would
    /// have to move an anchored vertex. A ripple that spreads past
    /// [`SMOOTH_VISIT_LIMIT`] vertices would rewrite most of the map and is
    /// reported as an error instead.
    pub fn safe_set_height(
        &self,
        field: &mut HeightField,
        x: i32,
        z: i32,
        height: i32,
    ) -> Result<bool, TerrainError> {
        if !field.cell_in_bounds(x, z) {
            return Err(TerrainError::OutOfBounds {
                x,
                z,
                bound_x: field.count_x(),
                bound_z: field.count_z(),
            });
        }

        let corners = [
            Point2::new(x, z),
            Point2::new(x, z + 1),
            Point2::new(x + 1, z),
            Point2::new(x + 1, z + 1),
        ];
        if corners
            .iter()
            .any(|c| self.vertex_anchored.get(c.x, c.z))
        {
            return Ok(false);
        }

        let mut queue: VecDeque<Point2> = VecDeque::new();
        let mut seen: HashSet<Point2> = HashSet::new();
        let mut new_heights: HashMap<Point2, i32> = HashMap::new();

        let mut min = Point2::new(x, z);
        let mut max = Point2::new(x + 1, z + 1);

        for corner in corners {
            queue.push_back(corner);
            seen.insert(corner);
            new_heights.insert(corner, height);
        }

        // Ripple outward one step of slope at a time. Border vertices are
        // always anchored, so the frontier can never leave the lattice.
        let mut visited = 0usize;
        while let Some(cur) = queue.pop_front() {
            visited += 1;
            if visited > SMOOTH_VISIT_LIMIT {
                return Err(TerrainError::SmoothingBudgetExceeded { x, z, visited });
            }

            min = Point2::new(min.x.min(cur.x), min.z.min(cur.z));
            max = Point2::new(max.x.max(cur.x), max.z.max(cur.z));

            let cur_height = new_heights[&cur];
            for i in 0..4 {
                let next = Point2::new(cur.x + ADJACENT_DX[i], cur.z + ADJACENT_DZ[i]);
                if seen.contains(&next) {
                    continue;
                }

                let diff = field.vertex_height(next.x, next.z) - cur_height;
                if diff.abs() > 1 {
                    if self.vertex_anchored.get(next.x, next.z) {
                        return Ok(false);
                    }
                    new_heights.insert(next, cur_height + diff.signum());
                    seen.insert(next);
                    queue.push_back(next);
                }
            }
        }

        // Commit the bounding rectangle as one batched write, falling back
        // to current heights for untouched vertices inside it.
        let size_x = (max.x - min.x) as usize + 1;
        let size_z = (max.z - min.z) as usize + 1;
        let mut patch = Grid2::new(size_x, size_z, 0);
        for px in 0..size_x as i32 {
            for pz in 0..size_z as i32 {
                let at = Point2::new(min.x + px, min.z + pz);
                let h = new_heights
                    .get(&at)
                    .copied()
                    .unwrap_or_else(|| field.vertex_height(at.x, at.z));
                patch.set(px, pz, h);
            }
        }
        field.set_vertex_heights(min.x, min.z, &patch)?;
        Ok(true)
    }

    /// Per-cell validity for placing a flat-footprint feature over `rect`:
    /// in bounds, flat, and not anchored.
    pub fn check_flat_and_free(&self, field: &HeightField, rect: GridRect) -> Grid2<bool> {
        let mut valid = Grid2::new(rect.size_x(), rect.size_z(), false);
        for x in 0..rect.size_x() as i32 {
            for z in 0..rect.size_z() as i32 {
                let cell_x = rect.min.x + x;
                let cell_z = rect.min.z + z;
                let ok = field.cell_in_bounds(cell_x, cell_z)
                    && field.is_cell_flat(cell_x, cell_z)
                    && !self.cell_anchored.get(cell_x, cell_z);
                valid.set(x, z, ok);
            }
        }
        valid
    }

    /// Per-point validity for laying a line feature: in bounds, smooth along
    /// the line's axis, and not anchored.
    pub fn check_smooth_and_free(&self, field: &HeightField, line: &AxisAlignedLine) -> Vec<bool> {
        line.points()
            .map(|p| {
                field.cell_in_bounds(p.x, p.z)
                    && field.is_cell_smooth(p.x, p.z, line.alignment)
                    && !self.cell_anchored.get(p.x, p.z)
            })
            .collect()
    }

    fn is_border_vertex(&self, x: i32, z: i32) -> bool {
        x == 0
            || z == 0
            || x == self.cell_anchored.size_x() as i32
            || z == self.cell_anchored.size_z() as i32
    }

    fn cell_out_of_bounds(&self, x: i32, z: i32) -> TerrainError {
        TerrainError::OutOfBounds {
            x,
            z,
            bound_x: self.cell_anchored.size_x(),
            bound_z: self.cell_anchored.size_z(),
        }
    }
}
