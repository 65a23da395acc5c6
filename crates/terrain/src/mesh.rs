//! Render geometry for the height field.
//!
//! The mesh is built as raw attribute buffers so a host application can pour
//! them into whatever mesh type its renderer uses. Each cell contributes five
//! vertices (four corners plus the center) and four triangles fanned around
//! the center, which is what lets a cell with a lone raised corner render
//! without a crease across the quad.

use crate::config::{ATLAS_COLUMNS, ATLAS_ROWS, CELL_SIZE, STEP_SIZE, UV_EPSILON};
use crate::heightfield::HeightField;
use crate::point::{Point2, Point3};
use crate::tiles::{Mirror, Rotation};

// ============================================================================
// Grid <-> world conversion
// ============================================================================

/// Affine mapping between grid coordinates and world space.
#[derive(Debug, Clone, Copy)]
pub struct GridConverter {
    pub cell_size: f32,
    pub step_size: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub min_z: f32,
}

impl Default for GridConverter {
    fn default() -> Self {
        GridConverter {
            cell_size: CELL_SIZE,
            step_size: STEP_SIZE,
            min_x: 0.0,
            min_y: 0.0,
            min_z: 0.0,
        }
    }
}

impl GridConverter {
    /// World position of a vertex at grid `(x, z)` and height step `y`.
    pub fn vertex_to_world(&self, p: Point3) -> [f32; 3] {
        [
            self.min_x + p.x as f32 * self.cell_size,
            self.min_y + p.y as f32 * self.step_size,
            self.min_z + p.z as f32 * self.cell_size,
        ]
    }

    /// World position of the center of cell `(x, z)` at a fractional height.
    pub fn cell_center_to_world(&self, p: Point2, height: f32) -> [f32; 3] {
        [
            self.min_x + (p.x as f32 + 0.5) * self.cell_size,
            self.min_y + height * self.step_size,
            self.min_z + (p.z as f32 + 0.5) * self.cell_size,
        ]
    }

    /// Cell containing a world position. The epsilon nudge keeps points that
    /// sit exactly on a cell boundary in the cell they visually belong to.
    pub fn world_to_cell(&self, world_x: f32, world_z: f32) -> Point2 {
        Point2::new(
            ((world_x - self.min_x) / self.cell_size + UV_EPSILON).floor() as i32,
            ((world_z - self.min_z) / self.cell_size + UV_EPSILON).floor() as i32,
        )
    }

    /// Vertex nearest a world position.
    pub fn world_to_vertex(&self, world_x: f32, world_z: f32) -> Point2 {
        Point2::new(
            ((world_x - self.min_x) / self.cell_size + 0.5).floor() as i32,
            ((world_z - self.min_z) / self.cell_size + 0.5).floor() as i32,
        )
    }

    /// Height step nearest a world height.
    pub fn world_to_step(&self, world_y: f32) -> i32 {
        ((world_y - self.min_y) / self.step_size + 0.5).floor() as i32
    }
}

// ============================================================================
// Mesh building
// ============================================================================

/// Raw mesh buffers for one terrain grid.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Corner UVs of a submaterial in the atlas, ordered BL, BR, TR, TL, inset
/// by [`UV_EPSILON`] against bleeding from neighboring tiles.
fn atlas_uvs(submaterial: u16) -> [[f32; 2]; 4] {
    let col = (submaterial % ATLAS_COLUMNS) as f32;
    let row = (submaterial / ATLAS_COLUMNS) as f32;
    let u0 = col / ATLAS_COLUMNS as f32 + UV_EPSILON;
    let u1 = (col + 1.0) / ATLAS_COLUMNS as f32 - UV_EPSILON;
    let v0 = row / ATLAS_ROWS as f32 + UV_EPSILON;
    let v1 = (row + 1.0) / ATLAS_ROWS as f32 - UV_EPSILON;
    // texture rows run top to bottom, so v0 is the tile's top edge
    [[u0, v1], [u1, v1], [u1, v0], [u0, v0]]
}

/// Assigns the four atlas corners to the cell corners BL, BR, TR, TL after
/// applying the tile's rotation and mirror.
fn oriented_uvs(submaterial: u16, rotation: Rotation, mirror: Mirror) -> [[f32; 2]; 4] {
    let base = atlas_uvs(submaterial);
    // a clockwise tile rotation walks the uv assignment counter-clockwise
    let offset = match rotation {
        Rotation::Deg0 => 0,
        Rotation::Deg90 => 3,
        Rotation::Deg180 => 2,
        Rotation::Deg270 => 1,
    };
    let mut uvs = [[0.0f32; 2]; 4];
    for (corner, uv) in uvs.iter_mut().enumerate() {
        *uv = base[(corner + offset) % 4];
    }
    match mirror {
        Mirror::None => {}
        Mirror::FlipX => {
            uvs.swap(0, 1); // BL <-> BR
            uvs.swap(2, 3); // TR <-> TL
        }
        Mirror::FlipZ => {
            uvs.swap(0, 3); // BL <-> TL
            uvs.swap(1, 2); // BR <-> TR
        }
    }
    uvs
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let nx = u[1] * v[2] - u[2] * v[1];
    let ny = u[2] * v[0] - u[0] * v[2];
    let nz = u[0] * v[1] - u[1] * v[0];
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len < 1e-8 {
        [0.0, 1.0, 0.0]
    } else {
        [nx / len, ny / len, nz / len]
    }
}

fn normalize_sum(normals: &[[f32; 3]]) -> [f32; 3] {
    let mut sum = [0.0f32; 3];
    for n in normals {
        sum[0] += n[0];
        sum[1] += n[1];
        sum[2] += n[2];
    }
    let len = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
    if len < 1e-8 {
        [0.0, 1.0, 0.0]
    } else {
        [sum[0] / len, sum[1] / len, sum[2] / len]
    }
}

/// Builds the full terrain mesh from the field's heights and tiles.
pub fn build_mesh(field: &HeightField, converter: &GridConverter) -> MeshGeometry {
    let cells = field.count_x() * field.count_z();
    let mut mesh = MeshGeometry {
        positions: Vec::with_capacity(cells * 5),
        normals: Vec::with_capacity(cells * 5),
        uvs: Vec::with_capacity(cells * 5),
        indices: Vec::with_capacity(cells * 12),
    };

    for x in 0..field.count_x() as i32 {
        for z in 0..field.count_z() as i32 {
            let tile = field.tile(x, z);
            let uvs = oriented_uvs(tile.submaterial, tile.rotation, tile.mirror);

            // corner order BL, BR, TR, TL, then the center
            let corners = [
                converter.vertex_to_world(Point3::new(x, field.vertex_height(x, z), z)),
                converter.vertex_to_world(Point3::new(x + 1, field.vertex_height(x + 1, z), z)),
                converter
                    .vertex_to_world(Point3::new(x + 1, field.vertex_height(x + 1, z + 1), z + 1)),
                converter.vertex_to_world(Point3::new(x, field.vertex_height(x, z + 1), z + 1)),
            ];
            let center =
                converter.cell_center_to_world(Point2::new(x, z), field.center_height(x, z));

            let vi = mesh.positions.len() as u32;
            mesh.positions.extend_from_slice(&corners);
            mesh.positions.push(center);

            mesh.uvs.extend_from_slice(&uvs);
            let center_uv = [
                (uvs[0][0] + uvs[2][0]) * 0.5,
                (uvs[0][1] + uvs[2][1]) * 0.5,
            ];
            mesh.uvs.push(center_uv);

            // one fan triangle per edge, wound counter-clockwise seen from +y
            let mut faces = [[0.0f32; 3]; 4];
            for i in 0..4 {
                let next = (i + 1) % 4;
                faces[i] = face_normal(corners[i], center, corners[next]);
                mesh.indices.push(vi + i as u32);
                mesh.indices.push(vi + 4);
                mesh.indices.push(vi + next as u32);
            }
            for i in 0..4 {
                let prev = (i + 3) % 4;
                mesh.normals.push(normalize_sum(&[faces[prev], faces[i]]));
            }
            mesh.normals.push(normalize_sum(&faces));
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid2::Grid2;
    use crate::heightfield::CellTile;

    #[test]
    fn test_converter_round_trip() {
        let converter = GridConverter::default();
        let world = converter.vertex_to_world(Point3::new(3, 2, 5));
        assert_eq!(world, [3.0, 1.0, 5.0]);
        assert_eq!(converter.world_to_vertex(world[0], world[2]), Point2::new(3, 5));
        assert_eq!(converter.world_to_step(world[1]), 2);

        // a point on a cell boundary lands in the higher-indexed cell
        assert_eq!(converter.world_to_cell(2.0, 2.0), Point2::new(2, 2));
        assert_eq!(converter.world_to_cell(2.9, 2.1), Point2::new(2, 2));
    }

    #[test]
    fn test_converter_with_offset_origin() {
        let converter = GridConverter {
            min_x: -32.0,
            min_z: -32.0,
            ..GridConverter::default()
        };
        assert_eq!(converter.world_to_cell(-32.0, -31.5), Point2::new(0, 0));
        assert_eq!(
            converter.vertex_to_world(Point3::new(0, 0, 0)),
            [-32.0, 0.0, -32.0]
        );
    }

    #[test]
    fn test_mesh_counts() {
        let field = HeightField::new(4, 3, 8, 2);
        let mesh = build_mesh(&field, &GridConverter::default());
        assert_eq!(mesh.vertex_count(), 4 * 3 * 5);
        assert_eq!(mesh.triangle_count(), 4 * 3 * 4);
        assert_eq!(mesh.uvs.len(), mesh.positions.len());
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn test_flat_cell_normals_point_up() {
        let field = HeightField::new(2, 2, 8, 2);
        let mesh = build_mesh(&field, &GridConverter::default());
        for n in &mesh.normals {
            assert!((n[1] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_raised_corner_lifts_center() {
        let mut field = HeightField::new(2, 2, 8, 2);
        let patch = Grid2::new(1, 1, 2);
        field.set_vertex_heights(1, 1, &patch).unwrap();
        let mesh = build_mesh(&field, &GridConverter::default());

        // cell (0,0): vertices BL,BR,TR,TL,C start at index 0
        assert_eq!(mesh.positions[2][1], 1.0); // TR at step 2, half a unit each
        assert_eq!(mesh.positions[0][1], 0.0);
        // majority corner height 0 wins the center
        assert_eq!(mesh.positions[4][1], 0.0);
    }

    #[test]
    fn test_rotation_shifts_uv_assignment() {
        let plain = oriented_uvs(3, Rotation::Deg0, Mirror::None);
        let rotated = oriented_uvs(3, Rotation::Deg90, Mirror::None);
        // one clockwise step moves each corner's uv to its neighbor
        assert_eq!(rotated[0], plain[3]);
        assert_eq!(rotated[1], plain[0]);
        assert_eq!(rotated[2], plain[1]);
        assert_eq!(rotated[3], plain[2]);
    }

    #[test]
    fn test_mirror_swaps_uv_pairs() {
        let plain = oriented_uvs(3, Rotation::Deg0, Mirror::None);
        let flipped = oriented_uvs(3, Rotation::Deg0, Mirror::FlipX);
        assert_eq!(flipped[0], plain[1]);
        assert_eq!(flipped[1], plain[0]);
        assert_eq!(flipped[2], plain[3]);
        assert_eq!(flipped[3], plain[2]);
    }

    #[test]
    fn test_tile_selects_atlas_region() {
        let field = {
            let mut f = HeightField::new(1, 1, 8, 2);
            f.set_tile(
                0,
                0,
                CellTile {
                    submaterial: 9, // column 1, row 1
                    ..CellTile::default()
                },
            );
            f
        };
        let mesh = build_mesh(&field, &GridConverter::default());
        let [u, v] = mesh.uvs[0];
        assert!(u > 1.0 / ATLAS_COLUMNS as f32 && u < 2.0 / ATLAS_COLUMNS as f32);
        assert!(v > 1.0 / ATLAS_ROWS as f32 && v < 2.0 / ATLAS_ROWS as f32);
    }
}
