//! Compile-time constants for the terrain grid.

/// Bits available per axis in a packed coordinate key.
pub const COORD_BITS: u32 = 10;

/// Exclusive upper bound for a coordinate axis. Coordinates must stay below
/// this so they can be packed into a single collision-free integer key.
pub const COORD_LIMIT: i32 = 1 << COORD_BITS;

/// Default number of grid cells along the x-axis.
pub const GRID_COUNT_X: usize = 64;

/// Default number of grid cells along the z-axis.
pub const GRID_COUNT_Z: usize = 64;

/// Default number of height steps along the y-axis.
pub const GRID_COUNT_Y: usize = 8;

/// Default number of height steps the terrain can be lowered below baseline.
pub const MAX_DEPTH: i32 = 2;

/// Side length of one grid cell in world units.
pub const CELL_SIZE: f32 = 1.0;

/// Height of one vertical grid step in world units.
pub const STEP_SIZE: f32 = 0.5;

/// Ceiling on vertices visited by one smoothing pass. A request that ripples
/// further than this would rewrite most of the map and is treated as a bug in
/// the calling layer, not as user input.
pub const SMOOTH_VISIT_LIMIT: usize = 1024;

/// Texture atlas layout: submaterial tiles per row / number of rows.
pub const ATLAS_COLUMNS: u16 = 8;
pub const ATLAS_ROWS: u16 = 4;

/// Inset applied to tile UVs to counteract atlas bleeding.
pub const UV_EPSILON: f32 = 0.0001;
