use std::error::Error;
use std::fmt;

/// Contract violations raised by grid-mutating operations.
///
/// User-facing rejections (building on occupied land, editing an anchored
/// vertex) are reported through `Ok(false)` or validity arrays instead; these
/// variants mean the caller handed the grid something it never should have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
    /// A coordinate fell outside the grid.
    OutOfBounds {
        x: i32,
        z: i32,
        bound_x: usize,
        bound_z: usize,
    },

    /// A patch or restored state had the wrong shape for the grid.
    DimensionMismatch { expected: usize, found: usize },

    /// An anchor was set where one already existed, or removed where none was.
    AnchorStateConflict { x: i32, z: i32, anchored: bool },

    /// A smoothing pass visited more vertices than the fixed ceiling allows.
    SmoothingBudgetExceeded { x: i32, z: i32, visited: usize },
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::OutOfBounds {
                x,
                z,
                bound_x,
                bound_z,
            } => write!(
                f,
                "coordinate ({x}, {z}) is outside the grid bounds {bound_x}x{bound_z}"
            ),
            TerrainError::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {expected} elements, found {found}"
            ),
            TerrainError::AnchorStateConflict { x, z, anchored } => {
                if *anchored {
                    write!(f, "vertex ({x}, {z}) is already anchored")
                } else {
                    write!(f, "vertex ({x}, {z}) is not anchored")
                }
            }
            TerrainError::SmoothingBudgetExceeded { x, z, visited } => write!(
                f,
                "smoothing from ({x}, {z}) visited {visited} vertices, exceeding the limit"
            ),
        }
    }
}

impl Error for TerrainError {}
