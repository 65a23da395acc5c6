//! Small integer grid points with packed, collision-free hashing.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::config::{COORD_BITS, COORD_LIMIT};

/// A 2d grid coordinate.
///
/// Valid coordinates range from 0 up to (but not including) [`COORD_LIMIT`]
/// per axis; [`Point2::NULL`] sits just outside that range at (-1, -1) so it
/// hashes to a key no valid point can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point2 {
    pub x: i32,
    pub z: i32,
}

impl Point2 {
    /// Sentinel used where an "absent" point is needed in a map or queue.
    pub const NULL: Point2 = Point2 { x: -1, z: -1 };

    pub fn new(x: i32, z: i32) -> Self {
        debug_assert!(
            x >= -1 && x < COORD_LIMIT && z >= -1 && z < COORD_LIMIT,
            "point coordinate out of packable range: ({x}, {z})"
        );
        Point2 { x, z }
    }

    pub fn is_null(&self) -> bool {
        *self == Point2::NULL
    }

    /// Collision-free integer key for this point, also used as the hash.
    pub fn packed(&self) -> u64 {
        ((self.x + 1) as u64) | (((self.z + 1) as u64) << COORD_BITS)
    }
}

impl Hash for Point2 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.packed());
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A 3d grid coordinate. The y component is a height step, not a world unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3 {
    pub const NULL: Point3 = Point3 {
        x: -1,
        y: -1,
        z: -1,
    };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(
            x >= -1 && x < COORD_LIMIT && y >= -1 && y < COORD_LIMIT && z >= -1 && z < COORD_LIMIT,
            "point coordinate out of packable range: ({x}, {y}, {z})"
        );
        Point3 { x, y, z }
    }

    pub fn is_null(&self) -> bool {
        *self == Point3::NULL
    }

    /// Drops the height component.
    pub fn xz(&self) -> Point2 {
        Point2 {
            x: self.x,
            z: self.z,
        }
    }

    fn packed(&self) -> u64 {
        ((self.x + 1) as u64)
            | (((self.y + 1) as u64) << COORD_BITS)
            | (((self.z + 1) as u64) << (2 * COORD_BITS))
    }
}

impl Hash for Point3 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.packed());
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
