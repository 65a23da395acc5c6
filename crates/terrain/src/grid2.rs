//! Dense 2d storage backing every per-cell and per-vertex layer.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A flat row-major grid of `T`, indexed by `(x, z)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Grid2<T> {
    size_x: usize,
    size_z: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid2<T> {
    pub fn new(size_x: usize, size_z: usize, fill: T) -> Self {
        Grid2 {
            size_x,
            size_z,
            data: vec![fill; size_x * size_z],
        }
    }
}

impl<T> Grid2<T> {
    pub fn from_vec(size_x: usize, size_z: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != size_x * size_z {
            return None;
        }
        Some(Grid2 {
            size_x,
            size_z,
            data,
        })
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_z(&self) -> usize {
        self.size_z
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.size_x && (z as usize) < self.size_z
    }

    fn index(&self, x: i32, z: i32) -> usize {
        assert!(
            self.in_bounds(x, z),
            "grid index ({x}, {z}) out of bounds {}x{}",
            self.size_x,
            self.size_z
        );
        x as usize * self.size_z + z as usize
    }

    pub fn at(&self, x: i32, z: i32) -> &T {
        &self.data[self.index(x, z)]
    }

    pub fn set(&mut self, x: i32, z: i32, value: T) {
        let idx = self.index(x, z);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy> Grid2<T> {
    pub fn get(&self, x: i32, z: i32) -> T {
        self.data[self.index(x, z)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_round_trip() {
        let mut grid = Grid2::new(4, 3, 0i32);
        grid.set(3, 2, 7);
        grid.set(0, 0, -1);
        assert_eq!(grid.get(3, 2), 7);
        assert_eq!(grid.get(0, 0), -1);
        assert_eq!(grid.get(1, 1), 0);
    }

    #[test]
    fn test_in_bounds() {
        let grid = Grid2::new(4, 3, 0u8);
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(3, 2));
        assert!(!grid.in_bounds(4, 0));
        assert!(!grid.in_bounds(0, 3));
        assert!(!grid.in_bounds(-1, 0));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Grid2::from_vec(2, 3, vec![0u8; 5]).is_none());
        assert!(Grid2::from_vec(2, 3, vec![0u8; 6]).is_some());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_read_panics() {
        let grid = Grid2::new(2, 2, 0u8);
        grid.get(2, 0);
    }
}
