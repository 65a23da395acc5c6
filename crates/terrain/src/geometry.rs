//! Axis-aligned lines, rectangles and direction tables shared by the
//! occupancy layers.

use crate::point::Point2;

/// Neighbor offsets in N, E, S, W order. Every traversal in the crate walks
/// neighbors in this order so results are reproducible.
pub const ADJACENT_DX: [i32; 4] = [0, 1, 0, -1];
pub const ADJACENT_DZ: [i32; 4] = [1, 0, -1, 0];

/// Corner vertex offsets for a cell in TR, BR, BL, TL order.
pub const CELL_TO_VERTEX_DX: [i32; 4] = [1, 1, 0, 0];
pub const CELL_TO_VERTEX_DZ: [i32; 4] = [1, 0, 0, 1];

/// Cells touching a vertex, in the same TR, BR, BL, TL order relative to the
/// vertex (i.e. the cell whose named corner is this vertex).
pub const VERTEX_TO_CELL_DX: [i32; 4] = [0, 0, -1, -1];
pub const VERTEX_TO_CELL_DZ: [i32; 4] = [0, -1, -1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAlignment {
    None,
    XAxis,
    ZAxis,
}

/// A straight segment of grid points along one axis, or a single point.
///
/// Construction drags the end point: whichever axis moved further wins, and
/// the end is snapped back onto the start's other axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisAlignedLine {
    pub start: Point2,
    pub end: Point2,
    pub alignment: AxisAlignment,
}

impl AxisAlignedLine {
    pub fn point(at: Point2) -> Self {
        AxisAlignedLine {
            start: at,
            end: at,
            alignment: AxisAlignment::None,
        }
    }

    pub fn new(start: Point2, end: Point2) -> Self {
        let dx = (end.x - start.x).abs();
        let dz = (end.z - start.z).abs();
        if dx == 0 && dz == 0 {
            Self::point(start)
        } else if dx >= dz {
            AxisAlignedLine {
                start,
                end: Point2::new(end.x, start.z),
                alignment: AxisAlignment::XAxis,
            }
        } else {
            AxisAlignedLine {
                start,
                end: Point2::new(start.x, end.z),
                alignment: AxisAlignment::ZAxis,
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.alignment {
            AxisAlignment::None => 1,
            AxisAlignment::XAxis => (self.end.x - self.start.x).unsigned_abs() as usize + 1,
            AxisAlignment::ZAxis => (self.end.z - self.start.z).unsigned_abs() as usize + 1,
        }
    }

    /// Iterates the points from start to end inclusive.
    pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
        let (step_x, step_z) = match self.alignment {
            AxisAlignment::None => (0, 0),
            AxisAlignment::XAxis => ((self.end.x - self.start.x).signum(), 0),
            AxisAlignment::ZAxis => (0, (self.end.z - self.start.z).signum()),
        };
        let start = self.start;
        (0..self.len() as i32)
            .map(move |i| Point2::new(start.x + step_x * i, start.z + step_z * i))
    }

    /// The two cell lines flanking this vertex line, clamped into the cell
    /// grid. A vertex line at x has the cell columns x-1 and x beside it.
    pub fn surrounding_grid_lines(
        &self,
        clamp_x: usize,
        clamp_z: usize,
    ) -> (AxisAlignedLine, AxisAlignedLine) {
        let min_x = self.start.x.min(self.end.x);
        let max_x = self.start.x.max(self.end.x);
        let min_z = self.start.z.min(self.end.z);
        let max_z = self.start.z.max(self.end.z);

        let clamp = |x: i32, z: i32| {
            Point2::new(
                x.clamp(0, clamp_x as i32 - 1),
                z.clamp(0, clamp_z as i32 - 1),
            )
        };

        if self.alignment == AxisAlignment::ZAxis {
            (
                AxisAlignedLine::new(clamp(min_x - 1, min_z - 1), clamp(max_x - 1, max_z)),
                AxisAlignedLine::new(clamp(min_x, min_z - 1), clamp(max_x, max_z)),
            )
        } else {
            (
                AxisAlignedLine::new(clamp(min_x - 1, min_z - 1), clamp(max_x, max_z - 1)),
                AxisAlignedLine::new(clamp(min_x - 1, min_z), clamp(max_x, max_z)),
            )
        }
    }

    pub fn contains(&self, at: Point2) -> bool {
        match self.alignment {
            AxisAlignment::None => at == self.start,
            AxisAlignment::XAxis => {
                at.z == self.start.z
                    && at.x >= self.start.x.min(self.end.x)
                    && at.x <= self.start.x.max(self.end.x)
            }
            AxisAlignment::ZAxis => {
                at.x == self.start.x
                    && at.z >= self.start.z.min(self.end.z)
                    && at.z <= self.start.z.max(self.end.z)
            }
        }
    }
}

/// An inclusive cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub min: Point2,
    pub max: Point2,
}

impl GridRect {
    pub fn new(a: Point2, b: Point2) -> Self {
        GridRect {
            min: Point2::new(a.x.min(b.x), a.z.min(b.z)),
            max: Point2::new(a.x.max(b.x), a.z.max(b.z)),
        }
    }

    pub fn size_x(&self) -> usize {
        (self.max.x - self.min.x) as usize + 1
    }

    pub fn size_z(&self) -> usize {
        (self.max.z - self.min.z) as usize + 1
    }

    pub fn contains(&self, at: Point2) -> bool {
        at.x >= self.min.x && at.x <= self.max.x && at.z >= self.min.z && at.z <= self.max.z
    }

    /// Iterates all contained cells, x-major.
    pub fn cells(&self) -> impl Iterator<Item = Point2> + '_ {
        let min = self.min;
        let max = self.max;
        (min.x..=max.x).flat_map(move |x| (min.z..=max.z).map(move |z| Point2::new(x, z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_snaps_to_dominant_axis() {
        let line = AxisAlignedLine::new(Point2::new(2, 2), Point2::new(6, 3));
        assert_eq!(line.alignment, AxisAlignment::XAxis);
        assert_eq!(line.end, Point2::new(6, 2));
        assert_eq!(line.len(), 5);

        let line = AxisAlignedLine::new(Point2::new(2, 2), Point2::new(3, 7));
        assert_eq!(line.alignment, AxisAlignment::ZAxis);
        assert_eq!(line.end, Point2::new(2, 7));
        assert_eq!(line.len(), 6);
    }

    #[test]
    fn test_degenerate_line_is_a_point() {
        let line = AxisAlignedLine::new(Point2::new(4, 4), Point2::new(4, 4));
        assert_eq!(line.alignment, AxisAlignment::None);
        assert_eq!(line.points().collect::<Vec<_>>(), vec![Point2::new(4, 4)]);
    }

    #[test]
    fn test_line_points_run_start_to_end() {
        let line = AxisAlignedLine::new(Point2::new(5, 1), Point2::new(2, 1));
        let pts: Vec<_> = line.points().collect();
        assert_eq!(
            pts,
            vec![
                Point2::new(5, 1),
                Point2::new(4, 1),
                Point2::new(3, 1),
                Point2::new(2, 1)
            ]
        );
        assert!(line.contains(Point2::new(3, 1)));
        assert!(!line.contains(Point2::new(3, 2)));
    }

    #[test]
    fn test_surrounding_grid_lines_flank_a_vertex_line() {
        // vertical vertex line at x=3, z 2..=5 on an 8x8 cell grid
        let line = AxisAlignedLine::new(Point2::new(3, 2), Point2::new(3, 5));
        let (west, east) = line.surrounding_grid_lines(8, 8);
        assert_eq!(west.start, Point2::new(2, 1));
        assert_eq!(west.end, Point2::new(2, 5));
        assert_eq!(east.start, Point2::new(3, 1));
        assert_eq!(east.end, Point2::new(3, 5));
        assert_eq!(west.alignment, AxisAlignment::ZAxis);
    }

    #[test]
    fn test_surrounding_grid_lines_clamp_at_the_edge() {
        let line = AxisAlignedLine::new(Point2::new(0, 0), Point2::new(0, 5));
        let (west, east) = line.surrounding_grid_lines(8, 8);
        // the west column clamps onto column 0, same as the east column's x
        assert_eq!(west.start, Point2::new(0, 0));
        assert_eq!(east.start, Point2::new(0, 0));
        assert_eq!(east.end, Point2::new(0, 5));
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = GridRect::new(Point2::new(4, 1), Point2::new(2, 3));
        assert_eq!(rect.min, Point2::new(2, 1));
        assert_eq!(rect.max, Point2::new(4, 3));
        assert_eq!(rect.size_x(), 3);
        assert_eq!(rect.size_z(), 3);
        assert_eq!(rect.cells().count(), 9);
        assert!(rect.contains(Point2::new(3, 2)));
        assert!(!rect.contains(Point2::new(5, 2)));
    }
}
