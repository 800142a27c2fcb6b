use std::fmt::{Display, Formatter};

use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use strum::VariantArray;
use unordered_pair::UnorderedPair;

use crate::board::Board;
use crate::cell::{Cell, CellId, Faction};
use crate::dir::{SideDir, VertexDir};
use crate::point::Point;
use crate::side::{Side, SideId, SideStatus, SIDE_COLOR_COUNT};
use crate::vertex::{Vertex, VertexId};

/// Reasons a puzzle definition is rejected by [`BoardBuilder::build`].
///
/// Malformed definitions are fatal; nothing is repaired silently.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// The row count is even or smaller than 3.
    BadRowCount {
        /// The offending row count.
        rows: usize,
    },
    /// The cell data string does not cover the board's cells exactly.
    BadDataLength {
        /// The cell count of the board.
        expected: usize,
        /// The length of the given string.
        got: usize,
    },
    /// The cell data string contains something other than `0`-`6` or `.`.
    BadDataChar {
        /// The offending character.
        ch: char,
    },
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRowCount { rows } => {
                write!(f, "the number of rows must be an odd number of at least 3, got {rows}")
            }
            Self::BadDataLength { expected, got } => {
                write!(f, "the cell data string must have exactly {expected} characters, got {got}")
            }
            Self::BadDataChar { ch } => {
                write!(f, "the cell data string contains an invalid character ({ch:?})")
            }
        }
    }
}

/// Builds a [`Board`] from a row count and an optional requirement string.
///
/// The requirement string has one character per cell in row-major order:
/// a digit `0`-`6` for a required active-side count, or `.` for no
/// requirement. Builders can be reused; [`build`](BoardBuilder::build) does
/// not consume them.
#[derive(Clone)]
pub struct BoardBuilder {
    rows: usize,
    cell_data: Option<String>,
    color_seed: u64,
    side_length: f64,
    center: Point,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new(5)
    }
}

impl BoardBuilder {
    /// Start a builder for a board with the given number of rows.
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            cell_data: None,
            color_seed: 0,
            side_length: 20.0,
            center: Point::default(),
        }
    }

    /// Set the per-cell requirement string.
    pub fn cell_data(&mut self, data: &str) -> &mut Self {
        self.cell_data = Some(data.to_owned());
        self
    }

    /// Seed for the cosmetic color tie-break RNG, so runs are reproducible.
    pub fn color_seed(&mut self, seed: u64) -> &mut Self {
        self.color_seed = seed;
        self
    }

    /// Side length used when placing cell and vertex coordinates.
    pub fn side_length(&mut self, length: f64) -> &mut Self {
        self.side_length = length;
        self
    }

    /// Board center used when placing cell and vertex coordinates.
    pub fn center(&mut self, center: Point) -> &mut Self {
        self.center = center;
        self
    }

    /// Total cell count for a row count: the middle row is `rows` wide and
    /// each row `d` away from it is `rows - d` wide.
    pub fn cell_count(rows: usize) -> usize {
        let mid = rows / 2;
        rows + 2 * (1..=mid).map(|d| rows - d).sum::<usize>()
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.rows < 3 || self.rows % 2 == 0 {
            return Err(BuildError::BadRowCount { rows: self.rows });
        }

        if let Some(data) = &self.cell_data {
            let expected = Self::cell_count(self.rows);
            if data.chars().count() != expected {
                return Err(BuildError::BadDataLength { expected, got: data.chars().count() });
            }
            if let Some(ch) = data.chars().find(|ch| *ch != '.' && !('0'..='6').contains(ch)) {
                return Err(BuildError::BadDataChar { ch });
            }
        }

        Ok(())
    }

    /// Build the board, failing on a malformed puzzle definition.
    pub fn build(&self) -> Result<Board, BuildError> {
        self.validate()?;

        let rows = self.rows;
        let mid = rows / 2;
        let num_cols = |row: usize| {
            if row <= mid {
                rows - (mid - row)
            } else {
                rows - (row - mid)
            }
        };

        // Cells, row-major; the grid embeds the rhombus into a rows x rows
        // array with absent slots as None.
        let data: Option<Vec<char>> = self.cell_data.as_ref().map(|d| d.chars().collect());
        let mut reqs: Vec<Option<u8>> = Vec::new();
        let mut coords: Vec<(usize, usize)> = Vec::new();
        for row in 0..rows {
            for col in 0..num_cols(row) {
                let req = data
                    .as_ref()
                    .and_then(|chars| chars[reqs.len()].to_digit(10))
                    .map(|req| req as u8);
                reqs.push(req);
                coords.push((row, col));
            }
        }
        let count = reqs.len();

        let mut row_offsets = vec![0usize; rows];
        for row in 1..rows {
            row_offsets[row] = row_offsets[row - 1] + num_cols(row - 1);
        }
        let grid = Array2::from_shape_fn((rows, rows), |(row, col)| {
            (col < num_cols(row)).then(|| CellId(row_offsets[row] + col))
        });

        let sqrt3 = 3.0_f64.sqrt();
        let cos60 = 60.0_f64.to_radians().cos();
        let s = self.side_length;

        let centers: Vec<Point> = coords
            .iter()
            .map(|&(row, col)| {
                let dx = (col as f64 - mid as f64) * sqrt3 * s
                    + (row as f64 - mid as f64).abs() * sqrt3 * s / 2.0;
                let dy = (row as f64 - mid as f64) * (2.0 * s - s * cos60);
                Point::new(self.center.x + dx, self.center.y + dy)
            })
            .collect();

        // Neighbor lookup; the row/col offsets differ above, at, and below
        // the middle row because hex rows pack staggered.
        let cell_at = |row: isize, col: isize| -> Option<CellId> {
            if row < 0 || row >= rows as isize {
                return None;
            }
            let (row, col) = (row as usize, col);
            if col < 0 || col >= num_cols(row) as isize {
                return None;
            }
            Some(CellId(row_offsets[row] + col as usize))
        };
        let neighbor_of = |id: usize, dir: SideDir| -> Option<CellId> {
            let (row, col) = (coords[id].0 as isize, coords[id].1 as isize);
            let at_or_above = coords[id].0 <= mid;
            let above = coords[id].0 < mid;
            match dir {
                SideDir::UpLeft => cell_at(row - 1, if at_or_above { col - 1 } else { col }),
                SideDir::UpRight => cell_at(row - 1, if at_or_above { col } else { col + 1 }),
                SideDir::Right => cell_at(row, col + 1),
                SideDir::DownRight => cell_at(row + 1, if above { col + 1 } else { col }),
                SideDir::DownLeft => cell_at(row + 1, if above { col } else { col - 1 }),
                SideDir::Left => cell_at(row, col - 1),
            }
        };

        let mut neighbors: Vec<[Option<CellId>; 6]> = vec![[None; 6]; count];
        for id in 0..count {
            for &dir in SideDir::VARIANTS {
                neighbors[id][dir.ix()] = neighbor_of(id, dir);
            }
        }

        // Vertices are created once and registered into the up to two
        // neighbors sharing them, per the fixed sharing table.
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut cell_vertices: Vec<[Option<VertexId>; 6]> = vec![[None; 6]; count];
        for id in 0..count {
            for &vd in VertexDir::VARIANTS {
                if cell_vertices[id][vd.ix()].is_some() {
                    continue;
                }
                let vertex_id = VertexId(vertices.len());
                vertices.push(Vertex {
                    id: vertex_id,
                    coords: vertex_coords(centers[id], s, vd),
                });
                cell_vertices[id][vd.ix()] = Some(vertex_id);

                for (toward, their_dir) in vertex_share(vd) {
                    if let Some(neighbor) = neighbors[id][toward.ix()] {
                        cell_vertices[neighbor.0][their_dir.ix()] = Some(vertex_id);
                    }
                }
            }
        }

        // Sides: one per pair of bounding vertices, shared with the neighbor
        // at the opposite direction, and inserted into the incidence graph.
        let mut graph: UnGraphMap<VertexId, SideId> =
            UnGraphMap::with_capacity(vertices.len(), count * 3);
        let mut sides: Vec<Side> = Vec::new();
        let mut cell_sides: Vec<[Option<SideId>; 6]> = vec![[None; 6]; count];
        for id in 0..count {
            for &dir in SideDir::VARIANTS {
                if cell_sides[id][dir.ix()].is_some() {
                    continue;
                }
                let (vd1, vd2) = dir.connected_vertex_dirs();
                let v1 = cell_vertices[id][vd1.ix()].unwrap();
                let v2 = cell_vertices[id][vd2.ix()].unwrap();

                let side_id = SideId(sides.len());
                sides.push(Side {
                    id: side_id,
                    status: SideStatus::Unset,
                    color: side_id.0 % SIDE_COLOR_COUNT,
                    dirty: true,
                    endpoints: UnorderedPair(v1, v2),
                    midpoint: Point::midpoint(vertices[v1.0].coords, vertices[v2.0].coords),
                    owners: vec![(dir, CellId(id))],
                    limb_of: Vec::new(),
                });
                cell_sides[id][dir.ix()] = Some(side_id);
                graph.add_edge(v1, v2, side_id);

                if let Some(neighbor) = neighbors[id][dir.ix()] {
                    cell_sides[neighbor.0][dir.opposite().ix()] = Some(side_id);
                    sides[side_id.0].owners.push((dir.opposite(), neighbor));
                }
            }
        }

        // A cell's limb at a vertex is the one incident side there that is
        // not among the cell's own six; boundary vertices have none.
        let mut cell_limbs: Vec<[Option<SideId>; 6]> = vec![[None; 6]; count];
        for id in 0..count {
            for &vd in VertexDir::VARIANTS {
                let vertex = cell_vertices[id][vd.ix()].unwrap();
                let limb = graph
                    .edges(vertex)
                    .map(|(_, _, side)| *side)
                    .find(|side| !cell_sides[id].contains(&Some(*side)));
                cell_limbs[id][vd.ix()] = limb;
                if let Some(limb) = limb {
                    sides[limb.0].limb_of.push((vd, CellId(id)));
                }
            }
        }

        let cells: Vec<Cell> = (0..count)
            .map(|id| Cell {
                row: coords[id].0,
                col: coords[id].1,
                requirement: reqs[id],
                center: centers[id],
                neighbors: neighbors[id],
                sides: cell_sides[id].map(|side| side.unwrap()),
                vertices: cell_vertices[id].map(|vertex| vertex.unwrap()),
                limbs: cell_limbs[id],
                faction: Faction::Unknown,
                fully_set: std::cell::Cell::new(false),
            })
            .collect();

        let req_cells = (0..count).filter(|&id| reqs[id].is_some()).map(CellId).collect();

        Ok(Board {
            rows,
            mid_row: mid,
            cells,
            sides,
            vertices,
            grid,
            graph,
            req_cells,
            history: Vec::new(),
            rng: StdRng::seed_from_u64(self.color_seed),
            color_seed: self.color_seed,
        })
    }
}

// Which neighbors share a vertex, and at which of their own vertex slots.
fn vertex_share(dir: VertexDir) -> [(SideDir, VertexDir); 2] {
    match dir {
        VertexDir::Top => [
            (SideDir::UpLeft, VertexDir::DownRight),
            (SideDir::UpRight, VertexDir::DownLeft),
        ],
        VertexDir::UpRight => [
            (SideDir::UpRight, VertexDir::Bottom),
            (SideDir::Right, VertexDir::UpLeft),
        ],
        VertexDir::DownRight => [
            (SideDir::Right, VertexDir::DownLeft),
            (SideDir::DownRight, VertexDir::Top),
        ],
        VertexDir::Bottom => [
            (SideDir::DownLeft, VertexDir::UpRight),
            (SideDir::DownRight, VertexDir::UpLeft),
        ],
        VertexDir::DownLeft => [
            (SideDir::Left, VertexDir::DownRight),
            (SideDir::DownLeft, VertexDir::Top),
        ],
        VertexDir::UpLeft => [
            (SideDir::UpLeft, VertexDir::Bottom),
            (SideDir::Left, VertexDir::UpRight),
        ],
    }
}

fn vertex_coords(center: Point, side_length: f64, dir: VertexDir) -> Point {
    let sqrt3 = 3.0_f64.sqrt();
    let cos60 = 60.0_f64.to_radians().cos();
    // Distances from the cell center to a vertex, split into the vertical
    // offset of the four "diagonal" vertices and their horizontal offset.
    let vertical = side_length - side_length * cos60;
    let horizontal = sqrt3 * side_length / 2.0;

    let (dx, dy) = match dir {
        VertexDir::Top => (0.0, -side_length),
        VertexDir::UpRight => (horizontal, -vertical),
        VertexDir::DownRight => (horizontal, vertical),
        VertexDir::Bottom => (0.0, side_length),
        VertexDir::DownLeft => (-horizontal, vertical),
        VertexDir::UpLeft => (-horizontal, -vertical),
    };
    Point::new(center.x + dx, center.y + dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_counts() {
        assert_eq!(BoardBuilder::cell_count(3), 7);
        assert_eq!(BoardBuilder::cell_count(5), 19);
        assert_eq!(BoardBuilder::cell_count(7), 37);
    }
}
