use strum::VariantArray;

use crate::board::Board;
use crate::dir::{SideDir, VertexDir};
use crate::point::Point;
use crate::side::SideId;
use crate::vertex::VertexId;

/// Identifies a [`Cell`] within its [`Board`](crate::Board).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CellId(pub(crate) usize);

impl CellId {
    /// The cell's position in the board's flat cell list.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Which side of the eventual closed loop a cell sits on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Faction {
    /// The cell is enclosed by the loop.
    Inside,
    /// The cell is outside the loop.
    Outside,
    /// Not yet determined.
    #[default]
    Unknown,
}

impl Faction {
    /// The opposite faction. The opposite of `Unknown` is `Unknown`.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Inside => Self::Outside,
            Self::Outside => Self::Inside,
            Self::Unknown => Self::Unknown,
        }
    }
}

/// Two unset cell sides at a vertex whose limb is active.
///
/// The active limb must continue through exactly one of the two, so exactly
/// one of them ends up blank.
#[derive(Copy, Clone, Debug)]
pub struct AntiPair {
    pub(crate) sides: (SideId, SideId),
    pub(crate) vertex: VertexId,
}

impl AntiPair {
    /// The two sides, exactly one of which must become blank.
    pub fn sides(&self) -> (SideId, SideId) {
        self.sides
    }

    /// The vertex where the pair meets its active limb.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }
}

/// A hexagonal cell with six sides, six vertices, and up to six limbs.
#[derive(Clone, Debug)]
pub struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) requirement: Option<u8>,
    pub(crate) center: Point,
    pub(crate) neighbors: [Option<CellId>; 6],
    pub(crate) sides: [SideId; 6],
    pub(crate) vertices: [VertexId; 6],
    pub(crate) limbs: [Option<SideId>; 6],
    pub(crate) faction: Faction,
    // One-way memo: once every side is non-unset this latches true. Monotonic
    // only while sides never revert to unset; a manual undo can violate that,
    // and the flag is deliberately not invalidated when it does.
    pub(crate) fully_set: std::cell::Cell<bool>,
}

impl Cell {
    /// The cell's row on the board.
    pub fn row(&self) -> usize {
        self.row
    }

    /// The cell's column within its row.
    pub fn col(&self) -> usize {
        self.col
    }

    /// The required number of active sides, if the puzzle constrains this cell.
    pub fn requirement(&self) -> Option<u8> {
        self.requirement
    }

    /// `6 - requirement`: how many of the cell's sides must end up blank.
    pub fn required_blanks(&self) -> Option<u8> {
        self.requirement.map(|req| 6 - req)
    }

    /// Center coordinates, for external hit tests.
    pub fn center(&self) -> Point {
        self.center
    }

    /// The cell's current faction.
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// The neighboring cell in `dir`, if not at the board boundary.
    pub fn neighbor(&self, dir: SideDir) -> Option<CellId> {
        self.neighbors[dir.ix()]
    }

    /// The cell's own side in `dir`.
    pub fn side(&self, dir: SideDir) -> SideId {
        self.sides[dir.ix()]
    }

    /// The cell's vertex in `dir`.
    pub fn vertex(&self, dir: VertexDir) -> VertexId {
        self.vertices[dir.ix()]
    }

    /// The limb at the vertex in `dir`, if any.
    ///
    /// A limb is the one side touching that vertex which is not among the
    /// cell's own six; boundary vertices have none.
    pub fn limb(&self, dir: VertexDir) -> Option<SideId> {
        self.limbs[dir.ix()]
    }

    /// The existing neighbor cells.
    pub fn adjacent_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.neighbors.iter().flatten().copied()
    }

    /// The existing limbs.
    pub fn all_limbs(&self) -> impl Iterator<Item = SideId> + '_ {
        self.limbs.iter().flatten().copied()
    }
}

// The five vertex-direction groupings whose anti-pairs never overlap: the
// three opposite pairs plus the two alternating 120-degree triples.
const ANTI_PAIR_GROUPINGS: [&[VertexDir]; 5] = [
    &[VertexDir::Top, VertexDir::Bottom],
    &[VertexDir::UpRight, VertexDir::DownLeft],
    &[VertexDir::DownRight, VertexDir::UpLeft],
    &[VertexDir::Top, VertexDir::DownLeft, VertexDir::DownRight],
    &[VertexDir::UpRight, VertexDir::UpLeft, VertexDir::Bottom],
];

/// Cell-derived queries.
impl Board {
    pub(crate) fn count_active_sides(&self, cell: CellId) -> usize {
        self.cell(cell).sides.iter().filter(|s| self.side(**s).is_active()).count()
    }

    pub(crate) fn count_blank_sides(&self, cell: CellId) -> usize {
        self.cell(cell).sides.iter().filter(|s| self.side(**s).is_blank()).count()
    }

    /// The cell's unset sides.
    pub(crate) fn unset_sides(&self, cell: CellId) -> Vec<SideId> {
        self.cell(cell)
            .sides
            .iter()
            .copied()
            .filter(|&s| self.side(s).is_unset())
            .collect()
    }

    /// How many more active sides the cell still needs, if it has a requirement.
    pub(crate) fn remaining_required(&self, cell: CellId) -> Option<i32> {
        self.cell(cell)
            .requirement
            .map(|req| req as i32 - self.count_active_sides(cell) as i32)
    }

    /// Whether none of the cell's sides are unset.
    ///
    /// Latches via the cell's one-way memo; see the field note on
    /// [`Cell::fully_set`] for the undo caveat.
    pub(crate) fn is_fully_set(&self, cell: CellId) -> bool {
        let c = self.cell(cell);
        if c.fully_set.get() {
            return true;
        }
        let done = c.sides.iter().all(|&s| !self.side(s).is_unset());
        if done {
            c.fully_set.set(true);
        }
        done
    }

    /// The limb of `cell` at `vertex`, if `vertex` belongs to the cell.
    pub(crate) fn limb_at(&self, cell: CellId, vertex: VertexId) -> Option<SideId> {
        let c = self.cell(cell);
        let slot = c.vertices.iter().position(|&v| v == vertex)?;
        c.limbs[slot]
    }

    /// The cap of `cell` centered on the side in `dir`.
    ///
    /// Returns the three contiguous sides of the run and the limbs at the two
    /// vertices bounding it.
    pub(crate) fn cap(&self, cell: CellId, dir: SideDir) -> (Vec<SideId>, Vec<SideId>) {
        let c = self.cell(cell);
        let (d1, d2) = dir.adjacents();
        let run = vec![c.side(d1), c.side(dir), c.side(d2)];

        // The run's two extreme vertices are the ones touched by only one
        // member side.
        let mut limbs = Vec::with_capacity(2);
        for &vertex in &c.vertices {
            let touched = run
                .iter()
                .filter(|&&s| {
                    let ep = self.side(s).endpoints;
                    ep.0 == vertex || ep.1 == vertex
                })
                .count();
            if touched == 1 {
                if let Some(limb) = self.limb_at(cell, vertex) {
                    limbs.push(limb);
                }
            }
        }

        (run, limbs)
    }

    /// The anti-pair of `cell` at the vertex in `vertex_dir`, if present.
    pub(crate) fn anti_pair(&self, cell: CellId, vertex_dir: VertexDir) -> Option<AntiPair> {
        let c = self.cell(cell);
        let limb = c.limb(vertex_dir)?;
        if !self.side(limb).is_active() {
            return None;
        }
        let (d1, d2) = vertex_dir.connected_side_dirs();
        let (s1, s2) = (c.side(d1), c.side(d2));
        if self.side(s1).is_unset() && self.side(s2).is_unset() {
            Some(AntiPair { sides: (s1, s2), vertex: c.vertex(vertex_dir) })
        } else {
            None
        }
    }

    /// Every grouping tying for the maximum simultaneous anti-pair count.
    pub(crate) fn maximal_anti_pair_groupings(&self, cell: CellId) -> Vec<Vec<AntiPair>> {
        let mut best = 0;
        let mut maximal: Vec<Vec<AntiPair>> = Vec::new();

        for grouping in ANTI_PAIR_GROUPINGS {
            let pairs: Vec<AntiPair> = grouping
                .iter()
                .filter_map(|&vd| self.anti_pair(cell, vd))
                .collect();

            if pairs.len() > best {
                best = pairs.len();
                maximal = vec![pairs];
            } else if pairs.len() == best {
                maximal.push(pairs);
            }
        }

        maximal
    }

    /// The guaranteed-blank budget from anti-pairs, with the member sides of
    /// every maximal grouping.
    ///
    /// Each anti-pair contributes exactly one blank whose precise side is
    /// undetermined, so the count is usable against both the blank and the
    /// active budget of the cell.
    pub(crate) fn theoretical_blanks(&self, cell: CellId) -> (usize, Vec<Vec<SideId>>) {
        let maximal = self.maximal_anti_pair_groupings(cell);
        let count = maximal.first().map_or(0, |pairs| pairs.len());
        let member_sets = maximal
            .into_iter()
            .map(|pairs| pairs.iter().flat_map(|p| [p.sides.0, p.sides.1]).collect())
            .collect();
        (count, member_sets)
    }

    /// The cell's own sides sharing a vertex with `side` (also one of its own).
    pub(crate) fn cell_sides_connected_to(&self, cell: CellId, side: SideId) -> Vec<SideId> {
        let c = self.cell(cell);
        c.sides
            .iter()
            .copied()
            .filter(|&s| s != side && self.connection_vertex(s, side).is_some())
            .collect()
    }

    /// Iterate the six side slots of `cell` in direction order.
    pub(crate) fn cell_sides(&self, cell: CellId) -> impl Iterator<Item = (SideDir, SideId)> + '_ {
        let c = self.cell(cell);
        SideDir::VARIANTS.iter().map(move |&dir| (dir, c.side(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groupings_are_opposite_pairs_and_120_degree_triples() {
        let mut pair_seen = Vec::new();
        let mut triple_seen = Vec::new();

        for grouping in ANTI_PAIR_GROUPINGS {
            match grouping.len() {
                2 => {
                    assert_eq!(grouping[1], grouping[0].opposite());
                    pair_seen.extend_from_slice(grouping);
                }
                3 => {
                    let (a, b) = grouping[0].deg120();
                    assert!(grouping.contains(&a) && grouping.contains(&b));
                    triple_seen.extend_from_slice(grouping);
                }
                n => panic!("grouping of unexpected size {n}"),
            }
        }

        // The pairs and the triples each cover every vertex direction once.
        for &vd in VertexDir::VARIANTS {
            assert_eq!(pair_seen.iter().filter(|&&seen| seen == vd).count(), 1);
            assert_eq!(triple_seen.iter().filter(|&&seen| seen == vd).count(), 1);
        }
    }
}
