use std::fmt::{Display, Formatter};

use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use unordered_pair::UnorderedPair;

use crate::cell::{Cell, CellId, Faction};
use crate::game_move::GameMove;
use crate::side::{Side, SideId, SideStatus, SIDE_COLOR_COUNT};
use crate::vertex::{Vertex, VertexId};

/// A hexagonal Slitherlink board.
///
/// Cells, sides, and vertices live in flat arenas addressed by id; the
/// vertex/side incidence is an undirected graph whose nodes are vertices and
/// whose edge weights are side ids. Topology is immutable once built; only
/// side status, cosmetic color, and cell factions change afterwards.
///
/// [`Board`]s are built by a [`BoardBuilder`](crate::builder::BoardBuilder).
#[derive(Debug)]
pub struct Board {
    pub(crate) rows: usize,
    pub(crate) mid_row: usize,
    pub(crate) cells: Vec<Cell>,
    pub(crate) sides: Vec<Side>,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) grid: Array2<Option<CellId>>,
    pub(crate) graph: UnGraphMap<VertexId, SideId>,
    pub(crate) req_cells: Vec<CellId>,
    pub(crate) history: Vec<GameMove>,
    pub(crate) rng: StdRng,
    pub(crate) color_seed: u64,
}

impl Board {
    /// The number of cell rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// How many cells a given row has.
    ///
    /// The middle row is `rows` cells wide; each row `d` away from it has
    /// `rows - d` cells.
    pub fn num_cols(&self, row: usize) -> usize {
        if row <= self.mid_row {
            self.rows - (self.mid_row - row)
        } else {
            self.rows - (row - self.mid_row)
        }
    }

    /// The cell at the given row and column, if it exists.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<CellId> {
        *self.grid.get((row, col))?
    }

    /// Look up a cell by id.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    /// Look up a side by id.
    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.0]
    }

    /// Look up a vertex by id.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    /// All cells, in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All sides, in creation order.
    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    /// All vertices, in creation order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Ids of the cells carrying a requirement.
    pub fn req_cells(&self) -> &[CellId] {
        &self.req_cells
    }

    /// All moves applied to the board so far, oldest first.
    pub fn history(&self) -> &[GameMove] {
        &self.history
    }

    /// Number of sides still unset.
    pub fn unset_count(&self) -> usize {
        self.sides.iter().filter(|s| s.is_unset()).count()
    }

    /// Clear every side's dirty flag, typically after a render pass.
    pub fn clear_dirty(&mut self) {
        for side in &mut self.sides {
            side.dirty = false;
        }
    }

    pub(crate) fn cell_ids(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len()).map(CellId)
    }

    pub(crate) fn side_ids(&self) -> impl Iterator<Item = SideId> {
        (0..self.sides.len()).map(SideId)
    }

    /// Apply a move, guarding against no-ops and stale proposals.
    ///
    /// A move whose recorded previous status no longer matches the side's
    /// current status was invalidated by an earlier move and is silently
    /// discarded. Returns whether the move was applied.
    pub(crate) fn apply(&mut self, mv: GameMove) -> bool {
        let current = self.sides[mv.side.0].status;
        if current == mv.new_status || mv.prev_status != current {
            return false;
        }

        let side = mv.side;
        let new_status = mv.new_status;
        self.history.push(mv);
        self.transition(side, new_status);
        true
    }

    /// Cycle a side through unset, active, blank, and back, recording the
    /// move in history.
    pub(crate) fn toggle_side(&mut self, side: SideId) -> SideStatus {
        let current = self.sides[side.0].status;
        let next = match current {
            SideStatus::Unset => SideStatus::Active,
            SideStatus::Active => SideStatus::Blank,
            SideStatus::Blank => SideStatus::Unset,
        };
        self.apply(GameMove::manual(side, next, current));
        self.sides[side.0].status
    }

    /// Pop the most recent move and apply its inverse status change without
    /// touching history. Returns the popped (forward) move.
    pub(crate) fn undo_last(&mut self) -> Option<GameMove> {
        let mv = self.history.pop()?;
        self.transition(mv.side, mv.prev_status);
        Some(mv)
    }

    /// Restore the pristine post-construction state: all sides unset with
    /// their original colors, factions unknown, history empty, and the color
    /// RNG reseeded.
    pub(crate) fn reset(&mut self) {
        for side in &mut self.sides {
            side.status = SideStatus::Unset;
            side.color = side.id.0 % SIDE_COLOR_COUNT;
            side.dirty = true;
        }
        for cell in &mut self.cells {
            cell.faction = Faction::Unknown;
            cell.fully_set.set(false);
        }
        self.history.clear();
        self.rng = StdRng::seed_from_u64(self.color_seed);
    }

    fn transition(&mut self, side: SideId, status: SideStatus) {
        match status {
            SideStatus::Active => self.set_active(side),
            SideStatus::Blank => self.set_blank(side),
            SideStatus::Unset => self.set_status(side, SideStatus::Unset),
        }
    }

    fn set_status(&mut self, side: SideId, status: SideStatus) {
        let s = &mut self.sides[side.0];
        if s.status != status {
            s.status = status;
            s.dirty = true;
        }
    }

    fn set_color(&mut self, side: SideId, color: usize) {
        let s = &mut self.sides[side.0];
        if s.color != color {
            s.color = color;
            s.dirty = true;
        }
    }

    // Activating a side may join up to two active runs; the side inherits or
    // merges their colors, recoloring the smaller run into the larger's.
    fn set_active(&mut self, side: SideId) {
        let UnorderedPair(v1, v2) = self.sides[side.0].endpoints;
        let active1 = self.active_sides_at_except(v1, side);
        let active2 = self.active_sides_at_except(v2, side);

        match (active1.first().copied(), active2.first().copied()) {
            (None, None) => {
                let color = self.least_used_color(None);
                self.set_color(side, color);
            }
            (Some(touching), None) | (None, Some(touching)) => {
                let color = self.sides[touching.0].color;
                self.set_color(side, color);
            }
            (Some(a1), Some(a2)) => {
                let link1 = self.link_items(a1);
                let link2 = self.link_items(a2);
                let (kept, recolored) = if link1.len() >= link2.len() {
                    (link1, link2)
                } else {
                    (link2, link1)
                };
                let color = self.sides[kept[0].0].color;
                self.set_color(side, color);
                for member in recolored {
                    self.set_color(member, color);
                }
            }
        }

        self.set_status(side, SideStatus::Active);
    }

    // Blanking a side may split one active run in two; the smaller half gets
    // a fresh least-used color so the halves stay visually distinct.
    fn set_blank(&mut self, side: SideId) {
        // Set first so the side is excluded from the runs below.
        self.set_status(side, SideStatus::Blank);

        let UnorderedPair(v1, v2) = self.sides[side.0].endpoints;
        let active1 = self.active_sides_at_except(v1, side);
        let active2 = self.active_sides_at_except(v2, side);

        if let (Some(&a1), Some(&a2)) = (active1.first(), active2.first()) {
            let link1 = self.link_items(a1);
            if link1.contains(&a2) {
                // Still one connected run; nothing split.
                return;
            }
            let link2 = self.link_items(a2);
            let (kept, recolored) = if link1.len() >= link2.len() {
                (link1, link2)
            } else {
                (link2, link1)
            };
            let except = self.sides[kept[0].0].color;
            let color = self.least_used_color(Some(except));
            for member in recolored {
                self.set_color(member, color);
            }
        }
    }

    // The color used by the fewest active sides, ties broken uniformly at
    // random from the board's seeded RNG.
    fn least_used_color(&mut self, except: Option<usize>) -> usize {
        let mut counts = [0usize; SIDE_COLOR_COUNT];
        for side in &self.sides {
            if side.is_active() {
                counts[side.color % SIDE_COLOR_COUNT] += 1;
            }
        }

        let min = (0..SIDE_COLOR_COUNT)
            .filter(|&color| except != Some(color))
            .map(|color| counts[color])
            .min()
            .unwrap();
        let candidates: Vec<usize> = (0..SIDE_COLOR_COUNT)
            .filter(|&color| except != Some(color) && counts[color] == min)
            .collect();

        *candidates.choose(&mut self.rng).unwrap()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            let width = self.num_cols(row);
            write!(f, "{}", " ".repeat(self.rows - width))?;
            for col in 0..width {
                if col > 0 {
                    write!(f, " ")?;
                }
                let ch = self
                    .cell_at(row, col)
                    .and_then(|id| self.cell(id).requirement)
                    .map(|req| char::from_digit(req as u32, 10).unwrap())
                    .unwrap_or('.');
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
