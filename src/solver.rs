use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use strum::VariantArray;
use unordered_pair::UnorderedPair;

use crate::board::Board;
use crate::cell::{CellId, Faction};
use crate::dir::SideDir;
use crate::game_move::MovePriority::{High, Highest, Low, Lowest, Normal};
use crate::game_move::{GameMove, MovePriority};
use crate::link::SideLink;
use crate::point::Point;
use crate::side::SideId;
use crate::side::SideStatus::{self, Active, Blank, Unset};

/// The forward-chaining deduction engine.
///
/// The solver owns the board and a queue of pending moves. Construction runs
/// a one-shot inspection of paired-requirement patterns; afterwards each
/// applied move triggers a re-inspection of its local vicinity only, and a
/// full-board inspection runs as a fallback whenever the queue runs dry.
///
/// Only logically certain deductions are made: there is no backtracking and
/// no hypothetical search. A puzzle that requires guessing simply stalls
/// with some sides left unset, which is not an error.
pub struct Solver {
    board: Board,
    next_moves: Vec<GameMove>,
    // Sides already given a proposal in the current inspection batch, so one
    // batch cannot queue duplicate or contradictory moves for a side.
    processed: HashSet<SideId>,
}

impl Solver {
    /// Wrap a board and run the initial one-shot inspection.
    pub fn new(board: Board) -> Self {
        let mut solver = Self {
            board,
            next_moves: Vec::new(),
            processed: HashSet::new(),
        };
        solver.initial_inspection();
        solver
    }

    /// The board under deduction.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Give up ownership of the board.
    pub fn into_board(self) -> Board {
        self.board
    }

    /// The moves currently queued, in no particular order.
    pub fn pending_moves(&self) -> &[GameMove] {
        &self.next_moves
    }

    /// Apply deduction steps until neither the queue nor a full-board
    /// inspection yields anything. Returns the number of sides set.
    ///
    /// Terminates because every applied move strictly decreases the number
    /// of unset sides.
    pub fn solve_all(&mut self) -> usize {
        let mut count = 0;
        while let Some(mv) = self.next_move(None, false) {
            let side = mv.side;
            if self.board.apply(mv) {
                count += 1;
                self.inspect_vicinity(side);
            }
        }
        count
    }

    /// Apply the single best pending deduction and re-inspect its vicinity.
    ///
    /// Pending moves are ranked by priority, ties broken by proximity to
    /// `prev` (typically the previously applied move's midpoint). Returns
    /// the applied move, or `None` when no further deduction exists.
    pub fn step(&mut self, prev: Option<Point>) -> Option<GameMove> {
        let mv = self.next_move(prev, true)?;
        let side = mv.side;
        self.board.apply(mv.clone());
        self.inspect_vicinity(side);
        Some(mv)
    }

    /// Manually cycle a side through unset, active, blank, and back.
    pub fn toggle_side(&mut self, side: SideId) -> SideStatus {
        self.board.toggle_side(side)
    }

    /// Undo the most recent move.
    ///
    /// Solver-originated moves are re-queued at the front of the pending
    /// list, so the next step replays them rather than losing the deduction.
    pub fn undo_last(&mut self) -> Option<GameMove> {
        let mv = self.board.undo_last()?;
        if mv.from_solver {
            self.next_moves.insert(0, mv.clone());
        }
        Some(mv)
    }

    /// Clear the board back to its pristine state and restart deduction.
    pub fn reset(&mut self) {
        self.board.reset();
        self.next_moves.clear();
        self.processed.clear();
        self.initial_inspection();
    }

    ///////////////////////////////////////////////////////////////////////
    // Queue management
    ///////////////////////////////////////////////////////////////////////

    fn add_move(
        &mut self,
        side: Option<SideId>,
        status: SideStatus,
        priority: MovePriority,
        reason: &str,
    ) {
        let Some(side) = side else { return };
        if status == Unset
            || !self.board.side(side).is_unset()
            || self.processed.contains(&side)
        {
            return;
        }
        self.next_moves.push(GameMove::solver(side, status, priority, reason));
        self.processed.insert(side);
    }

    fn add_moves<I>(&mut self, sides: I, status: SideStatus, priority: MovePriority, reason: &str)
    where
        I: IntoIterator<Item = SideId>,
    {
        for side in sides {
            self.add_move(Some(side), status, priority, reason);
        }
    }

    fn sort_queue(&mut self, prev: Option<Point>) {
        let board = &self.board;
        self.next_moves.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| match prev {
                Some(point) => board
                    .side(a.side)
                    .midpoint()
                    .dist(point)
                    .total_cmp(&board.side(b.side).midpoint().dist(point)),
                None => std::cmp::Ordering::Equal,
            })
        });
    }

    // Pop the best pending move whose side is still unset; anything else
    // was invalidated since being queued and is dropped.
    fn pop_pending(&mut self, prev: Option<Point>, sort: bool) -> Option<GameMove> {
        if sort {
            self.sort_queue(prev);
        }
        while !self.next_moves.is_empty() {
            let mv = self.next_moves.remove(0);
            if self.board.side(mv.side).is_unset() {
                return Some(mv);
            }
        }
        None
    }

    fn next_move(&mut self, prev: Option<Point>, sort: bool) -> Option<GameMove> {
        if let Some(mv) = self.pop_pending(prev, sort) {
            return Some(mv);
        }
        // Queue is dry; sweep the whole board before giving up.
        self.inspect_everything();
        self.pop_pending(prev, sort)
    }

    ///////////////////////////////////////////////////////////////////////
    // Inspection batches
    ///////////////////////////////////////////////////////////////////////

    /// One-time patterns around requirement-bearing cells, queued once at
    /// construction: zero-cells and the paired-requirement clues that never
    /// need re-checking.
    fn initial_inspection(&mut self) {
        self.processed.clear();

        for cell in self.board.req_cells().to_vec() {
            match self.board.cell(cell).requirement() {
                Some(0) => {
                    let sides = self.board.cell(cell).sides.to_vec();
                    self.add_moves(sides, Blank, High, "Remove sides of zero-cell.");
                    let limbs = self.board.cell(cell).all_limbs().collect_vec();
                    self.add_moves(limbs, Blank, High, "Remove limbs of zero-cell.");
                }
                Some(1) => {
                    for &dir in SideDir::VARIANTS {
                        let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                            continue;
                        };
                        let boundary = self.board.cell(cell).side(dir);
                        match self.board.cell(adj).requirement() {
                            Some(5) => {
                                self.add_move(
                                    Some(boundary),
                                    Active,
                                    High,
                                    "Set boundary of 1-and-5 to active.",
                                );
                            }
                            Some(4) => {
                                let (cap, limbs) = self.board.cap(cell, dir.opposite());
                                let reason =
                                    "Remove the cap of the 1-cell opposite its adjacent 4-cell.";
                                self.add_moves(cap, Blank, High, reason);
                                self.add_moves(limbs, Blank, High, reason);
                            }
                            Some(2) => {
                                self.add_move(
                                    Some(boundary),
                                    Blank,
                                    High,
                                    "Set the boundary of 1-and-2 to blank.",
                                );
                            }
                            Some(1) => {
                                self.add_move(
                                    Some(boundary),
                                    Blank,
                                    High,
                                    "Set the boundary of 1-and-1 to blank.",
                                );
                            }
                            _ => {}
                        }
                    }
                }
                Some(2) => {
                    // A 2-cell flanked by two non-adjacent 5-cells must spend
                    // both of its active sides on those boundaries.
                    let adj_5_dirs = SideDir::VARIANTS
                        .iter()
                        .copied()
                        .filter(|&dir| {
                            self.board
                                .cell(cell)
                                .neighbor(dir)
                                .is_some_and(|adj| self.board.cell(adj).requirement() == Some(5))
                        })
                        .collect_vec();
                    if adj_5_dirs.len() == 2 && !adj_5_dirs[0].is_adjacent(adj_5_dirs[1]) {
                        let reason = "The two sides of the 2-cell facing 5-cells should be active.";
                        let sides = adj_5_dirs
                            .iter()
                            .map(|&dir| self.board.cell(cell).side(dir))
                            .collect_vec();
                        self.add_moves(sides, Active, High, reason);
                    }
                }
                Some(5) => {
                    for &dir in SideDir::VARIANTS {
                        let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                            continue;
                        };
                        if self.board.cell(adj).requirement() != Some(5) {
                            continue;
                        }
                        let boundary = self.board.cell(cell).side(dir);
                        self.add_move(Some(boundary), Active, High, "Set boundary of 5-and-5 to active.");
                        let (cap1, limbs1) = self.board.cap(cell, dir.opposite());
                        let (cap2, limbs2) = self.board.cap(adj, dir);
                        self.add_moves(
                            cap1.into_iter().chain(cap2),
                            Active,
                            High,
                            "Activate the cap of both 5-and-5 cells.",
                        );
                        self.add_moves(
                            limbs1.into_iter().chain(limbs2),
                            Blank,
                            High,
                            "Remove dead limbs of both 5-and-5 cells.",
                        );
                    }
                }
                _ => {}
            }
        }
    }

    /// Re-inspect only the vicinity of a just-applied move: the sides
    /// sharing a vertex with it, the cells owning it, and the cells it is a
    /// limb of.
    fn inspect_vicinity(&mut self, side: SideId) {
        self.processed.clear();

        for conn in self.board.connected_sides(side) {
            self.inspect_side_clues(conn);
        }
        let owners = self.board.side(side).owners.iter().map(|&(_, c)| c).collect_vec();
        for cell in owners {
            self.inspect_cell_clues(cell);
        }
        let limb_cells = self.board.side(side).limb_of.iter().map(|&(_, c)| c).collect_vec();
        for cell in limb_cells {
            self.inspect_cell_clues(cell);
        }
    }

    /// Full-board sweep: every requirement cell, every side, then the
    /// expensive pattern rules, and finally faction inference only if
    /// nothing else produced a move.
    fn inspect_everything(&mut self) {
        self.processed.clear();

        for cell in self.board.req_cells().to_vec() {
            self.inspect_cell_clues(cell);
            self.inspect_less_obvious_cell_clues(cell);
        }

        for side in self.board.side_ids() {
            self.inspect_side_clues(side);
            self.inspect_loop_maker(side);
        }

        for cell in self.board.cell_ids() {
            if !self.next_moves.is_empty() {
                break;
            }
            self.inspect_face_to_face_loops(cell);
        }

        if self.next_moves.is_empty() {
            self.inspect_factions();
        }
    }

    ///////////////////////////////////////////////////////////////////////
    // Side rules
    ///////////////////////////////////////////////////////////////////////

    fn inspect_side_clues(&mut self, side: SideId) {
        if !self.board.side(side).is_unset() {
            return;
        }
        self.inspect_hanging_side(side);
        self.inspect_connecting_to_intersection(side);
        self.inspect_continue_active_link(side);
    }

    // A side with a dead endpoint has nowhere to extend; neither does the
    // rest of its link.
    fn inspect_hanging_side(&mut self, side: SideId) {
        if self.board.is_hanging(side) {
            self.add_moves(self.link_or_self(side), Blank, Highest, "Remove hanging side.");
        }
    }

    // A side running into a vertex that already has two active sides would
    // make it a three-way branch.
    fn inspect_connecting_to_intersection(&mut self, side: SideId) {
        let UnorderedPair(v1, v2) = self.board.side(side).endpoints();
        if self.board.is_intersection(v1) || self.board.is_intersection(v2) {
            self.add_moves(
                self.link_or_self(side),
                Blank,
                Highest,
                "Remove side connecting to intersection.",
            );
        }
    }

    // An unset side that is the only possible continuation of an active side
    // must itself become active, along with its whole link.
    fn inspect_continue_active_link(&mut self, side: SideId) {
        for conn in self.board.active_connected_sides(side) {
            if self.board.is_linked(side, conn, true) {
                self.add_moves(
                    self.link_or_self(side),
                    Active,
                    Highest,
                    "Activate the link continuation.",
                );
            }
        }
    }

    // Activating this side would tie the two ends of one active run into a
    // closed loop before the puzzle is finished.
    fn inspect_loop_maker(&mut self, side: SideId) {
        if !self.board.side(side).is_unset() {
            return;
        }
        let Some(link) = SideLink::from_side(&self.board, side) else {
            return;
        };

        let (v1, v2) = link.endpoints();
        let (e1, e2) = link.end_sides();
        let actives1 = self.board.active_sides_at_except(v1, e1);
        let actives2 = self.board.active_sides_at_except(v2, e2);

        if let (Some(&a1), Some(&a2)) = (actives1.first(), actives2.first()) {
            if self.board.side(a1).color() == self.board.side(a2).color()
                && SideLink::is_same_link(&self.board, a1, a2)
            {
                self.add_move(Some(side), Blank, Low, "Remove link which creates a loop.");
            }
        }
    }

    fn link_or_self(&self, side: SideId) -> Vec<SideId> {
        match SideLink::from_side(&self.board, side) {
            Some(link) => link.sides().to_vec(),
            None => vec![side],
        }
    }

    ///////////////////////////////////////////////////////////////////////
    // Cell rules
    ///////////////////////////////////////////////////////////////////////

    fn inspect_cell_clues(&mut self, cell: CellId) {
        if !self.board.is_fully_set(cell) {
            if let Some(req) = self.board.cell(cell).requirement() {
                if self.board.count_active_sides(cell) == req as usize {
                    self.add_moves(
                        self.board.unset_sides(cell),
                        Blank,
                        Highest,
                        "Cell already has the required number of active sides, \
                         so remove the other unset sides.",
                    );
                } else if self.board.count_blank_sides(cell) == (6 - req) as usize {
                    self.add_moves(
                        self.board.unset_sides(cell),
                        Active,
                        Highest,
                        "Cell already has enough blank sides, so activate the other unset sides.",
                    );
                } else {
                    self.inspect_four_cell_chain(cell);
                }
            }

            // Check each side and limb individually, even for cells that
            // carry no requirement.
            let own = self.board.cell(cell).sides.to_vec();
            for side in own {
                if self.board.side(side).is_unset() {
                    self.inspect_side_clues(side);
                }
            }
            let limbs = self.board.cell(cell).all_limbs().collect_vec();
            for limb in limbs {
                if self.board.side(limb).is_unset() {
                    self.inspect_side_clues(limb);
                }
            }
        }
    }

    fn inspect_less_obvious_cell_clues(&mut self, cell: CellId) {
        if self.board.is_fully_set(cell) {
            return;
        }
        if self.next_moves.is_empty() {
            self.inspect_symmetrical_3_cell(cell);
        }
        if self.next_moves.is_empty() {
            self.inspect_unset_side_links(cell);
        }
        if self.next_moves.is_empty() {
            self.inspect_theoreticals(cell);
        }
        if self.next_moves.is_empty() {
            self.inspect_closed_off_5_cell(cell);
        }
        if self.next_moves.is_empty() {
            self.inspect_open_5_cell(cell);
        }
        if self.next_moves.is_empty() {
            self.inspect_remaining_2_group(cell);
        }
    }

    // A 4-cell whose side opposite an adjacent 5-cell links with one of its
    // neighbors must keep that size-2 group active; while everything on that
    // face is still unset the same reasoning carries to the next 4-cell in
    // the chain.
    fn inspect_four_cell_chain(&mut self, cell: CellId) {
        if self.board.cell(cell).requirement() != Some(4) || self.board.is_fully_set(cell) {
            return;
        }

        for &dir in SideDir::VARIANTS {
            let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                continue;
            };
            if self.board.cell(adj).requirement() != Some(5) {
                continue;
            }

            let target_dir = dir.opposite();
            let mut current = Some(cell);
            while let Some(cur) = current {
                if self.board.cell(cur).requirement() != Some(4) {
                    break;
                }
                let target = self.board.cell(cur).side(target_dir);
                if !self.board.side(target).is_unset() {
                    break;
                }
                let (d1, d2) = target_dir.adjacents();
                let adj1 = self.board.cell(cur).side(d1);
                let adj2 = self.board.cell(cur).side(d2);

                if self.board.is_linked(target, adj1, false)
                    || self.board.is_linked(target, adj2, false)
                {
                    self.add_move(
                        Some(target),
                        Active,
                        Normal,
                        "Unset size-2 group of a 4-cell opposite a 5-cell should be active.",
                    );
                    break;
                }

                if self.board.side(adj1).is_unset() && self.board.side(adj2).is_unset() {
                    current = self.board.cell(cur).neighbor(target_dir);
                } else {
                    break;
                }
            }
        }
    }

    // A 3-cell whose unset sides form one exact 3-run takes all three
    // actives on that run; its endpoints continue outward through the limbs
    // there and nowhere else.
    fn inspect_symmetrical_3_cell(&mut self, cell: CellId) {
        if self.board.cell(cell).requirement() != Some(3) || self.board.is_fully_set(cell) {
            return;
        }

        for link in self.board.unset_side_links(cell) {
            if link.len() != 3 {
                continue;
            }
            let (v1, v2) = link.endpoints();
            let limb1 = self.board.limb_at(cell, v1);
            let limb2 = self.board.limb_at(cell, v2);
            let reason = "Set the limbs at the endpoints of the symmetrical 3-cell to active.";
            self.add_move(limb1, Active, Low, reason);
            self.add_move(limb2, Active, Low, reason);

            let others = self
                .board
                .cell(cell)
                .all_limbs()
                .filter(|&limb| Some(limb) != limb1 && Some(limb) != limb2)
                .collect_vec();
            self.add_moves(others, Blank, Low, "Remove all other limbs of the symmetrical 3-cell.");
        }
    }

    // Size a cell's unset links against its remaining active and blank
    // budgets; when the direct budgets are inconclusive, retry with the
    // theoretical blanks folded in.
    fn inspect_unset_side_links(&mut self, cell: CellId) {
        let Some(req) = self.board.cell(cell).requirement() else {
            return;
        };
        if self.board.is_fully_set(cell) {
            return;
        }

        let req = req as i32;
        let required_blanks = 6 - req;
        let groups = self.board.unset_side_links(cell);
        let actual_active = self.board.count_active_sides(cell) as i32;
        let actual_blank = self.board.count_blank_sides(cell) as i32;
        let (theoretical, theoretical_sets) = self.board.theoretical_blanks(cell);
        let total_blank = theoretical as i32 + actual_blank;
        let total_active = theoretical as i32 + actual_active;

        for theoretical_sides in &theoretical_sets {
            for group in &groups {
                let size = group.len() as i32;

                if size > required_blanks - actual_blank {
                    self.add_moves(
                        group.sides().to_vec(),
                        Active,
                        Normal,
                        &format!("Side group (size: {size}) of {req}-cell should be active."),
                    );
                } else if size > req - actual_active {
                    self.add_moves(
                        group.sides().to_vec(),
                        Blank,
                        Normal,
                        &format!("Side group (size: {size}) of {req}-cell should be blank."),
                    );
                } else if size > 1
                    && group.sides().iter().all(|side| !theoretical_sides.contains(side))
                {
                    if size > required_blanks - total_blank {
                        self.add_moves(
                            group.sides().to_vec(),
                            Active,
                            Normal,
                            &format!(
                                "Side group of {req}-cell should be active (using theoretical clues)."
                            ),
                        );
                    } else if size > req - total_active {
                        self.add_moves(
                            group.sides().to_vec(),
                            Blank,
                            Normal,
                            &format!(
                                "Side group of {req}-cell should be blank (using theoretical clues)."
                            ),
                        );
                    }
                }
            }
        }
    }

    // Anti-pairs guarantee one blank each without naming the side; once the
    // guaranteed blanks or actives exhaust the cell's budget the remaining
    // uncommitted sides are forced. One short of the requirement with exactly
    // two adjacent uncommitted sides left pins the limb between them instead.
    fn inspect_theoreticals(&mut self, cell: CellId) {
        let Some(req) = self.board.cell(cell).requirement() else {
            return;
        };
        if self.board.is_fully_set(cell) {
            return;
        }

        let req = req as i32;
        let actual_blank = self.board.count_blank_sides(cell) as i32;
        let actual_active = self.board.count_active_sides(cell) as i32;
        let set_sides = actual_blank + actual_active;
        let (theoretical, theoretical_sets) = self.board.theoretical_blanks(cell);
        let theoretical = theoretical as i32;

        for theoretical_sides in &theoretical_sets {
            let uncommitted = |board: &Board, side: SideId| {
                board.side(side).is_unset() && !theoretical_sides.contains(&side)
            };

            if theoretical + actual_blank == 6 - req {
                let sides = self
                    .board
                    .cell(cell)
                    .sides
                    .iter()
                    .copied()
                    .filter(|&side| uncommitted(&self.board, side))
                    .collect_vec();
                self.add_moves(
                    sides,
                    Active,
                    Low,
                    "Theoretical blanks plus actual blanks are enough. Set the other sides to active.",
                );
            }

            if theoretical + actual_active == req {
                let sides = self
                    .board
                    .cell(cell)
                    .sides
                    .iter()
                    .copied()
                    .filter(|&side| uncommitted(&self.board, side))
                    .collect_vec();
                self.add_moves(
                    sides,
                    Blank,
                    Low,
                    "Theoretical actives plus actual actives are enough. Set the other sides to blank.",
                );
            } else if theoretical + actual_active == req - 1
                && theoretical_sides.len() as i32 + set_sides == 4
            {
                let remaining = self
                    .board
                    .cell_sides(cell)
                    .filter(|&(_, side)| uncommitted(&self.board, side))
                    .collect_vec();
                debug_assert_eq!(remaining.len(), 2, "expected only 2 remaining unsure sides");

                if remaining.len() == 2 && remaining[0].0.is_adjacent(remaining[1].0) {
                    if let Some(vertex) =
                        self.board.connection_vertex(remaining[0].1, remaining[1].1)
                    {
                        let limb = self.board.limb_at(cell, vertex);
                        self.add_move(limb, Active, Low, "Bisect the remaining 2 unsure sides.");
                    }
                }
            }
        }
    }

    // Two cells facing each other across an all-unset boundary, each already
    // carrying both ends of one same-colored active run, would close a loop
    // face to face unless the boundary is crossed.
    fn inspect_face_to_face_loops(&mut self, cell: CellId) {
        if !self.next_moves.is_empty() || self.board.is_fully_set(cell) {
            return;
        }

        use SideDir::{DownLeft, DownRight, Left, Right, UpLeft, UpRight};
        // (same-loop active pair, adjacent-cell dir, cell's unset pair, the
        // adjacent cell's unset pair); the side to activate is the boundary
        // toward the adjacent cell.
        const CASES: [((SideDir, SideDir), SideDir, (SideDir, SideDir), (SideDir, SideDir)); 12] = [
            ((Left, Right), UpLeft, (UpLeft, UpRight), (DownLeft, DownRight)),
            ((Left, Right), UpRight, (UpLeft, UpRight), (DownLeft, DownRight)),
            ((Left, Right), DownLeft, (DownLeft, DownRight), (UpLeft, UpRight)),
            ((Left, Right), DownRight, (DownLeft, DownRight), (UpLeft, UpRight)),
            ((UpLeft, DownRight), UpRight, (UpRight, Right), (Left, DownLeft)),
            ((UpLeft, DownRight), Right, (UpRight, Right), (Left, DownLeft)),
            ((UpLeft, DownRight), DownLeft, (Left, DownLeft), (Right, UpRight)),
            ((UpLeft, DownRight), Left, (Left, DownLeft), (Right, UpRight)),
            ((UpRight, DownLeft), UpLeft, (UpLeft, Left), (Right, DownRight)),
            ((UpRight, DownLeft), Left, (UpLeft, Left), (Right, DownRight)),
            ((UpRight, DownLeft), Right, (Right, DownRight), (UpLeft, Left)),
            ((UpRight, DownLeft), DownRight, (Right, DownRight), (UpLeft, Left)),
        ];

        // Whether the cell's own active pair belongs to one run is shared
        // between cases that reuse the pair.
        let mut same_run_memo: HashMap<(SideDir, SideDir), bool> = HashMap::new();

        for (active_dirs, adj_dir, cell_unset, adj_unset) in CASES {
            if same_run_memo.get(&active_dirs) == Some(&false) {
                continue;
            }
            let Some(adj) = self.board.cell(cell).neighbor(adj_dir) else {
                continue;
            };

            let cell_active1 = self.board.cell(cell).side(active_dirs.0);
            let cell_active2 = self.board.cell(cell).side(active_dirs.1);
            let adj_active1 = self.board.cell(adj).side(active_dirs.0);
            let adj_active2 = self.board.cell(adj).side(active_dirs.1);

            if !self.board.side(cell_active1).is_active()
                || !self.board.side(cell_active2).is_active()
            {
                same_run_memo.insert(active_dirs, false);
                continue;
            }
            if !self.board.side(adj_active1).is_active()
                || !self.board.side(adj_active2).is_active()
            {
                continue;
            }

            let boundary_unset = [
                self.board.cell(cell).side(cell_unset.0),
                self.board.cell(cell).side(cell_unset.1),
                self.board.cell(adj).side(adj_unset.0),
                self.board.cell(adj).side(adj_unset.1),
            ];
            if !boundary_unset.iter().all(|&side| self.board.side(side).is_unset()) {
                continue;
            }

            if self.board.side(cell_active1).color() != self.board.side(cell_active2).color()
                || self.board.side(adj_active1).color() != self.board.side(adj_active2).color()
            {
                continue;
            }

            if !*same_run_memo.entry(active_dirs).or_insert_with(|| {
                SideLink::is_same_link(&self.board, cell_active1, cell_active2)
            }) {
                continue;
            }
            if !SideLink::is_same_link(&self.board, adj_active1, adj_active2) {
                continue;
            }

            let boundary = self.board.cell(cell).side(adj_dir);
            self.add_move(Some(boundary), Active, Lowest, "Avoid the face to face loop.");
            break;
        }
    }

    // A cell two actives short: oversized leftover links cannot fit, two
    // lone unset sides meeting at a vertex must fuse into one run, and two
    // 2-runs meeting at a vertex must be bisected there.
    fn inspect_remaining_2_group(&mut self, cell: CellId) {
        if self.board.remaining_required(cell) != Some(2) {
            return;
        }
        let req = match self.board.cell(cell).requirement() {
            Some(req) => req,
            None => return,
        };

        let mut size1: Vec<SideLink> = Vec::new();
        let mut size2: Vec<SideLink> = Vec::new();
        let mut oversized: Vec<SideLink> = Vec::new();
        for link in self.board.unset_side_links(cell) {
            match link.len() {
                1 => size1.push(link),
                2 => size2.push(link),
                _ => oversized.push(link),
            }
        }

        if !oversized.is_empty() {
            for link in &oversized {
                self.add_moves(
                    link.sides().to_vec(),
                    Blank,
                    Normal,
                    &format!("Side group of {req}-cell should be blank (using theoretical clues)."),
                );
            }
        } else if size1.len() == 2 && size1[0].connection_vertex(&size1[1]).is_some() {
            let vertex = size1[0].connection_vertex(&size1[1]).unwrap();
            let limb = self.board.limb_at(cell, vertex);
            self.add_move(
                limb,
                Blank,
                Low,
                &format!("Remaining required sides of {req}-cell is 2, so fuse the two together."),
            );
        } else if size2.len() == 2 && size2[0].connection_vertex(&size2[1]).is_some() {
            let vertex = size2[0].connection_vertex(&size2[1]).unwrap();
            let limb = self.board.limb_at(cell, vertex);
            self.add_move(
                limb,
                Active,
                Low,
                &format!("Remaining required sides of {req}-cell is 2, so bisect the two links."),
            );
        }
    }

    // A 5-cell closes off a neighbor when all three sides touching that
    // neighbor go active. If the neighbor's own budget cannot take the
    // forced blanks, the 5-cell's blank must sit on that face instead, which
    // forces the opposite cap active.
    fn inspect_closed_off_5_cell(&mut self, cell: CellId) {
        if self.board.cell(cell).requirement() != Some(5) || self.board.is_fully_set(cell) {
            return;
        }

        for &dir in SideDir::VARIANTS {
            let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                continue;
            };
            if !self.valid_to_close_off(adj, dir.opposite()) {
                let (cap, limbs) = self.board.cap(cell, dir.opposite());
                let reason = format!("The 5-cell cannot close off the {dir:?} direction.");
                self.add_moves(cap, Active, Low, &reason);
                self.add_moves(limbs, Blank, Low, &reason);
            }
        }
    }

    // Whether the cell bordering a 5-cell at `border_dir` tolerates being
    // closed off: its border side goes active and both sides flanking it
    // (plus anything linked to them inside the cell) go blank.
    fn valid_to_close_off(&self, adj: CellId, border_dir: SideDir) -> bool {
        let Some(req) = self.board.cell(adj).requirement() else {
            return true;
        };

        let mut count_blank = self.board.count_blank_sides(adj);
        let border = self.board.cell(adj).side(border_dir);
        for other in self.board.cell_sides_connected_to(adj, border) {
            if self.board.side(other).is_active() {
                return false;
            }
            if self.board.side(other).is_unset() {
                count_blank += 1;
                for linked in self.board.linked_sides(other, false) {
                    if self.board.cell(adj).sides.contains(&linked) {
                        count_blank += 1;
                    }
                }
            }
        }

        count_blank <= (6 - req) as usize
    }

    // Blanking a 5-cell side opens it toward that neighbor, handing the
    // neighbor two forced actives. If the neighbor's requirement cannot
    // absorb them, the side must be active instead.
    fn inspect_open_5_cell(&mut self, cell: CellId) {
        if self.board.cell(cell).requirement() != Some(5) || self.board.is_fully_set(cell) {
            return;
        }

        for &dir in SideDir::VARIANTS {
            let side = self.board.cell(cell).side(dir);
            if !self.board.side(side).is_unset() {
                continue;
            }
            let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                continue;
            };
            if self.board.cell(adj).requirement().is_none() {
                continue;
            }
            if !self.valid_to_open(adj, dir.opposite()) {
                self.add_move(
                    Some(side),
                    Active,
                    Low,
                    &format!("The 5-cell cannot be open in the {dir:?} direction."),
                );
            }
        }
    }

    // The sides of `cell` that are already active or forced active when the
    // side at `target_dir` goes blank. None when the configuration is
    // outright impossible.
    fn active_set_for_open(&self, cell: CellId, target_dir: SideDir) -> Option<HashSet<SideId>> {
        let own = self.board.cell(cell).sides;
        let mut active_set: HashSet<SideId> = own
            .iter()
            .copied()
            .filter(|&side| self.board.side(side).is_active())
            .collect();

        let (d1, d2) = target_dir.adjacents();
        for adj_dir in [d1, d2] {
            let adj_side = self.board.cell(cell).side(adj_dir);
            if self.board.side(adj_side).is_blank() {
                return None;
            }
            active_set.extend(self.board.link_items_filtered(adj_side, |s| own.contains(&s)));
        }

        Some(active_set)
    }

    fn has_anti_pair_opposite(
        &self,
        cell: CellId,
        target_dir: SideDir,
        active_set: &HashSet<SideId>,
    ) -> bool {
        let (vd1, vd2) = target_dir.opposite().connected_vertex_dirs();
        [vd1, vd2].into_iter().any(|vd| {
            self.board.anti_pair(cell, vd).is_some_and(|pair| {
                !active_set.contains(&pair.sides().0) && !active_set.contains(&pair.sides().1)
            })
        })
    }

    fn valid_to_open(&self, target: CellId, border_dir: SideDir) -> bool {
        let Some(req) = self.board.cell(target).requirement() else {
            return true;
        };
        let border = self.board.cell(target).side(border_dir);
        if self.board.side(border).is_active() {
            return false;
        }

        let Some(active_set) = self.active_set_for_open(target, border_dir) else {
            return false;
        };
        let mut count_active = active_set.len();
        if self.has_anti_pair_opposite(target, border_dir, &active_set) {
            count_active += 1;
        }

        count_active <= req as usize
    }

    ///////////////////////////////////////////////////////////////////////
    // Factions
    ///////////////////////////////////////////////////////////////////////

    // Last-resort inference: two-color the cells from the board edge inward,
    // then force every unset side between differently-sided cells active and
    // every one between same-sided cells blank.
    fn inspect_factions(&mut self) {
        self.recalculate_factions();

        for cell in self.board.cell_ids() {
            let own = self.board.cell(cell).faction();
            if own == Faction::Unknown {
                continue;
            }

            for &dir in SideDir::VARIANTS {
                let side = self.board.cell(cell).side(dir);
                if !self.board.side(side).is_unset() {
                    continue;
                }
                let adj = self.board.cell(cell).neighbor(dir);
                let far_faction = match adj {
                    Some(adj) => self.board.cell(adj).faction(),
                    None => Faction::Outside,
                };
                if far_faction == Faction::Unknown {
                    continue;
                }

                let (row, col) = (self.board.cell(cell).row(), self.board.cell(cell).col());
                let far_name = match adj {
                    Some(adj) => {
                        format!("[{},{}]", self.board.cell(adj).row(), self.board.cell(adj).col())
                    }
                    None => String::from("the outside"),
                };
                if far_faction != own {
                    self.add_move(
                        Some(side),
                        Active,
                        Lowest,
                        &format!("The cell at [{row},{col}] is {own:?} so we separate it from {far_name}."),
                    );
                } else {
                    self.add_move(
                        Some(side),
                        Blank,
                        Lowest,
                        &format!("The cell at [{row},{col}] is {own:?} so we merge it with {far_name}."),
                    );
                }
            }
        }
    }

    pub(crate) fn recalculate_factions(&mut self) {
        for cell in &mut self.board.cells {
            cell.faction = Faction::Unknown;
        }

        // Only boundary cells can be seeded; everything else is reached by
        // the flood.
        for row in 0..self.board.rows() {
            let width = self.board.num_cols(row);
            if row == 0 || row == self.board.rows() - 1 {
                for col in 0..width {
                    let cell = self.board.cell_at(row, col).unwrap();
                    self.process_edge_cell(cell);
                }
            } else {
                let first = self.board.cell_at(row, 0).unwrap();
                let last = self.board.cell_at(row, width - 1).unwrap();
                self.process_edge_cell(first);
                self.process_edge_cell(last);
            }
        }
    }

    // Seed a boundary cell from an outward side, or from a neighbor whose
    // faction is already resolved, and flood from there.
    fn process_edge_cell(&mut self, cell: CellId) {
        if self.board.cell(cell).faction() != Faction::Unknown {
            return;
        }

        for &dir in SideDir::VARIANTS {
            let side = self.board.cell(cell).side(dir);
            match self.board.cell(cell).neighbor(dir) {
                None => {
                    if self.board.side(side).is_blank() {
                        self.flood_faction(cell, Faction::Outside);
                    } else if self.board.side(side).is_active() {
                        self.flood_faction(cell, Faction::Inside);
                    }
                }
                Some(adj) => {
                    let faction = self.board.cell(adj).faction();
                    if faction != Faction::Unknown {
                        if self.board.side(side).is_blank() {
                            self.flood_faction(cell, faction);
                        } else if self.board.side(side).is_active() {
                            self.flood_faction(cell, faction.opposite());
                        }
                    }
                }
            }
        }
    }

    // First assignment wins, so the flood is idempotent under any traversal
    // order.
    fn flood_faction(&mut self, seed: CellId, faction: Faction) {
        let mut work = vec![(seed, faction)];
        while let Some((cell, faction)) = work.pop() {
            if self.board.cell(cell).faction() != Faction::Unknown {
                continue;
            }
            self.board.cells[cell.0].faction = faction;

            for &dir in SideDir::VARIANTS {
                let Some(adj) = self.board.cell(cell).neighbor(dir) else {
                    continue;
                };
                let side = self.board.cell(cell).side(dir);
                if self.board.side(side).is_blank() {
                    work.push((adj, faction));
                } else if self.board.side(side).is_active() {
                    work.push((adj, faction.opposite()));
                }
            }
        }
    }
}
