use std::collections::{HashMap, HashSet};

use unordered_pair::UnorderedPair;

use crate::board::Board;
use crate::cell::CellId;
use crate::side::SideId;
use crate::vertex::VertexId;

/// A maximal run of same-status, non-blank sides chained end to end.
///
/// Two member sides are chained when they share a vertex at which every
/// other side is blank, so the run can only ever be extended as a whole.
/// A valid link is a simple path: exactly two of its vertices touch one
/// member side (the endpoints) and every other touches exactly two.
#[derive(Clone, Debug)]
pub struct SideLink {
    sides: Vec<SideId>,
    endpoints: (VertexId, VertexId),
    end_sides: (SideId, SideId),
}

impl SideLink {
    /// Collect the link containing `seed`.
    ///
    /// Returns `None` when the traversal closes on itself (a loop has no
    /// endpoints and is not a link).
    pub fn from_side(board: &Board, seed: SideId) -> Option<SideLink> {
        Self::from_sides(board, board.link_items(seed))
    }

    /// Validate an already-collected member set into a link.
    fn from_sides(board: &Board, sides: Vec<SideId>) -> Option<SideLink> {
        let mut degree: HashMap<VertexId, Vec<SideId>> = HashMap::new();
        for &side in &sides {
            let UnorderedPair(v1, v2) = board.side(side).endpoints;
            degree.entry(v1).or_default().push(side);
            degree.entry(v2).or_default().push(side);
        }

        let mut ends: Vec<(VertexId, SideId)> = Vec::new();
        for (vertex, members) in degree {
            match members.len() {
                1 => ends.push((vertex, members[0])),
                2 => {}
                // Three members meeting at a vertex: the run is not a simple
                // path, so it is not a link.
                _ => return None,
            }
        }

        // Zero endpoints means the members close a loop.
        if ends.len() != 2 {
            return None;
        }
        ends.sort_by_key(|&(vertex, _)| vertex);

        Some(SideLink {
            sides,
            endpoints: (ends[0].0, ends[1].0),
            end_sides: (ends[0].1, ends[1].1),
        })
    }

    /// Whether `a` and `b` belong to the same run of same-status sides.
    ///
    /// Traverses from `a` and short-circuits as soon as `b` turns up, so no
    /// link is materialized; this also works when the run is a closed loop.
    pub fn is_same_link(board: &Board, a: SideId, b: SideId) -> bool {
        if board.side(a).status != board.side(b).status {
            return false;
        }

        let mut seen: HashSet<SideId> = HashSet::from([a]);
        let mut work = vec![a];
        while let Some(side) = work.pop() {
            if side == b {
                return true;
            }
            for next in board.link_steps(side, |_| true) {
                if seen.insert(next) {
                    work.push(next);
                }
            }
        }
        false
    }

    /// The member sides.
    pub fn sides(&self) -> &[SideId] {
        &self.sides
    }

    /// Number of member sides.
    pub fn len(&self) -> usize {
        self.sides.len()
    }

    /// Whether the link has no members. Links built by traversal never are.
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// Whether `side` is a member.
    pub fn contains(&self, side: SideId) -> bool {
        self.sides.contains(&side)
    }

    /// The two vertices touched by exactly one member side.
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        self.endpoints
    }

    /// The member sides touching each endpoint, in endpoint order.
    pub fn end_sides(&self) -> (SideId, SideId) {
        self.end_sides
    }

    /// The endpoint vertex this link shares with `other`, if they meet.
    pub fn connection_vertex(&self, other: &SideLink) -> Option<VertexId> {
        let (a1, a2) = self.endpoints;
        let (b1, b2) = other.endpoints;
        if a1 == b1 || a1 == b2 {
            Some(a1)
        } else if a2 == b1 || a2 == b2 {
            Some(a2)
        } else {
            None
        }
    }
}

impl Board {
    // The sides one chain-step away from `side`: at each endpoint vertex, a
    // same-status candidate is reachable only when every other side at that
    // vertex is blank.
    pub(crate) fn link_steps<F>(&self, side: SideId, filter: F) -> Vec<SideId>
    where
        F: Fn(SideId) -> bool,
    {
        let status = self.side(side).status;
        let mut ret = Vec::new();
        for at_vertex in self.connected_sides_by_vertex(side) {
            for &candidate in &at_vertex {
                if self.side(candidate).status != status || !filter(candidate) {
                    continue;
                }
                if at_vertex
                    .iter()
                    .filter(|&&other| other != candidate)
                    .all(|&other| self.side(other).is_blank())
                {
                    ret.push(candidate);
                }
            }
        }
        ret
    }

    /// The member sides of the run containing `seed`, without validation.
    ///
    /// Used directly by the color bookkeeping, which must also handle runs
    /// that close into loops.
    pub(crate) fn link_items(&self, seed: SideId) -> Vec<SideId> {
        self.link_items_filtered(seed, |_| true)
    }

    pub(crate) fn link_items_filtered<F>(&self, seed: SideId, filter: F) -> Vec<SideId>
    where
        F: Fn(SideId) -> bool,
    {
        let mut items = vec![seed];
        let mut seen: HashSet<SideId> = HashSet::from([seed]);
        let mut work = vec![seed];
        while let Some(side) = work.pop() {
            for next in self.link_steps(side, &filter) {
                if seen.insert(next) {
                    items.push(next);
                    work.push(next);
                }
            }
        }
        items
    }

    /// Partition the unset sides of `cell` into links restricted to the
    /// cell's own six sides.
    pub(crate) fn unset_side_links(&self, cell: CellId) -> Vec<SideLink> {
        let own = self.cell(cell).sides;
        let mut seen: HashSet<SideId> = HashSet::new();
        let mut ret = Vec::new();

        for &side in &own {
            if !self.side(side).is_unset() || seen.contains(&side) {
                continue;
            }
            let items = self.link_items_filtered(side, |s| own.contains(&s));
            seen.extend(items.iter().copied());
            // Six sides closing on themselves carry no endpoint information
            // and yield no link.
            if let Some(link) = SideLink::from_sides(self, items) {
                ret.push(link);
            }
        }

        ret
    }
}
