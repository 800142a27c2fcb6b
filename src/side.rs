use unordered_pair::UnorderedPair;

use crate::board::Board;
use crate::cell::CellId;
use crate::dir::{SideDir, VertexDir};
use crate::point::Point;
use crate::vertex::VertexId;

/// Number of distinct cosmetic colors cycled through by active paths.
pub const SIDE_COLOR_COUNT: usize = 8;

/// Identifies a [`Side`] within its [`Board`](crate::Board).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SideId(pub(crate) usize);

impl SideId {
    /// The side's position in the board's flat side list.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The tri-state status of a [`Side`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SideStatus {
    /// Neither active nor blank; nothing is known about the side yet.
    #[default]
    Unset,
    /// The side is part of the loop border.
    Active,
    /// The side is known to not be part of the loop.
    Blank,
}

/// One segment of a cell border, shared by up to two cells.
#[derive(Clone, Debug)]
pub struct Side {
    pub(crate) id: SideId,
    pub(crate) status: SideStatus,
    pub(crate) color: usize,
    pub(crate) dirty: bool,
    pub(crate) endpoints: UnorderedPair<VertexId>,
    pub(crate) midpoint: Point,
    // cells owning this side as one of their six, keyed by the direction
    // the side sits at within that cell
    pub(crate) owners: Vec<(SideDir, CellId)>,
    // cells for which this side is a limb, keyed by the vertex direction
    // where the side touches that cell
    pub(crate) limb_of: Vec<(VertexDir, CellId)>,
}

impl Side {
    /// The side's current status.
    pub fn status(&self) -> SideStatus {
        self.status
    }

    /// The side's cosmetic color index, in `0..SIDE_COLOR_COUNT`.
    ///
    /// Only meaningful while the side is [`Active`](SideStatus::Active); it
    /// distinguishes independent active paths visually and has no effect on
    /// deduction.
    pub fn color(&self) -> usize {
        self.color
    }

    /// Whether the side changed since the dirty flags were last cleared.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The side's two endpoint vertices.
    pub fn endpoints(&self) -> UnorderedPair<VertexId> {
        self.endpoints
    }

    /// Midpoint of the segment, for external hit tests.
    pub fn midpoint(&self) -> Point {
        self.midpoint
    }

    /// The cells owning this side, with the direction the side sits at.
    pub fn owners(&self) -> &[(SideDir, CellId)] {
        &self.owners
    }

    /// The cells for which this side is a limb.
    pub fn limb_of(&self) -> &[(VertexDir, CellId)] {
        &self.limb_of
    }

    /// Returns true if the side is active.
    pub fn is_active(&self) -> bool {
        self.status == SideStatus::Active
    }

    /// Returns true if the side is blank.
    pub fn is_blank(&self) -> bool {
        self.status == SideStatus::Blank
    }

    /// Returns true if the side is unset.
    pub fn is_unset(&self) -> bool {
        self.status == SideStatus::Unset
    }
}

/// Side-local connectivity queries.
///
/// All incidence goes through the board's vertex/side graph; sides themselves
/// only carry their endpoints.
impl Board {
    /// All sides sharing a vertex with `side`, excluding `side` itself.
    pub(crate) fn connected_sides(&self, side: SideId) -> Vec<SideId> {
        let UnorderedPair(v1, v2) = self.side(side).endpoints;
        let mut ret = self.sides_at_except(v1, side);
        ret.extend(self.sides_at_except(v2, side));
        ret
    }

    /// The sides connected to `side`, grouped per endpoint vertex.
    pub(crate) fn connected_sides_by_vertex(&self, side: SideId) -> [Vec<SideId>; 2] {
        let UnorderedPair(v1, v2) = self.side(side).endpoints;
        [self.sides_at_except(v1, side), self.sides_at_except(v2, side)]
    }

    /// The vertex common to both sides, if they are connected.
    pub(crate) fn connection_vertex(&self, a: SideId, b: SideId) -> Option<VertexId> {
        let UnorderedPair(a1, a2) = self.side(a).endpoints;
        let UnorderedPair(b1, b2) = self.side(b).endpoints;
        if a1 == b1 || a1 == b2 {
            Some(a1)
        } else if a2 == b1 || a2 == b2 {
            Some(a2)
        } else {
            None
        }
    }

    /// Whether `a` is linked to `b`.
    ///
    /// Two sides are linked if neither is blank, they have equal status
    /// (unless `ignore_status`), they share a vertex, and every other side at
    /// that vertex is blank.
    pub(crate) fn is_linked(&self, a: SideId, b: SideId, ignore_status: bool) -> bool {
        let (sa, sb) = (self.side(a), self.side(b));
        if sa.is_blank() || sb.is_blank() {
            return false;
        }
        if !ignore_status && sa.status != sb.status {
            return false;
        }
        let Some(vertex) = self.connection_vertex(a, b) else {
            return false;
        };
        self.sides_at(vertex)
            .filter(|&s| s != a && s != b)
            .all(|s| self.side(s).is_blank())
    }

    /// All sides linked to `side` (see [`Board::is_linked`]).
    pub(crate) fn linked_sides(&self, side: SideId, ignore_status: bool) -> Vec<SideId> {
        self.connected_sides(side)
            .into_iter()
            .filter(|&conn| self.is_linked(side, conn, ignore_status))
            .collect()
    }

    /// All active sides sharing a vertex with `side`, excluding `side`.
    pub(crate) fn active_connected_sides(&self, side: SideId) -> Vec<SideId> {
        let UnorderedPair(v1, v2) = self.side(side).endpoints;
        let mut ret = self.active_sides_at_except(v1, side);
        ret.extend(self.active_sides_at_except(v2, side));
        ret
    }

    /// Whether `side` has an endpoint whose other sides are all blank.
    ///
    /// Only unset and active sides can hang; a blank side has nothing to
    /// extend in the first place.
    pub(crate) fn is_hanging(&self, side: SideId) -> bool {
        match self.side(side).status {
            SideStatus::Unset | SideStatus::Active => self
                .connected_sides_by_vertex(side)
                .iter()
                .any(|conn| conn.iter().all(|&s| self.side(s).is_blank())),
            SideStatus::Blank => false,
        }
    }
}
