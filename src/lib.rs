#![warn(missing_docs)]

//! # `hexaloop`
//!
//! A deduction engine for hexagonal [Slitherlink](https://en.wikipedia.org/wiki/Slitherlink)
//! puzzles: a rhombus-shaped board of hexagonal cells, each optionally requiring an exact
//! count of active border sides, solved by tracing a single closed loop along the sides.
//! Begin by building a board with a [`BoardBuilder`], then hand it to a [`Solver`] and
//! either [`step`](Solver::step) through deductions one at a time or run
//! [`solve_all`](Solver::solve_all).
//!
//! # Internals
//! The board is an index-based arena: cells, sides, and vertices live in flat lists and
//! reference each other by id, with the vertex/side incidence kept in an undirected
//! graph (vertices as nodes, sides as edge weights). Topology is fixed at build time;
//! only side status, cosmetic path colors, and cell factions change afterwards.
//!
//! The solver is a forward-chaining rule engine. A one-shot initial pass seeds moves
//! from paired-requirement patterns (zero-cells, 1-and-5, 5-and-5, and friends). Each
//! applied move then re-inspects only its local vicinity, and a full-board inspection
//! runs whenever the pending queue empties, finishing with an inside/outside
//! two-coloring of the cells as the last-resort inference. Every move carries a
//! priority tier and a human-readable explanation; ties between pending moves break by
//! geometric proximity to the previously applied move.
//!
//! The engine applies logically certain deductions only. There is no backtracking and
//! no hypothetical search, so a puzzle that requires guessing stalls with some sides
//! left unset rather than erroring.

pub use board::Board;
pub use builder::{BoardBuilder, BuildError};
pub use cell::{AntiPair, Cell, CellId, Faction};
pub use dir::{SideDir, VertexDir};
pub use game_move::{GameMove, MovePriority};
pub use link::SideLink;
pub use point::Point;
pub use side::{Side, SideId, SideStatus, SIDE_COLOR_COUNT};
pub use solver::Solver;
pub use vertex::{Vertex, VertexId};

pub(crate) mod board;
pub(crate) mod builder;
pub(crate) mod cell;
pub(crate) mod dir;
pub(crate) mod game_move;
pub(crate) mod link;
pub(crate) mod point;
pub(crate) mod side;
pub(crate) mod solver;
mod tests;
pub(crate) mod vertex;
