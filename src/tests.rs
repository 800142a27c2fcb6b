#[cfg(test)]
mod tests {
    use crate::builder::{BoardBuilder, BuildError};
    use crate::board::Board;
    use crate::cell::Faction;
    use crate::dir::{SideDir, VertexDir};
    use crate::game_move::{GameMove, MovePriority};
    use crate::link::SideLink;
    use crate::side::{SideStatus, SIDE_COLOR_COUNT};
    use crate::solver::Solver;

    fn empty_board(rows: usize) -> Board {
        BoardBuilder::new(rows).build().unwrap()
    }

    fn board_with(rows: usize, data: &str) -> Board {
        BoardBuilder::new(rows).cell_data(data).build().unwrap()
    }

    #[test]
    fn rejects_bad_row_counts() {
        assert_eq!(BoardBuilder::new(4).build().unwrap_err(), BuildError::BadRowCount { rows: 4 });
        assert_eq!(BoardBuilder::new(1).build().unwrap_err(), BuildError::BadRowCount { rows: 1 });
        assert_eq!(BoardBuilder::new(0).build().unwrap_err(), BuildError::BadRowCount { rows: 0 });
    }

    #[test]
    fn rejects_wrong_data_length() {
        assert_eq!(
            BoardBuilder::new(3).cell_data("...").build().unwrap_err(),
            BuildError::BadDataLength { expected: 7, got: 3 },
        );
        assert_eq!(
            BoardBuilder::new(5).cell_data("....").build().unwrap_err(),
            BuildError::BadDataLength { expected: 19, got: 4 },
        );
    }

    #[test]
    fn rejects_invalid_characters() {
        assert_eq!(
            BoardBuilder::new(3).cell_data("..7....").build().unwrap_err(),
            BuildError::BadDataChar { ch: '7' },
        );
        assert_eq!(
            BoardBuilder::new(3).cell_data(".x.....").build().unwrap_err(),
            BuildError::BadDataChar { ch: 'x' },
        );
    }

    #[test]
    fn three_row_topology() {
        let board = empty_board(3);

        assert_eq!(board.cells().len(), 7);
        assert_eq!(board.sides().len(), 30);
        assert_eq!(board.vertices().len(), 24);
        assert_eq!(board.graph.edge_count(), board.sides().len());

        // Boundary sides have one owner, interior sides two.
        for side in board.sides() {
            assert!((1..=2).contains(&side.owners().len()), "side with {} owners", side.owners().len());
            assert!(side.limb_of().len() <= 2);
        }

        // Every vertex joins two or three sides.
        for vertex in board.vertices() {
            let degree = board.sides_at(vertex.id).count();
            assert!((2..=3).contains(&degree), "vertex with degree {degree}");
        }

        // Each cell's limb slots hold sides that are not the cell's own.
        for cell in board.cells() {
            for limb in cell.all_limbs() {
                assert!(!cell.sides.contains(&limb));
            }
        }
    }

    #[test]
    fn displays_requirement_rhombus() {
        let board = board_with(3, "...0...");
        assert_eq!(format!("{}", board), " . .\n. 0 .\n . .\n");
    }

    #[test]
    fn toggle_round_trips_to_unset() {
        let mut board = empty_board(3);
        let side = board.cells()[0].side(SideDir::UpLeft);

        assert_eq!(board.toggle_side(side), SideStatus::Active);
        assert_eq!(board.toggle_side(side), SideStatus::Blank);
        assert_eq!(board.toggle_side(side), SideStatus::Unset);
        assert_eq!(board.history().len(), 3);
    }

    #[test]
    fn same_status_is_a_noop() {
        let mut board = empty_board(3);
        let side = board.cells()[0].side(SideDir::Left);

        assert!(!board.apply(GameMove::manual(side, SideStatus::Unset, SideStatus::Unset)));
        assert!(board.history().is_empty());
    }

    #[test]
    fn stale_moves_are_discarded() {
        let mut board = empty_board(3);
        let side = board.cells()[0].side(SideDir::Left);
        board.toggle_side(side);

        // Recorded previous status no longer matches; silently dropped.
        assert!(!board.apply(GameMove::manual(side, SideStatus::Blank, SideStatus::Unset)));
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn undo_restores_previous_status() {
        let mut board = empty_board(3);
        let side = board.cells()[0].side(SideDir::Right);
        board.toggle_side(side);
        board.toggle_side(side);
        assert!(board.side(side).is_blank());

        let undone = board.undo_last().unwrap();
        assert_eq!(undone.side(), side);
        assert!(board.side(side).is_active());
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn links_have_two_endpoints_and_internal_vertices() {
        let mut board = empty_board(3);
        let center = board.cell_at(1, 1).unwrap();
        let ul = board.cell(center).side(SideDir::UpLeft);
        let ur = board.cell(center).side(SideDir::UpRight);
        let top_limb = board.cell(center).limb(VertexDir::Top).unwrap();

        // With the limb blank, the two sides chain through the top vertex.
        board.toggle_side(top_limb);
        board.toggle_side(top_limb);
        assert!(board.side(top_limb).is_blank());

        let link = SideLink::from_side(&board, ul).unwrap();
        assert_eq!(link.len(), 2);
        assert!(link.contains(ur));

        // n member sides touch n + 1 vertices; the two endpoints are touched
        // once and the rest exactly twice.
        let (e1, e2) = link.endpoints();
        assert_ne!(e1, e2);
        let internal = link
            .sides()
            .iter()
            .flat_map(|&s| {
                let ep = board.side(s).endpoints();
                [ep.0, ep.1]
            })
            .filter(|v| *v != e1 && *v != e2)
            .count();
        assert_eq!(internal / 2, link.len() - 1);

        assert!(SideLink::is_same_link(&board, ul, ur));
    }

    #[test]
    fn vertex_predicates() {
        let mut board = empty_board(3);
        let center = board.cell_at(1, 1).unwrap();
        let top = board.cell(center).vertex(VertexDir::Top);
        let ul = board.cell(center).side(SideDir::UpLeft);
        let ur = board.cell(center).side(SideDir::UpRight);
        let limb = board.cell(center).limb(VertexDir::Top).unwrap();

        board.toggle_side(ul);
        assert!(!board.is_intersection(top));
        assert!(!board.is_dead_end(top));

        // One active side, everything else at the vertex blank.
        board.toggle_side(ur);
        board.toggle_side(ur);
        board.toggle_side(limb);
        board.toggle_side(limb);
        assert!(board.is_dead_end(top));
        assert!(!board.is_intersection(top));
    }

    #[test]
    fn anti_pair_and_theoretical_blanks() {
        let mut board = empty_board(3);
        let center = board.cell_at(1, 1).unwrap();
        let top_limb = board.cell(center).limb(VertexDir::Top).unwrap();

        assert!(board.anti_pair(center, VertexDir::Top).is_none());
        board.toggle_side(top_limb);

        let pair = board.anti_pair(center, VertexDir::Top).unwrap();
        let (s1, s2) = pair.sides();
        assert_eq!(s1, board.cell(center).side(SideDir::UpLeft));
        assert_eq!(s2, board.cell(center).side(SideDir::UpRight));

        let (count, member_sets) = board.theoretical_blanks(center);
        assert_eq!(count, 1);
        assert!(member_sets.iter().all(|set| set.len() == 2));
    }

    #[test]
    fn zero_center_cell_blanks_sides_and_limbs_only() {
        let board = board_with(3, "...0...");
        let mut solver = Solver::new(board);

        let applied = solver.solve_all();
        assert_eq!(applied, 12);

        let board = solver.board();
        let center = board.cell_at(1, 1).unwrap();
        for (_, side) in board.cell_sides(center).collect::<Vec<_>>() {
            assert!(board.side(side).is_blank());
        }
        for limb in board.cell(center).all_limbs() {
            assert!(board.side(limb).is_blank());
        }
        // Nothing else was deduced.
        assert_eq!(board.unset_count(), board.sides().len() - 12);
        assert!(board.history().iter().all(|mv| mv.from_solver()));
    }

    #[test]
    fn adjacent_five_and_five() {
        let board = board_with(5, "........55.........");
        let mut solver = Solver::new(board);
        solver.solve_all();

        let board = solver.board();
        let left = board.cell_at(2, 1).unwrap();
        let right = board.cell_at(2, 2).unwrap();

        // Shared boundary is one side seen from both cells.
        let shared = board.cell(left).side(SideDir::Right);
        assert_eq!(shared, board.cell(right).side(SideDir::Left));
        assert!(board.side(shared).is_active());

        // Both opposite caps are active and their limbs dead.
        let (cap1, limbs1) = board.cap(left, SideDir::Left);
        let (cap2, limbs2) = board.cap(right, SideDir::Right);
        for side in cap1.iter().chain(cap2.iter()) {
            assert!(board.side(*side).is_active());
        }
        for limb in limbs1.iter().chain(limbs2.iter()) {
            assert!(board.side(*limb).is_blank());
        }
    }

    #[test]
    fn adjacent_ones_blank_their_boundary() {
        let board = board_with(3, "..11...");
        let mut solver = Solver::new(board);
        solver.solve_all();

        let board = solver.board();
        let left = board.cell_at(1, 0).unwrap();
        let right = board.cell_at(1, 1).unwrap();
        let shared = board.cell(left).side(SideDir::Right);
        assert_eq!(shared, board.cell(right).side(SideDir::Left));
        assert!(board.side(shared).is_blank());
    }

    #[test]
    fn intersection_side_is_removed() {
        let mut board = empty_board(3);
        let center = board.cell_at(1, 1).unwrap();
        let ul = board.cell(center).side(SideDir::UpLeft);
        let ur = board.cell(center).side(SideDir::UpRight);
        let top_limb = board.cell(center).limb(VertexDir::Top).unwrap();
        board.toggle_side(ul);
        board.toggle_side(ur);

        let mut solver = Solver::new(board);
        let mv = solver.step(None).unwrap();
        assert_eq!(mv.side(), top_limb);
        assert_eq!(mv.new_status(), SideStatus::Blank);
        assert_eq!(mv.priority(), MovePriority::Highest);
    }

    #[test]
    fn faction_propagates_from_the_boundary() {
        let board = empty_board(3);
        let mut solver = Solver::new(board);

        let corner = solver.board().cell_at(0, 0).unwrap();
        let outward = solver.board().cell(corner).side(SideDir::UpLeft);
        let toward_neighbor = solver.board().cell(corner).side(SideDir::Right);
        let neighbor = solver.board().cell(corner).neighbor(SideDir::Right).unwrap();

        // An active outward side puts the corner inside the loop; a blank
        // boundary extends the faction to its neighbor.
        solver.toggle_side(outward);
        solver.toggle_side(toward_neighbor);
        solver.toggle_side(toward_neighbor);

        solver.recalculate_factions();
        let board = solver.board();
        assert_eq!(board.cell(corner).faction(), Faction::Inside);
        assert_eq!(board.cell(neighbor).faction(), Faction::Inside);
        assert_eq!(board.cell(board.cell_at(2, 0).unwrap()).faction(), Faction::Unknown);
    }

    #[test]
    fn solver_undo_requeues_the_move() {
        // The 1-and-1 pattern queues exactly one move, so the replay is
        // unambiguous.
        let board = board_with(3, "..11...");
        let mut solver = Solver::new(board);

        let first = solver.step(None).unwrap();
        assert_eq!(solver.board().history().len(), 1);

        let undone = solver.undo_last().unwrap();
        assert_eq!(undone.side(), first.side());
        assert!(solver.board().history().is_empty());
        assert!(solver.board().side(first.side()).is_unset());

        // The replayed move comes back out first.
        let replayed = solver.step(None).unwrap();
        assert_eq!(replayed.side(), first.side());
        assert_eq!(replayed.new_status(), first.new_status());
    }

    #[test]
    fn solve_all_strictly_shrinks_unset_count() {
        // A real puzzle with mixed requirements.
        let board = board_with(5, "...24.2143..53...4.");
        let initial_unset = board.unset_count();

        let mut solver = Solver::new(board);
        let applied = solver.solve_all();

        let board = solver.board();
        assert!(applied > 0);
        assert_eq!(board.history().len(), applied);
        assert_eq!(board.unset_count(), initial_unset - applied);
        assert!(board.history().iter().all(|mv| mv.from_solver()));
    }

    #[test]
    fn reset_restores_pristine_state() {
        let board = board_with(3, "...0...");
        let mut solver = Solver::new(board);
        solver.solve_all();
        assert!(!solver.board().history().is_empty());

        solver.reset();
        let board = solver.board();
        assert!(board.history().is_empty());
        assert_eq!(board.unset_count(), board.sides().len());
        assert!(board.cells().iter().all(|c| c.faction() == Faction::Unknown));
        // The initial inspection queued the zero-cell moves again.
        assert!(!solver.pending_moves().is_empty());
    }

    #[test]
    fn active_colors_stay_in_range() {
        // Cosmetic bookkeeping only: the exact colors are not asserted, just
        // that active sides always carry a usable color index.
        let mut board = BoardBuilder::new(5)
            .cell_data("...24.2143..53...4.")
            .color_seed(7)
            .build()
            .unwrap();
        let sides: Vec<_> = board.cells()[9].sides.to_vec();
        for side in &sides {
            board.toggle_side(*side);
        }

        let mut solver = Solver::new(board);
        solver.solve_all();
        for side in solver.board().sides() {
            if side.is_active() {
                assert!(side.color() < SIDE_COLOR_COUNT);
            }
        }
    }
}
