//! Per-tile movement provenance for a move, as a presentation layer needs it
//! to animate slides and merges.
//!
//! This is a scalar re-statement of the engine's compaction algorithm over an
//! unpacked grid. The AI path never calls it; the resulting board must always
//! agree with [`Board::shift`] (tested below).

use crate::engine::{Board, Grid, Move};

/// One tile transition produced by a move, in processing order: rows top to
/// bottom (or columns left to right), cells scanned from the side moved
/// toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileMove {
    /// Source cell as (row, col).
    pub from: (usize, usize),
    /// Destination cell as (row, col).
    pub to: (usize, usize),
    /// True if the tile merged into the destination (doubling it).
    pub merge: bool,
}

/// Slide/merge in `dir`, reporting every tile movement and merge.
///
/// The move changed the board iff the returned vec is non-empty.
pub fn shift_with_moves(board: Board, dir: Move) -> (Board, Vec<TileMove>) {
    let grid = board.to_grid();
    let mut out: Grid = [[0; 4]; 4];
    let mut merged = [[false; 4]; 4];
    let mut moves = Vec::new();

    for line in 0..4 {
        let mut placed = 0usize;
        for step in 0..4 {
            let src = cell_at(dir, line, step);
            let val = grid[src.0][src.1];
            if val == 0 {
                continue;
            }
            if placed > 0 {
                let back = cell_at(dir, line, placed - 1);
                if out[back.0][back.1] == val && !merged[back.0][back.1] {
                    // Tile 32768 is the packed representation's ceiling.
                    out[back.0][back.1] = (val * 2).min(32768);
                    merged[back.0][back.1] = true;
                    moves.push(TileMove { from: src, to: back, merge: true });
                    continue;
                }
            }
            let dst = cell_at(dir, line, placed);
            out[dst.0][dst.1] = val;
            if dst != src {
                moves.push(TileMove { from: src, to: dst, merge: false });
            }
            placed += 1;
        }
    }

    (Board::from_grid(out), moves)
}

/// Map a (line, step) pair to a grid cell; step 0 is the side moved toward.
fn cell_at(dir: Move, line: usize, step: usize) -> (usize, usize) {
    match dir {
        Move::Left => (line, step),
        Move::Right => (line, 3 - step),
        Move::Up => (step, line),
        Move::Down => (3 - step, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn simple_merge_left() {
        engine::new();
        let b = Board::from_grid([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let (after, moves) = shift_with_moves(b, Move::Left);
        assert_eq!(after, Board::from_grid([[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(
            moves,
            vec![TileMove { from: (0, 1), to: (0, 0), merge: true }]
        );
    }

    #[test]
    fn processing_order_and_merge_flags() {
        engine::new();
        let b = Board::from_grid([[2, 2, 4, 4], [0; 4], [0; 4], [0; 4]]);
        let (after, moves) = shift_with_moves(b, Move::Left);
        assert_eq!(after, Board::from_grid([[4, 8, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(
            moves,
            vec![
                TileMove { from: (0, 1), to: (0, 0), merge: true },
                TileMove { from: (0, 2), to: (0, 1), merge: false },
                TileMove { from: (0, 3), to: (0, 1), merge: true },
            ]
        );
    }

    #[test]
    fn vertical_provenance() {
        engine::new();
        let b = Board::from_grid([
            [2, 0, 0, 0],
            [0, 0, 0, 0],
            [2, 0, 0, 0],
            [4, 0, 0, 0],
        ]);
        let (after, moves) = shift_with_moves(b, Move::Down);
        assert_eq!(
            after,
            Board::from_grid([[0; 4], [0; 4], [4, 0, 0, 0], [4, 0, 0, 0]])
        );
        // Bottom two tiles already sit in their slots; only the top 2 moves,
        // merging into the 2 at row 2.
        assert_eq!(
            moves,
            vec![TileMove { from: (0, 0), to: (2, 0), merge: true }]
        );
    }

    #[test]
    fn no_op_produces_no_moves() {
        engine::new();
        let b = Board::from_grid([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let (after, moves) = shift_with_moves(b, Move::Left);
        assert_eq!(after, b);
        assert!(moves.is_empty());
    }

    #[test]
    fn agrees_with_table_shift() {
        engine::new();
        let mut rng = StdRng::seed_from_u64(4242);
        let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
        for i in 0..200 {
            let dir = Move::ALL[i % 4];
            let (scalar, moves) = shift_with_moves(b, dir);
            let (table, moved) = engine::simulate(b, dir);
            assert_eq!(scalar, table);
            assert_eq!(!moves.is_empty(), moved);
            b = b.make_move(dir, &mut rng);
            if b.is_game_over() {
                b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
            }
        }
    }
}
