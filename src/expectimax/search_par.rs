use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::engine::{Board, Move};

use super::{pick_best, warm_engine_and_heuristics, BranchEval, Expectimax, SearchConfig, SearchStats};

/// Expectimax with the four root direction searches run in parallel.
///
/// Only the root fans out; each branch runs the sequential search on its own
/// rayon worker. Branches draw from independent RNGs seeded off the policy
/// RNG, so a fixed seed still fixes every chance-node sample — the parallel
/// and sequential policies are interchangeable, not bit-identical, since the
/// per-branch RNG streams differ.
pub struct ExpectimaxParallel {
    cfg: SearchConfig,
    rng: StdRng,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default(), StdRng::from_entropy())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::with_config(SearchConfig::default(), StdRng::seed_from_u64(seed))
    }

    pub fn with_config(cfg: SearchConfig, rng: StdRng) -> Self {
        warm_engine_and_heuristics();
        Self { cfg, rng, stats: SearchStats::default() }
    }

    /// Pick the direction with the greatest expected board quality, or `None`
    /// when no direction changes the board.
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        pick_best(&self.branch_evals(board))
    }

    /// Expected value per direction in fixed `[Up, Down, Left, Right]` order,
    /// searched concurrently.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = {
            let budget = super::depth_budget(board.count_empty());
            match self.cfg.depth_cap {
                Some(cap) => budget.min(cap),
                None => budget,
            }
        };
        let seeds: [u64; 4] = std::array::from_fn(|_| self.rng.gen());
        let cfg = self.cfg;

        let evals: Vec<(BranchEval, u64)> = Move::ALL
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(&dir, &seed)| {
                let shifted = board.shift(dir);
                if shifted == board {
                    (BranchEval { dir, ev: 0.0, legal: false }, 0)
                } else {
                    let mut worker =
                        Expectimax::with_config(cfg, StdRng::seed_from_u64(seed));
                    let (ev, nodes) = worker.chance_value(shifted, depth - 1);
                    (BranchEval { dir, ev, legal: true }, nodes)
                }
            })
            .collect();

        let mut out = [BranchEval { dir: Move::Up, ev: 0.0, legal: false }; 4];
        let mut nodes = 0u64;
        for (i, (branch, branch_nodes)) in evals.into_iter().enumerate() {
            out[i] = branch;
            nodes += branch_nodes;
        }
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        out
    }

    /// Counters from the most recent `best_move`/`branch_evals` call.
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }
}

impl Default for ExpectimaxParallel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{self, simulate, Grid};

    #[test]
    fn none_iff_stuck() {
        engine::new();
        let stuck: Grid = [
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ];
        assert_eq!(ExpectimaxParallel::from_seed(1).best_move(Board::from_grid(stuck)), None);
    }

    #[test]
    fn agrees_with_sequential_on_forced_position() {
        engine::new();
        // Columns 1-3 are full with no adjacent equals and rows are packed
        // right, so Left is the only direction that changes the board. Both
        // policies must return it regardless of sampling.
        let board = Board::from_grid([
            [0, 2, 4, 2],
            [0, 4, 2, 4],
            [0, 2, 4, 2],
            [0, 4, 2, 4],
        ]);
        let legal: Vec<Move> = Move::ALL
            .iter()
            .copied()
            .filter(|&d| simulate(board, d).1)
            .collect();
        assert_eq!(legal, vec![Move::Left]);
        assert_eq!(
            ExpectimaxParallel::from_seed(2).best_move(board),
            Expectimax::from_seed(2).best_move(board)
        );
    }

    #[test]
    fn chosen_move_is_always_legal() {
        engine::new();
        let mut rng = StdRng::seed_from_u64(21);
        let mut policy = ExpectimaxParallel::from_seed(21);
        let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
        for _ in 0..60 {
            match policy.best_move(board) {
                Some(dir) => {
                    let (next, moved) = simulate(board, dir);
                    assert!(moved);
                    board = next.with_random_tile(&mut rng);
                }
                None => {
                    assert!(board.is_game_over());
                    break;
                }
            }
        }
    }
}
