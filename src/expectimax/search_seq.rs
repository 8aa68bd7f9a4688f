use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::engine::{Board, Move};

use super::heuristic::evaluate;
use super::{depth_budget, pick_best, warm_engine_and_heuristics, BranchEval, SearchConfig, SearchStats};

enum Node {
    Max,
    Chance,
}

/// Single-threaded expectimax policy.
///
/// The RNG is injected so chance-node sampling is reproducible: two policies
/// built from the same seed pick the same move for the same board.
///
/// ```
/// use snake2048::engine::{self, Board};
/// use snake2048::expectimax::Expectimax;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// engine::new();
/// let mut rng = StdRng::seed_from_u64(1);
/// let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
/// let mut a = Expectimax::from_seed(9);
/// let mut b = Expectimax::from_seed(9);
/// assert_eq!(a.best_move(board), b.best_move(board));
/// ```
pub struct Expectimax<R: Rng = StdRng> {
    cfg: SearchConfig,
    rng: R,
    stats: SearchStats,
}

impl Expectimax<StdRng> {
    /// Policy with default knobs and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic policy for tests and reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Expectimax<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Expectimax<R> {
    pub fn with_rng(rng: R) -> Self {
        Self::with_config(SearchConfig::default(), rng)
    }

    pub fn with_config(cfg: SearchConfig, rng: R) -> Self {
        warm_engine_and_heuristics();
        Self { cfg, rng, stats: SearchStats::default() }
    }

    /// Pick the direction with the greatest expected board quality, or `None`
    /// when no direction changes the board (game over).
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        pick_best(&self.branch_evals(board))
    }

    /// Expected value per direction in fixed `[Up, Down, Left, Right]` order.
    ///
    /// No-op directions are pre-filtered (`legal = false`) and never searched.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = self.compute_depth(board);
        let mut nodes = 0u64;
        let out = Move::ALL.map(|dir| {
            let shifted = board.shift(dir);
            if shifted == board {
                BranchEval { dir, ev: 0.0, legal: false }
            } else {
                let ev = self.expectimax(shifted, Node::Chance, depth - 1, &mut nodes);
                BranchEval { dir, ev, legal: true }
            }
        });
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        out
    }

    /// Chance-ply entry for a post-move board; used by the parallel root.
    pub(crate) fn chance_value(&mut self, board: Board, depth: u32) -> (f64, u64) {
        let mut nodes = 0u64;
        let score = self.expectimax(board, Node::Chance, depth, &mut nodes);
        (score, nodes)
    }

    /// Counters from the most recent `best_move`/`branch_evals` call.
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    #[inline]
    fn compute_depth(&self, board: Board) -> u32 {
        let depth = depth_budget(board.count_empty());
        match self.cfg.depth_cap {
            Some(cap) => depth.min(cap),
            None => depth,
        }
    }

    fn expectimax(&mut self, board: Board, node: Node, depth: u32, nodes: &mut u64) -> f64 {
        *nodes += 1;
        if depth == 0 {
            return evaluate(board);
        }
        match node {
            Node::Max => self.evaluate_max(board, depth, nodes),
            Node::Chance => self.evaluate_chance(board, depth, nodes),
        }
    }

    fn evaluate_max(&mut self, board: Board, depth: u32, nodes: &mut u64) -> f64 {
        let mut best: Option<f64> = None;
        for dir in Move::ALL {
            let shifted = board.shift(dir);
            if shifted != board {
                let score = self.expectimax(shifted, Node::Chance, depth - 1, nodes);
                best = Some(match best {
                    Some(b) => b.max(score),
                    None => score,
                });
            }
        }
        // A stuck board is the loss condition; score it as-is.
        best.unwrap_or_else(|| evaluate(board))
    }

    fn evaluate_chance(&mut self, board: Board, depth: u32, nodes: &mut u64) -> f64 {
        let slots = empty_slots(board);
        if slots.is_empty() {
            return evaluate(board);
        }
        let total_empty = slots.len();
        let sampled: Vec<u32> = if total_empty > self.cfg.sample_cap {
            slots
                .choose_multiple(&mut self.rng, self.cfg.sample_cap)
                .copied()
                .collect()
        } else {
            slots
        };
        // The 4-spawn branch only matters close to the horizon or on crowded
        // boards; elsewhere it is folded into the 2-spawn score.
        let expand_four = depth <= 2 || total_empty <= 4;
        let mut acc = 0.0;
        for &slot in &sampled {
            let with_two = Board::from_raw(board.raw() | (1u64 << slot));
            let score2 = self.expectimax(with_two, Node::Max, depth - 1, nodes);
            let score4 = if expand_four {
                let with_four = Board::from_raw(board.raw() | (2u64 << slot));
                self.expectimax(with_four, Node::Max, depth - 1, nodes)
            } else {
                score2
            };
            acc += 0.9 * score2 + 0.1 * score4;
        }
        acc / sampled.len() as f64
    }
}

/// Bit offsets of the empty nibbles, lowest first.
fn empty_slots(board: Board) -> Vec<u32> {
    let mut slots = Vec::with_capacity(16);
    let raw = board.raw();
    for idx in 0..16 {
        if (raw >> (4 * idx)) & 0xf == 0 {
            slots.push(4 * idx);
        }
    }
    slots
}
