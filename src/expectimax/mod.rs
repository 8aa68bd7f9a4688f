//! Expectimax move selection for 2048.
//!
//! Two policy implementations share one decision procedure:
//! - [`Expectimax`]: single-threaded search.
//! - [`ExpectimaxParallel`]: the four root direction searches run on rayon.
//!
//! The search alternates a maximizing ply (the player picks the best legal
//! direction) with a chance ply (the environment drops a 2 or 4 into an empty
//! cell at 90%/10%), bottoming out at the heuristic when the depth budget is
//! spent or the board is stuck. Chance nodes with more than
//! [`SearchConfig::sample_cap`] empty cells sample that many uniformly from
//! the policy's injected RNG, so a fixed seed fixes the whole search.
//!
//! Quick start
//! ```
//! use snake2048::engine::{self, Board};
//! use snake2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! engine::new();
//! let mut policy = Expectimax::from_seed(42);
//! let mut rng = StdRng::seed_from_u64(7);
//! let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! assert!(policy.best_move(board).is_some());
//! ```

use crate::engine::Move;

mod heuristic;
mod search_par;
mod search_seq;

pub use heuristic::evaluate;
pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Knobs for the search. Defaults match the tuned live policy.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Most empty cells a chance node will expand; beyond this, cells are
    /// sampled uniformly without replacement.
    pub sample_cap: usize,
    /// Optional hard cap on the adaptive depth budget (None = uncapped).
    pub depth_cap: Option<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { sample_cap: 6, depth_cap: None }
    }
}

/// Per-direction expected value at the root.
///
/// `legal` is false when the direction is a no-op for the current board, in
/// which case `ev` is meaningless.
#[derive(Debug, Clone, Copy)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Node counters from the most recent search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// Depth budget from the count of empty cells: search deeper as the board
/// fills and the risk of losing dominates the branching cost.
pub(crate) fn depth_budget(empties: u32) -> u32 {
    if empties >= 8 {
        3
    } else if empties >= 6 {
        4
    } else if empties >= 2 {
        5
    } else {
        7
    }
}

/// Arg-max over legal branches in fixed Up/Down/Left/Right order; only a
/// strictly greater score displaces the incumbent, so the first direction
/// wins ties.
pub(crate) fn pick_best(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<(Move, f64)> = None;
    for branch in branches {
        if !branch.legal {
            continue;
        }
        match best {
            Some((_, score)) if branch.ev <= score => {}
            _ => best = Some((branch.dir, branch.ev)),
        }
    }
    best.map(|(dir, _)| dir)
}

/// Ensure engine and heuristic tables exist before a search starts.
fn warm_engine_and_heuristics() {
    crate::engine::new();
    heuristic::warm();
}
