//! snake2048: a 2048 game engine + snake-heuristic Expectimax policy
//!
//! This crate provides:
//! - A compact `Board` type with ergonomic methods (`shift`, `make_move`,
//!   `with_random_tile`, ...) over a packed `u64` representation
//! - A depth-adaptive Expectimax policy (`expectimax` module) with
//!   single-threaded and root-parallel variants
//! - Per-tile move provenance (`transitions` module) for presentation layers
//!   that animate slides and merges
//!
//! Quick start:
//! ```
//! use snake2048::engine::{self, Board, Move};
//! use snake2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // One-time table init
//! engine::new();
//!
//! // Deterministic setup with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let mut policy = Expectimax::from_seed(42);
//!
//! // Play until no direction changes the board
//! let mut moves = 0u32;
//! while let Some(dir) = policy.best_move(board) {
//!     board = board.make_move(dir, &mut rng);
//!     moves += 1;
//!     if moves >= 4 { break; } // keep doctests fast
//! }
//! assert!(moves > 0);
//! ```
pub mod engine;
pub mod expectimax;
pub mod transitions;
