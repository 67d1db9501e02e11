//! mc-2048: a 2048 game engine + Monte Carlo playout policy
//!
//! This crate provides:
//! - A compact `Board` type with ergonomic methods (`shift`, `make_move`, `to_grid`, ...)
//! - The `GameState` seam the policy drives, with a stock `Game` implementation
//! - A positional heuristic for scoring finished boards (`heuristic` module)
//! - Monte Carlo move selection (`montecarlo` module) with single-threaded and parallel variants
//! - A driving loop with fixed or score-dependent playout counts (`solver` module)
//!
//! Quick start:
//! ```
//! use mc_2048::engine::Board;
//! use mc_2048::game::{Game, GameState};
//! use mc_2048::montecarlo::MonteCarlo;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic game with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(&mut rng);
//! let mut policy = MonteCarlo::new();
//!
//! // A few policy moves (keep doctests fast)
//! for _ in 0..3 {
//!     if game.is_game_over() { break; }
//!     let dir = policy.best_move(&game, 2, &mut rng).unwrap();
//!     game.make_move(dir, &mut rng);
//! }
//! assert!(game.board() != Board::EMPTY);
//! ```
//!
//! Every random draw goes through an RNG passed in by the caller, so seeded
//! runs are reproducible.
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod heuristic;
pub mod montecarlo;
pub mod solver;

pub use error::{Result, SolverError};
