//! Monte Carlo move selection for 2048.
//!
//! For every candidate move the selector plays `runs` random games to the end,
//! scores each terminal board with [`crate::heuristic::board_score`], and keeps
//! the move with the highest average. Two implementations share the contract:
//! - [`MonteCarlo`]: single-threaded, draws straight from the caller's RNG.
//! - [`MonteCarloParallel`]: rayon-based; draws one seed per playout from the
//!   caller's RNG, so its results depend only on that RNG, not on scheduling.
//!
//! Quick start
//! ```
//! use mc_2048::engine::Move;
//! use mc_2048::game::Game;
//! use mc_2048::montecarlo::{MonteCarlo, MonteCarloParallel};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let game = Game::new(&mut rng);
//!
//! let mut mc = MonteCarlo::new();
//! let m = mc.best_move(&game, 4, &mut rng).unwrap();
//! assert!(Move::ALL.contains(&m));
//!
//! let mut mc_par = MonteCarloParallel::new();
//! assert!(mc_par.best_move(&game, 4, &mut rng).is_ok());
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::{Board, Move};
use crate::error::{Result, SolverError};
use crate::game::GameState;
use crate::heuristic;

mod search_par;
mod search_seq;

pub use search_par::MonteCarloParallel;
pub use search_seq::MonteCarlo;

/// Configurable knobs for the selectors. Defaults reproduce the plain
/// unbounded sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Abort a playout after this many simulated moves (None = run to game over).
    pub max_playout_moves: Option<u64>,
    /// Also evaluate listed moves that leave the current board unchanged.
    pub evaluate_noop_moves: bool,
    /// Worker threads for [`MonteCarloParallel`] (None = rayon's global pool).
    pub threads: Option<usize>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self { max_playout_moves: None, evaluate_noop_moves: false, threads: None }
    }
}

/// Average playout score for one root move.
///
/// - `avg` is the mean heuristic score over `runs` playouts (0.0 when `runs == 0`).
/// - `legal` is false when the move does not change the current board; such
///   moves are only evaluated with [`MonteCarloConfig::evaluate_noop_moves`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub avg: f64,
    pub legal: bool,
}

/// Work done by the last evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub playouts: u64,
    pub simulated_moves: u64,
}

impl SearchStats {
    fn record(&mut self, playout: &Playout) {
        self.playouts += 1;
        self.simulated_moves += playout.moves;
    }
}

/// Outcome of one playout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Playout {
    pub score: f64,
    pub moves: u64,
}

/// Play one random game from `board`, forcing `first_move`, and score its
/// terminal board.
///
/// After the forced move every move is drawn uniformly from `game.move_list()`
/// without checking legality; the engine treats a move that changes nothing as
/// a no-op. With `max_moves: None` a game that never ends blocks forever.
///
/// ```
/// use mc_2048::engine::{Board, Move};
/// use mc_2048::game::Game;
/// use mc_2048::montecarlo::run_playout;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let board = Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
/// let game = Game::from_board(board);
/// let a = run_playout(&game, board, Move::Down, &mut StdRng::seed_from_u64(1), None).unwrap();
/// let b = run_playout(&game, board, Move::Down, &mut StdRng::seed_from_u64(1), None).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn run_playout<G, R>(game: &G, board: Board, first_move: Move, rng: &mut R, max_moves: Option<u64>) -> Result<f64>
where
    G: GameState,
    R: Rng + ?Sized,
{
    playout(game, board, first_move, rng, max_moves).map(|p| p.score)
}

pub(crate) fn playout<G, R>(game: &G, board: Board, first_move: Move, rng: &mut R, max_moves: Option<u64>) -> Result<Playout>
where
    G: GameState,
    R: Rng + ?Sized,
{
    let moves = game.move_list();
    let mut sim = game.spawn(board);
    sim.make_move(first_move, rng);
    let mut count = 1u64;
    while !sim.is_game_over() {
        if let Some(cap) = max_moves {
            if count >= cap {
                warn!(moves = count, start = ?board, "playout hit move cap");
                return Err(SolverError::NonTerminatingSimulation { moves: count });
            }
        }
        let &dir = moves.choose(rng).ok_or(SolverError::EmptyMoveSet)?;
        sim.make_move(dir, rng);
        count += 1;
    }
    Ok(Playout { score: heuristic::board_score(sim.board()), moves: count })
}

/// Root candidates in enumeration order, paired with whether they change the board.
fn root_moves<G: GameState>(game: &G, cfg: &MonteCarloConfig) -> Result<Vec<(Move, bool)>> {
    let candidates: Vec<(Move, bool)> = game
        .move_list()
        .iter()
        .map(|&dir| (dir, game.is_legal(dir)))
        .filter(|&(_, legal)| legal || cfg.evaluate_noop_moves)
        .collect();
    if candidates.is_empty() {
        return Err(SolverError::EmptyMoveSet);
    }
    Ok(candidates)
}

/// Highest average wins; on equal averages the later move wins.
fn pick_best(branches: &[BranchEval]) -> Option<Move> {
    let mut best: Option<BranchEval> = None;
    for branch in branches {
        if best.map_or(true, |b| branch.avg >= b.avg) {
            best = Some(*branch);
        }
    }
    best.map(|b| b.dir)
}

#[inline]
fn mean(sum: f64, runs: u32) -> f64 {
    if runs == 0 { 0.0 } else { sum / runs as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn ties_go_to_the_later_move() {
        let branches = [
            BranchEval { dir: Move::Up, avg: 5.0, legal: true },
            BranchEval { dir: Move::Left, avg: 7.0, legal: true },
            BranchEval { dir: Move::Right, avg: 7.0, legal: true },
            BranchEval { dir: Move::Down, avg: 6.0, legal: true },
        ];
        assert_eq!(pick_best(&branches), Some(Move::Right));
        assert_eq!(pick_best(&[]), None);
    }

    #[test]
    fn negative_averages_still_pick_a_move() {
        let branches = [
            BranchEval { dir: Move::Up, avg: -2.0e6, legal: true },
            BranchEval { dir: Move::Down, avg: -3.0e6, legal: true },
        ];
        assert_eq!(pick_best(&branches), Some(Move::Up));
    }

    #[test]
    fn playout_is_deterministic_under_seed() {
        let mut rng = StdRng::seed_from_u64(77);
        let game = Game::new(&mut rng);
        let board = game.board();
        let dir = board.legal_moves()[0];
        let run = |seed| {
            let mut r = StdRng::seed_from_u64(seed);
            (0..5).map(|_| run_playout(&game, board, dir, &mut r, None).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(run(1), run(1));
    }

    #[test]
    fn playout_reaches_game_over() {
        let mut rng = StdRng::seed_from_u64(8);
        let board = Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let game = Game::from_board(board);
        let p = playout(&game, board, Move::Down, &mut rng, Some(10_000)).unwrap();
        assert!(p.moves > 1 && p.moves < 10_000);
    }

    #[test]
    fn playout_cap_reports_non_termination() {
        let mut rng = StdRng::seed_from_u64(8);
        let board = Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let game = Game::from_board(board);
        let err = run_playout(&game, board, Move::Down, &mut rng, Some(3)).unwrap_err();
        assert!(matches!(err, SolverError::NonTerminatingSimulation { moves: 3 }));
    }

    #[test]
    fn root_moves_filter_noops_unless_asked() {
        let board = Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let game = Game::from_board(board);
        let strict = root_moves(&game, &MonteCarloConfig::default()).unwrap();
        assert_eq!(strict, vec![(Move::Down, true), (Move::Right, true)]);
        let cfg = MonteCarloConfig { evaluate_noop_moves: true, ..Default::default() };
        assert_eq!(root_moves(&game, &cfg).unwrap().len(), 4);
    }

    /// Stock rules, except that Down is never allowed.
    struct NoDown(Game);

    impl GameState for NoDown {
        fn board(&self) -> Board { self.0.board() }
        fn move_list(&self) -> &[Move] { self.0.move_list() }
        fn is_legal(&self, dir: Move) -> bool { dir != Move::Down && self.0.is_legal(dir) }
        fn is_game_over(&self) -> bool { self.0.is_game_over() }
        fn make_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) {
            if dir != Move::Down {
                self.0.make_move(dir, rng)
            }
        }
        fn score(&self) -> u64 { self.0.score() }
        fn spawn(&self, board: Board) -> Self { NoDown(Game::from_board(board)) }
    }

    #[test]
    fn root_moves_follow_game_legality() {
        let board = Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let game = NoDown(Game::from_board(board));
        assert_eq!(root_moves(&game, &MonteCarloConfig::default()).unwrap(), vec![(Move::Right, true)]);
        let cfg = MonteCarloConfig { evaluate_noop_moves: true, ..Default::default() };
        assert!(root_moves(&game, &cfg).unwrap().contains(&(Move::Down, false)));
    }

    #[test]
    fn finished_game_has_no_root_moves() {
        let full = Board::from_grid(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let err = root_moves(&Game::from_board(full), &MonteCarloConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::EmptyMoveSet));
    }
}
