use rand::Rng;
use tracing::debug;

use crate::engine::Move;
use crate::error::{Result, SolverError};
use crate::game::GameState;

use super::{mean, pick_best, playout, root_moves, BranchEval, MonteCarloConfig, SearchStats};

/// Single-threaded Monte Carlo selector.
///
/// Playouts run one after another and draw directly from the caller's RNG.
pub struct MonteCarlo {
    cfg: MonteCarloConfig,
    stats: SearchStats,
}

impl MonteCarlo {
    pub fn new() -> Self { Self::with_config(MonteCarloConfig::default()) }

    pub fn with_config(cfg: MonteCarloConfig) -> Self {
        crate::engine::new();
        Self { cfg, stats: SearchStats::default() }
    }

    /// Pick the move with the best average playout score.
    ///
    /// With `runs == 0` no playouts are made and every average is 0.0, so the
    /// last candidate is returned.
    ///
    /// ```
    /// use mc_2048::engine::{Board, Move};
    /// use mc_2048::game::Game;
    /// use mc_2048::montecarlo::MonteCarlo;
    /// use rand::{SeedableRng, rngs::StdRng};
    ///
    /// let game = Game::from_board(Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
    /// let mut mc = MonteCarlo::new();
    /// let m = mc.best_move(&game, 1, &mut StdRng::seed_from_u64(7)).unwrap();
    /// assert!(m == Move::Down || m == Move::Right);
    /// ```
    pub fn best_move<G, R>(&mut self, game: &G, runs: u32, rng: &mut R) -> Result<Move>
    where
        G: GameState,
        R: Rng + ?Sized,
    {
        let branches = self.branch_evals(game, runs, rng)?;
        let best = pick_best(&branches).ok_or(SolverError::EmptyMoveSet)?;
        debug!(?best, runs, playouts = self.stats.playouts, "selected move");
        Ok(best)
    }

    /// Average playout score for every candidate move, in move-list order.
    pub fn branch_evals<G, R>(&mut self, game: &G, runs: u32, rng: &mut R) -> Result<Vec<BranchEval>>
    where
        G: GameState,
        R: Rng + ?Sized,
    {
        let board = game.board();
        self.stats = SearchStats::default();
        let mut out = Vec::with_capacity(game.move_list().len());
        for (dir, legal) in root_moves(game, &self.cfg)? {
            let mut sum = 0.0;
            for _ in 0..runs {
                let result = playout(game, board, dir, rng, self.cfg.max_playout_moves)?;
                self.stats.record(&result);
                sum += result.score;
            }
            out.push(BranchEval { dir, avg: mean(sum, runs), legal });
        }
        Ok(out)
    }

    /// Statistics collected from the last call to [`Self::best_move`] or
    /// [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn config(&self) -> &MonteCarloConfig { &self.cfg }
}

impl Default for MonteCarlo { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Board;
    use crate::game::Game;
    use rand::{rngs::StdRng, SeedableRng};

    /// A game that only ever offers one move and ends once that move is stuck.
    struct OneWay(Game);

    impl GameState for OneWay {
        fn board(&self) -> Board { self.0.board() }
        fn move_list(&self) -> &[Move] { &[Move::Left] }
        fn is_game_over(&self) -> bool {
            let b = self.0.board();
            b.shift(Move::Left) == b
        }
        fn make_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) { self.0.make_move(dir, rng) }
        fn score(&self) -> u64 { self.0.score() }
        fn spawn(&self, board: Board) -> Self { OneWay(Game::from_board(board)) }
    }

    fn lone_two() -> Board {
        Board::from_grid(&[[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]])
    }

    #[test]
    fn single_move_is_returned_for_any_run_count() {
        let game = OneWay(Game::from_board(lone_two()));
        let mut mc = MonteCarlo::with_config(MonteCarloConfig { max_playout_moves: Some(10_000), ..Default::default() });
        let mut rng = StdRng::seed_from_u64(3);
        for runs in [0, 1, 3] {
            assert_eq!(mc.best_move(&game, runs, &mut rng).unwrap(), Move::Left);
        }
    }

    #[test]
    fn zero_runs_skip_playouts() {
        let game = Game::from_board(lone_two());
        let mut mc = MonteCarlo::new();
        let mut rng = StdRng::seed_from_u64(3);
        let branches = mc.branch_evals(&game, 0, &mut rng).unwrap();
        assert!(branches.iter().all(|b| b.avg == 0.0));
        assert_eq!(mc.last_stats(), SearchStats::default());
        // all tied, so the last legal move wins
        assert_eq!(mc.best_move(&game, 0, &mut rng).unwrap(), Move::Left);
    }

    #[test]
    fn lone_tile_terminates_and_picks_listed_move() {
        let game = Game::from_board(Board::from_grid(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        let mut mc = MonteCarlo::with_config(MonteCarloConfig { max_playout_moves: Some(10_000), ..Default::default() });
        let mut rng = StdRng::seed_from_u64(2024);
        let m = mc.best_move(&game, 1, &mut rng).unwrap();
        assert!(game.move_list().contains(&m));
        assert_eq!(mc.last_stats().playouts, 2);
        assert!(mc.last_stats().simulated_moves >= 2);
    }

    #[test]
    fn branch_evals_follow_move_list_order() {
        let mut rng = StdRng::seed_from_u64(10);
        let game = Game::new(&mut rng);
        let mut mc = MonteCarlo::with_config(MonteCarloConfig { evaluate_noop_moves: true, ..Default::default() });
        let branches = mc.branch_evals(&game, 2, &mut rng).unwrap();
        let dirs: Vec<Move> = branches.iter().map(|b| b.dir).collect();
        assert_eq!(dirs, Move::ALL.to_vec());
        assert_eq!(mc.last_stats().playouts, 8);
    }

    #[test]
    fn empty_move_list_is_an_error() {
        let full = Board::from_grid(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut mc = MonteCarlo::new();
        let err = mc.best_move(&Game::from_board(full), 5, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, SolverError::EmptyMoveSet));
    }

    #[test]
    fn failed_call_resets_stats() {
        let mut mc = MonteCarlo::new();
        let mut rng = StdRng::seed_from_u64(6);
        mc.best_move(&Game::from_board(lone_two()), 2, &mut rng).unwrap();
        assert_eq!(mc.last_stats().playouts, 4);
        let full = Board::from_grid(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(mc.best_move(&Game::from_board(full), 2, &mut rng).is_err());
        assert_eq!(mc.last_stats(), SearchStats::default());
    }

    #[test]
    fn capped_playout_counts_only_finished_playouts() {
        let cfg = MonteCarloConfig { max_playout_moves: Some(2), ..Default::default() };
        let mut mc = MonteCarlo::with_config(cfg);
        let mut rng = StdRng::seed_from_u64(6);
        let err = mc.best_move(&Game::from_board(lone_two()), 2, &mut rng).unwrap_err();
        assert!(matches!(err, SolverError::NonTerminatingSimulation { moves: 2 }));
        // the first playout never finished
        assert_eq!(mc.last_stats(), SearchStats::default());
    }

    #[test]
    fn same_seed_same_choice() {
        let mut setup = StdRng::seed_from_u64(99);
        let mut game = Game::new(&mut setup);
        for dir in [Move::Left, Move::Up, Move::Left, Move::Up] {
            game.make_move(dir, &mut setup);
        }
        let mut mc = MonteCarlo::new();
        let a = mc.branch_evals(&game, 3, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = mc.branch_evals(&game, 3, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }
}
