use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::engine::Move;
use crate::error::{Result, SolverError};
use crate::game::GameState;

use super::{mean, pick_best, playout, root_moves, BranchEval, MonteCarloConfig, Playout, SearchStats};

/// Parallel Monte Carlo selector using rayon.
///
/// All `runs × moves` playouts are independent. Each gets its own `StdRng`
/// seeded from the caller's RNG before fanning out, and results are summed in
/// playout order, so the outcome for a given seed does not depend on the
/// number of threads.
pub struct MonteCarloParallel {
    cfg: MonteCarloConfig,
    stats: SearchStats,
    pool: Option<ThreadPool>,
}

impl MonteCarloParallel {
    pub fn new() -> Self {
        crate::engine::new();
        Self { cfg: MonteCarloConfig::default(), stats: SearchStats::default(), pool: None }
    }

    /// Build with `cfg`; `cfg.threads` gets a dedicated pool.
    pub fn with_config(cfg: MonteCarloConfig) -> Result<Self> {
        crate::engine::new();
        let pool = match cfg.threads {
            Some(0) => return Err(SolverError::Config("threads must be at least 1".into())),
            Some(n) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SolverError::Config(format!("failed to build thread pool: {e}")))?,
            ),
            None => None,
        };
        Ok(Self { cfg, stats: SearchStats::default(), pool })
    }

    /// Pick the move with the best average playout score, computed in parallel.
    ///
    /// Same contract as [`super::MonteCarlo::best_move`].
    pub fn best_move<G, R>(&mut self, game: &G, runs: u32, rng: &mut R) -> Result<Move>
    where
        G: GameState + Sync,
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
        G: GameState + Sync,
        R: Rng + ?Sized,
    {
        let board = game.board();
        self.stats = SearchStats::default();
        let candidates = root_moves(game, &self.cfg)?;
        let jobs: Vec<(usize, Move, u64)> = candidates
            .iter()
            .enumerate()
            .flat_map(|(i, &(dir, _))| (0..runs).map(move |_| (i, dir)))
            .map(|(i, dir)| (i, dir, rng.gen::<u64>()))
            .collect();

        let max_moves = self.cfg.max_playout_moves;
        let run_jobs = || -> Vec<Result<(usize, Playout)>> {
            jobs.par_iter()
                .map(|&(i, dir, seed)| {
                    let mut job_rng = StdRng::seed_from_u64(seed);
                    playout(game, board, dir, &mut job_rng, max_moves).map(|p| (i, p))
                })
                .collect()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run_jobs),
            None => run_jobs(),
        };

        let mut sums = vec![0.0f64; candidates.len()];
        for result in results {
            let (i, p) = result?;
            self.stats.record(&p);
            sums[i] += p.score;
        }
        Ok(candidates
            .into_iter()
            .zip(sums)
            .map(|((dir, legal), sum)| BranchEval { dir, avg: mean(sum, runs), legal })
            .collect())
    }

    /// Statistics collected from the last call to [`Self::best_move`] or
    /// [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn config(&self) -> &MonteCarloConfig { &self.cfg }
}

impl Default for MonteCarloParallel { fn default() -> Self { Self::new() } }
