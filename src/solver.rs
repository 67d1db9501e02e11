//! The driving loop: pick a move, apply it, render, until the game ends.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SolverConfig;
use crate::engine::{Board, Move};
use crate::error::{Result, SolverError};
use crate::game::{Game, GameState};
use crate::montecarlo::{MonteCarlo, MonteCarloParallel, SearchStats};

/// How many playouts per move to spend on each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RunsRepr", into = "RunsRepr")]
pub enum RunPolicy {
    /// The same count every turn. 0 means "play a random move".
    Fixed(u32),
    /// `floor(1 + 0.01 * score)`: spend more as the game gets further.
    Dynamic,
}

impl RunPolicy {
    pub fn runs_for(self, score: u64) -> u32 {
        match self {
            RunPolicy::Fixed(n) => n,
            RunPolicy::Dynamic => u32::try_from(1 + score / 100).unwrap_or(u32::MAX),
        }
    }
}

impl Default for RunPolicy {
    fn default() -> Self { RunPolicy::Fixed(100) }
}

impl FromStr for RunPolicy {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("dynamic") {
            return Ok(RunPolicy::Dynamic);
        }
        s.parse::<u32>()
            .map(RunPolicy::Fixed)
            .map_err(|_| SolverError::Config(format!("runs must be a count or \"dynamic\", got {s:?}")))
    }
}

impl fmt::Display for RunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPolicy::Fixed(n) => write!(f, "{n}"),
            RunPolicy::Dynamic => f.write_str("dynamic"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RunsRepr {
    Count(u32),
    Name(String),
}

impl TryFrom<RunsRepr> for RunPolicy {
    type Error = SolverError;

    fn try_from(repr: RunsRepr) -> Result<Self> {
        match repr {
            RunsRepr::Count(n) => Ok(RunPolicy::Fixed(n)),
            RunsRepr::Name(s) => s.parse(),
        }
    }
}

impl From<RunPolicy> for RunsRepr {
    fn from(policy: RunPolicy) -> Self {
        match policy {
            RunPolicy::Fixed(n) => RunsRepr::Count(n),
            RunPolicy::Dynamic => RunsRepr::Name("dynamic".into()),
        }
    }
}

/// Receives the game after every applied move.
pub trait RenderSink {
    fn render(&mut self, board: Board, score: u64, turn: u64) -> Result<()>;
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _board: Board, _score: u64, _turn: u64) -> Result<()> { Ok(()) }
}

/// Writes the board as text after every move.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self { Self { out } }

    pub fn into_inner(self) -> W { self.out }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn render(&mut self, board: Board, score: u64, turn: u64) -> Result<()> {
        writeln!(self.out, "{board}turn: {turn}  score: {score}\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Final state of a solved game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSummary {
    pub board: Board,
    pub score: u64,
    pub turns: u64,
    pub highest_tile: u64,
    pub playouts: u64,
}

enum Selector {
    Sequential(MonteCarlo),
    Parallel(MonteCarloParallel),
}

impl Selector {
    fn from_config(cfg: &SolverConfig) -> Result<Self> {
        Ok(if cfg.parallel {
            Selector::Parallel(MonteCarloParallel::with_config(cfg.montecarlo)?)
        } else {
            Selector::Sequential(MonteCarlo::with_config(cfg.montecarlo))
        })
    }

    fn best_move<G, R>(&mut self, game: &G, runs: u32, rng: &mut R) -> Result<(Move, SearchStats)>
    where
        G: GameState + Sync,
        R: Rng + ?Sized,
    {
        match self {
            Selector::Sequential(mc) => Ok((mc.best_move(game, runs, rng)?, mc.last_stats())),
            Selector::Parallel(mc) => Ok((mc.best_move(game, runs, rng)?, mc.last_stats())),
        }
    }
}

/// Play a fresh game to the end with the configured selector and run policy.
///
/// ```
/// use mc_2048::config::SolverConfig;
/// use mc_2048::solver::{solve_game, NullSink, RunPolicy};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let cfg = SolverConfig { runs: RunPolicy::Fixed(0), max_turns: Some(20), ..Default::default() };
/// let summary = solve_game(&cfg, &mut StdRng::seed_from_u64(1), &mut NullSink).unwrap();
/// assert!(summary.turns <= 20);
/// ```
pub fn solve_game<R, S>(cfg: &SolverConfig, rng: &mut R, sink: &mut S) -> Result<SolveSummary>
where
    R: Rng + ?Sized,
    S: RenderSink + ?Sized,
{
    let game = Game::new(rng);
    play_game(game, cfg, rng, sink)
}

/// Drive `game` until it is over (or `cfg.max_turns` is reached).
pub fn play_game<G, R, S>(mut game: G, cfg: &SolverConfig, rng: &mut R, sink: &mut S) -> Result<SolveSummary>
where
    G: GameState + Sync,
    R: Rng + ?Sized,
    S: RenderSink + ?Sized,
{
    let mut selector = Selector::from_config(cfg)?;
    let mut turns = 0u64;
    let mut playouts = 0u64;
    while !game.is_game_over() {
        if cfg.max_turns.is_some_and(|cap| turns >= cap) {
            break;
        }
        let runs = cfg.runs.runs_for(game.score());
        let dir = if runs > 0 {
            let (dir, stats) = selector.best_move(&game, runs, rng)?;
            playouts += stats.playouts;
            dir
        } else {
            *game.move_list().choose(rng).ok_or(SolverError::EmptyMoveSet)?
        };
        game.make_move(dir, rng);
        turns += 1;
        debug!(turn = turns, %dir, runs, score = game.score(), "applied move");
        sink.render(game.board(), game.score(), turns)?;
    }
    let board = game.board();
    let summary = SolveSummary { board, score: game.score(), turns, highest_tile: board.highest_tile(), playouts };
    info!(
        turns = summary.turns,
        score = summary.score,
        highest_tile = summary.highest_tile,
        playouts = summary.playouts,
        "game finished"
    );
    Ok(summary)
}
