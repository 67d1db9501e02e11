use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use mc_2048::config::SolverConfig;
use mc_2048::engine::{self as GameEngine, Board};
use mc_2048::solver::{self, NullSink, RenderSink, RunPolicy, TextSink};

#[derive(Debug, Parser)]
#[command(name = "mc-2048", about = "Play 2048 with a Monte Carlo playout policy")]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playouts per move: a count, 0 for random play, or "dynamic"
    #[arg(long)]
    runs: Option<RunPolicy>,

    /// Run playouts on a rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Run playouts on the calling thread, even if the config file enables --parallel
    #[arg(long, conflicts_with = "parallel")]
    no_parallel: bool,

    /// Worker threads for --parallel (default: rayon's global pool)
    #[arg(long)]
    threads: Option<usize>,

    /// Seed for a reproducible game
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many moves
    #[arg(long)]
    max_turns: Option<u64>,

    /// Abort any playout longer than this many simulated moves
    #[arg(long)]
    max_playout_moves: Option<u64>,

    /// Print the board after every move
    #[arg(long)]
    render: bool,

    /// Suppress the status line
    #[arg(long)]
    quiet: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<SolverConfig> {
        let mut cfg = SolverConfig::load(self.config.as_deref())
            .with_context(|| format!("loading config {:?}", self.config))?;
        if let Some(runs) = self.runs { cfg.runs = runs; }
        if self.parallel { cfg.parallel = true; }
        if self.no_parallel { cfg.parallel = false; }
        if let Some(threads) = self.threads { cfg.montecarlo.threads = Some(threads); }
        if let Some(seed) = self.seed { cfg.seed = Some(seed); }
        if let Some(max_turns) = self.max_turns { cfg.max_turns = Some(max_turns); }
        if let Some(cap) = self.max_playout_moves { cfg.montecarlo.max_playout_moves = Some(cap); }
        if let Some(level) = self.log_level { cfg.log_level = level; }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

/// Spinner status line: moves, moves/sec and score.
struct StatusSink {
    pb: ProgressBar,
    start: Instant,
}

impl StatusSink {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { pb, start: Instant::now() })
    }
}

impl RenderSink for StatusSink {
    fn render(&mut self, _board: Board, score: u64, turn: u64) -> mc_2048::Result<()> {
        let rate = turn as f64 / self.start.elapsed().as_secs_f64().max(1e-6);
        self.pb.set_message(format!("{} | moves/sec: {:.1} | score: {}", turn, rate, score));
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let render = args.render;
    let quiet = args.quiet;
    let cfg = args.into_config()?;
    init_tracing(&cfg.log_level)?;
    GameEngine::new();

    let seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, runs = %cfg.runs, parallel = cfg.parallel, "starting game");
    let mut rng = StdRng::seed_from_u64(seed);

    let start = Instant::now();
    let summary = if render {
        let mut sink = TextSink::new(io::stdout().lock());
        solver::solve_game(&cfg, &mut rng, &mut sink)?
    } else if quiet {
        solver::solve_game(&cfg, &mut rng, &mut NullSink)?
    } else {
        let mut sink = StatusSink::new()?;
        let summary = solver::solve_game(&cfg, &mut rng, &mut sink);
        sink.pb.finish_and_clear();
        summary?
    };

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    println!("{}", summary.board);
    println!(
        "Moves: {} | moves/sec: {:.1} | score: {} | highest tile: {} | playouts: {}",
        summary.turns,
        summary.turns as f64 / elapsed,
        summary.score,
        summary.highest_tile,
        summary.playouts
    );
    Ok(())
}
