use std::io;

/// Errors surfaced by the move selector and the solving loop.
#[derive(thiserror::Error, Debug)]
pub enum SolverError {
    /// The game offered no moves to evaluate.
    #[error("move list is empty; best_move needs a game with at least one move")]
    EmptyMoveSet,
    /// A playout hit the configured move cap before reaching game over.
    #[error("playout did not finish within {moves} moves")]
    NonTerminatingSimulation { moves: u64 },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
