//! Solver configuration.
//!
//! Loaded from an optional TOML file; every key is optional and falls back to
//! [`SolverConfig::default`]. The CLI overrides whatever the file sets.
//!
//! ```toml
//! runs = "dynamic"      # or a fixed count, e.g. 100; 0 plays randomly
//! parallel = true
//! seed = 42
//! max_turns = 5000
//! log_level = "info"
//!
//! [montecarlo]
//! max_playout_moves = 100000
//! threads = 8
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SolverError};
use crate::montecarlo::MonteCarloConfig;
use crate::solver::RunPolicy;

mod defaults {
    pub const LOG_LEVEL: &str = "info";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Playouts per candidate move.
    pub runs: RunPolicy,
    /// Fan playouts out over rayon workers.
    pub parallel: bool,
    /// Seed for a reproducible game (None = thread RNG).
    pub seed: Option<u64>,
    /// Stop after this many applied moves even if the game is not over.
    pub max_turns: Option<u64>,
    pub log_level: String,
    pub montecarlo: MonteCarloConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            runs: RunPolicy::default(),
            parallel: false,
            seed: None,
            max_turns: None,
            log_level: defaults::LOG_LEVEL.into(),
            montecarlo: MonteCarloConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: SolverConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_toml_str(&fs::read_to_string(path)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.montecarlo.max_playout_moves == Some(0) {
            return Err(SolverError::Config("max_playout_moves must be at least 1".into()));
        }
        if self.montecarlo.threads == Some(0) {
            return Err(SolverError::Config("threads must be at least 1".into()));
        }
        if self.log_level.trim().is_empty() {
            return Err(SolverError::Config("log_level must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn parses_full_document() {
        let cfg = SolverConfig::from_toml_str(
            r#"
            runs = "dynamic"
            parallel = true
            seed = 42
            max_turns = 500

            [montecarlo]
            max_playout_moves = 10000
            threads = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.runs, RunPolicy::Dynamic);
        assert!(cfg.parallel);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.max_turns, Some(500));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.montecarlo.max_playout_moves, Some(10_000));
        assert_eq!(cfg.montecarlo.threads, Some(2));
        assert!(!cfg.montecarlo.evaluate_noop_moves);
    }

    #[test]
    fn numeric_runs_are_fixed() {
        let cfg = SolverConfig::from_toml_str("runs = 0").unwrap();
        assert_eq!(cfg.runs, RunPolicy::Fixed(0));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(SolverConfig::from_toml_str("runs = \"many\""), Err(SolverError::Toml(_))));
        assert!(matches!(
            SolverConfig::from_toml_str("[montecarlo]\nmax_playout_moves = 0"),
            Err(SolverError::Config(_))
        ));
    }

    #[test]
    fn missing_path_means_defaults() {
        assert_eq!(SolverConfig::load(None).unwrap(), SolverConfig::default());
        assert!(matches!(
            SolverConfig::load(Some(Path::new("/definitely/not/here.toml"))),
            Err(SolverError::Io(_))
        ));
    }
}
