use crate::branchbound::OptDir;

/// How the search queue orders the open nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueDiscipline {
    BestFirst,
    DepthFirst,
    /// Best-first store plus a dive into the best fresh child.
    #[default]
    Hybrid,
}

/// Tuning knobs of the branch-and-bound engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stop the main loop after this many seconds (0 = no limit). The loop
    /// only checks between nodes, so it can overshoot by one node's work.
    pub time_limit: f64,
    /// Samples per `(candidate, direction)` before its pseudocost is trusted.
    pub reliable_threshold: i32,
    /// Non-improving strong-branching probes tolerated after the best
    /// candidate before committing to it.
    pub reliable_lookahead: i32,
    /// Run the primal heuristic every N processed nodes (0 = disabled).
    pub heuristic_freq: u32,
    /// Seconds between progress lines.
    pub print_interval: f64,
    pub queue_discipline: QueueDiscipline,
    pub opt_direction: OptDir,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_limit: 0.0,
            reliable_threshold: 8,
            reliable_lookahead: 4,
            heuristic_freq: 100,
            print_interval: 5.0,
            queue_discipline: QueueDiscipline::default(),
            opt_direction: OptDir::Max,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("reliability threshold must be nonnegative, got {0}")]
    NegativeReliableThreshold(i32),
    #[error("reliability lookahead must be nonnegative, got {0}")]
    NegativeReliableLookahead(i32),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reliable_threshold < 0 {
            return Err(ConfigError::NegativeReliableThreshold(self.reliable_threshold));
        }
        if self.reliable_lookahead < 0 {
            return Err(ConfigError::NegativeReliableLookahead(self.reliable_lookahead));
        }
        Ok(())
    }
}
