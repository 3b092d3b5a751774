//! # CIVIL UNREST
//!
//! Agent-based model of civil violence with corruption and employment
//! contagion, on a toroidal grid.
//!
//! Citizens weigh grievance against the estimated risk of arrest and turn
//! active when the difference exceeds their threshold. Cops arrest active
//! neighbours. Corrupted citizens spread corruption to susceptible
//! neighbours, honest citizens spread honesty, and employment churns with
//! the corruption and honesty levels of the population.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use civil_unrest::{Config, Model};
//!
//! let mut model = Model::new_with_seed(Config::default(), 42).unwrap();
//! model.run(100);
//!
//! println!("{}", model.stats.summary());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use civil_unrest::Config;
//!
//! let mut config = Config::default();
//! config.regime.legitimacy = 0.6;
//! config.contagion.corruption_transmission_prob = 0.1;
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use civil_unrest::{Config, Model};
//! use civil_unrest::checkpoint::Checkpoint;
//!
//! let mut model = Model::new_with_seed(Config::default(), 7).unwrap();
//! model.run(200);
//!
//! model.create_checkpoint().save("checkpoint.bin").unwrap();
//!
//! let loaded = Checkpoint::load("checkpoint.bin").unwrap();
//! let resumed = Model::from_checkpoint(loaded).unwrap();
//! ```

pub mod agent;
pub mod behavior;
pub mod checkpoint;
pub mod config;
pub mod export;
pub mod grid;
pub mod model;
pub mod scheduler;
pub mod stats;

// Re-export main types
pub use agent::{Agent, AgentId, Breed, Citizen, CitizenTraits, Condition, MoralState};
pub use config::{Config, ConfigError};
pub use grid::{Grid, GridError, Position};
pub use model::{Model, ModelError};
pub use stats::{Scope, Stats, StatsHistory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on a square grid of the given side
pub fn benchmark(steps: u64, side: usize, seed: u64) -> Result<BenchmarkResult, ModelError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.grid.width = side;
    config.grid.height = side;
    config.run.max_iters = steps;

    let mut model = Model::new_with_seed(config, seed)?;

    let start = Instant::now();
    let executed = model.run(steps);
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps: executed,
        citizens: model.citizen_count(),
        cops: model.cop_count(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: executed as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        final_active: model.stats.active,
        final_corrupted: model.stats.corrupted,
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub citizens: usize,
    pub cops: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub final_active: usize,
    pub final_corrupted: usize,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Population: {} citizens, {} cops", self.citizens, self.cops)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Final active: {}", self.final_active)?;
        writeln!(f, "Final corrupted: {}", self.final_corrupted)?;
        Ok(())
    }
}
