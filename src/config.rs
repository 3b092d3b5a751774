//! Configuration system for the civil unrest simulation.
//!
//! Supports YAML configuration files with defaults matching the classic
//! civil violence parameterisation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub population: PopulationConfig,
    pub regime: RegimeConfig,
    pub contagion: ContagionConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grid dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

/// Initial population layout and exogenous trait distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Approximate fraction of cells occupied by citizens
    pub citizen_density: f64,
    /// Approximate fraction of cells occupied by cops
    pub cop_density: f64,
    /// Configured citizen vision (perception itself is fixed at radius 1)
    pub citizen_vision: u32,
    /// Configured cop vision (perception itself is fixed at radius 1)
    pub cop_vision: u32,
    /// Probability that a new citizen starts unemployed
    pub initial_unemployment_rate: f64,
    /// Fraction of citizens starting Corrupted
    pub corruption_level: f64,
    /// Fraction of citizens starting Honest
    pub honest_level: f64,
}

/// Regime parameters shared by every agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Baseline government legitimacy (L)
    pub legitimacy: f64,
    /// Longest possible jail sentence (J_max), inclusive
    pub max_jail_term: u32,
    /// Base rebellion threshold
    pub active_threshold: f64,
    /// Constant in the arrest-probability estimate
    pub arrest_prob_constant: f64,
}

/// Moral and employment contagion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContagionConfig {
    pub corruption_transmission_prob: f64,
    pub honest_transmission_prob: f64,
    /// Corruption stops spreading once this saturation is reached
    pub max_corruption_saturation: f64,
    /// Honesty stops spreading once this saturation is reached
    pub max_honest_saturation: f64,
    /// Employed citizens stop losing jobs once this saturation is reached
    pub max_unemployed_saturation: f64,
}

/// Run control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Whether agents move to an empty neighbouring cell after acting
    pub movement: bool,
    /// The model stops running once the iteration count exceeds this
    pub max_iters: u64,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between checkpoints
    pub checkpoint_interval: u64,
    /// Steps between stats snapshots
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// Configuration rejected at model construction
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cop density + citizen density must not exceed 1 (got {0})")]
    DensityOverflow(f64),
    #[error("{name} must be between 0 and 1 (got {value})")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("moral levels must not exceed 1 (corruption {corruption} + honest {honest})")]
    MoralLevelOverflow { corruption: f64, honest: f64 },
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("stats interval must be non-zero")]
    ZeroStatsInterval,
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            population: PopulationConfig::default(),
            regime: RegimeConfig::default(),
            contagion: ContagionConfig::default(),
            run: RunConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            citizen_density: 0.7,
            cop_density: 0.074,
            citizen_vision: 7,
            cop_vision: 7,
            initial_unemployment_rate: 0.1,
            corruption_level: 0.1,
            honest_level: 0.6,
        }
    }
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            legitimacy: 0.8,
            max_jail_term: 1000,
            active_threshold: 0.1,
            arrest_prob_constant: 2.3,
        }
    }
}

impl Default for ContagionConfig {
    fn default() -> Self {
        Self {
            corruption_transmission_prob: 0.06,
            honest_transmission_prob: 0.02,
            max_corruption_saturation: 0.45,
            max_honest_saturation: 0.35,
            max_unemployed_saturation: 0.45,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            movement: true,
            max_iters: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 500,
            stats_interval: 1,
            log_level: "info".to_string(),
        }
    }
}

impl PopulationConfig {
    /// Fraction of citizens starting Susceptible
    pub fn susceptible_level(&self) -> f64 {
        1.0 - (self.corruption_level + self.honest_level)
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid.width,
                height: self.grid.height,
            });
        }

        let pop = &self.population;
        unit_range("citizen_density", pop.citizen_density)?;
        unit_range("cop_density", pop.cop_density)?;
        let density = pop.cop_density + pop.citizen_density;
        if density > 1.0 {
            return Err(ConfigError::DensityOverflow(density));
        }

        unit_range("initial_unemployment_rate", pop.initial_unemployment_rate)?;
        unit_range("corruption_level", pop.corruption_level)?;
        unit_range("honest_level", pop.honest_level)?;
        if pop.corruption_level + pop.susceptible_level() > 1.0 || pop.susceptible_level() < 0.0 {
            return Err(ConfigError::MoralLevelOverflow {
                corruption: pop.corruption_level,
                honest: pop.honest_level,
            });
        }

        unit_range("legitimacy", self.regime.legitimacy)?;

        let contagion = &self.contagion;
        unit_range("corruption_transmission_prob", contagion.corruption_transmission_prob)?;
        unit_range("honest_transmission_prob", contagion.honest_transmission_prob)?;
        unit_range("max_corruption_saturation", contagion.max_corruption_saturation)?;
        unit_range("max_honest_saturation", contagion.max_honest_saturation)?;
        unit_range("max_unemployed_saturation", contagion.max_unemployed_saturation)?;

        if self.logging.stats_interval == 0 {
            return Err(ConfigError::ZeroStatsInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!((config.population.susceptible_level() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_density_overflow_rejected() {
        let mut config = Config::default();
        config.population.citizen_density = 0.95;
        config.population.cop_density = 0.1;
        assert!(matches!(config.validate(), Err(ConfigError::DensityOverflow(_))));
    }

    #[test]
    fn test_unemployment_rate_rejected() {
        let mut config = Config::default();
        config.population.initial_unemployment_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { name: "initial_unemployment_rate", .. })
        ));
    }

    #[test]
    fn test_moral_levels_rejected() {
        let mut config = Config::default();
        config.population.corruption_level = 0.5;
        config.population.honest_level = 0.6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MoralLevelOverflow { .. })
        ));
    }

    #[test]
    fn test_logging_section_optional() {
        let mut yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let cut = yaml.find("logging:").unwrap();
        yaml.truncate(cut);
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(loaded.logging, LoggingConfig::default());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.grid.width = 12;
        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.grid.width, 12);
    }
}
