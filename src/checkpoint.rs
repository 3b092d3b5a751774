//! Checkpoint system for saving and resuming model state.
//!
//! A checkpoint carries the generator state along with the population, so a
//! resumed run draws exactly the numbers the uninterrupted run would have.

use crate::agent::Agent;
use crate::config::Config;
use crate::scheduler::RandomActivation;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

const MAGIC: &[u8; 4] = b"CVUR";

/// Complete model state
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Completed ticks
    pub iteration: u64,
    pub running: bool,
    pub config: Config,
    /// All agents, indexed by id
    pub agents: Vec<Agent>,
    pub schedule: RandomActivation,
    /// Generator state at the moment of the snapshot
    pub rng: ChaCha8Rng,
    /// Seed the run started from
    pub seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    pub fn new(
        iteration: u64,
        running: bool,
        config: Config,
        agents: Vec<Agent>,
        schedule: RandomActivation,
        rng: ChaCha8Rng,
        seed: u64,
    ) -> Self {
        Self {
            version: Self::VERSION,
            iteration,
            running,
            config,
            agents,
            schedule,
            rng,
            seed,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Approximate encoded size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).map_or(0, |n| n as usize)
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Periodic checkpoint writer with retention
pub struct CheckpointManager {
    pub base_dir: String,
    /// Ticks between checkpoints
    pub interval: u64,
    /// Maximum checkpoints kept on disk
    pub max_checkpoints: usize,
    last_checkpoint: u64,
}

impl CheckpointManager {
    pub fn new(base_dir: String, interval: u64, max_checkpoints: usize) -> Result<Self, CheckpointError> {
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: 0,
        })
    }

    pub fn should_save(&self, iteration: u64) -> bool {
        self.interval > 0 && iteration > 0 && iteration % self.interval == 0 && iteration != self.last_checkpoint
    }

    pub fn checkpoint_path(&self, iteration: u64) -> String {
        format!("{}/checkpoint_{:08}.bin", self.base_dir, iteration)
    }

    /// Save checkpoint, then drop the oldest ones beyond the limit
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.iteration);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.iteration;

        self.cleanup()?;
        log::debug!("Checkpoint written to {}", path);

        Ok(path)
    }

    fn checkpoint_files(&self) -> std::io::Result<Vec<std::fs::DirEntry>> {
        Ok(std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("checkpoint_"))
            .collect())
    }

    fn cleanup(&self) -> Result<(), CheckpointError> {
        let mut checkpoints = self.checkpoint_files()?;

        if checkpoints.len() > self.max_checkpoints {
            // Zero-padded names sort by iteration
            checkpoints.sort_by_key(|e| e.file_name());

            let to_remove = checkpoints.len() - self.max_checkpoints;
            for entry in checkpoints.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Most recent checkpoint in the directory
    pub fn find_latest(&self) -> Option<String> {
        self.checkpoint_files()
            .ok()?
            .into_iter()
            .max_by_key(|e| e.file_name())
            .map(|e| e.path().to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CitizenTraits;
    use crate::grid::Position;
    use rand::{Rng, SeedableRng};

    fn create_test_checkpoint() -> Checkpoint {
        let config = Config::default();
        let mut schedule = RandomActivation::new();
        schedule.add(0);
        schedule.add(1);
        Checkpoint::new(
            120,
            true,
            config,
            vec![
                Agent::new_citizen(0, Position::new(1, 1), 7, CitizenTraits::default()),
                Agent::new_cop(1, Position::new(2, 1), 7),
            ],
            schedule,
            ChaCha8Rng::seed_from_u64(12345),
            12345,
        )
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        let mut checkpoint = create_test_checkpoint();
        checkpoint.rng.gen::<u64>();

        checkpoint.save(&path).unwrap();
        let mut loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded.iteration, 120);
        assert!(loaded.running);
        assert_eq!(loaded.agents, checkpoint.agents);
        assert_eq!(loaded.schedule, checkpoint.schedule);
        assert_eq!(loaded.config, checkpoint.config);
        assert_eq!(loaded.seed, 12345);
        // Generator continues where it left off
        assert_eq!(loaded.rng.gen::<u64>(), checkpoint.rng.gen::<u64>());
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.bin");
        std::fs::write(&path, b"PRMD0000").unwrap();

        assert!(matches!(Checkpoint::load(&path), Err(CheckpointError::InvalidFormat(_))));
    }

    #[test]
    fn test_checkpoint_size() {
        let size = create_test_checkpoint().size_bytes();
        assert!(size > 0);
        assert!(size < 10_000);
    }

    #[test]
    fn test_manager_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("ckpt").to_string_lossy().to_string();
        let mut manager = CheckpointManager::new(base, 10, 2).unwrap();

        assert!(!manager.should_save(0));
        assert!(!manager.should_save(5));
        assert!(manager.should_save(10));

        let mut checkpoint = create_test_checkpoint();
        for iteration in [10, 20, 30] {
            checkpoint.iteration = iteration;
            manager.save(&checkpoint).unwrap();
        }

        assert!(!manager.should_save(30));
        assert_eq!(manager.checkpoint_files().unwrap().len(), 2);
        let latest = manager.find_latest().unwrap();
        assert!(latest.ends_with("checkpoint_00000030.bin"));
    }
}
