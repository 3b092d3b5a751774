//! Data export for analysis in external tools.

use crate::agent::Agent;
use crate::model::Model;
use crate::stats::{Stats, StatsHistory};
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

/// Per-agent reporter row. Citizen-only fields are `None` for cops.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRecord {
    pub id: usize,
    pub x: usize,
    pub y: usize,
    pub breed: &'static str,
    pub jail_sentence: Option<u32>,
    pub condition: Option<&'static str>,
    pub arrest_probability: Option<f64>,
    pub is_employed: Option<bool>,
    pub moral_state: Option<&'static str>,
}

impl From<&Agent> for AgentRecord {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            x: agent.pos.x,
            y: agent.pos.y,
            breed: agent.breed().as_str(),
            jail_sentence: agent.jail_sentence(),
            condition: agent.condition().map(|c| c.as_str()),
            arrest_probability: agent.arrest_probability(),
            is_employed: agent.is_employed(),
            moral_state: agent.moral_state().map(|m| m.as_str()),
        }
    }
}

impl AgentRecord {
    pub const CSV_HEADER: &'static str =
        "id,x,y,breed,jail_sentence,condition,arrest_probability,is_employed,moral_state";

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.id,
            self.x,
            self.y,
            self.breed,
            field(self.jail_sentence),
            self.condition.unwrap_or(""),
            self.arrest_probability.map(|p| format!("{:.4}", p)).unwrap_or_default(),
            field(self.is_employed),
            self.moral_state.unwrap_or(""),
        )
    }
}

fn field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export system for saving model data
pub struct ExportSystem;

impl ExportSystem {
    /// Export every agent to CSV
    pub fn export_agents_csv<P: AsRef<Path>>(agents: &[Agent], path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(file, "{}", AgentRecord::CSV_HEADER)?;
        for agent in agents {
            writeln!(file, "{}", AgentRecord::from(agent).to_csv_row())?;
        }

        file.flush()
    }

    /// Export recorded model snapshots to CSV
    pub fn export_history_csv<P: AsRef<Path>>(history: &StatsHistory, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(file, "{}", Stats::CSV_HEADER)?;
        for stats in &history.snapshots {
            writeln!(file, "{}", stats.to_csv_row())?;
        }

        file.flush()
    }

    /// Export a plain-text run summary
    pub fn export_summary<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let stats = &model.stats;

        writeln!(file, "=== Civil Unrest Run Summary ===")?;
        writeln!(file, "Seed: {}", model.seed())?;
        writeln!(file, "Iteration: {}", model.iteration)?;
        writeln!(file, "Grid: {}x{}", model.grid.width(), model.grid.height())?;
        writeln!(file, "Citizens: {}", model.citizen_count())?;
        writeln!(file, "Cops: {}", model.cop_count())?;
        writeln!(file)?;
        writeln!(file, "Quiescent: {}", stats.quiescent)?;
        writeln!(file, "Active: {}", stats.active)?;
        writeln!(file, "Arrested: {}", stats.arrested)?;
        writeln!(file, "Jailed: {}", stats.jailed)?;
        writeln!(file, "Employed: {}", stats.employed)?;
        writeln!(file)?;
        writeln!(file, "Corrupted: {} ({:.1}%)", stats.corrupted, stats.corrupted_saturation * 100.0)?;
        writeln!(file, "Honest: {} ({:.1}%)", stats.honest, stats.honest_saturation * 100.0)?;
        writeln!(file, "Susceptible: {}", stats.susceptible)?;
        writeln!(file, "Unemployed: {:.1}%", stats.unemployed_saturation * 100.0)?;

        Ok(())
    }
}
