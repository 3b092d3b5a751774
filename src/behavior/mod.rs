//! Per-tick decision engines.
//!
//! This module contains:
//! - Perception (radius-1 Von Neumann neighbourhood, arrest estimate)
//! - Citizen rule (rebellion, legitimacy, contagion, employment churn)
//! - Cop rule (arrest a visible rebel)
//!
//! Exactly one agent acts at a time. The acting agent mutates its own
//! state and, for contagion and arrests, a neighbour's state directly
//! through [`StepContext`]; any change to a counted field invalidates
//! the census so later queries in the same tick see it.

pub mod citizen;
pub mod cop;
pub mod perception;

pub use perception::{arrest_probability, Neighborhood, Sightings, PERCEPTION_RADIUS};

use crate::agent::{Agent, AgentId, Breed, Citizen};
use crate::config::Config;
use crate::grid::{Grid, Position};
use crate::stats::{Census, CensusCache};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Mutable view of the model handed to the agent currently acting
pub struct StepContext<'a> {
    pub agents: &'a mut [Agent],
    pub grid: &'a mut Grid,
    pub census: &'a mut CensusCache,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a Config,
}

impl<'a> StepContext<'a> {
    /// Run one agent's decision rule
    pub fn activate(&mut self, id: AgentId) {
        match self.agents.get(id).map(Agent::breed) {
            Some(Breed::Citizen) => citizen::step(self, id),
            Some(Breed::Cop) => cop::step(self, id),
            None => log::warn!("activation of unknown agent {}", id),
        }
    }

    /// Census of the population as it stands right now
    pub fn census(&mut self) -> Census {
        *self.census.get(self.agents)
    }

    #[inline]
    pub fn citizen(&self, id: AgentId) -> Option<&Citizen> {
        self.agents.get(id).and_then(Agent::as_citizen)
    }

    #[inline]
    pub fn citizen_mut(&mut self, id: AgentId) -> Option<&mut Citizen> {
        self.agents.get_mut(id).and_then(Agent::as_citizen_mut)
    }

    /// Move to a uniformly chosen cell among `empty_cells`, if any
    pub fn move_randomly(&mut self, id: AgentId, empty_cells: &[Position]) {
        if let Some(&to) = empty_cells.choose(&mut *self.rng) {
            let from = self.agents[id].pos;
            self.grid.move_agent(id, from, to);
            self.agents[id].pos = to;
        }
    }
}
