//! Neighbourhood perception shared by citizens and cops.

use crate::agent::{Agent, AgentId, Citizen, Condition, MoralState};
use crate::grid::{Grid, Position, Shape};

/// Perception radius. The configured vision is not used for perception.
pub const PERCEPTION_RADIUS: usize = 1;

/// What an agent sees around its cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighborhood {
    /// Agents in neighbouring cells
    pub neighbors: Vec<AgentId>,
    /// Neighbouring cells with nobody in them
    pub empty_cells: Vec<Position>,
}

/// Head counts over a neighbourhood
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sightings {
    pub cops: usize,
    /// Active, unjailed citizens (not counting the observer)
    pub active_rebels: usize,
}

impl Neighborhood {
    /// Look around `center` on the radius-1 Von Neumann neighbourhood
    pub fn perceive(grid: &Grid, center: Position) -> Self {
        let mut view = Self::default();
        for cell in grid.neighborhood(center, PERCEPTION_RADIUS, Shape::VonNeumann) {
            match grid.get(cell) {
                Some(id) => view.neighbors.push(id),
                None => view.empty_cells.push(cell),
            }
        }
        view
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Citizen neighbours with their ids
    pub fn citizens<'a>(&'a self, agents: &'a [Agent]) -> impl Iterator<Item = (AgentId, &'a Citizen)> + 'a {
        self.neighbors
            .iter()
            .filter_map(move |&id| agents.get(id).and_then(Agent::as_citizen).map(|c| (id, c)))
    }

    pub fn sightings(&self, agents: &[Agent]) -> Sightings {
        let mut seen = Sightings::default();
        for agent in self.neighbors.iter().filter_map(|&id| agents.get(id)) {
            match agent.as_citizen() {
                None => seen.cops += 1,
                Some(c) if c.is_active_rebel() => seen.active_rebels += 1,
                Some(_) => {}
            }
        }
        seen
    }

    /// Active, unjailed citizen neighbours
    pub fn active_rebels(&self, agents: &[Agent]) -> Vec<AgentId> {
        self.citizens(agents)
            .filter(|(_, c)| c.is_active_rebel())
            .map(|(id, _)| id)
            .collect()
    }

    /// Quiescent, susceptible citizen neighbours: the contagion targets
    pub fn contagion_targets(&self, agents: &[Agent]) -> Vec<AgentId> {
        self.citizens(agents)
            .filter(|(_, c)| c.moral_state == MoralState::Susceptible && c.condition == Condition::Quiescent)
            .map(|(id, _)| id)
            .collect()
    }

    /// Employed citizen neighbours that are not corrupted
    pub fn employed_uncorrupted(&self, agents: &[Agent]) -> Vec<AgentId> {
        self.citizens(agents)
            .filter(|(_, c)| c.is_employed && c.moral_state != MoralState::Corrupted)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Estimated probability of arrest if the observer turns active:
/// `1 - exp(-C * cops / actives)`, where `actives` includes the observer.
pub fn arrest_probability(constant: f64, cops_in_view: usize, actives_in_view: usize) -> f64 {
    let actives = actives_in_view.max(1) as f64;
    1.0 - (-constant * cops_in_view as f64 / actives).exp()
}
