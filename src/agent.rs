//! Agent structures: citizens and cops.

use crate::grid::Position;
use serde::{Deserialize, Serialize};

/// Unique agent identifier, equal to the agent's index in the population
pub type AgentId = usize;

/// Agent role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Breed {
    Citizen,
    Cop,
}

impl Breed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Breed::Citizen => "citizen",
            Breed::Cop => "cop",
        }
    }
}

/// Rebellion state of a citizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Quiescent,
    Active,
    /// Set by a cop on arrest. Neither quiescent nor active, so the
    /// rebellion rule never moves a citizen out of it.
    Arrested,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Quiescent => "Quiescent",
            Condition::Active => "Active",
            Condition::Arrested => "Arrested",
        }
    }
}

/// Contagion-driven moral trait. Honest and Corrupted are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoralState {
    Honest,
    Susceptible,
    Corrupted,
}

impl MoralState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoralState::Honest => "Honest",
            MoralState::Susceptible => "Susceptible",
            MoralState::Corrupted => "Corrupted",
        }
    }
}

/// Exogenous traits used to create a citizen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CitizenTraits {
    pub hardship: f64,
    /// Baseline legitimacy anchor
    pub legitimacy: f64,
    /// Initial perceived legitimacy
    pub regime_legitimacy: f64,
    pub risk_aversion: f64,
    pub active_threshold: f64,
    pub threshold: f64,
    pub is_employed: bool,
    pub moral_state: MoralState,
    pub corruption_transmission_prop: f64,
    pub honest_transmission_prop: f64,
}

impl Default for CitizenTraits {
    fn default() -> Self {
        Self {
            hardship: 0.5,
            legitimacy: 0.8,
            regime_legitimacy: 0.8,
            risk_aversion: 0.5,
            active_threshold: 0.1,
            threshold: 0.1,
            is_employed: true,
            moral_state: MoralState::Susceptible,
            corruption_transmission_prop: 0.06,
            honest_transmission_prop: 0.02,
        }
    }
}

/// Citizen state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
    pub hardship: f64,
    pub legitimacy: f64,
    pub regime_legitimacy: f64,
    pub risk_aversion: f64,
    pub active_threshold: f64,
    pub threshold: f64,
    /// hardship * (1 - regime_legitimacy) as of the last explicit refresh
    pub grievance: f64,
    pub condition: Condition,
    pub jail_sentence: u32,
    /// None until the citizen's first free tick
    pub arrest_probability: Option<f64>,
    pub is_employed: bool,
    pub moral_state: MoralState,
    pub corruption_transmission_prop: f64,
    pub honest_transmission_prop: f64,
}

impl Citizen {
    pub fn new(traits: CitizenTraits) -> Self {
        let mut citizen = Self {
            hardship: traits.hardship,
            legitimacy: traits.legitimacy,
            regime_legitimacy: traits.regime_legitimacy,
            risk_aversion: traits.risk_aversion,
            active_threshold: traits.active_threshold,
            threshold: traits.threshold,
            grievance: 0.0,
            condition: Condition::Quiescent,
            jail_sentence: 0,
            arrest_probability: None,
            is_employed: traits.is_employed,
            moral_state: traits.moral_state,
            corruption_transmission_prop: traits.corruption_transmission_prop,
            honest_transmission_prop: traits.honest_transmission_prop,
        };
        citizen.refresh_grievance();
        citizen
    }

    /// Recompute grievance from the current perceived legitimacy.
    ///
    /// The tick rule does not call this after re-estimating legitimacy;
    /// grievance only changes when refreshed explicitly.
    pub fn refresh_grievance(&mut self) {
        self.grievance = self.hardship * (1.0 - self.regime_legitimacy);
    }

    #[inline]
    pub fn is_jailed(&self) -> bool {
        self.jail_sentence > 0
    }

    /// Active and free, i.e. visible to cops and counted as a fellow rebel
    #[inline]
    pub fn is_active_rebel(&self) -> bool {
        self.condition == Condition::Active && self.jail_sentence == 0
    }
}

/// Per-variant agent payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentKind {
    Citizen(Citizen),
    Cop,
}

/// An agent on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub pos: Position,
    /// Configured vision; perception uses a fixed radius regardless
    pub vision: u32,
    pub kind: AgentKind,
}

impl Agent {
    pub fn new_citizen(id: AgentId, pos: Position, vision: u32, traits: CitizenTraits) -> Self {
        Self {
            id,
            pos,
            vision,
            kind: AgentKind::Citizen(Citizen::new(traits)),
        }
    }

    pub fn new_cop(id: AgentId, pos: Position, vision: u32) -> Self {
        Self {
            id,
            pos,
            vision,
            kind: AgentKind::Cop,
        }
    }

    pub fn breed(&self) -> Breed {
        match self.kind {
            AgentKind::Citizen(_) => Breed::Citizen,
            AgentKind::Cop => Breed::Cop,
        }
    }

    #[inline]
    pub fn is_cop(&self) -> bool {
        matches!(self.kind, AgentKind::Cop)
    }

    #[inline]
    pub fn as_citizen(&self) -> Option<&Citizen> {
        match &self.kind {
            AgentKind::Citizen(c) => Some(c),
            AgentKind::Cop => None,
        }
    }

    #[inline]
    pub fn as_citizen_mut(&mut self) -> Option<&mut Citizen> {
        match &mut self.kind {
            AgentKind::Citizen(c) => Some(c),
            AgentKind::Cop => None,
        }
    }

    // Reporter getters; citizen-only values are None for cops.

    pub fn condition(&self) -> Option<Condition> {
        self.as_citizen().map(|c| c.condition)
    }

    pub fn moral_state(&self) -> Option<MoralState> {
        self.as_citizen().map(|c| c.moral_state)
    }

    pub fn jail_sentence(&self) -> Option<u32> {
        self.as_citizen().map(|c| c.jail_sentence)
    }

    pub fn arrest_probability(&self) -> Option<f64> {
        self.as_citizen().and_then(|c| c.arrest_probability)
    }

    pub fn is_employed(&self) -> Option<bool> {
        self.as_citizen().map(|c| c.is_employed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_citizen_grievance() {
        let citizen = Citizen::new(CitizenTraits {
            hardship: 0.9,
            regime_legitimacy: 0.1,
            ..Default::default()
        });

        assert!((citizen.grievance - 0.81).abs() < 1e-12);
        assert_eq!(citizen.condition, Condition::Quiescent);
        assert_eq!(citizen.jail_sentence, 0);
        assert!(citizen.arrest_probability.is_none());
    }

    #[test]
    fn test_grievance_not_tracking_legitimacy() {
        let mut citizen = Citizen::new(CitizenTraits {
            hardship: 0.5,
            regime_legitimacy: 0.8,
            ..Default::default()
        });
        citizen.regime_legitimacy = 0.0;
        assert!((citizen.grievance - 0.1).abs() < 1e-12);

        citizen.refresh_grievance();
        assert!((citizen.grievance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cop_has_no_citizen_fields() {
        let cop = Agent::new_cop(0, Position::new(1, 1), 7);

        assert_eq!(cop.breed(), Breed::Cop);
        assert!(cop.condition().is_none());
        assert!(cop.jail_sentence().is_none());
        assert!(cop.is_employed().is_none());
    }

    #[test]
    fn test_arrested_marker_is_distinct() {
        assert_eq!(Condition::Arrested.as_str(), "Arrested");
        assert_ne!(Condition::Arrested, Condition::Quiescent);
        assert_ne!(Condition::Arrested, Condition::Active);
    }

    #[test]
    fn test_active_rebel_requires_freedom() {
        let mut citizen = Citizen::new(CitizenTraits::default());
        citizen.condition = Condition::Active;
        assert!(citizen.is_active_rebel());

        citizen.jail_sentence = 3;
        assert!(!citizen.is_active_rebel());
        assert!(citizen.is_jailed());
    }
}
