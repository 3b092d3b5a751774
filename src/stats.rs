//! Population statistics: counts and saturation ratios over citizens.
//!
//! Every query is a pure function of the population at call time. The
//! free functions rescan the population; [`CensusCache`] memoises one scan
//! and must be invalidated whenever a counted field changes.
//!
//! A saturation over zero considered citizens (all-cop or empty
//! population, or everyone jailed under [`Scope::ExcludeJailed`]) is 0.0.

use crate::agent::{Agent, Citizen, Condition, MoralState};
use serde::{Deserialize, Serialize};

/// Which citizens a query considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    IncludeJailed,
    ExcludeJailed,
}

fn considered(agents: &[Agent], scope: Scope) -> impl Iterator<Item = &Citizen> {
    agents
        .iter()
        .filter_map(Agent::as_citizen)
        .filter(move |c| scope == Scope::IncludeJailed || !c.is_jailed())
}

#[inline]
fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Citizens in the given rebellion condition
pub fn count_condition(agents: &[Agent], condition: Condition, scope: Scope) -> usize {
    considered(agents, scope).filter(|c| c.condition == condition).count()
}

/// Citizens in the given moral state
pub fn count_moral_state(agents: &[Agent], state: MoralState, scope: Scope) -> usize {
    considered(agents, scope).filter(|c| c.moral_state == state).count()
}

/// Fraction of considered citizens without a job
pub fn unemployed_saturation(agents: &[Agent], scope: Scope) -> f64 {
    let (hits, total) = considered(agents, scope)
        .fold((0, 0), |(h, t), c| (h + usize::from(!c.is_employed), t + 1));
    ratio(hits, total)
}

/// Fraction of considered citizens that are corrupted
pub fn corrupted_saturation(agents: &[Agent], scope: Scope) -> f64 {
    let total = considered(agents, scope).count();
    ratio(count_moral_state(agents, MoralState::Corrupted, scope), total)
}

/// Fraction of considered citizens that are honest
pub fn honest_saturation(agents: &[Agent], scope: Scope) -> f64 {
    let total = considered(agents, scope).count();
    ratio(count_moral_state(agents, MoralState::Honest, scope), total)
}

/// Citizens currently serving a sentence
pub fn count_jailed(agents: &[Agent]) -> usize {
    considered(agents, Scope::IncludeJailed).filter(|c| c.is_jailed()).count()
}

/// Citizens currently employed
pub fn count_employed(agents: &[Agent]) -> usize {
    considered(agents, Scope::IncludeJailed).filter(|c| c.is_employed).count()
}

/// Counts over one set of citizens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub citizens: usize,
    pub quiescent: usize,
    pub active: usize,
    pub arrested: usize,
    pub employed: usize,
    pub corrupted: usize,
    pub honest: usize,
    pub susceptible: usize,
}

impl Tally {
    fn add(&mut self, c: &Citizen) {
        self.citizens += 1;
        match c.condition {
            Condition::Quiescent => self.quiescent += 1,
            Condition::Active => self.active += 1,
            Condition::Arrested => self.arrested += 1,
        }
        if c.is_employed {
            self.employed += 1;
        }
        match c.moral_state {
            MoralState::Corrupted => self.corrupted += 1,
            MoralState::Honest => self.honest += 1,
            MoralState::Susceptible => self.susceptible += 1,
        }
    }

    pub fn unemployed(&self) -> usize {
        self.citizens - self.employed
    }

    pub fn unemployed_saturation(&self) -> f64 {
        ratio(self.unemployed(), self.citizens)
    }

    pub fn corrupted_saturation(&self) -> f64 {
        ratio(self.corrupted, self.citizens)
    }

    pub fn honest_saturation(&self) -> f64 {
        ratio(self.honest, self.citizens)
    }
}

/// One full scan of the population, for both scopes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    pub all: Tally,
    pub free: Tally,
}

impl Census {
    pub fn scan(agents: &[Agent]) -> Self {
        let mut census = Census::default();
        for citizen in agents.iter().filter_map(Agent::as_citizen) {
            census.all.add(citizen);
            if !citizen.is_jailed() {
                census.free.add(citizen);
            }
        }
        census
    }

    #[inline]
    pub fn tally(&self, scope: Scope) -> &Tally {
        match scope {
            Scope::IncludeJailed => &self.all,
            Scope::ExcludeJailed => &self.free,
        }
    }

    pub fn jailed(&self) -> usize {
        self.all.citizens - self.free.citizens
    }
}

/// Memoised census, invalidated explicitly by whoever mutates a counted field
#[derive(Clone, Debug, Default)]
pub struct CensusCache {
    census: Option<Census>,
    scans: u64,
}

impl CensusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current census, rescanning only if invalidated since the last call
    pub fn get(&mut self, agents: &[Agent]) -> &Census {
        if self.census.is_none() {
            self.scans += 1;
        }
        self.census.get_or_insert_with(|| Census::scan(agents))
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.census = None;
    }

    /// Number of full scans performed so far
    pub fn scans(&self) -> u64 {
        self.scans
    }
}

/// Model-level reporter snapshot for one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub iteration: u64,
    pub citizens: usize,
    pub quiescent: usize,
    pub active: usize,
    pub arrested: usize,
    pub jailed: usize,
    pub employed: usize,
    pub corrupted: usize,
    pub honest: usize,
    pub susceptible: usize,
    pub unemployed_saturation: f64,
    pub corrupted_saturation: f64,
    pub honest_saturation: f64,
}

impl Stats {
    pub fn from_census(iteration: u64, census: &Census) -> Self {
        let all = &census.all;
        Self {
            iteration,
            citizens: all.citizens,
            quiescent: all.quiescent,
            active: all.active,
            arrested: all.arrested,
            jailed: census.jailed(),
            employed: all.employed,
            corrupted: all.corrupted,
            honest: all.honest,
            susceptible: all.susceptible,
            unemployed_saturation: all.unemployed_saturation(),
            corrupted_saturation: all.corrupted_saturation(),
            honest_saturation: all.honest_saturation(),
        }
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Q:{:5} | A:{:5} | Jail:{:5} | Emp:{:5} | Corr:{:5} | Hon:{:5} | Sus:{:5}",
            self.iteration,
            self.quiescent,
            self.active,
            self.jailed,
            self.employed,
            self.corrupted,
            self.honest,
            self.susceptible,
        )
    }

    pub const CSV_HEADER: &'static str = "iteration,quiescent,active,arrested,jailed,employed,corrupted,honest,susceptible,unemployed_saturation,corrupted_saturation,honest_saturation";

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{:.4},{:.4},{:.4}",
            self.iteration,
            self.quiescent,
            self.active,
            self.arrested,
            self.jailed,
            self.employed,
            self.corrupted,
            self.honest,
            self.susceptible,
            self.unemployed_saturation,
            self.corrupted_saturation,
            self.honest_saturation,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    pub snapshots: Vec<Stats>,
    pub interval: u64,
}

impl StatsHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a snapshot if its iteration falls on the interval
    pub fn record(&mut self, stats: Stats) {
        if self.interval == 0 || stats.iteration % self.interval == 0 {
            self.snapshots.push(stats);
        }
    }

    pub fn latest(&self) -> Option<&Stats> {
        self.snapshots.last()
    }

    /// Active rebels over time
    pub fn active_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.iteration, s.active)).collect()
    }

    /// Jailed citizens over time
    pub fn jailed_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.iteration, s.jailed)).collect()
    }

    /// (corrupted, honest, susceptible) over time
    pub fn moral_series(&self) -> Vec<(u64, usize, usize, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.iteration, s.corrupted, s.honest, s.susceptible))
            .collect()
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CitizenTraits;
    use crate::grid::Position;

    fn citizen(id: usize, employed: bool, moral_state: MoralState, jail: u32) -> Agent {
        let mut agent = Agent::new_citizen(
            id,
            Position::new(id, 0),
            7,
            CitizenTraits {
                is_employed: employed,
                moral_state,
                ..Default::default()
            },
        );
        if let Some(c) = agent.as_citizen_mut() {
            c.jail_sentence = jail;
            if jail > 0 {
                c.condition = Condition::Arrested;
            }
        }
        agent
    }

    fn population() -> Vec<Agent> {
        vec![
            citizen(0, true, MoralState::Honest, 0),
            citizen(1, false, MoralState::Corrupted, 0),
            citizen(2, false, MoralState::Susceptible, 4),
            citizen(3, true, MoralState::Corrupted, 0),
            Agent::new_cop(4, Position::new(4, 0), 7),
        ]
    }

    #[test]
    fn test_saturations_respect_scope() {
        let agents = population();

        assert!((unemployed_saturation(&agents, Scope::IncludeJailed) - 0.5).abs() < 1e-12);
        assert!((unemployed_saturation(&agents, Scope::ExcludeJailed) - 1.0 / 3.0).abs() < 1e-12);
        assert!((corrupted_saturation(&agents, Scope::IncludeJailed) - 0.5).abs() < 1e-12);
        assert!((corrupted_saturation(&agents, Scope::ExcludeJailed) - 2.0 / 3.0).abs() < 1e-12);
        assert!((honest_saturation(&agents, Scope::IncludeJailed) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_counts() {
        let agents = population();

        assert_eq!(count_jailed(&agents), 1);
        assert_eq!(count_employed(&agents), 2);
        assert_eq!(count_condition(&agents, Condition::Quiescent, Scope::IncludeJailed), 3);
        assert_eq!(count_condition(&agents, Condition::Arrested, Scope::ExcludeJailed), 0);
        assert_eq!(count_moral_state(&agents, MoralState::Susceptible, Scope::IncludeJailed), 1);
        assert_eq!(count_moral_state(&agents, MoralState::Susceptible, Scope::ExcludeJailed), 0);
    }

    #[test]
    fn test_census_matches_scans() {
        let agents = population();
        let census = Census::scan(&agents);

        for scope in [Scope::IncludeJailed, Scope::ExcludeJailed] {
            let tally = census.tally(scope);
            assert_eq!(tally.unemployed_saturation(), unemployed_saturation(&agents, scope));
            assert_eq!(tally.corrupted_saturation(), corrupted_saturation(&agents, scope));
            assert_eq!(tally.honest_saturation(), honest_saturation(&agents, scope));
        }
        assert_eq!(census.jailed(), count_jailed(&agents));
    }

    #[test]
    fn test_zero_citizens_saturate_to_zero() {
        let cops = vec![
            Agent::new_cop(0, Position::new(0, 0), 7),
            Agent::new_cop(1, Position::new(1, 0), 7),
        ];

        for agents in [&cops[..], &[][..]] {
            for scope in [Scope::IncludeJailed, Scope::ExcludeJailed] {
                assert_eq!(unemployed_saturation(agents, scope), 0.0);
                assert_eq!(corrupted_saturation(agents, scope), 0.0);
                assert_eq!(honest_saturation(agents, scope), 0.0);
                assert_eq!(Census::scan(agents).tally(scope).corrupted_saturation(), 0.0);
            }
        }
    }

    #[test]
    fn test_census_cache_invalidation() {
        let mut agents = population();
        let mut cache = CensusCache::new();

        assert_eq!(cache.get(&agents).all.corrupted, 2);
        assert_eq!(cache.get(&agents).all.corrupted, 2);
        assert_eq!(cache.scans(), 1);

        if let Some(c) = agents[2].as_citizen_mut() {
            c.moral_state = MoralState::Corrupted;
        }
        cache.invalidate();
        assert_eq!(cache.get(&agents).all.corrupted, 3);
        assert_eq!(cache.scans(), 2);
    }

    #[test]
    fn test_stats_history() {
        let mut history = StatsHistory::new(10);

        for i in 0..50 {
            history.record(Stats {
                iteration: i,
                active: i as usize,
                ..Default::default()
            });
        }

        let series = history.active_series();
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (0, 0));
        assert_eq!(series[4], (40, 40));
    }

    #[test]
    fn test_history_series() {
        let mut history = StatsHistory::new(1);
        for i in 0..3u64 {
            let n = i as usize;
            history.record(Stats {
                iteration: i,
                jailed: n * 2,
                corrupted: n,
                honest: 10 - n,
                susceptible: 5,
                ..Default::default()
            });
        }

        assert_eq!(history.jailed_series(), vec![(0, 0), (1, 2), (2, 4)]);
        assert_eq!(history.moral_series()[2], (2, 2, 8, 5));
        assert_eq!(history.latest().map(|s| s.iteration), Some(2));
    }

    #[test]
    fn test_stats_from_census() {
        let agents = population();
        let stats = Stats::from_census(3, &Census::scan(&agents));

        assert_eq!(stats.iteration, 3);
        assert_eq!(stats.citizens, 4);
        assert_eq!(stats.arrested, 1);
        assert_eq!(stats.jailed, 1);
        assert!(stats.summary().contains("Jail:    1"));
        assert_eq!(stats.to_csv_row().split(',').count(), Stats::CSV_HEADER.split(',').count());
    }
}
