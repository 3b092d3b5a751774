//! Model orchestrator: owns the population, grid, scheduler and RNG, and
//! advances the simulation one tick at a time.

use crate::agent::{Agent, AgentId, CitizenTraits, Condition, MoralState};
use crate::behavior::StepContext;
use crate::checkpoint::Checkpoint;
use crate::config::{Config, ConfigError};
use crate::grid::{Grid, GridError, Position};
use crate::scheduler::RandomActivation;
use crate::stats::{self, Census, CensusCache, Scope, Stats, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid placement: {0}")]
    Grid(#[from] GridError),
}

/// The civil violence model
pub struct Model {
    // Population; writes go through `agent_mut` so the census stays in sync
    agents: Vec<Agent>,
    pub grid: Grid,
    pub schedule: RandomActivation,

    // Run state
    pub iteration: u64,
    pub running: bool,

    pub config: Config,

    // Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,
    census: CensusCache,

    // Shared random source (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl Model {
    /// Create and populate a model with a random seed
    pub fn new(config: Config) -> Result<Self, ModelError> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create and populate a model with a specific seed
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, ModelError> {
        let mut model = Self::empty_with_seed(config, seed)?;
        model.populate()?;
        model.collect();

        log::info!(
            "Model initialised: {} citizens, {} cops on {}x{} grid (seed {})",
            model.citizen_count(),
            model.cop_count(),
            model.grid.width(),
            model.grid.height(),
            seed
        );
        Ok(model)
    }

    /// Create a model with a validated configuration and no agents.
    ///
    /// Agents are then added by hand with [`Model::spawn_citizen`] and
    /// [`Model::spawn_cop`].
    pub fn empty_with_seed(config: Config, seed: u64) -> Result<Self, ModelError> {
        config.validate()?;

        Ok(Self {
            agents: Vec::new(),
            grid: Grid::new(config.grid.width, config.grid.height),
            schedule: RandomActivation::new(),
            iteration: 0,
            running: true,
            stats: Stats::default(),
            stats_history: StatsHistory::new(config.logging.stats_interval),
            census: CensusCache::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
        })
    }

    /// Restore a model from a checkpoint, continuing its random stream
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, ModelError> {
        checkpoint.config.validate()?;

        let mut grid = Grid::new(checkpoint.config.grid.width, checkpoint.config.grid.height);
        for agent in &checkpoint.agents {
            grid.place(agent.id, agent.pos)?;
        }

        let mut model = Self {
            agents: checkpoint.agents,
            grid,
            schedule: checkpoint.schedule,
            iteration: checkpoint.iteration,
            running: checkpoint.running,
            stats: Stats::default(),
            stats_history: StatsHistory::new(checkpoint.config.logging.stats_interval),
            census: CensusCache::new(),
            rng: checkpoint.rng,
            seed: checkpoint.seed,
            config: checkpoint.config,
        };
        model.stats = Stats::from_census(model.iteration, model.census.get(&model.agents));
        Ok(model)
    }

    /// Snapshot the complete state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.iteration,
            self.running,
            self.config.clone(),
            self.agents.clone(),
            self.schedule.clone(),
            self.rng.clone(),
            self.seed,
        )
    }

    /// Fill the grid cell by cell: cop with probability `cop_density`,
    /// otherwise citizen with probability `cop_density + citizen_density`.
    fn populate(&mut self) -> Result<(), ModelError> {
        let pop = self.config.population.clone();
        let regime = self.config.regime.clone();
        let contagion = self.config.contagion.clone();
        let cells: Vec<Position> = self.grid.coords().collect();

        for pos in cells {
            if self.rng.gen::<f64>() < pop.cop_density {
                self.spawn_cop(pos)?;
            } else if self.rng.gen::<f64>() < pop.cop_density + pop.citizen_density {
                let is_employed = self.rng.gen::<f64>() >= pop.initial_unemployment_rate;

                let p: f64 = self.rng.gen();
                let moral_state = if p < pop.corruption_level {
                    MoralState::Corrupted
                } else if p < pop.corruption_level + pop.susceptible_level() {
                    MoralState::Susceptible
                } else {
                    MoralState::Honest
                };

                let hardship = self.rng.gen();
                let risk_aversion = self.rng.gen();
                // Employment raises the bar for rebelling
                let bump = self.rng.gen_range(0.05..0.15);
                let threshold = regime.active_threshold + if is_employed { bump } else { 0.0 };

                self.spawn_citizen(
                    pos,
                    CitizenTraits {
                        hardship,
                        legitimacy: regime.legitimacy,
                        regime_legitimacy: regime.legitimacy,
                        risk_aversion,
                        active_threshold: regime.active_threshold,
                        threshold,
                        is_employed,
                        moral_state,
                        corruption_transmission_prop: contagion.corruption_transmission_prob,
                        honest_transmission_prop: contagion.honest_transmission_prob,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn next_id(&self) -> AgentId {
        self.agents.len()
    }

    /// Place a new citizen on an empty cell and register it
    pub fn spawn_citizen(&mut self, pos: Position, traits: CitizenTraits) -> Result<AgentId, ModelError> {
        let id = self.next_id();
        self.grid.place(id, pos)?;
        self.agents
            .push(Agent::new_citizen(id, pos, self.config.population.citizen_vision, traits));
        self.schedule.add(id);
        self.census.invalidate();
        Ok(id)
    }

    /// Place a new cop on an empty cell and register it
    pub fn spawn_cop(&mut self, pos: Position) -> Result<AgentId, ModelError> {
        let id = self.next_id();
        self.grid.place(id, pos)?;
        self.agents
            .push(Agent::new_cop(id, pos, self.config.population.cop_vision));
        self.schedule.add(id);
        Ok(id)
    }

    /// Advance one tick: activate every agent once in random order, then
    /// record statistics and check the iteration bound.
    pub fn step(&mut self) {
        let Self {
            agents,
            grid,
            census,
            rng,
            config,
            schedule,
            ..
        } = self;

        schedule.step(rng, |rng, id| {
            let mut ctx = StepContext {
                agents: &mut agents[..],
                grid: &mut *grid,
                census: &mut *census,
                rng,
                config: &*config,
            };
            ctx.activate(id);
        });

        self.iteration += 1;
        self.collect();
        log::debug!("{}", self.stats.summary());

        if self.running && self.iteration > self.config.run.max_iters {
            log::info!("Reached max_iters ({}), stopping", self.config.run.max_iters);
            self.running = false;
        }
    }

    /// Run a single agent's decision rule outside a full tick
    pub fn activate(&mut self, id: AgentId) {
        let mut ctx = StepContext {
            agents: &mut self.agents,
            grid: &mut self.grid,
            census: &mut self.census,
            rng: &mut self.rng,
            config: &self.config,
        };
        ctx.activate(id);
    }

    /// Step up to `steps` times, stopping early once the model halts.
    /// Returns the number of ticks executed.
    pub fn run(&mut self, steps: u64) -> u64 {
        let mut executed = 0;
        while executed < steps && self.running {
            self.step();
            executed += 1;
        }
        executed
    }

    /// Step until the model stops running
    pub fn run_to_completion(&mut self) -> u64 {
        self.run_with_callback(|_| {})
    }

    /// Step until the model stops running, calling back after every tick
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> u64
    where
        F: FnMut(&Model),
    {
        let mut executed = 0;
        while self.running {
            self.step();
            executed += 1;
            callback(self);
        }
        executed
    }

    /// Clear the running flag from outside
    pub fn halt(&mut self) {
        self.running = false;
    }

    fn collect(&mut self) {
        self.stats = Stats::from_census(self.iteration, self.census.get(&self.agents));
        self.stats_history.record(self.stats.clone());
    }

    /// Census of the current population
    pub fn census(&mut self) -> Census {
        *self.census.get(&self.agents)
    }

    /// All agents, indexed by id
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        // Callers may change counted fields
        self.census.invalidate();
        self.agents.get_mut(id)
    }

    pub fn citizen_count(&self) -> usize {
        self.agents.iter().filter(|a| !a.is_cop()).count()
    }

    pub fn cop_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_cop()).count()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // Population statistics, each a fresh scan

    pub fn count_condition(&self, condition: Condition, scope: Scope) -> usize {
        stats::count_condition(&self.agents, condition, scope)
    }

    pub fn count_moral_state(&self, state: MoralState, scope: Scope) -> usize {
        stats::count_moral_state(&self.agents, state, scope)
    }

    pub fn unemployed_saturation(&self, scope: Scope) -> f64 {
        stats::unemployed_saturation(&self.agents, scope)
    }

    pub fn corrupted_saturation(&self, scope: Scope) -> f64 {
        stats::corrupted_saturation(&self.agents, scope)
    }

    pub fn honest_saturation(&self, scope: Scope) -> f64 {
        stats::honest_saturation(&self.agents, scope)
    }

    pub fn count_jailed(&self) -> usize {
        stats::count_jailed(&self.agents)
    }

    pub fn count_employed(&self) -> usize {
        stats::count_employed(&self.agents)
    }
}
