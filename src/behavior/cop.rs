//! Cop decision rule: inspect the neighbourhood and arrest a random active
//! rebel, then move if movement is enabled.

use super::perception::Neighborhood;
use super::StepContext;
use crate::agent::{AgentId, Condition};
use rand::seq::SliceRandom;
use rand::Rng;

/// Run one tick for cop `id`
pub fn step(ctx: &mut StepContext<'_>, id: AgentId) {
    let view = Neighborhood::perceive(ctx.grid, ctx.agents[id].pos);

    let suspects = view.active_rebels(ctx.agents);
    if let Some(&arrestee) = suspects.choose(&mut *ctx.rng) {
        let sentence = ctx.rng.gen_range(0..=ctx.config.regime.max_jail_term);
        if let Some(citizen) = ctx.citizen_mut(arrestee) {
            citizen.jail_sentence = sentence;
            citizen.condition = Condition::Arrested;
        }
        ctx.census.invalidate();
        log::trace!("cop {} arrested citizen {} for {} ticks", id, arrestee, sentence);
    }

    if ctx.config.run.movement {
        ctx.move_randomly(id, &view.empty_cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, CitizenTraits};
    use crate::config::Config;
    use crate::grid::{Grid, Position};
    use crate::stats::CensusCache;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run_cop(agents: &mut Vec<Agent>, config: &Config, seed: u64) -> Grid {
        let mut grid = Grid::new(5, 5);
        for agent in agents.iter() {
            grid.place(agent.id, agent.pos).unwrap();
        }
        let mut census = CensusCache::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = StepContext {
            agents,
            grid: &mut grid,
            census: &mut census,
            rng: &mut rng,
            config,
        };
        ctx.activate(0);
        grid
    }

    fn rebel(id: AgentId, pos: Position) -> Agent {
        let mut agent = Agent::new_citizen(id, pos, 7, CitizenTraits::default());
        if let Some(c) = agent.as_citizen_mut() {
            c.condition = Condition::Active;
        }
        agent
    }

    #[test]
    fn test_cop_arrests_adjacent_rebel() {
        let mut config = Config::default();
        config.regime.max_jail_term = 30;
        config.run.movement = false;

        for seed in 0..20 {
            let mut agents = vec![Agent::new_cop(0, Position::new(2, 2), 7), rebel(1, Position::new(3, 2))];
            run_cop(&mut agents, &config, seed);

            let citizen = agents[1].as_citizen().unwrap();
            assert_eq!(citizen.condition, Condition::Arrested);
            assert!(citizen.jail_sentence <= 30);
        }
    }

    #[test]
    fn test_cop_ignores_quiescent_and_distant() {
        let mut config = Config::default();
        config.run.movement = false;
        let mut agents = vec![
            Agent::new_cop(0, Position::new(2, 2), 7),
            Agent::new_citizen(1, Position::new(2, 1), 7, CitizenTraits::default()),
            rebel(2, Position::new(4, 4)),
        ];

        run_cop(&mut agents, &config, 1);

        assert_eq!(agents[1].condition(), Some(Condition::Quiescent));
        assert_eq!(agents[2].condition(), Some(Condition::Active));
        assert_eq!(agents[2].jail_sentence(), Some(0));
    }

    #[test]
    fn test_cop_moves_after_arrest() {
        let config = Config::default();
        let mut agents = vec![Agent::new_cop(0, Position::new(2, 2), 7), rebel(1, Position::new(3, 2))];

        let grid = run_cop(&mut agents, &config, 3);

        let pos = agents[0].pos;
        assert_ne!(pos, Position::new(2, 2));
        assert_ne!(pos, Position::new(3, 2));
        assert_eq!(grid.get(pos), Some(0));
        assert_eq!(agents[1].condition(), Some(Condition::Arrested));
    }
}
