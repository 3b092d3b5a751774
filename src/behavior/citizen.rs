//! Citizen decision rule.
//!
//! Summary: if grievance minus perceived risk exceeds the threshold (lowered
//! by population-wide unemployment and corruption), rebel. Corrupted and
//! honest citizens spread their moral state to quiescent susceptible
//! neighbours, and jobs are lost or found in proportion to corruption and
//! honesty saturation.

use super::perception::{arrest_probability, Neighborhood, Sightings};
use super::StepContext;
use crate::agent::{AgentId, Condition, MoralState};
use rand::seq::SliceRandom;
use rand::Rng;

/// Extra corruption chance when the target has no job
const UNEMPLOYED_CORRUPTION_BONUS: f64 = 0.07;
/// Chance that a corrupted citizen hands its target a neighbour's job
const JOB_SWAP_PROBABILITY: f64 = 0.06;

/// Run one tick for citizen `id`
pub fn step(ctx: &mut StepContext<'_>, id: AgentId) {
    if serve_sentence(ctx, id) {
        return;
    }

    let view = Neighborhood::perceive(ctx.grid, ctx.agents[id].pos);
    let seen = view.sightings(ctx.agents);

    update_arrest_probability(ctx, id, &seen);
    update_regime_legitimacy(ctx, id);
    update_employment_status(ctx, id);
    decide_rebellion(ctx, id);

    if ctx.config.run.movement {
        ctx.move_randomly(id, &view.empty_cells);
    }

    spread_corruption(ctx, id, &view);
    spread_honesty(ctx, id, &view);
    churn_employment(ctx, id);
}

/// Decrement a running sentence. Returns true if the citizen is jailed and
/// does nothing else this tick.
fn serve_sentence(ctx: &mut StepContext<'_>, id: AgentId) -> bool {
    let Some(me) = ctx.citizen_mut(id) else {
        return true;
    };
    if me.jail_sentence == 0 {
        return false;
    }
    me.jail_sentence -= 1;
    if me.jail_sentence == 0 {
        ctx.census.invalidate();
    }
    true
}

fn update_arrest_probability(ctx: &mut StepContext<'_>, id: AgentId, seen: &Sightings) {
    let constant = ctx.config.regime.arrest_prob_constant;
    // the citizen counts herself among the actives
    let p = arrest_probability(constant, seen.cops, seen.active_rebels + 1);
    if let Some(me) = ctx.citizen_mut(id) {
        me.arrest_probability = Some(p);
    }
}

/// Perceived legitimacy drops with unemployment and corruption among free
/// citizens. Corrupted citizens keep their estimate. Grievance is left as is.
fn update_regime_legitimacy(ctx: &mut StepContext<'_>, id: AgentId) {
    let eligible = ctx
        .citizen(id)
        .is_some_and(|me| me.moral_state != MoralState::Corrupted && !me.is_jailed());
    if !eligible {
        return;
    }

    let free = ctx.census().free;
    let weight = ctx.rng.gen_range(0.3..0.4);
    if let Some(me) = ctx.citizen_mut(id) {
        me.regime_legitimacy =
            me.legitimacy - weight * (free.unemployed_saturation() + free.corrupted_saturation());
    }
}

/// Employment re-check. The rule only re-asserts employment for citizens
/// who already hold a job, so it never changes anything.
fn update_employment_status(ctx: &mut StepContext<'_>, id: AgentId) {
    if let Some(me) = ctx.citizen_mut(id) {
        if me.is_employed && (me.condition == Condition::Active || me.is_jailed()) {
            me.is_employed = true;
        }
    }
}

fn decide_rebellion(ctx: &mut StepContext<'_>, id: AgentId) {
    let all = ctx.census().all;
    let w_unemployment = ctx.rng.gen_range(0.03..0.43);
    let w_corruption = ctx.rng.gen_range(0.01..0.03);
    let total_contribution =
        w_unemployment * all.unemployed_saturation() + w_corruption * all.corrupted_saturation();

    let Some(me) = ctx.citizen_mut(id) else {
        return;
    };
    let net_risk = me.risk_aversion * me.arrest_probability.unwrap_or(0.0);
    let drive = me.grievance - net_risk;
    let bar = me.threshold - total_contribution;

    let next = match me.condition {
        Condition::Quiescent if drive > bar => Condition::Active,
        Condition::Active if drive <= bar => Condition::Quiescent,
        unchanged => unchanged,
    };
    if next != me.condition {
        me.condition = next;
        ctx.census.invalidate();
    }
}

/// A corrupted citizen with more than one neighbour may corrupt one
/// quiescent susceptible neighbour; unemployed targets are easier. A
/// successful attempt can also move a job from an employed, uncorrupted
/// neighbour to an unemployed target.
fn spread_corruption(ctx: &mut StepContext<'_>, id: AgentId, view: &Neighborhood) {
    let Some(me) = ctx.citizen(id) else {
        return;
    };
    if me.moral_state != MoralState::Corrupted || view.len() <= 1 {
        return;
    }
    let base_prop = me.corruption_transmission_prop;

    let targets = view.contagion_targets(ctx.agents);
    let job_holders = view.employed_uncorrupted(ctx.agents);
    if targets.is_empty() {
        return;
    }

    let corr_prop = base_prop * ctx.rng.gen_range(0.001..0.1);
    let Some(&target) = targets.choose(&mut *ctx.rng) else {
        return;
    };
    let target_employed = ctx.citizen(target).is_some_and(|c| c.is_employed);
    let chance = if target_employed {
        corr_prop
    } else {
        corr_prop + UNEMPLOYED_CORRUPTION_BONUS
    };
    if ctx.rng.gen::<f64>() >= chance {
        return;
    }

    let max_saturation = ctx.config.contagion.max_corruption_saturation;
    if ctx.census().all.corrupted_saturation() < max_saturation {
        if let Some(t) = ctx.citizen_mut(target) {
            t.moral_state = MoralState::Corrupted;
        }
        ctx.census.invalidate();
        log::trace!("citizen {} corrupted citizen {}", id, target);
    }

    if !job_holders.is_empty() && ctx.rng.gen::<f64>() < JOB_SWAP_PROBABILITY && !target_employed {
        let Some(&victim) = job_holders.choose(&mut *ctx.rng) else {
            return;
        };
        if let Some(v) = ctx.citizen_mut(victim) {
            v.is_employed = false;
        }
        if let Some(t) = ctx.citizen_mut(target) {
            t.is_employed = true;
        }
        ctx.census.invalidate();
        log::trace!("citizen {} moved a job from {} to {}", id, victim, target);
    }
}

/// An honest citizen with more than one neighbour may convert one quiescent
/// susceptible neighbour while honesty saturation is below its cap.
fn spread_honesty(ctx: &mut StepContext<'_>, id: AgentId, view: &Neighborhood) {
    let Some(me) = ctx.citizen(id) else {
        return;
    };
    if me.moral_state != MoralState::Honest || view.len() <= 1 {
        return;
    }
    let base_prop = me.honest_transmission_prop;

    let targets = view.contagion_targets(ctx.agents);
    let Some(&target) = targets.choose(&mut *ctx.rng) else {
        return;
    };
    let honest_prop = base_prop * ctx.rng.gen_range(0.01..0.1);
    if ctx.rng.gen::<f64>() >= honest_prop {
        return;
    }

    let max_saturation = ctx.config.contagion.max_honest_saturation;
    if ctx.census().all.honest_saturation() < max_saturation {
        if let Some(t) = ctx.citizen_mut(target) {
            t.moral_state = MoralState::Honest;
        }
        ctx.census.invalidate();
        log::trace!("citizen {} converted citizen {} to honesty", id, target);
    }
}

/// Employed citizens lose their job with a chance scaled by corruption
/// saturation (while unemployment among free citizens is below its cap);
/// unemployed citizens find one with a chance scaled by honesty saturation.
fn churn_employment(ctx: &mut StepContext<'_>, id: AgentId) {
    let Some(employed) = ctx.citizen(id).map(|c| c.is_employed) else {
        return;
    };
    let census = ctx.census();

    let flips = if employed {
        if census.free.unemployed_saturation() >= ctx.config.contagion.max_unemployed_saturation {
            return;
        }
        let draw: f64 = ctx.rng.gen();
        draw < ctx.rng.gen_range(0.0..0.09) * census.all.corrupted_saturation()
    } else {
        let draw: f64 = ctx.rng.gen();
        draw < ctx.rng.gen_range(0.0..0.009) * census.all.honest_saturation()
    };

    if flips {
        if let Some(me) = ctx.citizen_mut(id) {
            me.is_employed = !employed;
        }
        ctx.census.invalidate();
    }
}
