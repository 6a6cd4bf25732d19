//! ADP decision model: joint connector assignment and charge rate.
//!
//! Every step a small MILP picks (charger, connector, EV) triples and their
//! charge rates, minimising the energy bought now plus the value-function
//! estimate of the state the decision leaves behind. The future-cost features
//! are written in terms of the decision variables, so the solver sees how its
//! own choices move them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ai::decision::milp::{ConstraintSense, LinearExpr, MilpModel, MilpSolver, SolverError, VarId};
use crate::ai::features::basis::NUM_FEATURES;
use crate::config::const_funcs;
use crate::models::charger::Charger;
use crate::models::ev::Ev;
use crate::utils::logging::{self, DecisionType, OperationCategory};

/// One EV plugged into one connector for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub charger_id: u32,
    pub connector_id: usize,
    pub ev_id: u32,
    pub charge_rate_kw: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub assignments: Vec<Assignment>,
    pub objective: f64,
}

impl Decision {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("charging model at step {step} could not be solved: {source}")]
    Solver {
        step: usize,
        #[source]
        source: SolverError,
    },
    #[error("assignment references unknown charger {0}")]
    UnknownCharger(u32),
    #[error("assignment references unknown EV {0}")]
    UnknownEv(u32),
    #[error("charger {charger_id} has no connector {connector_id}")]
    InvalidConnector { charger_id: u32, connector_id: usize },
}

/// Step-level inputs shared by every candidate triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionContext {
    pub step: usize,
    pub energy_price: f64,
    pub horizon: usize,
    pub step_minutes: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    charger: usize,
    connector: usize,
    ev: usize,
    indicator: VarId,
    rate: VarId,
}

pub fn decide(
    evs: &[Ev],
    chargers: &[Charger],
    context: &DecisionContext,
    weights: &[f64; NUM_FEATURES],
    solver: &dyn MilpSolver,
) -> Result<Decision, DecisionError> {
    let _timing = logging::start_timing(
        "decide",
        OperationCategory::Decision { subcategory: DecisionType::Milp },
    );

    let dt_hours = const_funcs::step_hours(context.step_minutes);
    let mut model = MilpModel::new();
    let mut candidates = Vec::new();

    for (charger_idx, charger) in chargers.iter().enumerate() {
        for connector in 0..charger.connector_count {
            for (ev_idx, ev) in evs.iter().enumerate() {
                if !ev.needs_energy() {
                    continue;
                }
                let indicator = model.add_binary();
                let rate = model.add_continuous(0.0, None);
                candidates.push(Candidate { charger: charger_idx, connector, ev: ev_idx, indicator, rate });
            }
        }
    }

    if candidates.is_empty() {
        debug!(step = context.step, "no EV needs energy, skipping solve");
        return Ok(Decision::empty());
    }

    // C1: one EV per connector, C2: one connector per EV
    let mut per_connector: BTreeMap<(usize, usize), Vec<VarId>> = BTreeMap::new();
    let mut per_ev: BTreeMap<usize, Vec<VarId>> = BTreeMap::new();
    for c in &candidates {
        per_connector.entry((c.charger, c.connector)).or_default().push(c.indicator);
        per_ev.entry(c.ev).or_default().push(c.indicator);
    }
    for indicators in per_connector.values().chain(per_ev.values()) {
        let mut expr = LinearExpr::new();
        for &x in indicators {
            expr.add_term(x, 1.0);
        }
        model.add_constraint(expr, ConstraintSense::LessEqual, 1.0);
    }

    for c in &candidates {
        // C3: rate only flows through an active triple, capped by charger power
        let mut power = LinearExpr::new();
        power
            .add_term(c.rate, 1.0)
            .add_term(c.indicator, -chargers[c.charger].max_power_kw);
        model.add_constraint(power, ConstraintSense::LessEqual, 0.0);

        // C4: no overcharging
        let mut energy = LinearExpr::new();
        energy.add_term(c.rate, dt_hours);
        model.add_constraint(energy, ConstraintSense::LessEqual, evs[c.ev].remaining_energy_kwh);
    }

    model.set_objective(build_objective(evs, chargers, context, weights, &candidates, dt_hours));

    debug!(
        step = context.step,
        candidates = candidates.len(),
        variables = model.num_variables(),
        constraints = model.constraints().len(),
        "solving charging model"
    );

    let values = solver
        .solve(&model)
        .map_err(|source| DecisionError::Solver { step: context.step, source })?;

    let assignments = candidates
        .iter()
        .filter(|c| values[c.indicator] > 0.5)
        .map(|c| {
            let charger = &chargers[c.charger];
            Assignment {
                charger_id: charger.id,
                connector_id: c.connector,
                ev_id: evs[c.ev].id,
                charge_rate_kw: values[c.rate].clamp(0.0, charger.max_power_kw),
            }
        })
        .collect();

    Ok(Decision {
        assignments,
        objective: model.objective().evaluate(&values),
    })
}

/// Immediate energy cost plus `zetas · phi(post-decision state)`.
fn build_objective(
    evs: &[Ev],
    chargers: &[Charger],
    context: &DecisionContext,
    weights: &[f64; NUM_FEATURES],
    candidates: &[Candidate],
    dt_hours: f64,
) -> LinearExpr {
    let [z_bias, z_scheduled, z_available, z_remaining, z_urgency, z_time] = *weights;

    let total_connectors: usize = chargers.iter().map(|c| c.connector_count).sum();
    let total_demand: f64 = evs.iter().map(|ev| ev.remaining_energy_kwh).sum();
    let time = const_funcs::normalized_time(context.step, context.horizon, context.step_minutes);

    let mut objective = LinearExpr::constant(
        z_bias + z_available * total_connectors as f64 + z_remaining * total_demand + z_time * time,
    );

    for c in candidates {
        // scheduled count rises and free connectors drop with every active triple
        objective.add_term(c.indicator, z_scheduled - z_available);
        // energy bought now, and the demand it removes
        objective.add_term(c.rate, context.energy_price * dt_hours - z_remaining * dt_hours);
    }

    // urgency of EVs left unconnected after this step
    for (ev_idx, ev) in evs.iter().enumerate() {
        if ev.departure_step <= context.step {
            continue;
        }
        let urgency = const_funcs::urgency_weight(ev.departure_step, context.step);
        objective.add_constant(z_urgency * urgency);
        for c in candidates.iter().filter(|c| c.ev == ev_idx) {
            objective.add_term(c.indicator, -z_urgency * urgency);
        }
    }

    objective
}
