//! Greedy baseline dispatch rules used for comparison with the ADP policy.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ai::decision::model::Assignment;
use crate::models::charger::Charger;
use crate::models::ev::Ev;
use crate::utils::logging::{self, DecisionType, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicRule {
    /// First come, largest demand
    Fcld,
    /// Earliest departure, largest demand
    Edld,
}

impl HeuristicRule {
    pub fn label(&self) -> &'static str {
        match self {
            HeuristicRule::Fcld => "FCLD",
            HeuristicRule::Edld => "EDLD",
        }
    }

    fn compare(&self, a: &Ev, b: &Ev) -> Ordering {
        let primary = match self {
            HeuristicRule::Fcld => a.arrival_step.cmp(&b.arrival_step),
            HeuristicRule::Edld => a.departure_step.cmp(&b.departure_step),
        };
        primary.then_with(|| b.required_energy_kwh.total_cmp(&a.required_energy_kwh))
    }
}

impl fmt::Display for HeuristicRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeuristicRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fcld" => Ok(HeuristicRule::Fcld),
            "edld" => Ok(HeuristicRule::Edld),
            other => Err(format!("unknown heuristic rule '{}', expected fcld or edld", other)),
        }
    }
}

/// Fills free connectors charger by charger with the next EV in rule order.
///
/// Free connectors are read from the chargers' current occupancy, i.e. the
/// connections made in the previous step. Each EV charges at the lesser of the
/// charger limit and the rate that would finish it within one step.
pub fn solve_heuristic(
    evs: &[Ev],
    chargers: &[Charger],
    rule: HeuristicRule,
    step_hours: f64,
) -> Vec<Assignment> {
    let _timing = logging::start_timing(
        "solve_heuristic",
        OperationCategory::Decision { subcategory: DecisionType::Heuristic },
    );

    let mut queue: Vec<&Ev> = evs.iter().filter(|ev| ev.needs_energy()).collect();
    if queue.is_empty() {
        return Vec::new();
    }
    queue.sort_by(|a, b| rule.compare(a, b));

    let mut allocated = HashSet::new();
    let mut next_in_queue = queue.into_iter();
    let mut assignments = Vec::new();

    for charger in chargers {
        let available = charger.available_connectors();
        for k in 0..available {
            let Some(ev) = next_in_queue.by_ref().find(|ev| !allocated.contains(&ev.id)) else {
                return assignments;
            };
            allocated.insert(ev.id);
            assignments.push(Assignment {
                charger_id: charger.id,
                connector_id: charger.connector_count - available + k,
                ev_id: ev.id,
                charge_rate_kw: charger.max_power_kw.min(ev.remaining_energy_kwh / step_hours),
            });
        }
    }

    assignments
}
