use crate::ai::decision::model::{Assignment, DecisionError};
use crate::models::charger::Charger;
use crate::models::ev::Ev;

/// Energy and money moved by one step's assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepDelivery {
    pub energy_kwh: f64,
    pub cost: f64,
}

/// Plugs the EV into its connector and transfers `rate · Δt`, clamped to what
/// the EV still needs. Returns the energy delivered.
pub fn apply_assignment(
    evs: &mut [Ev],
    chargers: &mut [Charger],
    assignment: &Assignment,
    step_hours: f64,
) -> Result<f64, DecisionError> {
    let charger = chargers
        .iter_mut()
        .find(|c| c.id == assignment.charger_id)
        .ok_or(DecisionError::UnknownCharger(assignment.charger_id))?;
    let ev = evs
        .iter_mut()
        .find(|ev| ev.id == assignment.ev_id)
        .ok_or(DecisionError::UnknownEv(assignment.ev_id))?;

    if !charger.connect(assignment.connector_id, ev.id) {
        return Err(DecisionError::InvalidConnector {
            charger_id: charger.id,
            connector_id: assignment.connector_id,
        });
    }

    let delivered = ev.deliver(assignment.charge_rate_kw * step_hours);
    ev.assign(charger.id, assignment.connector_id);
    Ok(delivered)
}

/// Clears every connector map, then applies the assignments in order.
pub fn apply_assignments(
    evs: &mut [Ev],
    chargers: &mut [Charger],
    assignments: &[Assignment],
    step_hours: f64,
    energy_price: f64,
) -> Result<StepDelivery, DecisionError> {
    for charger in chargers.iter_mut() {
        charger.reset_connections();
    }

    let mut delivery = StepDelivery::default();
    for assignment in assignments {
        let energy = apply_assignment(evs, chargers, assignment, step_hours)?;
        delivery.energy_kwh += energy;
        delivery.cost += energy * energy_price;
    }
    Ok(delivery)
}
