use crate::config::constants::*;

pub fn step_hours(step_minutes: f64) -> f64 {
    step_minutes / MINUTES_PER_HOUR
}

pub fn hour_of_step(step: usize, step_minutes: f64) -> f64 {
    (step as f64 * step_minutes) / MINUTES_PER_HOUR
}

/// Normalised time of day in [0, 1).
pub fn normalized_time(step: usize, horizon: usize, step_minutes: f64) -> f64 {
    let total_minutes = horizon as f64 * step_minutes;
    if total_minutes <= 0.0 {
        return 0.0;
    }
    (step as f64 * step_minutes) / total_minutes
}

pub fn urgency_weight(departure_step: usize, current_step: usize) -> f64 {
    let time_remaining = departure_step as f64 - current_step as f64;
    1.0 / time_remaining.max(MIN_TIME_TO_DEPARTURE)
}

pub fn service_level_percent(delivered_kwh: f64, requested_kwh: f64) -> f64 {
    if requested_kwh > 0.0 {
        delivered_kwh / requested_kwh * 100.0
    } else {
        100.0
    }
}
