use crate::ai::features::basis::FEATURE_NAMES;
use crate::ai::learning::weights::IterationUpdate;
use crate::ai::learning::weights::diagnostics::format_weights;
use crate::config::simulation_config::SimulationConfig;
use super::metrics_calculation::{ComparisonReport, StrategySummary};

fn print_strategy(summary: &StrategySummary) {
    println!("{}:", summary.label);
    println!("  Total Cost: ${:.2}", summary.total_cost);
    println!("    Energy: ${:.2}", summary.energy_cost);
    println!("    Penalties: ${:.2}", summary.penalty_cost);
    println!("  Delivered: {:.2} kWh", summary.delivered_energy_kwh);
    println!("  Service Level: {:.2}%", summary.service_level);
    println!("  Peak Step Load: {:.2} kWh", summary.peak_load_kwh);
    println!("  Energy in Peak Window: {:.2} kWh", summary.peak_window_energy_kwh);
    println!("  Mean Decision Time: {:.3} ms", summary.mean_decision_latency_ms);
}

pub fn print_comparison(report: &ComparisonReport, config: &SimulationConfig) {
    println!("\n📈 Evaluation after {} training iterations", report.iteration);
    println!("----------------------------------------");
    print_strategy(&report.adp_summary(config));
    print_strategy(&report.baseline_summary(config));
    println!("----------------------------------------");
    match report.cost_savings_percent() {
        Some(savings) if savings >= 0.0 => {
            println!("ADP saves {:.2}% against {}", savings, report.baseline_rule)
        }
        Some(savings) => println!("ADP costs {:.2}% more than {}", -savings, report.baseline_rule),
        None => println!("{} day cost nothing, no savings to report", report.baseline_rule),
    }
    println!("Final weights:");
    for (name, weight) in FEATURE_NAMES.iter().zip(report.zetas.iter()) {
        println!("  {:<10} {:>12.4}", name, weight);
    }
    println!("----------------------------------------");
}

/// One line per progress refresh while training.
pub fn format_iteration_line(update: &IterationUpdate) -> String {
    format!(
        "iter {} | day cost ${:.2} | zetas {}",
        update.iteration,
        update.day_cost,
        format_weights(&update.zetas)
    )
}
