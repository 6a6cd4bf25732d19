//! Tracing setup and a lightweight per-function profiler.
//!
//! `start_timing` returns a guard that, when timing is enabled, records the
//! elapsed time on drop into process-wide histograms keyed by function name
//! and by [`OperationCategory`]. Nested guards also remember their caller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};
use tracing_timing::{Builder, Histogram};

const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;
const NS_PER_MS: f64 = 1_000_000.0;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum OperationCategory {
    Simulation,
    Decision { subcategory: DecisionType },
    WeightsUpdate { subcategory: WeightsUpdateType },
    FileIO { subcategory: FileIOType },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum DecisionType {
    Milp,
    Heuristic,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum WeightsUpdateType {
    Regression,
    Smoothing,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum FileIOType {
    CheckpointSave,
    CheckpointLoad,
    ConfigLoad,
    ReportSave,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationCategory::Simulation => f.write_str("Simulation"),
            OperationCategory::Decision { subcategory } => {
                let kind = match subcategory {
                    DecisionType::Milp => "MILP",
                    DecisionType::Heuristic => "Heuristic",
                };
                write!(f, "Decision / {}", kind)
            }
            OperationCategory::WeightsUpdate { subcategory } => {
                let kind = match subcategory {
                    WeightsUpdateType::Regression => "Regression",
                    WeightsUpdateType::Smoothing => "Smoothing",
                };
                write!(f, "Weights / {}", kind)
            }
            OperationCategory::FileIO { subcategory } => {
                let kind = match subcategory {
                    FileIOType::CheckpointSave => "Checkpoint Save",
                    FileIOType::CheckpointLoad => "Checkpoint Load",
                    FileIOType::ConfigLoad => "Config Load",
                    FileIOType::ReportSave => "Report Save",
                };
                write!(f, "File I/O / {}", kind)
            }
            OperationCategory::Other => f.write_str("Other"),
        }
    }
}

/// Accumulated calls of one timed function.
struct FunctionStats {
    total: Duration,
    calls: u64,
    callers: Vec<&'static str>,
    histogram: Option<Histogram<u64>>,
}

impl FunctionStats {
    fn new() -> Self {
        Self { total: Duration::ZERO, calls: 0, callers: Vec::new(), histogram: new_histogram() }
    }
}

thread_local! {
    static CALL_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTIONS: Mutex<HashMap<&'static str, FunctionStats>> = Mutex::new(HashMap::new());
    static ref CATEGORIES: Mutex<HashMap<OperationCategory, Histogram<u64>>> = Mutex::new(HashMap::new());
}

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3).ok()
}

/// Records on drop; does nothing when timing was off at creation.
pub struct TimingGuard {
    name: &'static str,
    category: OperationCategory,
    start: Option<Instant>,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            record(self.name, self.category, start.elapsed());
        }
    }
}

pub fn start_timing(name: &'static str, category: OperationCategory) -> TimingGuard {
    let start = if is_timing_enabled() {
        CALL_STACK.with(|stack| stack.borrow_mut().push(name));
        Some(Instant::now())
    } else {
        None
    };
    TimingGuard { name, category, start }
}

fn record(name: &'static str, category: OperationCategory, elapsed: Duration) {
    let caller = CALL_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();
        stack.last().copied()
    });
    let nanos = (elapsed.as_nanos() as u64).clamp(1, HISTOGRAM_MAX_NS);

    {
        let mut functions = FUNCTIONS.lock();
        let stats = functions.entry(name).or_insert_with(FunctionStats::new);
        stats.total += elapsed;
        stats.calls += 1;
        if let Some(caller) = caller {
            if !stats.callers.contains(&caller) {
                stats.callers.push(caller);
            }
        }
        if let Some(histogram) = stats.histogram.as_mut() {
            let _ = histogram.record(nanos);
        }
    }

    let mut categories = CATEGORIES.lock();
    if !categories.contains_key(&category) {
        match new_histogram() {
            Some(histogram) => {
                categories.insert(category, histogram);
            }
            None => return,
        }
    }
    if let Some(histogram) = categories.get_mut(&category) {
        let _ = histogram.record(nanos);
    }
}

/// Installs the global subscriber. `adpcharge` logs at debug level when
/// `debug_logging` is set; `RUST_LOG` directives still apply.
pub fn init_logging(enable_timing: bool, debug_logging: bool) -> anyhow::Result<()> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_directive = if debug_logging { "adpcharge=debug" } else { "adpcharge=info" };
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive(crate_directive.parse().context("invalid log directive")?);

    let timing_layer = enable_timing.then(|| {
        Builder::default().layer(|| {
            Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3)
                .expect("histogram bounds are constant and valid")
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .with(timing_layer)
        .try_init()
        .context("failed to set up tracing subscriber")?;

    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\n⏱️  Timing Report");
    println!("========================================");

    let functions = FUNCTIONS.lock();
    let mut by_total: Vec<_> = functions.iter().collect();
    by_total.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    println!("By function (slowest total first):");
    for (name, stats) in by_total {
        let mean_ms = stats.total.as_secs_f64() * 1000.0 / stats.calls.max(1) as f64;
        let p95_ms = stats
            .histogram
            .as_ref()
            .map_or(0.0, |h| h.value_at_quantile(0.95) as f64 / NS_PER_MS);
        println!(
            "  {:<28} calls={:<8} total={:>9.3}s mean={:>9.3}ms p95={:>9.3}ms",
            name,
            stats.calls,
            stats.total.as_secs_f64(),
            mean_ms,
            p95_ms
        );
        if !stats.callers.is_empty() {
            println!("    called by: {}", stats.callers.join(", "));
        }
    }

    let categories = CATEGORIES.lock();
    let category_total_ns: f64 = categories.values().map(|h| h.mean() * h.len() as f64).sum();
    let mut by_share: Vec<_> = categories.iter().collect();
    by_share.sort_by(|a, b| {
        let total_a = a.1.mean() * a.1.len() as f64;
        let total_b = b.1.mean() * b.1.len() as f64;
        total_b.total_cmp(&total_a)
    });

    println!("By category:");
    for (category, histogram) in by_share {
        let total_ns = histogram.mean() * histogram.len() as f64;
        let share = if category_total_ns > 0.0 { total_ns / category_total_ns * 100.0 } else { 0.0 };
        println!(
            "  {:<28} {:>5.1}%  mean={:.3}ms p99={:.3}ms count={}",
            category.to_string(),
            share,
            histogram.mean() / NS_PER_MS,
            histogram.value_at_quantile(0.99) as f64 / NS_PER_MS,
            histogram.len()
        );
    }
    println!("========================================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        let milp = OperationCategory::Decision { subcategory: DecisionType::Milp };
        assert_eq!(milp.to_string(), "Decision / MILP");
        let save = OperationCategory::FileIO { subcategory: FileIOType::CheckpointSave };
        assert_eq!(save.to_string(), "File I/O / Checkpoint Save");
    }

    #[test]
    fn guard_is_inert_when_timing_disabled() {
        let guard = start_timing("noop", OperationCategory::Other);
        assert!(guard.start.is_none());
    }
}
