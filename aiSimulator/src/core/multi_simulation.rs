use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing::{info, warn};

use crate::ai::decision::heuristics::HeuristicRule;
use crate::ai::decision::milp::MilpSolver;
use crate::ai::learning::weights::diagnostics::format_weights;
use crate::ai::learning::weights::{CheckpointStore, TrainingState};
use crate::analysis::metrics_calculation::{build_comparison_report, ComparisonReport};
use crate::analysis::reporting::{format_iteration_line, print_comparison};
use crate::config::constants::PROGRESS_REFRESH_ITERATIONS;
use crate::config::simulation_config::SimulationConfig;
use crate::core::iteration::run_iteration;
use crate::data::scenario::Scenario;
use crate::utils::csv_export::CsvExporter;

/// What to do with an existing checkpoint at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Resume from the checkpoint
    Continue,
    /// Erase stored checkpoints and train from the initial weights
    Restart,
    /// Skip training and report with the stored weights
    Finalize,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionAction::Continue => "continue",
            SessionAction::Restart => "restart",
            SessionAction::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

impl FromStr for SessionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "continue" => Ok(SessionAction::Continue),
            "r" | "restart" => Ok(SessionAction::Restart),
            "f" | "finalize" => Ok(SessionAction::Finalize),
            other => Err(format!("unknown session action '{}', expected continue, restart or finalize", other)),
        }
    }
}

/// Why a training loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// The stop flag was raised
    Interrupted,
    /// The iteration cap was reached
    Completed,
}

/// Everything a session needs, borrowed from the caller.
pub struct TrainingSession<'a> {
    pub config: &'a SimulationConfig,
    pub scenario: &'a Scenario,
    pub store: &'a CheckpointStore,
    pub solver: &'a dyn MilpSolver,
    pub baseline: HeuristicRule,
    /// Parent directory for CSV reports; `None` skips them
    pub report_dir: Option<PathBuf>,
    /// Iterations to run in this session; `None` runs until interrupted
    pub max_iterations: Option<u64>,
    pub show_progress: bool,
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub state: TrainingState,
    /// `None` when the session went straight to the report
    pub training: Option<TrainingOutcome>,
    pub report: Option<ComparisonReport>,
}

fn progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

impl<'a> TrainingSession<'a> {
    /// Picks the starting state for `action` given what was found on disk.
    ///
    /// Returns the state and whether to skip training.
    pub fn initial_state(
        &self,
        action: SessionAction,
        checkpoint: Option<TrainingState>,
    ) -> Result<(TrainingState, bool)> {
        let fresh = || TrainingState::from_config(&self.config.learning);
        match (action, checkpoint) {
            (SessionAction::Continue, Some(state)) => {
                println!("▶️  Resuming from iteration {}", state.iteration);
                state.print_summary();
                Ok((state, false))
            }
            (SessionAction::Finalize, Some(state)) => {
                state.print_summary();
                Ok((state, true))
            }
            (SessionAction::Finalize, None) => {
                warn!("no checkpoint found, reporting with the initial weights");
                Ok((fresh(), true))
            }
            (SessionAction::Restart, _) => {
                self.store.clear().context("Failed to clear checkpoints for restart")?;
                println!("🆕 Starting a new training run from scratch");
                Ok((fresh(), false))
            }
            (SessionAction::Continue, None) => {
                println!("🆕 No checkpoint found, starting a new training run");
                Ok((fresh(), false))
            }
        }
    }

    /// Trains until the stop flag is raised or the iteration cap is reached.
    ///
    /// The flag is only checked between iterations. A checkpoint is written
    /// every `checkpoints.interval` iterations and again on the way out when
    /// the last one is stale.
    pub fn train<R: Rng + ?Sized>(
        &self,
        state: &mut TrainingState,
        rng: &mut R,
        stop: &AtomicBool,
    ) -> Result<TrainingOutcome> {
        let interval = self.config.checkpoints.interval.max(1);
        let start_iteration = state.iteration;
        let mut last_saved = state.iteration;

        println!("🚀 Training started (Ctrl+C to pause)");
        let progress = progress_bar(self.show_progress);

        let outcome = loop {
            if stop.load(Ordering::SeqCst) {
                break TrainingOutcome::Interrupted;
            }
            if let Some(max) = self.max_iterations {
                if state.iteration - start_iteration >= max {
                    break TrainingOutcome::Completed;
                }
            }

            let update = run_iteration(state, self.scenario, self.config, self.solver, rng)
                .with_context(|| format!("Training iteration {} failed", state.iteration + 1))?;

            if update.iteration % interval == 0 {
                self.store
                    .save(state)
                    .with_context(|| format!("Failed to save checkpoint at iteration {}", update.iteration))?;
                last_saved = update.iteration;
                info!(iteration = update.iteration, "checkpoint saved");
            }

            progress.set_message(format_iteration_line(&update));
            if update.iteration % PROGRESS_REFRESH_ITERATIONS == 0 {
                progress.tick();
            }
        };
        progress.finish_and_clear();

        if state.iteration != last_saved {
            self.store
                .save(state)
                .with_context(|| format!("Failed to save checkpoint at iteration {}", state.iteration))?;
        }

        match outcome {
            TrainingOutcome::Interrupted => {
                println!("\n⏸️  Training paused at iteration {}", state.iteration);
                println!("State saved to {}", self.store.directory().display());
            }
            TrainingOutcome::Completed => {
                println!(
                    "✅ Finished {} iterations, now at iteration {}",
                    state.iteration - start_iteration,
                    state.iteration
                );
            }
        }
        info!(iteration = state.iteration, zetas = %format_weights(&state.zetas), ?outcome, "training stopped");
        Ok(outcome)
    }

    /// Evaluates the current weights against the baseline, prints the
    /// comparison and writes the CSV report when a directory is configured.
    pub fn finalize(&self, state: &TrainingState) -> Result<ComparisonReport> {
        println!("\n📋 Generating final report...");
        let report = build_comparison_report(state, self.scenario, self.config, self.solver, self.baseline)
            .context("Evaluation day failed")?;
        print_comparison(&report, self.config);

        if let Some(dir) = &self.report_dir {
            let exporter = CsvExporter::new(dir)?;
            exporter.export_report(&report, self.config)?;
            println!("📁 Report saved to {}", exporter.output_dir().display());
        }
        Ok(report)
    }
}

/// Applies `action` to the checkpoint the caller loaded, trains and reports.
///
/// After an interrupt `finalize_after_interrupt` decides whether the report
/// is produced; a session that reaches its iteration cap always reports.
pub fn run_session<R, F>(
    session: &TrainingSession<'_>,
    action: SessionAction,
    checkpoint: Option<TrainingState>,
    rng: &mut R,
    stop: &AtomicBool,
    finalize_after_interrupt: F,
) -> Result<SessionOutcome>
where
    R: Rng + ?Sized,
    F: FnOnce(&TrainingState) -> bool,
{
    let (mut state, finalize_now) = session.initial_state(action, checkpoint)?;

    if finalize_now {
        let report = session.finalize(&state)?;
        return Ok(SessionOutcome { state, training: None, report: Some(report) });
    }

    let outcome = session.train(&mut state, rng, stop)?;
    let report = match outcome {
        TrainingOutcome::Completed => Some(session.finalize(&state)?),
        TrainingOutcome::Interrupted if finalize_after_interrupt(&state) => Some(session.finalize(&state)?),
        TrainingOutcome::Interrupted => {
            println!("👋 Goodbye! Run again to resume training.");
            None
        }
    };

    Ok(SessionOutcome { state, training: Some(outcome), report })
}

/// Raises the stop flag. Returns `true` when it was already raised, which a
/// Ctrl+C handler takes as a request to exit.
pub fn raise_stop(stop: &AtomicBool) -> bool {
    stop.swap(true, Ordering::SeqCst)
}

/// One trimmed line, or `None` once the input is exhausted.
fn read_choice(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(e) => {
            warn!("failed to read from stdin: {}", e);
            None
        }
    }
}

/// Asks what to do with an existing checkpoint until the answer is valid.
///
/// Closed input continues training; only an explicit choice restarts.
pub fn prompt_session_action(state: &TrainingState, input: &mut impl BufRead) -> SessionAction {
    println!("\n======================================================");
    println!("CHECKPOINT FOUND");
    println!("======================================================");
    println!("Iteration: {}", state.iteration);
    println!("Latest weights: {}", format_weights(&state.zetas));
    println!("------------------------------------------------------");
    println!("  [C] Continue training");
    println!("  [R] Restart (erase checkpoints and start from scratch)");
    println!("  [F] Finalize now (report with the learned weights)");

    loop {
        print!("Choice (C/R/F): ");
        let _ = io::stdout().flush();

        let Some(choice) = read_choice(input) else {
            println!();
            warn!("no answer on stdin, continuing from the checkpoint");
            return SessionAction::Continue;
        };
        match choice.parse() {
            Ok(action) => return action,
            Err(_) => println!("Please enter C, R or F."),
        }
    }
}

/// After an interrupt: `true` to produce the report, `false` to exit.
pub fn prompt_finalize(state: &TrainingState, input: &mut impl BufRead) -> bool {
    println!("Training paused at iteration {}.", state.iteration);
    print!("[F]inalize and report, or [S]top here? (F/S): ");
    let _ = io::stdout().flush();

    read_choice(input).is_some_and(|choice| choice.eq_ignore_ascii_case("f"))
}
