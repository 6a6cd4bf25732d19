use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use adpcharge::ai::decision::milp::GoodLpSolver;
use adpcharge::ai::learning::weights::{CheckpointStore, TrainingState};
use adpcharge::cli::cli::Args;
use adpcharge::config::simulation_config::SimulationConfig;
use adpcharge::core::multi_simulation::{
    prompt_finalize, prompt_session_action, raise_stop, run_session, SessionAction, TrainingSession,
};
use adpcharge::data::scenario::Scenario;
use adpcharge::utils::logging::{self, FileIOType, OperationCategory};

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let _timing = logging::start_timing(
        "load_config",
        OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad },
    );

    let mut config = match args.config() {
        Some(path) => SimulationConfig::load_from_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(dir) = args.checkpoint_dir() {
        config.checkpoints.directory = dir.to_path_buf();
    }
    if let Some(interval) = args.checkpoint_interval() {
        config.checkpoints.interval = interval;
    }
    config.validate()?;
    Ok(config)
}

/// Loads the checkpoint once and picks the action: the explicit `--action`,
/// or the menu when a checkpoint exists.
fn resolve_action(args: &Args, store: &CheckpointStore) -> Result<(SessionAction, Option<TrainingState>)> {
    let checkpoint = store.load().context("Failed to load checkpoint")?;
    let action = match (args.action(), &checkpoint) {
        (Some(action), _) => action,
        (None, Some(state)) => prompt_session_action(state, &mut io::stdin().lock()),
        (None, None) => SessionAction::Continue,
    };
    Ok((action, checkpoint))
}

/// Ctrl+C during training raises `stop`; a second one, e.g. at the
/// finalize prompt, exits.
fn install_interrupt_handler(stop: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        if raise_stop(&stop) {
            std::process::exit(130);
        }
    })
    .context("Failed to install Ctrl+C handler")
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())?;

    println!("⚡ ADP EV Charging Controller");
    println!(
        "Debug logging: {}, Timing: {}",
        if args.debug_logging() { "enabled" } else { "disabled" },
        if args.enable_timing() { "enabled" } else { "disabled" }
    );

    let config = load_config(&args)?;
    let scenario = Scenario::base();
    let store = CheckpointStore::from_config(&config.checkpoints);

    let mut rng = match args.seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // the default SIGINT behaviour stays in place while the startup menu waits
    let (action, checkpoint) = resolve_action(&args, &store)?;
    info!(%action, seed = ?args.seed(), "starting session");

    let stop = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&stop))?;

    let session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: args.baseline(),
        report_dir: args.report_dir().map(|dir| dir.to_path_buf()),
        max_iterations: args.max_iterations(),
        show_progress: args.show_progress(),
    };

    run_session(&session, action, checkpoint, &mut rng, &stop, |state| {
        prompt_finalize(state, &mut io::stdin().lock())
    })?;

    if logging::is_timing_enabled() {
        logging::print_timing_report();
    }

    Ok(())
}
