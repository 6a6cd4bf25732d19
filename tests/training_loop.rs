mod common;

use std::sync::atomic::AtomicBool;

use adpcharge::ai::decision::heuristics::HeuristicRule;
use adpcharge::ai::decision::milp::GoodLpSolver;
use adpcharge::ai::learning::weights::TrainingState;
use adpcharge::core::multi_simulation::{run_session, SessionAction, TrainingOutcome, TrainingSession};
use adpcharge::core::simulation::{run_day, DayMode, Strategy};
use adpcharge::data::scenario::Scenario;
use adpcharge::models::ev::Ev;
use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{short_day_config, store_in, tempdir};

#[test]
fn training_day_features_stay_in_range() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 96, 500);
    let scenario = Scenario::base();
    let mut rng = StdRng::seed_from_u64(21);

    let day = run_day(
        &Strategy::Adp(config.learning.initial_weights),
        DayMode::Training,
        &scenario,
        &config,
        &GoodLpSolver,
        &mut rng,
    )
    .unwrap();

    assert_eq!(day.feature_history.len(), 96);
    assert_eq!(day.step_costs.len(), 96);
    for phi in &day.feature_history {
        assert_eq!(phi.bias, 1.0);
        assert!(phi.available >= 0.0 && phi.available <= scenario.total_connectors() as f64);
        assert!(phi.scheduled >= 0.0);
        assert!(phi.remaining >= 0.0);
        assert!(phi.urgency >= 0.0);
        assert!((0.0..1.0).contains(&phi.time));
    }
    assert!(day.delivered_energy_kwh <= day.requested_energy_kwh + 1e-6);
}

#[test]
fn missed_departure_costs_the_penalty_rate() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 4, 500);
    let scenario = Scenario {
        chargers: Vec::new(),
        initial_evs: vec![Ev::new(1, 0, 2, 5.0)],
        scheduled_arrivals: Vec::new(),
    };
    let mut rng = StdRng::seed_from_u64(0);

    let day = run_day(&Strategy::Fcld, DayMode::Evaluation, &scenario, &config, &GoodLpSolver, &mut rng).unwrap();
    assert_eq!(day.step_costs[2], 1000.0);
}

#[test]
fn capped_session_trains_checkpoints_and_reports() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 12, 2);
    let scenario = Scenario::base();
    let store = store_in(&config);
    let session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: HeuristicRule::Edld,
        report_dir: Some(dir.path().join("reports")),
        max_iterations: Some(4),
        show_progress: false,
    };
    let mut rng = StdRng::seed_from_u64(3);

    let checkpoint = store.load().unwrap();
    let outcome = run_session(&session, SessionAction::Continue, checkpoint, &mut rng, &AtomicBool::new(false), |_| {
        panic!("not interrupted")
    })
    .unwrap();

    assert_eq!(outcome.training, Some(TrainingOutcome::Completed));
    assert_eq!(outcome.state.iteration, 4);
    assert_eq!(outcome.state.history.len(), 4);
    assert!(outcome.report.is_some());
    assert_eq!(store.snapshot_files().unwrap().len(), 2);
    assert_eq!(store.load().unwrap().unwrap(), outcome.state);

    let report_runs: Vec<_> = std::fs::read_dir(dir.path().join("reports")).unwrap().collect();
    assert_eq!(report_runs.len(), 1);
}

#[test]
fn second_session_resumes_where_the_first_stopped() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 8, 500);
    let scenario = Scenario::base();
    let store = store_in(&config);
    let mut session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: HeuristicRule::Fcld,
        report_dir: None,
        max_iterations: Some(2),
        show_progress: false,
    };
    let stop = AtomicBool::new(false);

    let first = run_session(
        &session,
        SessionAction::Continue,
        store.load().unwrap(),
        &mut StdRng::seed_from_u64(1),
        &stop,
        |_| false,
    )
    .unwrap();
    session.max_iterations = Some(3);
    let second = run_session(
        &session,
        SessionAction::Continue,
        store.load().unwrap(),
        &mut StdRng::seed_from_u64(2),
        &stop,
        |_| false,
    )
    .unwrap();

    assert_eq!(first.state.iteration, 2);
    assert_eq!(second.state.iteration, 5);
    assert_eq!(&second.state.history[..2], &first.state.history[..]);
    assert_eq!(second.state.history[2], first.state.zetas);
}

#[test]
fn interrupted_session_saves_and_may_skip_the_report() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 8, 500);
    let scenario = Scenario::base();
    let store = store_in(&config);
    store
        .save(&TrainingState { iteration: 7, zetas: [0.5; 6], history: vec![[0.0; 6]; 7] })
        .unwrap();
    let session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: HeuristicRule::Edld,
        report_dir: None,
        max_iterations: None,
        show_progress: false,
    };

    let mut asked = false;
    let outcome = run_session(
        &session,
        SessionAction::Continue,
        store.load().unwrap(),
        &mut StdRng::seed_from_u64(9),
        &AtomicBool::new(true),
        |state| {
            asked = true;
            assert_eq!(state.iteration, 7);
            false
        },
    )
    .unwrap();

    assert!(asked);
    assert_eq!(outcome.training, Some(TrainingOutcome::Interrupted));
    assert!(outcome.report.is_none());
    assert_eq!(outcome.state.zetas, [0.5; 6]);
}

#[test]
fn finalize_reports_without_training() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 96, 500);
    let scenario = Scenario::base();
    let store = store_in(&config);
    let trained = TrainingState { iteration: 3, zetas: [0.0, 0.0, 0.0, 10.0, 0.0, 0.0], history: vec![[0.0; 6]; 3] };
    store.save(&trained).unwrap();
    let session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: HeuristicRule::Edld,
        report_dir: None,
        max_iterations: None,
        show_progress: false,
    };

    let outcome = run_session(
        &session,
        SessionAction::Finalize,
        store.load().unwrap(),
        &mut StdRng::seed_from_u64(0),
        &AtomicBool::new(false),
        |_| true,
    )
    .unwrap();

    assert_eq!(outcome.training, None);
    assert_eq!(outcome.state, trained);
    let report = outcome.report.unwrap();
    assert_eq!(report.iteration, 3);
    assert_eq!(report.baseline.requested_energy_kwh, 145.0);
    assert!((report.baseline.service_level() - 100.0).abs() < 1e-6);
}

#[test]
fn session_uses_the_checkpoint_it_is_given() {
    let dir = tempdir();
    let config = short_day_config(dir.path(), 8, 500);
    let scenario = Scenario::base();
    let store = store_in(&config);
    let session = TrainingSession {
        config: &config,
        scenario: &scenario,
        store: &store,
        solver: &GoodLpSolver,
        baseline: HeuristicRule::Edld,
        report_dir: None,
        max_iterations: Some(1),
        show_progress: false,
    };
    // nothing on disk; the caller's copy is what the menu showed
    let shown = TrainingState { iteration: 40, zetas: [0.25; 6], history: vec![[0.0; 6]; 40] };

    let outcome = run_session(
        &session,
        SessionAction::Continue,
        Some(shown),
        &mut StdRng::seed_from_u64(4),
        &AtomicBool::new(false),
        |_| false,
    )
    .unwrap();

    assert_eq!(outcome.state.iteration, 41);
    assert_eq!(outcome.state.history.len(), 41);
    assert_eq!(store.load().unwrap().unwrap().iteration, 41);
}
