// Time Constants
pub const HORIZON_STEPS: usize = 96;                 // 24h at 15 min resolution
pub const STEP_MINUTES: f64 = 15.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

// Tariff Constants
pub const OFFPEAK_PRICE: f64 = 0.15;                 // $/kWh
pub const PEAK_PRICE: f64 = 0.50;                    // $/kWh
pub const PEAK_START_HOUR: f64 = 17.0;
pub const PEAK_END_HOUR: f64 = 20.0;

// Physical Tolerances
pub const ENERGY_EPSILON_KWH: f64 = 0.001;           // Below this an EV needs no more energy
pub const PENALTY_TOLERANCE_KWH: f64 = 0.1;          // Unmet energy tolerated at departure
pub const MIN_TIME_TO_DEPARTURE: f64 = 0.1;          // Urgency denominator floor
pub const PENALTY_PER_KWH: f64 = 200.0;

// Training Arrival Constants
pub const ARRIVAL_PROBABILITY: f64 = 0.15;
pub const ARRIVAL_ENERGY_KWH: f64 = 30.0;
pub const ARRIVAL_DWELL_MIN_STEPS: usize = 35;
pub const ARRIVAL_DWELL_MAX_STEPS: usize = 35;
pub const TRAINING_EV_ID_OFFSET: u32 = 100;

// Evaluation Scenario Constants
pub const EVALUATION_EV_ID: u32 = 200;
pub const EVALUATION_ARRIVAL_STEP: usize = 68;       // 17:00
pub const EVALUATION_DEPARTURE_STEP: usize = 92;
pub const EVALUATION_ENERGY_KWH: f64 = 45.0;

// Learning Constants
pub const LEARNING_RATE: f64 = 0.01;                 // Slow and stable smoothing
pub const DISCOUNT_FACTOR: f64 = 0.99;
pub const INITIAL_REMAINING_WEIGHT: f64 = 10.0;

// Checkpoint Constants
pub const CHECKPOINT_DIR: &str = "checkpoints";
pub const LEGACY_CHECKPOINT_FILE: &str = "adp_checkpoint.json";
pub const STATE_FILE_NAME: &str = "training_state.json.gz";
pub const STATE_TMP_FILE_NAME: &str = "training_state.tmp.json.gz";
pub const SNAPSHOT_PREFIX: &str = "checkpoint_";
pub const SNAPSHOT_EXTENSION: &str = ".json";
pub const CORRUPTED_SUFFIX: &str = ".corrupted";
pub const CHECKPOINT_INTERVAL: u64 = 500;
pub const MAX_CHECKPOINT_FILES: usize = 20;

// Reporting Constants
pub const REPORT_DIR: &str = "reports";
pub const PROGRESS_REFRESH_ITERATIONS: u64 = 10;
