use std::path::{Path, PathBuf};

use clap::Parser;

use crate::ai::decision::heuristics::HeuristicRule;
use crate::config::constants::REPORT_DIR;
use crate::core::multi_simulation::SessionAction;

#[derive(Parser, Debug)]
#[command(author, version, about = "ADP-based EV charging controller", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "continue, restart or finalize; prompts when a checkpoint exists and this is omitted")]
    action: Option<SessionAction>,

    #[arg(long, help = "JSON configuration file; missing fields use defaults")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Overrides the configured checkpoint directory")]
    checkpoint_dir: Option<PathBuf>,

    #[arg(short = 'i', long, help = "Overrides the configured checkpoint interval")]
    checkpoint_interval: Option<u64>,

    #[arg(short = 'n', long, help = "Stop after this many iterations instead of running until Ctrl+C")]
    max_iterations: Option<u64>,

    #[arg(long, help = "Random seed for deterministic training arrivals")]
    seed: Option<u64>,

    #[arg(short, long, default_value = "edld", help = "Baseline heuristic for the final report (fcld or edld)")]
    baseline: HeuristicRule,

    #[arg(short, long, default_value = REPORT_DIR)]
    report_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    no_report_files: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

impl Args {
    pub fn action(&self) -> Option<SessionAction> {
        self.action
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn checkpoint_dir(&self) -> Option<&Path> {
        self.checkpoint_dir.as_deref()
    }

    pub fn checkpoint_interval(&self) -> Option<u64> {
        self.checkpoint_interval
    }

    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn baseline(&self) -> HeuristicRule {
        self.baseline
    }

    /// `None` when CSV output is disabled.
    pub fn report_dir(&self) -> Option<&Path> {
        if self.no_report_files {
            None
        } else {
            Some(&self.report_dir)
        }
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn show_progress(&self) -> bool {
        !self.no_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["adpcharge"]).unwrap();
        assert_eq!(args.action(), None);
        assert_eq!(args.baseline(), HeuristicRule::Edld);
        assert_eq!(args.report_dir(), Some(Path::new(REPORT_DIR)));
        assert!(args.show_progress());
        assert!(args.max_iterations().is_none());
    }

    #[test]
    fn batch_flags() {
        let args = Args::try_parse_from([
            "adpcharge",
            "--action",
            "restart",
            "--baseline",
            "FCLD",
            "--max-iterations",
            "50",
            "--checkpoint-dir",
            "/tmp/ckpt",
            "--no-report-files",
            "--no-progress",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(args.action(), Some(SessionAction::Restart));
        assert_eq!(args.baseline(), HeuristicRule::Fcld);
        assert_eq!(args.max_iterations(), Some(50));
        assert_eq!(args.checkpoint_dir(), Some(Path::new("/tmp/ckpt")));
        assert_eq!(args.report_dir(), None);
        assert!(!args.show_progress());
        assert_eq!(args.seed(), Some(7));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Args::try_parse_from(["adpcharge", "--action", "pause"]).is_err());
    }
}
