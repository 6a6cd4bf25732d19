use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::analysis::metrics_calculation::ComparisonReport;
use crate::ai::features::basis::FEATURE_NAMES;
use crate::config::const_funcs;
use crate::config::simulation_config::SimulationConfig;
use crate::utils::logging::{self, FileIOType, OperationCategory};

pub const LOAD_PROFILE_FILE: &str = "load_profile.csv";
pub const WEIGHT_HISTORY_FILE: &str = "weight_history.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

/// Writes report artifacts into `<output_dir>/<timestamp>/`.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
}

impl CsvExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        fs::create_dir_all(&full_path)
            .with_context(|| format!("Failed to create report directory {}", full_path.display()))?;

        Ok(Self { output_dir: full_path, timestamp })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Load profiles, weight history and the per-strategy summary.
    pub fn export_report(&self, report: &ComparisonReport, config: &SimulationConfig) -> Result<()> {
        let _timing = logging::start_timing(
            "export_report",
            OperationCategory::FileIO { subcategory: FileIOType::ReportSave },
        );

        self.export_load_profiles(report, config)?;
        self.export_weight_history(report)?;
        self.export_summary(report, config)?;

        info!(dir = %self.output_dir.display(), "report written");
        Ok(())
    }

    pub fn export_load_profiles(&self, report: &ComparisonReport, config: &SimulationConfig) -> Result<()> {
        let path = self.output_dir.join(LOAD_PROFILE_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let baseline_column = format!("{}_kwh", report.baseline_rule.label().to_lowercase());
        writer.write_record(["step", "hour", "price", "adp_kwh", baseline_column.as_str()])?;

        let steps = report.adp.load_profile.len().max(report.baseline.load_profile.len());
        for step in 0..steps {
            let adp = report.adp.load_profile.get(step).copied().unwrap_or(0.0);
            let baseline = report.baseline.load_profile.get(step).copied().unwrap_or(0.0);
            writer.write_record(&[
                step.to_string(),
                format!("{:.2}", const_funcs::hour_of_step(step, config.step_minutes)),
                format!("{:.2}", config.price_at(step)),
                format!("{:.6}", adp),
                format!("{:.6}", baseline),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Every historical weight vector followed by the current one.
    pub fn export_weight_history(&self, report: &ComparisonReport) -> Result<()> {
        let path = self.output_dir.join(WEIGHT_HISTORY_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut header = vec!["row"];
        header.extend(FEATURE_NAMES.iter().copied());
        writer.write_record(&header)?;

        for (row, zetas) in report.history.iter().chain(std::iter::once(&report.zetas)).enumerate() {
            let mut record = vec![row.to_string()];
            record.extend(zetas.iter().map(|w| w.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn export_summary(&self, report: &ComparisonReport, config: &SimulationConfig) -> Result<()> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writer.serialize(report.adp_summary(config))?;
        writer.serialize(report.baseline_summary(config))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::decision::heuristics::HeuristicRule;
    use crate::ai::metrics::simulation_metrics::DayResult;

    fn report() -> ComparisonReport {
        ComparisonReport {
            iteration: 2,
            baseline_rule: HeuristicRule::Fcld,
            adp: DayResult { load_profile: vec![1.0, 2.0, 0.0, 0.5], ..Default::default() },
            baseline: DayResult { load_profile: vec![3.0, 0.0, 0.0, 0.0], ..Default::default() },
            zetas: [1.0, 0.0, 0.0, 10.0, 0.0, 0.5],
            history: vec![[0.0, 0.0, 0.0, 10.0, 0.0, 0.0], [0.5, 0.0, 0.0, 10.0, 0.0, 0.25]],
        }
    }

    #[test]
    fn report_files_land_in_timestamped_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimulationConfig { horizon_steps: 4, ..SimulationConfig::default() };
        let exporter = CsvExporter::new(dir.path()).unwrap();
        exporter.export_report(&report(), &config).unwrap();

        assert!(exporter.output_dir().starts_with(dir.path()));
        assert!(exporter.output_dir().ends_with(exporter.timestamp()));

        let profile = fs::read_to_string(exporter.output_dir().join(LOAD_PROFILE_FILE)).unwrap();
        let lines: Vec<&str> = profile.lines().collect();
        assert_eq!(lines[0], "step,hour,price,adp_kwh,fcld_kwh");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "1,0.25,0.15,2.000000,0.000000");

        let history = fs::read_to_string(exporter.output_dir().join(WEIGHT_HISTORY_FILE)).unwrap();
        // two history rows plus the current weights
        assert_eq!(history.lines().count(), 4);

        let summary = fs::read_to_string(exporter.output_dir().join(SUMMARY_FILE)).unwrap();
        assert!(summary.lines().next().unwrap().starts_with("label,total_cost"));
        assert_eq!(summary.lines().count(), 3);
    }
}
