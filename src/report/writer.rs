//! Report output files.
//!
//! Writes the raw dataset, CSV export, metadata document, HTML quality
//! report, and text summary into the configured directories, creating
//! them on demand.

use crate::models::{Config, DemogenError, Result};
use crate::pipeline::RunOutcome;
use crate::report::{
    render_csv, render_metadata, render_quality_report, render_raw_dataset, render_summary,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Paths of everything a run wrote.
#[derive(Debug)]
pub struct ReportPaths {
    pub raw_json: PathBuf,
    /// Absent when no records were collected
    pub csv: Option<PathBuf>,
    pub metadata: PathBuf,
    pub quality_report: PathBuf,
    pub summary: PathBuf,
}

/// Write all outputs for a finished run.
pub fn write_all(config: &Config, outcome: &RunOutcome) -> Result<ReportPaths> {
    let generated_at = Utc::now();
    let run_id = Uuid::new_v4().to_string();
    let timestamp = generated_at.format("%Y%m%d_%H%M%S");

    let raw_dir = &config.paths.raw_data;
    let metadata_dir = &config.paths.metadata;
    let reports_dir = &config.paths.reports;
    for dir in [raw_dir, metadata_dir, reports_dir] {
        fs::create_dir_all(dir)
            .map_err(|e| DemogenError::io(format!("creating {}", dir.display()), e))?;
    }

    // Raw dataset
    let raw_json = raw_dir.join(format!("demographics_{timestamp}.json"));
    let dataset = render_raw_dataset(outcome, &run_id, generated_at);
    write_file(&raw_json, &serde_json::to_string_pretty(&dataset)?)?;
    info!(path = %raw_json.display(), records = outcome.records.len(), "saved raw data");

    // CSV export, only when there is something to tabulate
    let csv = if outcome.records.is_empty() {
        None
    } else {
        let path = raw_dir.join(format!("demographics_{timestamp}.csv"));
        write_file(&path, &render_csv(&outcome.records))?;
        info!(path = %path.display(), "saved CSV export");
        Some(path)
    };

    // Metadata document
    let metadata_path = metadata_dir.join("dataset_metadata.json");
    let metadata = render_metadata(outcome, &run_id, generated_at);
    write_file(&metadata_path, &serde_json::to_string_pretty(&metadata)?)?;
    info!(path = %metadata_path.display(), "generated metadata");

    // HTML quality report
    let quality_report = reports_dir.join("quality_report.html");
    write_file(
        &quality_report,
        &render_quality_report(outcome, config, generated_at),
    )?;
    info!(path = %quality_report.display(), "generated quality report");

    // Text summary
    let summary = reports_dir.join("collection_summary.txt");
    write_file(&summary, &render_summary(outcome, config, generated_at))?;
    info!(path = %summary.display(), "generated collection summary");

    Ok(ReportPaths {
        raw_json,
        csv,
        metadata: metadata_path,
        quality_report,
        summary,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| DemogenError::io(format!("writing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, PathsConfig, Record, RunStats, Tract};
    use tempfile::TempDir;

    fn outcome() -> RunOutcome {
        let tract = Tract::new("17", "031", "770100", "Chicago, IL (Urban)");
        let mut record = Record::new(&tract, "mock_data");
        record.insert("median_income", FieldValue::Number(52_000.0));
        record.quality_score = Some(1.0);

        let mut stats = RunStats::new();
        stats.record_quality(1.0);
        stats.successful_requests = 1;

        RunOutcome {
            records: vec![record],
            failed_tracts: Vec::new(),
            stats,
            final_delay_secs: 1.0,
        }
    }

    fn config_in(dir: &TempDir) -> Config {
        Config {
            paths: PathsConfig {
                logs: dir.path().join("logs"),
                raw_data: dir.path().join("data/raw"),
                metadata: dir.path().join("data/metadata"),
                reports: dir.path().join("reports"),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_write_all_produces_every_output() {
        let dir = TempDir::new().unwrap();
        let paths = write_all(&config_in(&dir), &outcome()).unwrap();

        assert!(paths.raw_json.exists());
        assert!(paths.csv.as_ref().unwrap().exists());
        assert!(paths.metadata.exists());
        assert!(paths.quality_report.exists());
        assert!(paths.summary.exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.raw_json).unwrap()).unwrap();
        assert_eq!(raw["collection_info"]["total_records"], 1);
        assert_eq!(raw["data"][0]["tract_id"], "17031770100");
    }

    #[test]
    fn test_write_all_skips_csv_without_records() {
        let dir = TempDir::new().unwrap();
        let empty = RunOutcome {
            records: Vec::new(),
            failed_tracts: Vec::new(),
            stats: RunStats::new(),
            final_delay_secs: 1.0,
        };
        let paths = write_all(&config_in(&dir), &empty).unwrap();
        assert!(paths.csv.is_none());
        assert!(paths.summary.exists());
    }
}
