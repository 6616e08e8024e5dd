//! Pure report renderers.
//!
//! Every function here is a pure mapping from (run outcome, generation
//! timestamp) to a string or JSON document, so identical inputs render
//! byte-identical output. The writer module owns filesystem concerns.

use crate::models::{Config, Record};
use crate::pipeline::RunOutcome;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Render the HTML quality report.
pub fn render_quality_report(
    outcome: &RunOutcome,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> String {
    let stats = &outcome.stats;
    let total_records = outcome.records.len();
    let success_rate = if stats.total_requests > 0 {
        stats.successful_requests as f64 / stats.total_requests as f64 * 100.0
    } else {
        0.0
    };
    let avg_quality = stats.average_quality() * 100.0;

    let score_color = if avg_quality >= 80.0 {
        "#27ae60"
    } else if avg_quality >= 60.0 {
        "#f39c12"
    } else {
        "#e74c3c"
    };
    let success_class = if success_rate >= 80.0 {
        "good"
    } else if success_rate >= 60.0 {
        "warning"
    } else {
        "poor"
    };

    let complete_records = outcome
        .records
        .iter()
        .filter(|r| {
            config
                .quality
                .required_fields
                .iter()
                .all(|f| r.field(f).is_some())
        })
        .count();

    let mut recommendations = String::new();
    if avg_quality >= 80.0 {
        recommendations.push_str(
            "<li>Data quality is excellent - maintain current collection practices</li>",
        );
    }
    if avg_quality < 70.0 {
        recommendations.push_str(
            "<li>Consider increasing validation checks to improve data quality</li>",
        );
    }
    if success_rate < 80.0 {
        recommendations.push_str(
            "<li>Success rate could be improved - check API keys and network connectivity</li>",
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Data Quality Report - Demographic Collection</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }}
        .container {{ background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        h1 {{ color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }}
        .metric {{ background: #ecf0f1; padding: 20px; margin: 20px 0; border-radius: 5px; border-left: 4px solid #3498db; }}
        .metric h3 {{ margin-top: 0; color: #2c3e50; }}
        .score {{ font-size: 36px; font-weight: bold; color: {score_color}; }}
        .good {{ color: #27ae60; }}
        .warning {{ color: #f39c12; }}
        .poor {{ color: #e74c3c; }}
        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }}
        th {{ background-color: #3498db; color: white; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Data Quality Report - Demographic Collection</h1>
        <p><strong>Generated:</strong> {generated}</p>

        <div class="metric">
            <h3>Overall Quality Score</h3>
            <div class="score">{avg_quality:.1}%</div>
        </div>

        <div class="metric">
            <h3>Collection Metrics</h3>
            <table>
                <tr>
                    <th>Metric</th>
                    <th>Value</th>
                </tr>
                <tr>
                    <td>Total Records Collected</td>
                    <td>{total_records}</td>
                </tr>
                <tr>
                    <td>Collection Success Rate</td>
                    <td class="{success_class}">{success_rate:.1}%</td>
                </tr>
                <tr>
                    <td>Failed Attempts</td>
                    <td>{failed_requests}</td>
                </tr>
                <tr>
                    <td>Average Response Time</td>
                    <td>{avg_response:.2}s</td>
                </tr>
            </table>
        </div>

        <div class="metric">
            <h3>Data Completeness</h3>
            <p>Records with all required fields: {complete_records}/{total_records}</p>
        </div>

        <div class="metric">
            <h3>Recommendations</h3>
            <ul>
                {recommendations}
            </ul>
        </div>
    </div>
</body>
</html>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        failed_requests = stats.failed_requests,
        avg_response = stats.average_response_time(),
    )
}

/// Render the plain-text run summary.
pub fn render_summary(
    outcome: &RunOutcome,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> String {
    let stats = &outcome.stats;
    let separator = "=".repeat(70);
    let duration_minutes = (generated_at - stats.started_at).num_seconds() as f64 / 60.0;

    let success_rate = if stats.total_requests > 0 {
        stats.successful_requests as f64 / stats.total_requests as f64 * 100.0
    } else {
        0.0
    };
    let (quality_min, quality_max) = stats.quality_range();

    let failed_list = if outcome.failed_tracts.is_empty() {
        "  None".to_string()
    } else {
        outcome
            .failed_tracts
            .iter()
            .take(5)
            .map(|t| format!("  - {}", t.name))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let failed_overflow = if outcome.failed_tracts.len() > 5 {
        "\n  ... and more"
    } else {
        ""
    };

    let target = config.collection.target_tracts;
    let rec_performance = if outcome.records.len() as f64 >= target as f64 * 0.8 {
        "Excellent collection performance - maintain current practices"
    } else {
        "Consider retrying failed tracts or extending collection time"
    };
    let rec_quality =
        if !stats.quality_scores.is_empty() && stats.average_quality() >= 0.7 {
            "Quality assessment is working well"
        } else {
            "Review quality thresholds and validation rules"
        };
    let rec_pacing = if outcome.final_delay_secs <= 2.0 {
        "effective - no major delays"
    } else {
        "triggered - consider spacing requests further"
    };

    format!(
        r#"{separator}
DEMOGRAPHIC DATA COLLECTION - FINAL SUMMARY
{separator}

COLLECTION OVERVIEW:
- Start Time: {start_time}
- End Time: {end_time}
- Duration: {duration_minutes:.1} minutes

DATA COLLECTED:
- Total Records: {total_records}
- Successful Requests: {successful}
- Failed Requests: {failed}
- Success Rate: {success_rate:.1}%

QUALITY METRICS:
- Average Quality Score: {avg_quality:.3}
- Quality Range: {quality_min:.3} - {quality_max:.3}

API PERFORMANCE:
- Census API Calls: {total_requests}
- Average Response Time: {avg_response:.2}s
- Final Delay Setting: {final_delay:.1}s

ISSUES ENCOUNTERED:
- Failed Tracts: {failed_count}
{failed_list}{failed_overflow}

RECOMMENDATIONS FOR FUTURE COLLECTION:
1. {rec_performance}
2. {rec_quality}
3. API rate limiting was {rec_pacing}

DATA FILES GENERATED:
- Raw data: {raw_dir}/demographics_*.json
- CSV export: {raw_dir}/demographics_*.csv
- Metadata: {metadata_dir}/dataset_metadata.json
- Quality report: {reports_dir}/quality_report.html
- Collection log: {logs_dir}/collection.log

{separator}
COLLECTION COMPLETED SUCCESSFULLY
{separator}
"#,
        start_time = stats.started_at.format("%Y-%m-%d %H:%M:%S"),
        end_time = generated_at.format("%Y-%m-%d %H:%M:%S"),
        total_records = outcome.records.len(),
        successful = stats.successful_requests,
        failed = stats.failed_requests,
        avg_quality = stats.average_quality(),
        total_requests = stats.total_requests,
        avg_response = stats.average_response_time(),
        final_delay = outcome.final_delay_secs,
        failed_count = outcome.failed_tracts.len(),
        raw_dir = config.paths.raw_data.display(),
        metadata_dir = config.paths.metadata.display(),
        reports_dir = config.paths.reports.display(),
        logs_dir = config.paths.logs.display(),
    )
}

/// Render the raw dataset document (collection info + all records).
pub fn render_raw_dataset(
    outcome: &RunOutcome,
    run_id: &str,
    generated_at: DateTime<Utc>,
) -> Value {
    json!({
        "collection_info": {
            "collected_at": generated_at.to_rfc3339(),
            "agent_version": env!("CARGO_PKG_VERSION"),
            "run_id": run_id,
            "total_records": outcome.records.len(),
        },
        "data": outcome.records,
    })
}

/// Render the dataset provenance/metadata document.
pub fn render_metadata(
    outcome: &RunOutcome,
    run_id: &str,
    generated_at: DateTime<Utc>,
) -> Value {
    let stats = &outcome.stats;
    let duration_minutes = (generated_at - stats.started_at).num_seconds() as f64 / 60.0;
    let completeness_rate = if stats.total_requests > 0 {
        outcome.records.len() as f64 / stats.total_requests as f64
    } else {
        0.0
    };
    let apis_used = if stats.total_requests > 0 {
        json!(["census.gov ACS5", "synthetic store generator"])
    } else {
        json!(["synthetic demographics generator", "synthetic store generator"])
    };

    json!({
        "dataset_info": {
            "title": "Demographic Food Access Dataset",
            "description": "Census demographic and store location data for food-access analysis",
            "created": generated_at.to_rfc3339(),
            "creator": format!("demogen v{}", env!("CARGO_PKG_VERSION")),
            "total_records": outcome.records.len(),
        },
        "collection_process": {
            "run_id": run_id,
            "start_time": stats.started_at.to_rfc3339(),
            "end_time": generated_at.to_rfc3339(),
            "duration_minutes": duration_minutes,
            "apis_used": apis_used,
        },
        "data_structure": data_structure(&outcome.records),
        "quality_metrics": {
            "average_quality_score": stats.average_quality(),
            "completeness_rate": completeness_rate,
        },
    })
}

/// Infer per-field types and descriptions from the first record.
fn data_structure(records: &[Record]) -> Value {
    let Some(first) = records.first() else {
        return json!({});
    };
    let Ok(Value::Object(map)) = serde_json::to_value(first) else {
        return json!({});
    };

    let structure: serde_json::Map<String, Value> = map
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                json!({
                    "type": json_type_name(value),
                    "description": field_description(name),
                }),
            )
        })
        .collect();

    Value::Object(structure)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Human-readable description of a known field.
fn field_description(name: &str) -> String {
    match name {
        "tract_id" => "Concatenated state, county, and tract FIPS codes".to_string(),
        "location" => "Display name of the census tract".to_string(),
        "state_fips" => "Two-digit state FIPS code".to_string(),
        "county_fips" => "Three-digit county FIPS code".to_string(),
        "tract_fips" => "Six-digit tract FIPS code".to_string(),
        "collected_at" => "Collection timestamp (UTC)".to_string(),
        "data_source" => "Provenance of the record".to_string(),
        "median_income" => "Median household income in dollars".to_string(),
        "poverty_rate" => "Percentage of population below poverty line".to_string(),
        "total_population" => "Total population in census tract".to_string(),
        "white_population" => "Population identifying as white".to_string(),
        "black_population" => "Population identifying as Black".to_string(),
        "vehicle_available" => "Households with vehicle available".to_string(),
        "no_vehicle" => "Households without vehicle".to_string(),
        "snap_benefits" => "Households receiving SNAP benefits".to_string(),
        "quality_score" => "Data quality assessment score (0-1)".to_string(),
        "nearby_stores" => "List of nearby food retail locations".to_string(),
        other => format!("Data field: {other}"),
    }
}

/// Render all records as CSV: the header is the sorted union of every
/// field name seen across records; store lists embed as JSON.
pub fn render_csv(records: &[Record]) -> String {
    let rows: Vec<serde_json::Map<String, Value>> = records
        .iter()
        .filter_map(|r| match serde_json::to_value(r) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect();

    let mut names: BTreeSet<&str> = BTreeSet::new();
    for row in &rows {
        names.extend(row.keys().map(String::as_str));
    }
    let header: Vec<&str> = names.into_iter().collect();

    let mut out = String::new();
    out.push_str(
        &header
            .iter()
            .map(|h| csv_escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');

    for row in &rows {
        let cells: Vec<String> = header.iter().map(|name| csv_cell(row.get(*name))).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    out
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => csv_escape(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => csv_escape(&other.to_string()),
    }
}

fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, RunStats, Tract};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn outcome() -> RunOutcome {
        let tract_a = Tract::new("17", "031", "770100", "Chicago, IL (Urban)");
        let tract_b = Tract::new("06", "037", "207400", "Los Angeles, CA (Urban)");
        let failed = Tract::new("36", "061", "008600", "Manhattan, NY (Urban)");

        let mut record_a = Record::new(&tract_a, "mock_data");
        record_a.insert("median_income", FieldValue::Number(52_000.0));
        record_a.quality_score = Some(1.0);

        let mut record_b = Record::new(&tract_b, "mock_data");
        record_b.insert("median_income", FieldValue::Number(61_000.0));
        record_b.insert("poverty_rate", FieldValue::Number(12.0));
        record_b.quality_score = Some(1.0);

        let mut stats = RunStats::new();
        stats.started_at = fixed_time();
        stats.record_quality(1.0);
        stats.record_quality(1.0);
        stats.record_quality(0.6);
        stats.successful_requests = 2;

        RunOutcome {
            records: vec![record_a, record_b],
            failed_tracts: vec![failed],
            stats,
            final_delay_secs: 1.0,
        }
    }

    #[test]
    fn test_renders_are_idempotent() {
        let outcome = outcome();
        let config = Config::default();
        let at = fixed_time();

        assert_eq!(
            render_quality_report(&outcome, &config, at),
            render_quality_report(&outcome, &config, at)
        );
        assert_eq!(
            render_summary(&outcome, &config, at),
            render_summary(&outcome, &config, at)
        );
        assert_eq!(
            render_metadata(&outcome, "run-1", at),
            render_metadata(&outcome, "run-1", at)
        );
    }

    #[test]
    fn test_summary_lists_failed_tracts() {
        let summary = render_summary(&outcome(), &Config::default(), fixed_time());
        assert!(summary.contains("Failed Tracts: 1"));
        assert!(summary.contains("  - Manhattan, NY (Urban)"));
        assert!(!summary.contains("... and more"));
    }

    #[test]
    fn test_summary_truncates_failed_tract_list() {
        let mut outcome = outcome();
        outcome.failed_tracts = (0..7)
            .map(|i| Tract::new("17", "031", format!("{i:06}"), format!("Tract {i}")))
            .collect();
        let summary = render_summary(&outcome, &Config::default(), fixed_time());
        assert!(summary.contains("  - Tract 4"));
        assert!(!summary.contains("  - Tract 5"));
        assert!(summary.contains("... and more"));
    }

    #[test]
    fn test_empty_outcome_renders_safely() {
        let outcome = RunOutcome {
            records: Vec::new(),
            failed_tracts: Vec::new(),
            stats: RunStats::new(),
            final_delay_secs: 1.0,
        };
        let config = Config::default();
        let at = fixed_time();

        let summary = render_summary(&outcome, &config, at);
        assert!(summary.contains("Total Records: 0"));
        assert!(summary.contains("  None"));

        let html = render_quality_report(&outcome, &config, at);
        assert!(html.contains("0.0%"));

        let metadata = render_metadata(&outcome, "run-1", at);
        assert_eq!(metadata["data_structure"], json!({}));
        assert_eq!(metadata["quality_metrics"]["completeness_rate"], 0.0);

        assert_eq!(render_csv(&[]), "\n");
    }

    #[test]
    fn test_csv_header_is_sorted_union() {
        let csv = render_csv(&outcome().records);
        let header = csv.lines().next().unwrap();
        // record_a lacks poverty_rate; the union still carries it
        let columns: Vec<&str> = header.split(',').collect();
        assert!(columns.contains(&"median_income"));
        assert!(columns.contains(&"poverty_rate"));
        assert!(columns.contains(&"tract_id"));
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(columns, sorted);
    }

    #[test]
    fn test_csv_escapes_embedded_commas() {
        let csv = render_csv(&outcome().records);
        // Location names contain commas and must be quoted
        assert!(csv.contains("\"Chicago, IL (Urban)\""));
    }

    #[test]
    fn test_metadata_field_types() {
        let metadata = render_metadata(&outcome(), "run-1", fixed_time());
        let structure = &metadata["data_structure"];
        assert_eq!(structure["median_income"]["type"], "number");
        assert_eq!(structure["location"]["type"], "string");
        assert_eq!(
            structure["median_income"]["description"],
            "Median household income in dollars"
        );
    }
}
