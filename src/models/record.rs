//! Record and run-statistics types.
//!
//! A `Record` is the normalized result of one collection pass over one
//! tract: fixed identity fields plus a flat field→value map, annotated
//! once with a quality score and once with a nearby-store sample.

use crate::models::Tract;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scalar cell in a collected record.
///
/// Serializes untagged: JSON null / number / string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Missing or empty value
    Null,
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Normalize a raw API cell: empty/absent → null, numeric-looking
    /// → number, anything else stays text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Null,
            Some(s) if s.trim().is_empty() => Self::Null,
            Some(s) => match s.trim().parse::<f64>() {
                Ok(v) => Self::Number(v),
                Err(_) => Self::Text(s.to_string()),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric coercion: numbers pass through, text is parsed, null
    /// (and unparsable text) yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

/// Category of a nearby food retail location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreCategory {
    Supermarket,
    Grocery,
    Convenience,
}

/// A nearby food retail location (point of interest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(rename = "type")]
    pub category: StoreCategory,

    /// Distance from the tract in miles
    pub distance_miles: f64,

    pub name: String,
}

/// One normalized demographic record for a tract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Concatenated 11-digit GEOID
    pub tract_id: String,

    /// Display name of the tract
    pub location: String,

    pub state_fips: String,
    pub county_fips: String,
    pub tract_fips: String,

    /// When this record was collected
    pub collected_at: DateTime<Utc>,

    /// Provenance label (e.g. "census_acs5_2021" or "mock_data")
    pub data_source: String,

    /// Demographic variables, keyed by configured field name
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,

    /// Quality score in [0, 1], set once after assessment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,

    /// Nearby store sample, set once when the record passes the gate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nearby_stores: Vec<Store>,
}

impl Record {
    /// Create an empty record for a tract.
    pub fn new(tract: &Tract, data_source: impl Into<String>) -> Self {
        Self {
            tract_id: tract.geoid(),
            location: tract.name.clone(),
            state_fips: tract.state.clone(),
            county_fips: tract.county.clone(),
            tract_fips: tract.tract.clone(),
            collected_at: Utc::now(),
            data_source: data_source.into(),
            fields: BTreeMap::new(),
            quality_score: None,
            nearby_stores: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Run-wide statistics, passed explicitly through the collection loop.
///
/// `total_requests` and the latency samples count attempted network
/// calls only; the synthetic source performs none. `successful_requests`
/// counts records that passed the quality gate.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub quality_scores: Vec<f64>,
    pub response_times_secs: Vec<f64>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            quality_scores: Vec::new(),
            response_times_secs: Vec::new(),
        }
    }

    pub fn record_attempt(&mut self) {
        self.total_requests += 1;
    }

    pub fn record_latency(&mut self, secs: f64) {
        self.response_times_secs.push(secs);
    }

    pub fn record_success(&mut self) {
        self.successful_requests += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_requests += 1;
    }

    pub fn record_quality(&mut self, score: f64) {
        self.quality_scores.push(score);
    }

    /// Cumulative success rate; 1.0 before any attempt has been made.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 1.0;
        }
        self.successful_requests as f64 / self.total_requests as f64
    }

    /// Mean of the last `window` quality scores; 1.0 before any score
    /// has been collected.
    pub fn recent_quality_mean(&self, window: usize) -> f64 {
        if self.quality_scores.is_empty() {
            return 1.0;
        }
        let start = self.quality_scores.len().saturating_sub(window);
        mean(&self.quality_scores[start..])
    }

    pub fn average_quality(&self) -> f64 {
        if self.quality_scores.is_empty() {
            return 0.0;
        }
        mean(&self.quality_scores)
    }

    /// (min, max) of all quality scores; (0, 0) when empty.
    pub fn quality_range(&self) -> (f64, f64) {
        let mut scores = self.quality_scores.iter().copied();
        let Some(first) = scores.next() else {
            return (0.0, 0.0);
        };
        scores.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s)))
    }

    pub fn average_response_time(&self) -> f64 {
        if self.response_times_secs.is_empty() {
            return 0.0;
        }
        mean(&self.response_times_secs)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_parse() {
        assert_eq!(FieldValue::parse(None), FieldValue::Null);
        assert_eq!(FieldValue::parse(Some("")), FieldValue::Null);
        assert_eq!(FieldValue::parse(Some("  ")), FieldValue::Null);
        assert_eq!(FieldValue::parse(Some("123.5")), FieldValue::Number(123.5));
        assert_eq!(FieldValue::parse(Some("-40")), FieldValue::Number(-40.0));
        assert_eq!(
            FieldValue::parse(Some("N/A")),
            FieldValue::Text("N/A".to_string())
        );
    }

    #[test]
    fn test_field_value_coercion() {
        assert_eq!(FieldValue::Number(5.0).as_number(), Some(5.0));
        assert_eq!(FieldValue::Text("7.25".to_string()).as_number(), Some(7.25));
        assert_eq!(FieldValue::Text("seven".to_string()).as_number(), None);
        assert_eq!(FieldValue::Null.as_number(), None);
    }

    #[test]
    fn test_record_serializes_flat() {
        let tract = Tract::new("17", "031", "770100", "Chicago, IL (Urban)");
        let mut record = Record::new(&tract, "mock_data");
        record.insert("median_income", FieldValue::Number(56_000.0));
        record.insert("notes", FieldValue::Text("sampled".to_string()));
        record.insert("snap_benefits", FieldValue::Null);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tract_id"], "17031770100");
        assert_eq!(value["median_income"], 56_000.0);
        assert_eq!(value["notes"], "sampled");
        assert!(value["snap_benefits"].is_null());
        // Unset quality score is omitted entirely
        assert!(value.get("quality_score").is_none());
    }

    #[test]
    fn test_success_rate_defaults_to_one() {
        let stats = RunStats::new();
        assert_eq!(stats.success_rate(), 1.0);
    }

    #[test]
    fn test_recent_quality_mean_windows() {
        let mut stats = RunStats::new();
        assert_eq!(stats.recent_quality_mean(5), 1.0);

        for score in [0.2, 0.2, 1.0, 1.0, 1.0, 1.0, 1.0] {
            stats.record_quality(score);
        }
        // Only the last five scores count
        assert!((stats.recent_quality_mean(5) - 1.0).abs() < 1e-9);
        assert!((stats.recent_quality_mean(7) - 0.771_428_571).abs() < 1e-6);
    }

    #[test]
    fn test_quality_range() {
        let mut stats = RunStats::new();
        assert_eq!(stats.quality_range(), (0.0, 0.0));

        stats.record_quality(0.8);
        assert_eq!(stats.quality_range(), (0.8, 0.8));

        stats.record_quality(0.3);
        stats.record_quality(0.95);
        assert_eq!(stats.quality_range(), (0.3, 0.95));
    }
}
