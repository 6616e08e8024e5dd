//! Data quality assessment.
//!
//! Scores a record from three checks applied in one pass:
//! - completeness: required fields present and non-null (-20 each)
//! - validity: ranged fields numeric and in bounds (-10 / -15)
//! - consistency: rate field in [0, 100] alongside population (-20)
//!
//! A field can lose points under more than one check; that is accepted
//! behavior. Within the validity check, coercion is decided first: a
//! value that fails numeric coercion is not range checked.

use crate::models::{QualityConfig, Record};
use std::collections::BTreeMap;
use tracing::debug;

const MISSING_FIELD_PENALTY: f64 = 20.0;
const OUT_OF_RANGE_PENALTY: f64 = 15.0;
const NON_NUMERIC_PENALTY: f64 = 10.0;
const INCONSISTENT_RATE_PENALTY: f64 = 20.0;

/// Quality assessor: a pure scoring function over one record.
///
/// The caller owns the bookkeeping (appending the score to `RunStats`).
pub struct QualityAssessor {
    required_fields: Vec<String>,
    valid_ranges: BTreeMap<String, (f64, f64)>,
    population_field: String,
    rate_field: String,
}

impl QualityAssessor {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            required_fields: config.required_fields.clone(),
            valid_ranges: config.valid_ranges.clone(),
            population_field: config.population_field.clone(),
            rate_field: config.rate_field.clone(),
        }
    }

    /// Score a record in [0, 1]. Starts from 100 points, applies every
    /// deduction unconditionally, floors at 0, and normalizes.
    pub fn score(&self, record: &Record) -> f64 {
        let mut points = 100.0;

        // Completeness
        for field in &self.required_fields {
            let missing = record.field(field).map_or(true, |v| v.is_null());
            if missing {
                points -= MISSING_FIELD_PENALTY;
                debug!(field = %field, "missing required field");
            }
        }

        // Validity
        for (field, (min, max)) in &self.valid_ranges {
            let Some(value) = record.field(field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match value.as_number() {
                None => {
                    points -= NON_NUMERIC_PENALTY;
                    debug!(field = %field, "value failed numeric coercion");
                }
                Some(v) if v < *min || v > *max => {
                    points -= OUT_OF_RANGE_PENALTY;
                    debug!(
                        field = %field,
                        value = v,
                        min = *min,
                        max = *max,
                        "value out of range"
                    );
                }
                Some(_) => {}
            }
        }

        // Consistency
        let population = record.field(&self.population_field);
        let rate = record.field(&self.rate_field);
        if let (Some(population), Some(rate)) = (population, rate) {
            if !population.is_null() && !rate.is_null() {
                if let Some(rate) = rate.as_number() {
                    if !(0.0..=100.0).contains(&rate) {
                        points -= INCONSISTENT_RATE_PENALTY;
                        debug!(rate = rate, "rate field inconsistent with population");
                    }
                }
            }
        }

        points.max(0.0) / 100.0
    }
}
