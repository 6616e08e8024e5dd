//! Synthetic data generator.
//!
//! Stands in for the Census API when no credential is configured, and
//! for the store lookup in both modes (a real store query needs the
//! tract centroid geocoded first, which is out of scope). Draws are
//! bounded to plausible ranges; a seeded generator is deterministic.

use crate::models::{FieldValue, Record, Store, StoreCategory, Tract};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STORE_CATEGORIES: [StoreCategory; 3] = [
    StoreCategory::Supermarket,
    StoreCategory::Grocery,
    StoreCategory::Convenience,
];

/// Provenance label for synthetic records.
pub const MOCK_DATA_SOURCE: &str = "mock_data";

/// Seeded generator for synthetic demographics and store samples.
#[derive(Debug)]
pub struct MockGenerator {
    rng: StdRng,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a plausible demographic record for a tract.
    pub fn demographics(&mut self, tract: &Tract) -> Record {
        let mut record = Record::new(tract, MOCK_DATA_SOURCE);

        record.insert("median_income", self.int_field(25_000, 85_000));
        record.insert(
            "poverty_rate",
            FieldValue::Number(round_to(self.rng.gen_range(5.0..35.0), 1)),
        );
        record.insert("total_population", self.int_field(1_500, 8_000));
        record.insert("white_population", self.int_field(500, 6_000));
        record.insert("black_population", self.int_field(200, 3_000));
        record.insert("vehicle_available", self.int_field(800, 5_000));
        record.insert("no_vehicle", self.int_field(100, 1_500));
        record.insert("snap_benefits", self.int_field(200, 2_000));

        record
    }

    /// Generate a sample of 1-5 nearby stores.
    pub fn stores(&mut self) -> Vec<Store> {
        let count = self.rng.gen_range(1..=5);
        (0..count)
            .map(|i| Store {
                category: STORE_CATEGORIES[self.rng.gen_range(0..STORE_CATEGORIES.len())],
                distance_miles: round_to(self.rng.gen_range(0.2..5.0), 2),
                name: format!("Store {}", i + 1),
            })
            .collect()
    }

    fn int_field(&mut self, min: u32, max: u32) -> FieldValue {
        FieldValue::Number(self.rng.gen_range(min..=max) as f64)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tract() -> Tract {
        Tract::new("17", "031", "770100", "Chicago, IL (Urban)")
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let a = MockGenerator::with_seed(42).demographics(&tract());
        let b = MockGenerator::with_seed(42).demographics(&tract());
        assert_eq!(a.fields, b.fields);

        let stores_a = {
            let mut g = MockGenerator::with_seed(7);
            g.demographics(&tract());
            g.stores()
        };
        let stores_b = {
            let mut g = MockGenerator::with_seed(7);
            g.demographics(&tract());
            g.stores()
        };
        assert_eq!(stores_a, stores_b);
    }

    #[test]
    fn test_fields_stay_within_bounds() {
        let mut generator = MockGenerator::with_seed(123);
        for _ in 0..100 {
            let record = generator.demographics(&tract());
            let value = |name: &str| record.field(name).and_then(FieldValue::as_number).unwrap();

            assert!((25_000.0..=85_000.0).contains(&value("median_income")));
            // Rounding to one decimal can land exactly on the bound
            assert!((5.0..=35.0).contains(&value("poverty_rate")));
            assert!((1_500.0..=8_000.0).contains(&value("total_population")));
            assert!((100.0..=1_500.0).contains(&value("no_vehicle")));
        }
    }

    #[test]
    fn test_store_sample_shape() {
        let mut generator = MockGenerator::with_seed(99);
        for _ in 0..50 {
            let stores = generator.stores();
            assert!((1..=5).contains(&stores.len()));
            for (i, store) in stores.iter().enumerate() {
                assert!((0.2..=5.0).contains(&store.distance_miles));
                assert_eq!(store.name, format!("Store {}", i + 1));
            }
        }
    }

    #[test]
    fn test_mock_record_is_source_labelled() {
        let record = MockGenerator::with_seed(1).demographics(&tract());
        assert_eq!(record.data_source, MOCK_DATA_SOURCE);
        assert_eq!(record.tract_id, "17031770100");
    }
}
