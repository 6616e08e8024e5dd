//! Demographic data source selection.
//!
//! The real-vs-synthetic choice is made once, at construction time,
//! based on whether a usable API credential resolved. The pipeline only
//! ever sees the `DemographicSource` trait, so tests can script either
//! branch deterministically.

use crate::client::{CensusClient, MockGenerator};
use crate::models::{CensusError, Config, Record, RunStats, Store, Tract};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// A source of demographic records and nearby-store samples.
#[async_trait]
pub trait DemographicSource {
    /// Fetch the demographics for one tract.
    ///
    /// Sources that perform a network call must bump the attempt
    /// counter and append one latency sample to `stats` per call.
    async fn fetch_demographics(
        &mut self,
        tract: &Tract,
        stats: &mut RunStats,
    ) -> Result<Record, CensusError>;

    /// Fetch nearby stores for one tract.
    async fn fetch_stores(&mut self, tract: &Tract) -> Vec<Store>;

    /// Whether this source talks to the real API.
    fn is_live(&self) -> bool {
        false
    }
}

/// Build the source dictated by the configuration: the live Census
/// client when a credential resolves, the synthetic generator otherwise.
pub fn build_source(config: &Config) -> Result<Box<dyn DemographicSource>, CensusError> {
    match config.resolve_api_key() {
        Some(api_key) => {
            let client = CensusClient::new(api_key, &config.census)?;
            Ok(Box::new(CensusSource::new(client, config.variables.clone())))
        }
        None => {
            warn!("Census API key not configured, using mock data");
            Ok(Box::new(MockSource::new(MockGenerator::new())))
        }
    }
}

/// Live source backed by the Census API.
///
/// Stores still come from the synthetic generator: querying real store
/// locations needs the tract centroid geocoded first.
pub struct CensusSource {
    client: CensusClient,
    variables: BTreeMap<String, String>,
    stores: MockGenerator,
}

impl CensusSource {
    pub fn new(client: CensusClient, variables: BTreeMap<String, String>) -> Self {
        Self {
            client,
            variables,
            stores: MockGenerator::new(),
        }
    }
}

#[async_trait]
impl DemographicSource for CensusSource {
    async fn fetch_demographics(
        &mut self,
        tract: &Tract,
        stats: &mut RunStats,
    ) -> Result<Record, CensusError> {
        stats.record_attempt();
        let start = Instant::now();
        let result = self.client.fetch(tract, &self.variables).await;
        stats.record_latency(start.elapsed().as_secs_f64());
        result
    }

    async fn fetch_stores(&mut self, tract: &Tract) -> Vec<Store> {
        debug!(tract = %tract.name, "sampling nearby stores");
        self.stores.stores()
    }

    fn is_live(&self) -> bool {
        true
    }
}

/// Synthetic source used when no credential is configured.
pub struct MockSource {
    generator: MockGenerator,
}

impl MockSource {
    pub fn new(generator: MockGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl DemographicSource for MockSource {
    async fn fetch_demographics(
        &mut self,
        tract: &Tract,
        _stats: &mut RunStats,
    ) -> Result<Record, CensusError> {
        debug!(tract = %tract.name, "generating mock demographics");
        Ok(self.generator.demographics(tract))
    }

    async fn fetch_stores(&mut self, tract: &Tract) -> Vec<Store> {
        debug!(tract = %tract.name, "sampling nearby stores");
        self.generator.stores()
    }
}
