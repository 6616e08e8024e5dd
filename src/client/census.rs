//! Census data API client.
//!
//! The ACS endpoint answers with a two-row tabular JSON array: a header
//! row of variable codes and a single value row of nullable strings.
//! This client builds the three-level geography query, maps the header
//! row back to configured field names, and classifies failures into the
//! typed `CensusError` taxonomy.

use crate::models::{CensusError, FieldValue, Record, Tract};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Census API client.
pub struct CensusClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    year: u16,
    dataset: String,
    timeout: Duration,
}

impl CensusClient {
    /// Create a new client from the census section of the config.
    pub fn new(api_key: String, config: &crate::models::CensusConfig) -> Result<Self, CensusError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CensusError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
            year: config.year,
            dataset: config.dataset.clone(),
            timeout,
        })
    }

    /// Provenance label recorded on every fetched record,
    /// e.g. "census_acs5_2021".
    pub fn data_source_label(&self) -> String {
        let dataset = self.dataset.rsplit('/').next().unwrap_or(&self.dataset);
        format!("census_{}_{}", dataset, self.year)
    }

    /// Fetch demographics for one tract.
    ///
    /// `variables` maps record field names to ACS variable codes; the
    /// response header row is inverted back through it, so codes the
    /// API returns but the config does not name are dropped.
    pub async fn fetch(
        &self,
        tract: &Tract,
        variables: &BTreeMap<String, String>,
    ) -> Result<Record, CensusError> {
        let codes: Vec<&str> = variables.values().map(String::as_str).collect();
        let url = format!("{}/{}/{}", self.base_url, self.year, self.dataset);
        let params = [
            ("get", format!("NAME,{}", codes.join(","))),
            ("for", format!("tract:{}", tract.tract)),
            ("in", format!("state:{} county:{}", tract.state, tract.county)),
            ("key", self.api_key.clone()),
        ];

        debug!(tract = %tract.name, url = %url, "requesting demographics");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CensusError::Timeout(self.timeout)
                } else {
                    CensusError::Network(e)
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok());
            return Err(CensusError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CensusError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<Vec<Option<String>>> = response
            .json()
            .await
            .map_err(|e| CensusError::Parse(format!("invalid response body: {e}")))?;

        if rows.len() < 2 {
            return Err(CensusError::NoData);
        }

        let headers = &rows[0];
        let values = &rows[1];

        // Invert name→code to map the header row back to field names
        let by_code: BTreeMap<&str, &str> = variables
            .iter()
            .map(|(name, code)| (code.as_str(), name.as_str()))
            .collect();

        let mut record = Record::new(tract, self.data_source_label());
        for (i, header) in headers.iter().enumerate() {
            let Some(code) = header.as_deref() else {
                continue;
            };
            if let Some(name) = by_code.get(code) {
                let raw = values.get(i).and_then(|v| v.as_deref());
                record.insert(*name, FieldValue::parse(raw));
            }
        }

        info!(tract = %tract.name, fields = record.fields.len(), "census fetch succeeded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CensusConfig;

    fn client() -> CensusClient {
        CensusClient::new("test-key".to_string(), &CensusConfig::default()).unwrap()
    }

    #[test]
    fn test_data_source_label() {
        assert_eq!(client().data_source_label(), "census_acs5_2021");
    }

    #[test]
    fn test_data_source_label_without_slash() {
        let config = CensusConfig {
            dataset: "dec".to_string(),
            year: 2020,
            ..Default::default()
        };
        let client = CensusClient::new("k".to_string(), &config).unwrap();
        assert_eq!(client.data_source_label(), "census_dec_2020");
    }
}
