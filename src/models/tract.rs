//! Census tract sampling units.

use serde::{Deserialize, Serialize};

/// One census tract targeted for a single collection pass.
///
/// Identified by the three-level FIPS hierarchy: state, county, tract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tract {
    /// Two-digit state FIPS code
    pub state: String,

    /// Three-digit county FIPS code
    pub county: String,

    /// Six-digit tract FIPS code
    pub tract: String,

    /// Human-readable display name
    pub name: String,
}

impl Tract {
    pub fn new(
        state: impl Into<String>,
        county: impl Into<String>,
        tract: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            county: county.into(),
            tract: tract.into(),
            name: name.into(),
        }
    }

    /// Concatenated 11-digit GEOID (state + county + tract).
    pub fn geoid(&self) -> String {
        format!("{}{}{}", self.state, self.county, self.tract)
    }
}

/// Built-in sample of census tracts, chosen to span urban, suburban,
/// rural, and mixed contexts.
///
/// Truncated to `target` entries (the `collection.target_tracts` setting).
pub fn sample_tracts(target: usize) -> Vec<Tract> {
    let tracts = vec![
        // Urban
        Tract::new("17", "031", "770100", "Chicago, IL (Urban)"),
        Tract::new("06", "037", "207400", "Los Angeles, CA (Urban)"),
        Tract::new("36", "061", "008600", "Manhattan, NY (Urban)"),
        // Suburban
        Tract::new("17", "031", "810600", "Chicago Suburbs, IL"),
        Tract::new("06", "073", "401101", "San Diego Suburbs, CA"),
        // Rural
        Tract::new("28", "151", "960100", "Mississippi Delta (Rural)"),
        Tract::new("21", "095", "950100", "Appalachia, KY (Rural)"),
        // Mixed
        Tract::new("48", "201", "110305", "Houston, TX"),
        Tract::new("04", "013", "040902", "Phoenix, AZ"),
        Tract::new("13", "121", "000604", "Atlanta, GA"),
    ];

    tracts.into_iter().take(target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geoid_concatenates_fips() {
        let tract = Tract::new("17", "031", "770100", "Chicago, IL (Urban)");
        assert_eq!(tract.geoid(), "17031770100");
    }

    #[test]
    fn test_sample_tracts_respects_target() {
        assert_eq!(sample_tracts(3).len(), 3);
        assert_eq!(sample_tracts(10).len(), 10);
        // Asking past the built-in list caps at what exists
        assert_eq!(sample_tracts(100).len(), 10);
    }
}
