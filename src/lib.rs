//! demogen - adaptive demographic data collection for food-access analysis.
//!
//! ## Architecture
//!
//! One sequential collection loop, decomposed into:
//! - **Source** (`client`): Census API client, or a seeded synthetic
//!   generator when no credential is configured
//! - **Quality Assessor** (`quality`): scores each record 0.0-1.0 from
//!   completeness, range-validity, and consistency checks
//! - **Pacing Controller** (`pacing`): adapts the inter-tract delay from
//!   recent quality and cumulative success, with jittered sleeps
//! - **Pipeline** (`pipeline`): fetch → score → gate → accumulate
//! - **Reporter** (`report`): raw JSON + CSV, metadata, HTML report,
//!   text summary
//!
//! Run state is an explicit `RunStats` value threaded through the loop,
//! so scoring and pacing stay testable in isolation.

pub mod client;
pub mod models;
pub mod pacing;
pub mod pipeline;
pub mod quality;
pub mod report;

// Re-exports for convenience
pub use client::{build_source, CensusClient, DemographicSource, MockGenerator, MockSource};
pub use models::{
    sample_tracts, CensusError, Config, DemogenError, FieldValue, Record, Result, RunStats, Store,
    StoreCategory, Tract,
};
pub use pacing::PacingController;
pub use pipeline::{CollectionPipeline, RunOutcome};
pub use quality::QualityAssessor;
