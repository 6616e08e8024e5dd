//! The collection loop.
//!
//! Per tract: fetch demographics → score → gate on the quality
//! threshold → fetch nearby stores (retained records only) → adapt
//! pacing → jittered sleep. Strictly sequential; the sleep runs once
//! per tract, failures included.

use crate::client::DemographicSource;
use crate::models::{Config, Record, RunStats, Tract};
use crate::pacing::{PacingController, RATE_LIMIT_COOLDOWN};
use crate::quality::QualityAssessor;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

/// Everything a finished run hands to the reporter.
#[derive(Debug)]
pub struct RunOutcome {
    /// Records that passed the quality gate, in collection order
    pub records: Vec<Record>,

    /// Tracts that failed (transport error or quality below threshold)
    pub failed_tracts: Vec<Tract>,

    /// Run-wide counters and histories
    pub stats: RunStats,

    /// Delay setting when the loop ended
    pub final_delay_secs: f64,
}

/// Sequential collection pipeline.
pub struct CollectionPipeline {
    config: Config,
    source: Box<dyn DemographicSource>,
    assessor: QualityAssessor,
    pacing: PacingController,
}

impl CollectionPipeline {
    pub fn new(config: Config, source: Box<dyn DemographicSource>) -> Self {
        let assessor = QualityAssessor::new(&config.quality);
        let pacing = PacingController::new(config.collection.min_delay_seconds);
        Self {
            config,
            source,
            assessor,
            pacing,
        }
    }

    /// Run the collection loop over the given tracts.
    pub async fn run(mut self, tracts: Vec<Tract>) -> RunOutcome {
        let total = tracts.len();
        let threshold = self.config.collection.min_quality_threshold;

        info!(
            total_tracts = total,
            live = self.source.is_live(),
            threshold = threshold,
            "starting demographic collection"
        );

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        let mut stats = RunStats::new();
        let mut records: Vec<Record> = Vec::new();
        let mut failed_tracts: Vec<Tract> = Vec::new();

        for (idx, tract) in tracts.into_iter().enumerate() {
            info!(tract = %tract.name, index = idx + 1, total = total, "processing tract");

            match self.source.fetch_demographics(&tract, &mut stats).await {
                Ok(mut record) => {
                    let score = self.assessor.score(&record);
                    record.quality_score = Some(score);
                    stats.record_quality(score);

                    if score >= threshold {
                        record.nearby_stores = self.source.fetch_stores(&tract).await;
                        records.push(record);
                        stats.record_success();
                        info!(score = format!("{score:.2}"), "collected record");
                    } else {
                        warn!(
                            score = format!("{score:.2}"),
                            threshold = threshold,
                            "quality below threshold, skipping"
                        );
                        failed_tracts.push(tract);
                    }
                }
                Err(err) => {
                    error!(tract = %tract.name, error = %err, "demographics fetch failed");
                    stats.record_failure();

                    if err.is_rate_limited() {
                        self.pacing.on_rate_limited();
                        warn!(
                            cooldown_secs = RATE_LIMIT_COOLDOWN.as_secs(),
                            "cooling down after rate limit"
                        );
                        tokio::time::sleep(RATE_LIMIT_COOLDOWN).await;
                    }

                    failed_tracts.push(tract);
                }
            }

            self.pacing.adapt(&stats);
            self.pacing.wait().await;

            pb.set_position((idx + 1) as u64);
            pb.set_message(format!(
                "collected: {}, failed: {}",
                records.len(),
                failed_tracts.len()
            ));
        }

        pb.finish_with_message(format!(
            "done: {} collected, {} failed",
            records.len(),
            failed_tracts.len()
        ));

        info!(
            collected = records.len(),
            failed = failed_tracts.len(),
            avg_quality = format!("{:.3}", stats.average_quality()),
            final_delay_secs = format!("{:.1}", self.pacing.delay_secs()),
            "collection complete"
        );

        RunOutcome {
            records,
            failed_tracts,
            final_delay_secs: self.pacing.delay_secs(),
            stats,
        }
    }
}
