//! Adaptive request pacing.
//!
//! One scalar delay between tracts, tuned after every tract from two
//! signals: the mean of the last five quality scores and the cumulative
//! success rate. The rules are cumulative within one `adapt` call - the
//! success-rate doubling can compound on top of a quality adjustment.
//! The sleep itself is jittered to avoid synchronized request bursts.

use crate::models::RunStats;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, warn};

/// Rolling window of quality scores consulted by `adapt`.
pub const QUALITY_WINDOW: usize = 5;

/// Forced sleep after a rate-limit response, on top of delay doubling.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

const LOW_QUALITY_MEAN: f64 = 0.6;
const HIGH_QUALITY_MEAN: f64 = 0.9;
const LOW_SUCCESS_RATE: f64 = 0.7;

const SLOWDOWN_FACTOR: f64 = 1.5;
const SLOWDOWN_CAP_SECS: f64 = 10.0;
const SPEEDUP_FACTOR: f64 = 0.9;
const SPEEDUP_FLOOR_SECS: f64 = 1.0;
const FAILURE_FACTOR: f64 = 2.0;
const FAILURE_CAP_SECS: f64 = 15.0;

const JITTER_MIN: f64 = 0.8;
const JITTER_MAX: f64 = 1.2;

/// Pacing controller: owns the inter-tract delay.
#[derive(Debug)]
pub struct PacingController {
    delay_secs: f64,
    rng: StdRng,
}

impl PacingController {
    /// Start from the configured baseline delay.
    pub fn new(min_delay_seconds: f64) -> Self {
        Self {
            delay_secs: min_delay_seconds,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter for tests.
    pub fn with_seed(min_delay_seconds: f64, seed: u64) -> Self {
        Self {
            delay_secs: min_delay_seconds,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current delay in seconds.
    pub fn delay_secs(&self) -> f64 {
        self.delay_secs
    }

    /// Adjust the delay from recent quality and cumulative success.
    ///
    /// Called once per tract, after scoring. Rules in order:
    /// 1. recent quality mean < 0.6 → ×1.5, capped at 10 s
    /// 2. else mean > 0.9 and delay > 1 s → ×0.9, floored at 1 s
    /// 3. success rate < 0.7 → ×2, capped at 15 s (compounds on 1/2)
    pub fn adapt(&mut self, stats: &RunStats) {
        let recent_quality = stats.recent_quality_mean(QUALITY_WINDOW);

        if recent_quality < LOW_QUALITY_MEAN {
            self.delay_secs = (self.delay_secs * SLOWDOWN_FACTOR).min(SLOWDOWN_CAP_SECS);
            warn!(
                avg_quality = format!("{recent_quality:.2}"),
                delay_secs = self.delay_secs,
                "quality dropping, slowing down"
            );
        } else if recent_quality > HIGH_QUALITY_MEAN && self.delay_secs > SPEEDUP_FLOOR_SECS {
            self.delay_secs = (self.delay_secs * SPEEDUP_FACTOR).max(SPEEDUP_FLOOR_SECS);
            debug!(
                avg_quality = format!("{recent_quality:.2}"),
                delay_secs = self.delay_secs,
                "quality excellent, speeding up"
            );
        }

        let success_rate = stats.success_rate();
        if success_rate < LOW_SUCCESS_RATE {
            self.delay_secs = (self.delay_secs * FAILURE_FACTOR).min(FAILURE_CAP_SECS);
            warn!(
                success_rate = format!("{:.1}%", success_rate * 100.0),
                delay_secs = self.delay_secs,
                "success rate low, increasing delay"
            );
        }
    }

    /// Double the delay after a rate-limit response. Uncapped here; the
    /// caps re-bound it on the next `adapt` call.
    pub fn on_rate_limited(&mut self) {
        self.delay_secs *= 2.0;
        warn!(delay_secs = self.delay_secs, "rate limited, doubling delay");
    }

    /// Sleep for the jittered delay. Returns the seconds slept.
    ///
    /// The single routine suspension point of the collection loop,
    /// executed once per tract, failures included.
    pub async fn wait(&mut self) -> f64 {
        let jitter = self.rng.gen_range(JITTER_MIN..JITTER_MAX);
        let actual = self.delay_secs * jitter;
        debug!(
            delay_secs = format!("{actual:.2}"),
            "waiting before next tract"
        );
        tokio::time::sleep(Duration::from_secs_f64(actual)).await;
        actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with_scores(scores: &[f64]) -> RunStats {
        let mut stats = RunStats::new();
        for &score in scores {
            stats.record_quality(score);
        }
        stats
    }

    #[test]
    fn test_empty_history_counts_as_perfect_quality() {
        let mut pacing = PacingController::new(2.0);
        pacing.adapt(&RunStats::new());
        // Mean defaults to 1.0, which is the speed-up regime
        assert!((pacing.delay_secs() - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_low_quality_slows_down_with_cap() {
        let mut pacing = PacingController::new(4.0);
        pacing.adapt(&stats_with_scores(&[0.2, 0.3, 0.4]));
        assert!((pacing.delay_secs() - 6.0).abs() < 1e-9);

        let mut pacing = PacingController::new(9.0);
        pacing.adapt(&stats_with_scores(&[0.1; 5]));
        assert_eq!(pacing.delay_secs(), 10.0);
    }

    #[test]
    fn test_high_quality_speeds_up_with_floor() {
        let mut pacing = PacingController::new(5.0);
        pacing.adapt(&stats_with_scores(&[0.95; 5]));
        assert!((pacing.delay_secs() - 4.5).abs() < 1e-9);

        let mut pacing = PacingController::new(1.05);
        pacing.adapt(&stats_with_scores(&[0.95; 5]));
        assert_eq!(pacing.delay_secs(), 1.0);
    }

    #[test]
    fn test_speed_up_requires_delay_above_floor() {
        let mut pacing = PacingController::new(1.0);
        pacing.adapt(&stats_with_scores(&[1.0; 5]));
        assert_eq!(pacing.delay_secs(), 1.0);
    }

    #[test]
    fn test_low_success_rate_doubles_with_cap() {
        let mut stats = stats_with_scores(&[0.8; 5]);
        stats.total_requests = 10;
        stats.successful_requests = 5;

        let mut pacing = PacingController::new(4.0);
        pacing.adapt(&stats);
        assert!((pacing.delay_secs() - 8.0).abs() < 1e-9);

        let mut pacing = PacingController::new(12.0);
        pacing.adapt(&stats);
        assert_eq!(pacing.delay_secs(), 15.0);
    }

    #[test]
    fn test_quality_and_success_rules_compound() {
        let mut stats = stats_with_scores(&[0.2; 5]);
        stats.total_requests = 10;
        stats.successful_requests = 2;

        // 4.0 ×1.5 = 6.0, then ×2 = 12.0 within one adapt call
        let mut pacing = PacingController::new(4.0);
        pacing.adapt(&stats);
        assert!((pacing.delay_secs() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_ignores_old_scores() {
        // Five recent good scores hide two early disasters
        let stats = stats_with_scores(&[0.0, 0.0, 0.95, 0.95, 0.95, 0.95, 0.95]);
        let mut pacing = PacingController::new(5.0);
        pacing.adapt(&stats);
        assert!((pacing.delay_secs() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_rate_limit_doubles_delay() {
        let mut pacing = PacingController::new(3.0);
        pacing.on_rate_limited();
        assert_eq!(pacing.delay_secs(), 6.0);
    }

    #[tokio::test]
    async fn test_wait_jitters_within_bounds() {
        let mut pacing = PacingController::with_seed(0.01, 42);
        for _ in 0..20 {
            let slept = pacing.wait().await;
            assert!(slept >= 0.01 * JITTER_MIN);
            assert!(slept < 0.01 * JITTER_MAX);
        }
    }
}
