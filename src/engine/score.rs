//! Time-decayed ranking scores.

use chrono::{DateTime, Utc};

use crate::types::{IndexConfig, ScoreParams};

/// Calculate a decayed ranking score.
///
/// Formula: sign(m) * log10(max(|m|, 1)) + created_secs / decay_seconds
///
/// - m = rshares / rshares_scale (integer division, so weight below one
///   scale unit counts as zero)
/// - the age term grows with creation time, so for fixed rshares a newer
///   item always outranks an older one, and ten times the weight buys
///   `decay_seconds` of age.
pub fn calculate_score(rshares: i64, created: DateTime<Utc>, params: ScoreParams) -> f64 {
    let modified = rshares / params.rshares_scale.max(1);
    let order = (modified.unsigned_abs().max(1) as f64).log10();
    let sign = modified.signum() as f64;
    sign * order + created.timestamp() as f64 / params.decay_seconds.max(1) as f64
}

/// Hot score with the configured tunables.
pub fn calculate_hot(rshares: i64, created: DateTime<Utc>, config: &IndexConfig) -> f64 {
    calculate_score(rshares, created, config.hot)
}

/// Trending score with the configured tunables.
pub fn calculate_trending(rshares: i64, created: DateTime<Utc>, config: &IndexConfig) -> f64 {
    calculate_score(rshares, created, config.trending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_zero_weight_is_pure_age() {
        let score = calculate_score(0, at(1_000_000), ScoreParams::HOT);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sign_preserved() {
        let created = at(1_500_000_000);
        let base = calculate_score(0, created, ScoreParams::HOT);
        let up = calculate_score(1_000_000_000, created, ScoreParams::HOT);
        let down = calculate_score(-1_000_000_000, created, ScoreParams::HOT);
        assert!((up - base - 2.0).abs() < 1e-9);
        assert!((base - down - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_rshares() {
        let created = at(1_500_000_000);
        let mut last = f64::NEG_INFINITY;
        for rshares in [
            -50_000_000_000i64,
            -10_000_000,
            0,
            9_999_999,
            10_000_000,
            200_000_000,
            i64::MAX,
        ] {
            let score = calculate_score(rshares, created, ScoreParams::TRENDING);
            assert!(score >= last, "score fell at rshares {rshares}");
            last = score;
        }
    }

    #[test]
    fn test_older_scores_lower() {
        for params in [ScoreParams::HOT, ScoreParams::TRENDING] {
            let newer = calculate_score(5_000_000_000, at(1_600_000_000), params);
            let older = calculate_score(5_000_000_000, at(1_599_990_000), params);
            assert!(newer > older);
        }
    }

    #[test]
    fn test_trending_decays_slower_than_hot() {
        let config = IndexConfig::default();
        let day = 86_400;
        let hot_drop = calculate_hot(0, at(2 * day), &config) - calculate_hot(0, at(day), &config);
        let trending_drop =
            calculate_trending(0, at(2 * day), &config) - calculate_trending(0, at(day), &config);
        assert!((hot_drop / trending_drop - 48.0).abs() < 1e-6);
    }

    #[test]
    fn test_extreme_rshares_finite() {
        let score = calculate_score(i64::MIN, at(0), ScoreParams::HOT);
        assert!(score.is_finite());
    }
}
