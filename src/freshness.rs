use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::record::Freshness;

/// Source of the current time.
///
/// The evaluator's only non-determinism; tests inject a fixed clock.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Annotates device-reported timestamps with a liveness verdict and a
/// human-readable age.
///
/// "Now" is pulled back by a one-minute lookback before the comparison to
/// tolerate device clock drift and uplink latency: a reading is current
/// while it is less than a minute old.
pub struct FreshnessEvaluator {
    clock: Arc<dyn Clock>,
    lookback: Duration,
}

impl FreshnessEvaluator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lookback: Duration::minutes(1),
        }
    }

    pub fn evaluate(&self, datetime: DateTime<Utc>) -> Freshness {
        let skewed_now = self.clock.now_utc() - self.lookback;
        Freshness {
            is_current: skewed_now < datetime,
            age: humanize_age(skewed_now - datetime),
        }
    }
}

impl Default for FreshnessEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse human rendering of a duration, in the style of calendar
/// libraries: "a few seconds ago", "2 hours ago", "a day ago", ...
/// Sign is ignored; readings slightly in the future read as recent.
fn humanize_age(diff: Duration) -> String {
    let secs = diff.num_seconds().abs();
    let mins = (secs as f64 / 60.0).round() as i64;
    let hours = (mins as f64 / 60.0).round() as i64;
    let days = (hours as f64 / 24.0).round() as i64;

    if secs < 45 {
        "a few seconds ago".to_string()
    } else if secs < 90 {
        "a minute ago".to_string()
    } else if mins < 45 {
        format!("{} minutes ago", mins)
    } else if mins < 90 {
        "an hour ago".to_string()
    } else if hours < 22 {
        format!("{} hours ago", hours)
    } else if hours < 36 {
        "a day ago".to_string()
    } else if days < 26 {
        format!("{} days ago", days)
    } else if days < 45 {
        "a month ago".to_string()
    } else if days < 320 {
        format!("{} months ago", (days as f64 / 30.44).round() as i64)
    } else if days < 548 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", (days as f64 / 365.25).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock {
        now: DateTime<Utc>,
    }

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.now
        }
    }

    fn evaluator_at(now: DateTime<Utc>) -> FreshnessEvaluator {
        FreshnessEvaluator::with_clock(Arc::new(FixedClock { now }))
    }

    fn t0() -> DateTime<Utc> {
        "2016-02-09T19:43:29Z".parse().unwrap()
    }

    #[test]
    fn test_thirty_second_old_reading_is_current() {
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() - Duration::seconds(30));
        assert!(freshness.is_current);
        assert_eq!(freshness.age, "a few seconds ago");
    }

    #[test]
    fn test_boundary_at_exactly_sixty_seconds() {
        // skewed now == datetime: the strict comparison makes it stale
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() - Duration::seconds(60));
        assert!(!freshness.is_current);
    }

    #[test]
    fn test_boundary_at_sixty_one_seconds() {
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() - Duration::seconds(61));
        assert!(!freshness.is_current);
    }

    #[test]
    fn test_just_inside_the_lookback_is_current() {
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() - Duration::seconds(59));
        assert!(freshness.is_current);
    }

    #[test]
    fn test_age_is_computed_even_when_stale() {
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() - Duration::hours(2));
        assert!(!freshness.is_current);
        assert_eq!(freshness.age, "2 hours ago");
    }

    #[test]
    fn test_humanize_thresholds() {
        assert_eq!(humanize_age(Duration::seconds(10)), "a few seconds ago");
        assert_eq!(humanize_age(Duration::seconds(70)), "a minute ago");
        assert_eq!(humanize_age(Duration::minutes(10)), "10 minutes ago");
        assert_eq!(humanize_age(Duration::minutes(60)), "an hour ago");
        assert_eq!(humanize_age(Duration::hours(5)), "5 hours ago");
        assert_eq!(humanize_age(Duration::hours(30)), "a day ago");
        assert_eq!(humanize_age(Duration::days(5)), "5 days ago");
        assert_eq!(humanize_age(Duration::days(40)), "a month ago");
        assert_eq!(humanize_age(Duration::days(90)), "3 months ago");
        assert_eq!(humanize_age(Duration::days(400)), "a year ago");
        assert_eq!(humanize_age(Duration::days(800)), "2 years ago");
    }

    #[test]
    fn test_future_reading_reads_as_recent() {
        let evaluator = evaluator_at(t0());
        let freshness = evaluator.evaluate(t0() + Duration::seconds(10));
        assert!(freshness.is_current);
        assert_eq!(freshness.age, "a minute ago");
    }
}
