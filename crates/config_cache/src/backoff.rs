//! Exponential backoff with randomization
//!
//! Each delay is drawn from `[interval * (1 - f), interval * (1 + f)]`, then the
//! interval grows by the multiplier up to the max interval. Once the elapsed time
//! since the first attempt exceeds the budget, no further delay is produced.

use std::time::Duration;

use contracts::BackoffSettings;
use tokio::time::Instant;

/// Exponential backoff state for one call
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max_interval: Duration,
    max_elapsed_time: Duration,
    multiplier: f64,
    randomization_factor: f64,
    current_interval: Duration,
    started_at: Instant,
}

impl ExponentialBackoff {
    pub fn from_settings(settings: &BackoffSettings) -> Self {
        Self {
            max_interval: Duration::from_millis(settings.max_interval_ms),
            max_elapsed_time: Duration::from_millis(settings.max_elapsed_time_ms),
            multiplier: settings.multiplier,
            randomization_factor: settings.randomization_factor,
            current_interval: Duration::from_millis(settings.initial_interval_ms),
            started_at: Instant::now(),
        }
    }

    /// Next delay, or `None` when the elapsed-time budget is spent
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.started_at.elapsed() > self.max_elapsed_time {
            return None;
        }
        let delay = randomized_interval(
            self.current_interval,
            self.randomization_factor,
            rand::random::<f64>(),
        );
        self.grow_interval();
        Some(delay)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    fn grow_interval(&mut self) {
        let next = self.current_interval.as_secs_f64() * self.multiplier;
        self.current_interval = if !next.is_finite() || next >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(next)
        };
    }
}

/// Pick a delay within `interval * (1 ± factor)` using `random` in `[0, 1)`
fn randomized_interval(interval: Duration, factor: f64, random: f64) -> Duration {
    let base = interval.as_secs_f64();
    let delta = factor * base;
    let min = base - delta;
    let max = base + delta;
    let picked = min + random * (max - min);
    if !picked.is_finite() {
        return interval;
    }
    Duration::from_secs_f64(picked.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BackoffSettings {
        BackoffSettings {
            enabled: true,
            initial_interval_ms: 100,
            max_interval_ms: 300,
            max_elapsed_time_ms: 10_000,
            multiplier: 2.0,
            randomization_factor: 0.5,
        }
    }

    #[test]
    fn test_randomized_interval_bounds() {
        let interval = Duration::from_millis(1000);
        assert_eq!(
            randomized_interval(interval, 0.5, 0.0),
            Duration::from_millis(500)
        );
        assert_eq!(
            randomized_interval(interval, 0.5, 0.5),
            Duration::from_millis(1000)
        );
        assert_eq!(randomized_interval(interval, 0.0, 0.9), interval);
    }

    #[tokio::test]
    async fn test_interval_grows_until_cap() {
        let mut backoff = ExponentialBackoff::from_settings(&settings());
        assert_eq!(backoff.current_interval(), Duration::from_millis(100));

        let first = backoff.next_backoff().unwrap();
        assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(150));
        assert_eq!(backoff.current_interval(), Duration::from_millis(200));

        backoff.next_backoff().unwrap();
        assert_eq!(backoff.current_interval(), Duration::from_millis(300));

        backoff.next_backoff().unwrap();
        assert_eq!(backoff.current_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_non_finite_factor_keeps_interval() {
        let interval = Duration::from_millis(400);
        assert_eq!(randomized_interval(interval, f64::NAN, 0.3), interval);
        assert_eq!(randomized_interval(interval, f64::INFINITY, 0.3), interval);
    }

    #[tokio::test]
    async fn test_non_finite_multiplier_caps_at_max_interval() {
        for multiplier in [f64::NAN, f64::INFINITY] {
            let mut backoff = ExponentialBackoff::from_settings(&BackoffSettings {
                multiplier,
                ..settings()
            });
            assert!(backoff.next_backoff().is_some());
            assert_eq!(backoff.current_interval(), Duration::from_millis(300));
            assert!(backoff.next_backoff().is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_elapsed_budget() {
        let mut backoff = ExponentialBackoff::from_settings(&BackoffSettings {
            max_elapsed_time_ms: 1_000,
            ..settings()
        });
        assert!(backoff.next_backoff().is_some());

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert!(backoff.next_backoff().is_none());
    }
}
