//! Dual-window (per day, per minute) call counter guarding the upstream API budget.
//!
//! Every admission attempt is counted in both the current day bucket and the
//! current minute bucket, and is admitted only if both post-increment counts are
//! within their limits. Buckets are keyed by UTC wall-clock time.

use crate::rate_limit::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DAILY_LIMIT: u32 = 10_000;
pub const MINUTE_LIMIT: u32 = 10;

/// Maximum number of calls per day bucket and per minute bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub daily: u32,
    pub per_minute: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            daily: DAILY_LIMIT,
            per_minute: MINUTE_LIMIT,
        }
    }
}

/// Remaining calls in the current day and minute buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub daily_remaining: u32,
    pub minute_remaining: u32,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} calls left today, {} this minute",
            self.daily_remaining, self.minute_remaining
        )
    }
}

#[derive(Debug)]
struct Bucket {
    key: String,
    count: u32,
}

/// Counter for one window that only remembers the current and the previous bucket.
#[derive(Debug, Default)]
struct WindowCounter {
    current: Option<Bucket>,
    previous: Option<Bucket>,
}

impl WindowCounter {
    fn increment(&mut self, key: &str) -> u32 {
        let in_current = self.current.as_ref().is_some_and(|b| b.key == key);
        if !in_current {
            let in_previous = self.previous.as_ref().is_some_and(|b| b.key == key);
            if in_previous {
                // Clock stepped back into the previous bucket.
                std::mem::swap(&mut self.current, &mut self.previous);
            } else {
                self.previous = self.current.take();
                self.current = Some(Bucket {
                    key: key.to_string(),
                    count: 0,
                });
            }
        }

        match self.current.as_mut() {
            Some(bucket) => {
                bucket.count = bucket.count.saturating_add(1);
                bucket.count
            }
            None => 0,
        }
    }

    fn count(&self, key: &str) -> u32 {
        [&self.current, &self.previous]
            .into_iter()
            .flatten()
            .find(|bucket| bucket.key == key)
            .map_or(0, |bucket| bucket.count)
    }

    fn tracked_buckets(&self) -> usize {
        self.current.is_some() as usize + self.previous.is_some() as usize
    }
}

#[derive(Debug, Default)]
struct UsageCounters {
    daily: WindowCounter,
    minute: WindowCounter,
}

fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

fn minute_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d-%H-%M").to_string()
}

/// Admits or rejects calls against a per-day and a per-minute budget.
///
/// Both counters are updated under a single lock, so concurrent callers never
/// observe a half-applied increment. Share one limiter between invocations with
/// an [`Arc`].
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use climate_trends::{Clock, RateLimiter, RateLimits};
/// use std::sync::Arc;
///
/// struct Frozen(DateTime<Utc>);
///
/// impl Clock for Frozen {
///     fn now(&self) -> DateTime<Utc> {
///         self.0
///     }
/// }
///
/// let noon = Utc.with_ymd_and_hms(2025, 7, 27, 12, 0, 0).unwrap();
/// let limiter = RateLimiter::with_clock(
///     RateLimits { daily: 100, per_minute: 2 },
///     Arc::new(Frozen(noon)),
/// );
/// assert!(limiter.admit());
/// assert!(limiter.admit());
/// // Third attempt in the same minute is over the per-minute budget, but still counted
/// assert!(!limiter.admit());
/// assert_eq!(limiter.usage().daily_remaining, 97);
/// assert_eq!(limiter.usage().minute_remaining, 0);
/// ```
pub struct RateLimiter {
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    counters: Mutex<UsageCounters>,
}

impl RateLimiter {
    /// A limiter with the default budget (10000 per day, 10 per minute) on the system clock.
    pub fn new() -> Self {
        Self::with_limits(RateLimits::default())
    }

    pub fn with_limits(limits: RateLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            counters: Mutex::new(UsageCounters::default()),
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Counts one call attempt and reports whether it is within budget.
    ///
    /// The attempt is counted even when it is rejected.
    pub fn admit(&self) -> bool {
        let now = self.clock.now();
        let day = day_key(now);
        let minute = minute_key(now);

        let (daily_count, minute_count) = {
            let mut counters = self.lock();
            let daily_count = counters.daily.increment(&day);
            let minute_count = counters.minute.increment(&minute);
            (daily_count, minute_count)
        };

        let admitted = daily_count <= self.limits.daily && minute_count <= self.limits.per_minute;
        if admitted {
            debug!(
                "Admitted call {} of {} today ({}), {} of {} this minute",
                daily_count, self.limits.daily, day, minute_count, self.limits.per_minute
            );
        } else {
            warn!(
                "Rejected call: {} of {} today ({}), {} of {} this minute",
                daily_count, self.limits.daily, day, minute_count, self.limits.per_minute
            );
        }
        admitted
    }

    /// Remaining budget in the current buckets. Does not count as a call.
    pub fn usage(&self) -> Usage {
        let now = self.clock.now();
        let counters = self.lock();
        Usage {
            daily_remaining: self
                .limits
                .daily
                .saturating_sub(counters.daily.count(&day_key(now))),
            minute_remaining: self
                .limits
                .per_minute
                .saturating_sub(counters.minute.count(&minute_key(now))),
        }
    }

    /// Number of buckets held in memory across both windows.
    #[cfg(test)]
    pub(crate) fn tracked_buckets(&self) -> usize {
        let counters = self.lock();
        counters.daily.tracked_buckets() + counters.minute.tracked_buckets()
    }

    fn lock(&self) -> MutexGuard<'_, UsageCounters> {
        // Counters stay consistent even if a holder panicked; every update is a single add.
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ManualClock;
    use chrono::{Duration, TimeZone};

    fn limiter_at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap(),
        ));
        let limiter = RateLimiter::with_clock(RateLimits::default(), clock.clone());
        (limiter, clock)
    }

    #[test]
    fn test_bucket_keys() {
        let now = Utc.with_ymd_and_hms(2025, 7, 27, 9, 5, 42).unwrap();
        assert_eq!(day_key(now), "2025-07-27");
        assert_eq!(minute_key(now), "2025-07-27-09-05");
    }

    #[test]
    fn test_minute_window_isolation() {
        let (limiter, clock) = limiter_at(2025, 7, 27, 12, 0);

        for call in 1..=MINUTE_LIMIT {
            assert!(limiter.admit(), "call {} should be admitted", call);
        }
        assert!(!limiter.admit(), "11th call in the same minute must be rejected");
        assert_eq!(limiter.usage().minute_remaining, 0);

        clock.advance(Duration::minutes(1));
        assert_eq!(limiter.usage().minute_remaining, MINUTE_LIMIT);
        assert!(limiter.admit(), "next minute bucket re-admits immediately");

        // 11 attempts in the first minute plus 1 in the second, rejected one included
        assert_eq!(limiter.usage().daily_remaining, DAILY_LIMIT - 12);
    }

    #[test]
    fn test_rejected_calls_are_counted() {
        let (limiter, _clock) = limiter_at(2025, 7, 27, 12, 0);
        for _ in 0..15 {
            limiter.admit();
        }
        assert_eq!(limiter.usage().daily_remaining, DAILY_LIMIT - 15);
        assert_eq!(limiter.usage().minute_remaining, 0);
    }

    #[test]
    fn test_daily_exhaustion() {
        let (limiter, clock) = limiter_at(2025, 7, 27, 0, 0);

        let mut calls = 0;
        while calls < DAILY_LIMIT {
            for _ in 0..MINUTE_LIMIT {
                assert!(limiter.admit());
                calls += 1;
            }
            clock.advance(Duration::minutes(1));
        }
        assert_eq!(limiter.usage().daily_remaining, 0);

        // Fresh minute bucket, but the day is used up
        assert_eq!(limiter.usage().minute_remaining, MINUTE_LIMIT);
        assert!(!limiter.admit());
        clock.advance(Duration::minutes(1));
        assert!(!limiter.admit());

        // New day, new budget
        clock.set(Utc.with_ymd_and_hms(2025, 7, 28, 0, 0, 0).unwrap());
        assert!(limiter.admit());
        assert_eq!(limiter.usage().daily_remaining, DAILY_LIMIT - 1);
    }

    #[test]
    fn test_usage_does_not_count() {
        let (limiter, _clock) = limiter_at(2025, 1, 1, 8, 30);
        for _ in 0..5 {
            limiter.usage();
        }
        assert_eq!(
            limiter.usage(),
            Usage {
                daily_remaining: DAILY_LIMIT,
                minute_remaining: MINUTE_LIMIT
            }
        );
    }

    #[test]
    fn test_old_buckets_are_evicted() {
        let (limiter, clock) = limiter_at(2025, 3, 1, 23, 50);
        for _ in 0..30 {
            limiter.admit();
            clock.advance(Duration::minutes(1));
        }
        // current + previous for each of the two windows
        assert!(limiter.tracked_buckets() <= 4);
    }

    #[test]
    fn test_clock_stepping_back_reuses_previous_bucket() {
        let (limiter, clock) = limiter_at(2025, 3, 1, 10, 0);
        for _ in 0..MINUTE_LIMIT {
            limiter.admit();
        }
        clock.advance(Duration::minutes(1));
        limiter.admit();
        clock.advance(Duration::minutes(-1));
        assert!(!limiter.admit(), "previous minute bucket is still full");
    }

    #[test]
    fn test_concurrent_admissions_never_exceed_minute_budget() {
        let (limiter, _clock) = limiter_at(2025, 5, 5, 5, 5);
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..5).filter(|_| limiter.admit()).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, MINUTE_LIMIT as usize);
        assert_eq!(limiter.usage().daily_remaining, DAILY_LIMIT - 40);
    }
}
