//! # Backoff policy for relaunching failed instances.
//!
//! A failed exit is not relaunched immediately. The delay is derived from
//! the instance's own history:
//!
//! ```text
//! delay = max(minimum, uptime) × retries
//! ```
//!
//! Instances that crash on startup back off linearly in their launch count,
//! floored at [`BackoffPolicy::minimum`]; instances that ran for a while
//! before failing back off proportionally to that uptime, which breaks tight
//! crash loops without delaying recovery of a service that was healthy for
//! hours.

use std::time::Duration;

/// Floor for any failure-triggered relaunch delay.
pub const MINIMUM_BACKOFF: Duration = Duration::from_millis(500);

/// Relaunch delay policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Lower bound on the per-retry base delay.
    pub minimum: Duration,
}

impl Default for BackoffPolicy {
    /// Returns a policy floored at [`MINIMUM_BACKOFF`].
    fn default() -> Self {
        Self {
            minimum: MINIMUM_BACKOFF,
        }
    }
}

impl BackoffPolicy {
    /// Computes the relaunch delay for an instance.
    ///
    /// `uptime` is the time since the failed launch started; `retries` is
    /// the instance's launch count (already incremented for the launch that
    /// failed, so the first failure computes with `retries == 1`). The
    /// multiplication saturates instead of overflowing.
    pub fn delay(&self, uptime: Duration, retries: u32) -> Duration {
        uptime.max(self.minimum).saturating_mul(retries.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_crash_uses_the_floor() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(Duration::from_millis(1), 1), MINIMUM_BACKOFF);
    }

    #[test]
    fn delay_grows_with_retries() {
        let policy = BackoffPolicy::default();
        let mut previous = Duration::ZERO;
        for retries in 1..6 {
            let delay = policy.delay(Duration::from_millis(1), retries);
            assert!(delay > previous, "retry {retries}: {delay:?} !> {previous:?}");
            previous = delay;
        }
    }

    #[test]
    fn long_uptime_scales_the_base() {
        let policy = BackoffPolicy::default();
        let uptime = Duration::from_secs(40);
        assert_eq!(policy.delay(uptime, 1), uptime);
        assert_eq!(policy.delay(uptime, 2), uptime * 2);
    }

    #[test]
    fn zero_retries_is_treated_as_one() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(Duration::ZERO, 0), MINIMUM_BACKOFF);
    }

    #[test]
    fn huge_retry_count_saturates() {
        let policy = BackoffPolicy::default();
        let delay = policy.delay(Duration::from_secs(u64::MAX / 2), u32::MAX);
        assert_eq!(delay, Duration::MAX);
    }
}
