//! Bounded polling with capped exponential backoff.
//!
//! Every blocking wait in the scraper (waiting for the load-more button to
//! appear, waiting for it to become clickable) goes through a
//! [`RetryPolicy`], so the number of probes a wait can make is fixed up front
//! and the termination of the load loop does not depend on the page.
//!
//! # Backoff Strategy
//!
//! The delay after the `n`-th failed attempt follows:
//! ```text
//! delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=jitter)
//! ```
//!
//! A fixed-interval poll is the special case `base_delay == max_delay` with
//! no jitter, which is what [`RetryPolicy::polling`] builds.

use rand::{rng, Rng};
use std::fmt;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::trace;

/// How many times to probe a condition and how long to wait in between.
#[derive(Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of probes, including the first one.
    pub max_attempts: usize,
    /// Delay after the first failed probe (doubles with each attempt).
    pub base_delay: Duration,
    /// Upper bound on the delay between two probes.
    pub max_delay: Duration,
    /// Upper bound of the random delay added on top of the backoff.
    pub jitter: Duration,
}

/// Result of [`RetryPolicy::poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollResult {
    /// Whether the probe returned `true` before the attempts ran out.
    pub satisfied: bool,
    /// Number of probes that were made.
    pub attempts: usize,
    /// Wall-clock time spent polling.
    pub elapsed: Duration,
}

impl RetryPolicy {
    /// Fixed-interval polling that gives up after roughly `timeout`.
    ///
    /// The number of attempts is `ceil(timeout / interval)`, and never less
    /// than one, so a zero timeout still probes once. Combine with
    /// [`RetryPolicy::with_jitter`] to spread the probes out.
    pub fn polling(timeout: Duration, interval: Duration) -> Self {
        let max_attempts = if interval.is_zero() {
            1
        } else {
            let attempts = timeout.as_nanos().div_ceil(interval.as_nanos()).max(1);
            usize::try_from(attempts).unwrap_or(usize::MAX)
        };
        Self {
            max_attempts,
            base_delay: interval,
            max_delay: interval,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to wait after the `attempt`-th failed probe (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        let mut delay = self.base_delay.saturating_mul(1u32 << exponent);
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        if self.jitter.is_zero() {
            return delay;
        }
        let bound = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let jitter_ns: u64 = rng().random_range(0..=bound);
        delay.saturating_add(Duration::from_nanos(jitter_ns))
    }

    /// Call `probe` until it returns `true` or the attempts are exhausted,
    /// sleeping between probes according to the policy.
    pub fn poll_until<F>(&self, mut probe: F) -> PollResult
    where
        F: FnMut() -> bool,
    {
        let t0 = Instant::now();
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if probe() {
                return PollResult {
                    satisfied: true,
                    attempts: attempt,
                    elapsed: t0.elapsed(),
                };
            }
            if attempt < max_attempts {
                let delay = self.delay_for(attempt);
                trace!(attempt, max = max_attempts, ?delay, "probe not satisfied; backing off");
                sleep(delay);
            }
        }

        PollResult {
            satisfied: false,
            attempts: max_attempts,
            elapsed: t0.elapsed(),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .finish()
    }
}
