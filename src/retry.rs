//! Bounded exponential backoff, used as a `tokio-retry2` strategy.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_elapsed: Option<Duration>,
    pub max_attempts: Option<usize>,
}

impl Backoff {
    /// Manifest ETag lookups: give up after about a minute.
    pub const ETAG: Backoff = Backoff {
        initial: Duration::from_secs(1),
        multiplier: 1.5,
        max_delay: Duration::from_secs(30),
        max_elapsed: Some(Duration::from_secs(60)),
        max_attempts: None,
    };

    /// Waiting for a new batch job to become startable.
    pub const JOB_READY: Backoff = Backoff {
        initial: Duration::from_secs(1),
        multiplier: 1.5,
        max_delay: Duration::from_secs(30),
        max_elapsed: None,
        max_attempts: Some(60),
    };

    pub fn delays(&self) -> Delays {
        Delays {
            policy: *self,
            next: self.initial,
            start: Instant::now(),
            elapsed: Duration::ZERO,
            attempts: 1,
        }
    }
}

impl IntoIterator for Backoff {
    type Item = Duration;
    type IntoIter = Delays;

    fn into_iter(self) -> Self::IntoIter {
        self.delays()
    }
}

/// Yields the delay before each retry; ends once the attempt or elapsed budget is spent.
#[derive(Debug, Clone)]
pub struct Delays {
    policy: Backoff,
    next: Duration,
    start: Instant,
    elapsed: Duration,
    attempts: usize,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if let Some(max_attempts) = self.policy.max_attempts {
            if self.attempts >= max_attempts {
                return None;
            }
        }

        let delay = self.next.min(self.policy.max_delay);
        if let Some(max_elapsed) = self.policy.max_elapsed {
            // real time covers slow attempts, the running sum covers unslept delays
            let elapsed = self.start.elapsed().max(self.elapsed);
            if elapsed + delay > max_elapsed {
                return None;
            }
        }

        self.attempts += 1;
        self.elapsed += delay;
        self.next = delay.mul_f64(self.policy.multiplier).min(self.policy.max_delay);
        Some(delay)
    }
}
