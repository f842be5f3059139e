//! # Tick wait strategies.
//!
//! A [`Backoff`] maps a 1-based tick attempt to the time to sleep before that tick.
//!
//! - [`LinearBackoff`] waits the same duration before every tick;
//! - [`ExponentialBackoff`] waits `scalar × 2^(attempt − 1)`: with `scalar = 100ms`,
//!   the first tick waits 100ms and the fifth 1.6s.
//!
//! Both accept a jitter `j ∈ [0, 1]`: the computed wait is scaled by a uniform random
//! factor in `[1 − j, 1 + j]`.
//!
//! Any `Fn(u32) -> Duration` is also a [`Backoff`].
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use nodevisor::tick::{Backoff, ExponentialBackoff, LinearBackoff};
//!
//! let linear = LinearBackoff::new(Duration::from_secs(1));
//! assert_eq!(linear.wait(7), Duration::from_secs(1));
//!
//! let exp = ExponentialBackoff::new(Duration::from_millis(100));
//! assert_eq!(exp.wait(1), Duration::from_millis(100));
//! assert_eq!(exp.wait(5), Duration::from_millis(1600));
//! ```

use std::time::Duration;

use rand::Rng;

/// Computes the wait before a tick.
pub trait Backoff: Send + Sync + 'static {
    /// Wait before tick number `attempt` (1-based).
    fn wait(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync + 'static,
{
    fn wait(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Constant wait between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearBackoff {
    /// Wait before every tick.
    pub every: Duration,
    /// Random spread in `[0, 1]`; `0` disables jitter.
    pub jitter: f64,
}

impl LinearBackoff {
    /// Linear backoff without jitter.
    pub fn new(every: Duration) -> Self {
        Self { every, jitter: 0.0 }
    }

    /// Sets the jitter, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = clamp_jitter(jitter);
        self
    }
}

impl Backoff for LinearBackoff {
    fn wait(&self, _attempt: u32) -> Duration {
        apply_jitter(self.every, self.jitter)
    }
}

/// Doubling wait between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialBackoff {
    /// Wait before the first tick.
    pub scalar: Duration,
    /// Random spread in `[0, 1]`; `0` disables jitter.
    pub jitter: f64,
}

impl ExponentialBackoff {
    /// Exponential backoff without jitter.
    pub fn new(scalar: Duration) -> Self {
        Self {
            scalar,
            jitter: 0.0,
        }
    }

    /// Sets the jitter, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = clamp_jitter(jitter);
        self
    }
}

impl Backoff for ExponentialBackoff {
    /// `scalar × 2^(attempt − 1)`; attempt `0` waits nothing, overflow saturates.
    fn wait(&self, attempt: u32) -> Duration {
        let Some(exp) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let base = 1u32
            .checked_shl(exp)
            .and_then(|factor| self.scalar.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        apply_jitter(base, self.jitter)
    }
}

fn clamp_jitter(jitter: f64) -> f64 {
    if jitter.is_nan() {
        0.0
    } else {
        jitter.clamp(0.0, 1.0)
    }
}

/// Scales `d` by a uniform factor in `[1 − jitter, 1 + jitter]`.
fn apply_jitter(d: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 || d.is_zero() {
        return d;
    }
    let multiplier = jitter * rand::rng().random_range(-1.0..=1.0);
    Duration::try_from_secs_f64(d.as_secs_f64() * (1.0 + multiplier)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_constant() {
        let b = LinearBackoff::new(Duration::from_millis(500));
        for attempt in 0..10 {
            assert_eq!(b.wait(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_exponential_doubles_from_scalar() {
        let b = ExponentialBackoff::new(Duration::from_millis(100));
        assert_eq!(b.wait(0), Duration::ZERO);
        assert_eq!(b.wait(1), Duration::from_millis(100));
        assert_eq!(b.wait(2), Duration::from_millis(200));
        assert_eq!(b.wait(3), Duration::from_millis(400));
        assert_eq!(b.wait(5), Duration::from_millis(1600));
    }

    #[test]
    fn test_exponential_overflow_saturates() {
        let b = ExponentialBackoff::new(Duration::from_secs(1));
        assert_eq!(b.wait(40), Duration::MAX);
        assert_eq!(b.wait(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_jitter_bounds() {
        let b = LinearBackoff::new(Duration::from_millis(1000)).with_jitter(0.2);
        for attempt in 1..200 {
            let d = b.wait(attempt);
            assert!(d >= Duration::from_millis(799), "{d:?} below lower bound");
            assert!(d <= Duration::from_millis(1201), "{d:?} above upper bound");
        }

        let b = ExponentialBackoff::new(Duration::from_millis(100)).with_jitter(1.0);
        for _ in 0..200 {
            assert!(b.wait(3) <= Duration::from_millis(801));
        }
    }

    #[test]
    fn test_jitter_is_clamped() {
        assert_eq!(LinearBackoff::new(Duration::ZERO).with_jitter(7.0).jitter, 1.0);
        assert_eq!(LinearBackoff::new(Duration::ZERO).with_jitter(-1.0).jitter, 0.0);
        assert_eq!(LinearBackoff::new(Duration::ZERO).with_jitter(f64::NAN).jitter, 0.0);
    }

    #[test]
    fn test_closure_backoff() {
        let b = |attempt: u32| Duration::from_millis(u64::from(attempt) * 10);
        assert_eq!(Backoff::wait(&b, 3), Duration::from_millis(30));
    }
}
