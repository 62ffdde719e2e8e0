//! Bounded retry policy with an injectable sleeper.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Blocks the current thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Delay between two consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt
    Fixed(Duration),
    /// `base + step * (attempt - 1)`
    Linear { base: Duration, step: Duration },
}

impl Backoff {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Linear { base, step } => step
                .checked_mul(attempt.saturating_sub(1))
                .and_then(|extra| base.checked_add(extra))
                .unwrap_or(Duration::MAX),
        }
    }
}

/// Retry settings as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Extra delay added per attempt; 0 keeps the delay fixed
    #[serde(default)]
    pub step_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
            step_secs: 0,
        }
    }
}

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// Final error of an operation together with the number of attempts spent.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(default_max_attempts(), Duration::from_secs(default_delay_secs()))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let base = Duration::from_secs(config.delay_secs);
        let backoff = if config.step_secs == 0 {
            Backoff::Fixed(base)
        } else {
            Backoff::Linear {
                base,
                step: Duration::from_secs(config.step_secs),
            }
        };
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Run `op` until it succeeds or `max_attempts` is reached.
    ///
    /// `op` receives the 1-based attempt number. `on_failure` is called after
    /// every failed attempt with the attempt number and error. The sleeper is
    /// only used between attempts, never after the last one.
    pub fn run<T, E, F, L>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: F,
        mut on_failure: L,
    ) -> Result<(T, u32), RetryExhausted<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        L: FnMut(u32, &E),
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok((value, attempt)),
                Err(err) => {
                    on_failure(attempt, &err);
                    if attempt >= self.max_attempts {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                    sleeper.sleep(self.backoff.delay_for(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) slept: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();
        let result: Result<_, RetryExhausted<()>> =
            policy.run(&sleeper, |_| Ok("done"), |_, _| {});
        let (value, attempts) = result.unwrap();
        assert_eq!(value, "done");
        assert_eq!(attempts, 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[test]
    fn test_success_after_failures() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
        let mut failures = Vec::new();
        let (_, attempts) = policy
            .run(
                &sleeper,
                |attempt| if attempt < 3 { Err("boom") } else { Ok(()) },
                |attempt, _| failures.push(attempt),
            )
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(failures, vec![1, 2]);
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[test]
    fn test_exhausted_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
        let mut calls = 0;
        let err = policy
            .run(
                &sleeper,
                |_| -> Result<(), &'static str> {
                    calls += 1;
                    Err("still failing")
                },
                |_, _| {},
            )
            .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "still failing");
        // No sleep after the final attempt
        assert_eq!(sleeper.slept.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_linear_backoff() {
        let backoff = Backoff::Linear {
            base: Duration::from_secs(2),
            step: Duration::from_secs(3),
        };
        assert_eq!(backoff.delay_for(1), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(5));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_linear_backoff_saturates() {
        let backoff = Backoff::Linear {
            base: Duration::from_secs(1),
            step: Duration::from_secs(u64::MAX),
        };
        assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(3), Duration::MAX);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_attempts: 0,
            delay_secs: 1,
            step_secs: 0,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_secs(1)));
    }
}
