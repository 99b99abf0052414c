//! Backoff schedule and the retry state machine used by batch writes.

use std::time::Duration;

use crate::dynamodb::transport::ServiceError;

/// Seconds to wait before the n-th retry of a batch group.
pub const DEFAULT_BACKOFF_SECS: [u64; 5] = [1, 2, 4, 8, 16];

/// Retry settings for batch submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before each retry, indexed by the 0-based retry number. Retries
    /// past the end of the schedule reuse its last entry.
    pub backoff: Vec<Duration>,
    /// Retries allowed per batch group, on top of the first submission.
    pub max_retries: usize,
    /// Also retry errors classified as permanent (access denied, missing
    /// table, validation). Off by default.
    pub retry_permanent_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF_SECS
                .iter()
                .copied()
                .map(Duration::from_secs)
                .collect(),
            max_retries: DEFAULT_BACKOFF_SECS.len(),
            retry_permanent_errors: false,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_permanent_errors(mut self, retry: bool) -> Self {
        self.retry_permanent_errors = retry;
        self
    }

    /// Returns the wait before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: usize) -> Duration {
        self.backoff
            .get(attempt)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or_default()
    }

    fn retries_error(&self, error: &ServiceError) -> bool {
        error.is_transient() || self.retry_permanent_errors
    }
}

/// The operations of one batch group still to be applied, and how many
/// times the group has been resubmitted so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryAttempt<T> {
    pub pending: Vec<T>,
    pub retries: usize,
}

/// Outcome of one submission of a [`RetryAttempt`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    /// Everything in the group was applied.
    Complete,
    /// Wait `delay`, then submit `next`.
    Retry {
        next: RetryAttempt<T>,
        delay: Duration,
    },
    /// The service kept returning unprocessed operations until the retry
    /// budget ran out.
    Exhausted { remaining: Vec<T>, retries: usize },
    /// The submission failed and may not be retried.
    Failed { error: ServiceError, retries: usize },
}

impl<T> RetryAttempt<T> {
    /// The first submission of a group.
    pub fn first(pending: Vec<T>) -> Self {
        Self {
            pending,
            retries: 0,
        }
    }

    /// Folds the outcome of submitting `self.pending` into the next state.
    ///
    /// `outcome` is either the operations the service left unprocessed, or
    /// the error that failed the whole submission. A failed submission is
    /// retried with the same operations.
    pub fn advance(self, outcome: Result<Vec<T>, ServiceError>, policy: &RetryPolicy) -> Transition<T> {
        let budget_left = self.retries < policy.max_retries;
        let delay = policy.delay(self.retries);

        match outcome {
            Ok(unprocessed) if unprocessed.is_empty() => Transition::Complete,
            Ok(unprocessed) if budget_left => Transition::Retry {
                next: RetryAttempt {
                    pending: unprocessed,
                    retries: self.retries + 1,
                },
                delay,
            },
            Ok(unprocessed) => Transition::Exhausted {
                remaining: unprocessed,
                retries: self.retries,
            },
            Err(error) if budget_left && policy.retries_error(&error) => Transition::Retry {
                next: RetryAttempt {
                    pending: self.pending,
                    retries: self.retries + 1,
                },
                delay,
            },
            Err(error) => Transition::Failed {
                error,
                retries: self.retries,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttled() -> ServiceError {
        ServiceError::new(Some("ThrottlingException".into()), "slow down")
    }

    fn denied() -> ServiceError {
        ServiceError::new(Some("AccessDeniedException".into()), "no")
    }

    #[test]
    fn test_delay_follows_schedule_and_clamps() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..8).map(|n| policy.delay(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 16, 16, 16]);

        let empty = RetryPolicy {
            backoff: vec![],
            ..RetryPolicy::default()
        };
        assert_eq!(empty.delay(3), Duration::ZERO);
    }

    #[test]
    fn test_fully_processed_completes() {
        let attempt = RetryAttempt::first(vec![1, 2, 3]);
        assert_eq!(
            attempt.advance(Ok(vec![]), &RetryPolicy::default()),
            Transition::Complete
        );
    }

    #[test]
    fn test_unprocessed_remainder_is_resubmitted() {
        let attempt = RetryAttempt::first(vec![1, 2, 3]);
        let transition = attempt.advance(Ok(vec![3]), &RetryPolicy::default());
        assert_eq!(
            transition,
            Transition::Retry {
                next: RetryAttempt {
                    pending: vec![3],
                    retries: 1
                },
                delay: Duration::from_secs(1),
            }
        );
    }

    #[test]
    fn test_always_unprocessed_terminates() {
        let policy = RetryPolicy::default();
        let mut attempt = RetryAttempt::first(vec!['a', 'b']);
        let mut waited = Duration::ZERO;

        let outcome = loop {
            let unprocessed = attempt.pending.clone();
            match attempt.advance(Ok(unprocessed), &policy) {
                Transition::Retry { next, delay } => {
                    waited += delay;
                    attempt = next;
                }
                other => break other,
            }
        };

        assert_eq!(
            outcome,
            Transition::Exhausted {
                remaining: vec!['a', 'b'],
                retries: 5
            }
        );
        assert_eq!(waited, Duration::from_secs(31));
    }

    #[test]
    fn test_transient_errors_retry_same_group() {
        let attempt = RetryAttempt::first(vec![1, 2]);
        let Transition::Retry { next, delay } = attempt.advance(Err(throttled()), &RetryPolicy::default())
        else {
            panic!("expected a retry");
        };
        assert_eq!(next.pending, vec![1, 2]);
        assert_eq!(next.retries, 1);
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn test_transient_errors_fail_when_budget_spent() {
        let attempt = RetryAttempt {
            pending: vec![1],
            retries: 5,
        };
        assert_eq!(
            attempt.advance(Err(throttled()), &RetryPolicy::default()),
            Transition::Failed {
                error: throttled(),
                retries: 5
            }
        );
    }

    #[test]
    fn test_permanent_errors_fail_fast_unless_configured() {
        let attempt = RetryAttempt::first(vec![1]);
        assert_eq!(
            attempt.clone().advance(Err(denied()), &RetryPolicy::default()),
            Transition::Failed {
                error: denied(),
                retries: 0
            }
        );

        let uniform = RetryPolicy::default().with_retry_permanent_errors(true);
        assert!(matches!(
            attempt.advance(Err(denied()), &uniform),
            Transition::Retry { .. }
        ));
    }

    #[test]
    fn test_zero_retry_budget() {
        let policy = RetryPolicy::default().with_max_retries(0);
        assert_eq!(
            RetryAttempt::first(vec![1]).advance(Ok(vec![1]), &policy),
            Transition::Exhausted {
                remaining: vec![1],
                retries: 0
            }
        );
    }
}
