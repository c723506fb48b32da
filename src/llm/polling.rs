//! Bounded polling for asynchronous vendor jobs.
//!
//! A job moves `Submitted -> Polling -> {Succeeded | Failed | TimedOut}`.
//! Terminal states absorb every later observation, and the number of status
//! checks never exceeds [`PollPolicy::max_attempts`].

use crate::llm::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    /// Upper bound on time spent sleeping between status checks.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// What a single status check reported.
#[derive(Debug, Clone, PartialEq)]
pub enum PollObservation<T> {
    Pending,
    Succeeded(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState<T> {
    Submitted,
    Polling { attempt: u32 },
    Succeeded(T),
    Failed(String),
    TimedOut { attempts: u32 },
}

impl<T> JobState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded(_) | JobState::Failed(_) | JobState::TimedOut { .. }
        )
    }

    /// Applies one observation taken during `attempt`.
    pub fn observe(self, attempt: u32, observation: PollObservation<T>) -> Self {
        if self.is_terminal() {
            return self;
        }
        match observation {
            PollObservation::Pending => JobState::Polling { attempt },
            PollObservation::Succeeded(value) => JobState::Succeeded(value),
            PollObservation::Failed(message) => JobState::Failed(message),
        }
    }

    fn time_out(self, attempts: u32) -> Self {
        if self.is_terminal() {
            self
        } else {
            JobState::TimedOut { attempts }
        }
    }
}

/// Polls `check` until the job reaches a terminal state.
///
/// A failed status check is logged and retried on the next attempt; only a
/// failure on the final attempt is returned as an error. The returned state
/// is always terminal.
pub async fn poll_until_terminal<T, F, Fut>(
    policy: PollPolicy,
    mut check: F,
) -> Result<JobState<T>, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollObservation<T>, ProviderError>>,
{
    let mut state = JobState::Submitted;

    for attempt in 1..=policy.max_attempts {
        match check(attempt).await {
            Ok(observation) => {
                state = state.observe(attempt, observation);
                if state.is_terminal() {
                    debug!("Job reached terminal state after {} polls", attempt);
                    return Ok(state);
                }
            }
            Err(e) if attempt == policy.max_attempts => return Err(e),
            Err(e) => warn!("Status check {} failed, retrying: {}", attempt, e),
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Ok(state.time_out(policy.max_attempts))
}

impl<T> JobState<T> {
    /// Converts a terminal state into the adapter result.
    pub fn into_result(
        self,
        on_failure: impl FnOnce(String) -> ProviderError,
    ) -> Result<T, ProviderError> {
        match self {
            JobState::Succeeded(value) => Ok(value),
            JobState::Failed(message) => Err(on_failure(message)),
            JobState::TimedOut { attempts } => Err(ProviderError::PollTimeout { attempts }),
            JobState::Submitted | JobState::Polling { .. } => {
                Err(ProviderError::PollTimeout { attempts: 0 })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ProviderKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_never_terminal_times_out_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let state = tokio::time::timeout(
            Duration::from_secs(5),
            poll_until_terminal(fast_policy(5), move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ProviderError>(PollObservation::<String>::Pending)
                }
            }),
        )
        .await
        .expect("polling must finish within its bound")
        .unwrap();

        assert_eq!(state, JobState::TimedOut { attempts: 5 });
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let err = state.into_result(|m| ProviderError::generation_failed(ProviderKind::Replicate, m));
        assert!(err.unwrap_err().to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_poll() {
        let state = poll_until_terminal(fast_policy(30), |attempt| async move {
            if attempt < 3 {
                Ok::<_, ProviderError>(PollObservation::Pending)
            } else {
                Ok(PollObservation::Succeeded("https://img.example/x.webp".to_string()))
            }
        })
        .await
        .unwrap();

        assert_eq!(
            state,
            JobState::Succeeded("https://img.example/x.webp".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let state = poll_until_terminal(fast_policy(30), |_| async {
            Ok::<_, ProviderError>(PollObservation::<String>::Failed("NSFW content detected".to_string()))
        })
        .await
        .unwrap();

        let err = state
            .into_result(|m| ProviderError::generation_failed(ProviderKind::Replicate, m))
            .unwrap_err();
        assert!(err.to_string().contains("NSFW content detected"));
    }

    #[tokio::test]
    async fn test_transient_check_errors_are_retried() {
        let state = poll_until_terminal(fast_policy(5), |attempt| async move {
            if attempt == 1 {
                Err(ProviderError::Network {
                    provider: ProviderKind::Replicate,
                    message: "connection reset".to_string(),
                })
            } else {
                Ok(PollObservation::Succeeded(attempt))
            }
        })
        .await
        .unwrap();

        assert_eq!(state, JobState::Succeeded(2));
    }

    #[tokio::test]
    async fn test_error_on_final_attempt_is_returned() {
        let result = poll_until_terminal(fast_policy(2), |_| async {
            Err::<PollObservation<()>, _>(ProviderError::Network {
                provider: ProviderKind::Replicate,
                message: "unreachable".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Network { .. })));
    }

    #[test]
    fn test_terminal_states_absorb_observations() {
        let done: JobState<u32> = JobState::Succeeded(1);
        assert_eq!(done.observe(2, PollObservation::Pending), JobState::Succeeded(1));

        let failed: JobState<u32> = JobState::Failed("boom".to_string());
        assert_eq!(
            failed.observe(3, PollObservation::Succeeded(7)),
            JobState::Failed("boom".to_string())
        );
    }

    #[test]
    fn test_default_policy_bounds_wait() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.max_wait(), Duration::from_secs(58));
    }
}
