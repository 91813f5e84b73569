//! Try candidates in order with a per-attempt timeout; the first success wins.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Why a single candidate attempt did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure<E> {
    /// The attempt exceeded its time budget and was dropped
    TimedOut(Duration),

    /// The attempt completed with an error
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for AttemptFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::TimedOut(limit) => {
                write!(f, "request timed out after {}ms", limit.as_millis())
            }
            AttemptFailure::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Every candidate failed; attempts are kept in the order they were made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    pub attempts: Vec<(String, AttemptFailure<E>)>,
}

impl<E> Exhausted<E> {
    /// Most recent failure, if any candidate was tried at all
    pub fn last(&self) -> Option<&AttemptFailure<E>> {
        self.attempts.last().map(|(_, failure)| failure)
    }
}

/// A candidate that produced a value, and the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success<T> {
    pub candidate: String,
    pub value: T,
    /// Number of attempts made, including the successful one
    pub attempts: usize,
}

/// Run `attempt` against each candidate in order until one succeeds.
///
/// Each attempt is bounded by `per_attempt`; an attempt that runs over is dropped, which
/// aborts whatever request it was driving. Timeouts and errors are not fatal: the next
/// candidate is tried. No further attempts are made after the first success.
pub async fn first_success<'a, T, E, F, Fut>(
    candidates: &'a [String],
    per_attempt: Duration,
    mut attempt: F,
) -> Result<Success<T>, Exhausted<E>>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut failures = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        tracing::debug!("Attempt {} of {}: {}", index + 1, candidates.len(), candidate);

        let failure = match tokio::time::timeout(per_attempt, attempt(candidate)).await {
            Ok(Ok(value)) => {
                return Ok(Success {
                    candidate: candidate.clone(),
                    value,
                    attempts: index + 1,
                })
            }
            Ok(Err(err)) => AttemptFailure::Failed(err),
            Err(_) => AttemptFailure::TimedOut(per_attempt),
        };

        tracing::warn!("Candidate {} failed: {}", candidate, failure);
        failures.push((candidate.clone(), failure));
    }

    Err(Exhausted { attempts: failures })
}
