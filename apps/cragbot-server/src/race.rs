//! First-settle race between an operation and a timer.
//!
//! Unlike `tokio::time::timeout`, losing the race does not drop the
//! operation. It runs on its own task and keeps going after the timer fires,
//! so whatever side effects it was already committed to still happen.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ServerError;

/// Outcome of [`first_settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    /// The operation finished before the deadline.
    Completed(T),
    /// The deadline passed first. The operation is still running.
    TimedOut,
}

/// Races `operation` against a `deadline` timer and returns whichever
/// settles first.
///
/// The operation is spawned onto the runtime; when the timer wins the task
/// is detached, not aborted.
///
/// # Errors
///
/// Returns `ServerError::Task` if the operation panicked before the
/// deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cragbot_server::race::{Settled, first_settle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let settled = first_settle(async { 7 }, Duration::from_secs(1)).await.unwrap();
/// assert_eq!(settled, Settled::Completed(7));
/// # }
/// ```
pub async fn first_settle<F>(
    operation: F,
    deadline: Duration,
) -> Result<Settled<F::Output>, ServerError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(operation);
    tokio::select! {
        joined = handle => joined
            .map(Settled::Completed)
            .map_err(|e| ServerError::Task(e.to_string())),
        () = tokio::time::sleep(deadline) => {
            debug!(
                deadline_ms = deadline.as_millis() as u64,
                "Deadline reached before operation settled"
            );
            Ok(Settled::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_should_return_operation_result_when_it_finishes_first() {
        let settled = first_settle(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "payload"
            },
            Duration::from_secs(29),
        )
        .await
        .unwrap();
        assert_eq!(settled, Settled::Completed("payload"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_time_out_at_deadline() {
        let start = tokio::time::Instant::now();
        let settled = first_settle(
            async {
                tokio::time::sleep(Duration::from_secs(35)).await;
                "late"
            },
            Duration::from_secs(29),
        )
        .await
        .unwrap();
        assert_eq!(settled, Settled::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(29));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_keep_running_loser_after_timeout() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let settled = first_settle(
            async move {
                tokio::time::sleep(Duration::from_secs(35)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_secs(29),
        )
        .await
        .unwrap();
        assert_eq!(settled, Settled::TimedOut);
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_should_report_panicked_operation() {
        let result = first_settle(
            async {
                panic!("boom");
            },
            Duration::from_secs(29),
        )
        .await;
        assert!(matches!(result, Err(ServerError::Task(_))));
    }
}
