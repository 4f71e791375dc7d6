//! Parallel fold execution with index-addressed result slots.

use crate::error::{AuthorfoldError, Result};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared flag that asks a running scheduler to stop starting new folds.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs independent per-document tasks on a fixed-size worker pool.
///
/// Results land in a slot addressed by task index, so the returned vector
/// matches input order regardless of completion order. A run either returns
/// every result or an error; partial results are never returned.
#[derive(Debug, Clone)]
pub struct FoldScheduler {
    workers: usize,
    token: CancellationToken,
}

/// What happened to one task slot.
enum Slot<T> {
    Done(T),
    Failed(AuthorfoldError),
    NotRun,
}

impl FoldScheduler {
    /// Creates a scheduler with `workers` threads.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(AuthorfoldError::invalid_param("workers", 0, ">= 1"));
        }
        Ok(Self {
            workers,
            token: CancellationToken::new(),
        })
    }

    /// Uses `token` for cancellation instead of a private one.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Worker thread count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Token that cancels this scheduler's runs.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs `task(0..total)` in parallel and returns results in index order.
    ///
    /// After the first failure no further tasks start. Failures are reported
    /// for the lowest failing index: a task's own error is returned as-is and
    /// a panic becomes [`AuthorfoldError::TaskPanicked`]. Cancellation with
    /// no failure yields [`AuthorfoldError::Cancelled`].
    ///
    /// # Errors
    ///
    /// See above; also returns an error if the thread pool cannot be built.
    pub fn run<T, F>(&self, total: usize, task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("authorfold-fold-{i}"))
            .build()
            .map_err(|e| AuthorfoldError::Other(format!("failed to build worker pool: {e}")))?;

        let failed = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);

        let outcomes: Vec<(usize, Slot<T>)> = pool.install(|| {
            (0..total)
                .into_par_iter()
                .map(|index| {
                    if self.token.is_cancelled() || failed.load(Ordering::SeqCst) {
                        return (index, Slot::NotRun);
                    }
                    let slot = match panic::catch_unwind(AssertUnwindSafe(|| task(index))) {
                        Ok(Ok(value)) => {
                            completed.fetch_add(1, Ordering::SeqCst);
                            Slot::Done(value)
                        }
                        Ok(Err(err)) => {
                            failed.store(true, Ordering::SeqCst);
                            Slot::Failed(err)
                        }
                        Err(payload) => {
                            failed.store(true, Ordering::SeqCst);
                            Slot::Failed(AuthorfoldError::TaskPanicked {
                                index,
                                message: panic_message(payload.as_ref()),
                            })
                        }
                    };
                    (index, slot)
                })
                .collect()
        });

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut first_failure: Option<(usize, AuthorfoldError)> = None;
        for (index, slot) in outcomes {
            match slot {
                Slot::Done(value) => slots[index] = Some(value),
                Slot::Failed(err) => {
                    if first_failure.as_ref().map_or(true, |(i, _)| index < *i) {
                        first_failure = Some((index, err));
                    }
                }
                Slot::NotRun => {}
            }
        }

        if let Some((index, err)) = first_failure {
            warn!(index, error = %err, "fold task failed");
            return Err(err);
        }

        let done = completed.load(Ordering::SeqCst);
        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or(AuthorfoldError::Cancelled {
                completed: done,
                total,
            })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_results_follow_input_order() {
        let scheduler = FoldScheduler::new(4).expect("workers > 0");
        let out = scheduler
            .run(50, |i| {
                // Early tasks finish last
                std::thread::sleep(Duration::from_micros(((50 - i) * 20) as u64));
                Ok(i * 10)
            })
            .expect("all succeed");
        assert_eq!(out, (0..50).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_tasks() {
        let scheduler = FoldScheduler::new(1).expect("workers > 0");
        let out: Vec<usize> = scheduler.run(0, Ok).expect("nothing to do");
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(FoldScheduler::new(0).is_err());
    }

    #[test]
    fn test_panic_surfaces_with_index() {
        let scheduler = FoldScheduler::new(2).expect("workers > 0");
        let err = scheduler
            .run(8, |i| {
                if i == 5 {
                    panic!("boom at five");
                }
                Ok(i)
            })
            .unwrap_err();
        match err {
            AuthorfoldError::TaskPanicked { index, message } => {
                assert_eq!(index, 5);
                assert!(message.contains("boom"));
            }
            other => panic!("expected TaskPanicked, got {other}"),
        }
    }

    #[test]
    fn test_task_error_propagates() {
        let scheduler = FoldScheduler::new(3).expect("workers > 0");
        let err = scheduler
            .run(6, |i| {
                if i == 2 {
                    Err(AuthorfoldError::Other("fold two failed".into()))
                } else {
                    Ok(i)
                }
            })
            .unwrap_err();
        assert!(err.to_string().contains("fold two"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let scheduler = FoldScheduler::new(2)
            .expect("workers > 0")
            .with_cancellation(token);
        let err = scheduler.run(10, Ok).unwrap_err();
        assert!(matches!(
            err,
            AuthorfoldError::Cancelled {
                completed: 0,
                total: 10
            }
        ));
    }

    #[test]
    fn test_cancel_mid_run_returns_no_partial_results() {
        let token = CancellationToken::new();
        let scheduler = FoldScheduler::new(1)
            .expect("workers > 0")
            .with_cancellation(token.clone());
        let result = scheduler.run(20, |i| {
            if i == 3 {
                token.cancel();
            }
            Ok(i)
        });
        match result {
            Err(AuthorfoldError::Cancelled { completed, total }) => {
                assert_eq!(total, 20);
                assert!(completed < 20);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}
