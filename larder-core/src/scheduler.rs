//! Deferred execution of analysis tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use tracing::Instrument;

use crate::types::RecordId;

/// A boxed background task. It reports its own outcome; nothing awaits it.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs analysis tasks some time after submission.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, kind: &'static str, record_id: RecordId, task: Task);
}

/// Spawns each task onto the current tokio runtime as soon as it is scheduled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn schedule(&self, kind: &'static str, record_id: RecordId, task: Task) {
        let span = tracing::info_span!("analysis_task", kind = kind, record_id = %record_id);
        tokio::spawn(task.instrument(span));
    }
}

/// Queues tasks until [`ManualScheduler::run_pending`] is awaited.
///
/// Lets tests observe records before their analysis has run, and lets the CLI
/// run the analysis inline.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(&'static str, RecordId, Task)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run every queued task to completion, in submission order.
    /// Returns how many tasks ran.
    pub async fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch: Vec<_> = std::mem::take(
                &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if batch.is_empty() {
                return ran;
            }
            for (kind, record_id, task) in batch {
                let span =
                    tracing::info_span!("analysis_task", kind = kind, record_id = %record_id);
                task.instrument(span).await;
                ran += 1;
            }
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, kind: &'static str, record_id: RecordId, task: Task) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, record_id, task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_manual_scheduler_defers_until_run() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            scheduler.schedule(
                "test",
                Uuid::new_v4(),
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        assert_eq!(scheduler.pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(scheduler.run_pending().await, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_runs_task() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        TokioScheduler.schedule(
            "test",
            Uuid::new_v4(),
            Box::pin(async move {
                let _ = tx.send(42);
            }),
        );
        assert_eq!(rx.await.unwrap(), 42);
    }
}
