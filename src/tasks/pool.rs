use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    task::JoinHandle,
};
use tokio_util::task::TaskTracker;

use crate::infrastructure::shutdown::Shutdown;

use super::poll_worker::{PollWorker, WorkerReport};

/// Capacity reserved for one worker; dropping it unspawned frees the slot.
#[derive(Debug)]
pub struct WorkerSlot {
    _permit: OwnedSemaphorePermit,
}

/// Bounded set of running poll workers sharing one shutdown signal.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    tracker: TaskTracker,
    shutdown: Shutdown,
}

impl WorkerPool {
    pub fn new(capacity: usize, shutdown: Shutdown) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            tracker: TaskTracker::new(),
            shutdown,
        }
    }

    /// Never waits: `None` means the pool is full right now.
    pub fn try_reserve(&self) -> Option<WorkerSlot> {
        if self.tracker.is_closed() {
            return None;
        }
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| WorkerSlot { _permit: permit })
    }

    pub fn spawn(&self, slot: WorkerSlot, worker: PollWorker) -> JoinHandle<WorkerReport> {
        let listener = self.shutdown.subscribe();
        let request_id = worker.request_id();
        tracing::debug!(
            target: "worker",
            request_id,
            active = self.active(),
            "poll worker spawned"
        );
        self.tracker.spawn(async move {
            let report = worker.run(listener).await;
            drop(slot);
            tracing::debug!(
                target: "worker",
                request_id = report.request_id,
                state = ?report.state,
                attempts = report.attempts,
                outcome = ?report.outcome,
                "poll worker finished"
            );
            report
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Stops accepting workers and waits for the running ones to finish.
    /// Returns `false` if `timeout` elapsed first.
    pub async fn close_and_wait(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, MessageId};

    use super::*;
    use crate::{
        domain::{CheckTicket, PollOutcome, ReplyTarget},
        tasks::poll_worker::{PollPolicy, WorkerState},
        testing::{credentials, FakeApi, RecordingMessenger, SubmitBehavior},
    };

    fn worker(request_id: i64, api: Arc<FakeApi>) -> PollWorker {
        PollWorker::new(
            CheckTicket { request_id },
            ReplyTarget {
                chat_id: ChatId(1),
                message_id: MessageId(1),
            },
            PollPolicy {
                max_attempts: 2,
                interval: Duration::from_secs(1),
            },
            Arc::new(credentials()),
            api,
            Arc::new(RecordingMessenger::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reservations_are_bounded_and_released() {
        let pool = WorkerPool::new(2, Shutdown::new());
        let api = Arc::new(FakeApi::new(SubmitBehavior::Ticket).with_polls(vec![
            Ok(PollOutcome::Success {
                originality_rating: 50.0,
            }),
        ]));

        let first = pool.try_reserve().expect("free slot");
        let second = pool.try_reserve().expect("free slot");
        assert!(pool.try_reserve().is_none());
        assert_eq!(pool.active(), 2);

        drop(second);
        assert_eq!(pool.active(), 1);

        let report = pool.spawn(first, worker(1, api)).await.unwrap();
        assert_eq!(report.state, WorkerState::Succeeded);
        assert_eq!(pool.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_workers_and_closes_pool() {
        let shutdown = Shutdown::new();
        let pool = WorkerPool::new(4, shutdown.clone());
        let api = Arc::new(FakeApi::new(SubmitBehavior::Ticket));

        let handles: Vec<_> = (0..3)
            .map(|id| {
                let slot = pool.try_reserve().expect("free slot");
                pool.spawn(slot, worker(id, api.clone()))
            })
            .collect();

        shutdown.trigger();
        assert!(pool.close_and_wait(Duration::from_secs(5)).await);
        assert!(pool.try_reserve().is_none());

        for handle in handles {
            assert_eq!(handle.await.unwrap().state, WorkerState::Cancelled);
        }
        assert_eq!(api.poll_count(), 0);
    }
}
