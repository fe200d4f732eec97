use std::{sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{
    antiplagiat::CheckApi,
    domain::{CheckTicket, Credentials, PollOutcome, ReplyTarget},
    infrastructure::shutdown::ShutdownListener,
    messaging::{reply, Messenger},
};

pub const GIVEN_UP_TEXT: &str = "couldn't get result";
pub const CANCELLED_TEXT: &str = "check interrupted: the bot is shutting down, result unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Waiting,
    Polling,
    Succeeded,
    GivenUp,
    Cancelled,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::GivenUp | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerReport {
    pub request_id: i64,
    pub state: WorkerState,
    pub attempts: u32,
    /// `None` only when cancelled.
    pub outcome: Option<PollOutcome>,
}

/// Polls one ticket until it yields a rating or the attempt budget runs out.
pub struct PollWorker {
    ticket: CheckTicket,
    reply_to: ReplyTarget,
    policy: PollPolicy,
    credentials: Arc<Credentials>,
    api: Arc<dyn CheckApi>,
    messenger: Arc<dyn Messenger>,
    state: WorkerState,
    attempts: u32,
}

impl PollWorker {
    pub fn new(
        ticket: CheckTicket,
        reply_to: ReplyTarget,
        policy: PollPolicy,
        credentials: Arc<Credentials>,
        api: Arc<dyn CheckApi>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            ticket,
            reply_to,
            policy,
            credentials,
            api,
            messenger,
            state: WorkerState::Waiting,
            attempts: 0,
        }
    }

    pub fn request_id(&self) -> i64 {
        self.ticket.request_id
    }

    pub async fn run(mut self, shutdown: ShutdownListener) -> WorkerReport {
        let request_id = self.ticket.request_id;

        while self.attempts < self.policy.max_attempts {
            self.transition(WorkerState::Waiting);
            tokio::select! {
                _ = sleep(self.policy.interval) => {}
                _ = shutdown.notified() => return self.cancel().await,
            }

            self.transition(WorkerState::Polling);
            self.attempts += 1;
            let result = tokio::select! {
                res = self.api.poll(&self.credentials, request_id) => res,
                _ = shutdown.notified() => return self.cancel().await,
            };

            match result {
                Ok(PollOutcome::Success { originality_rating }) => {
                    return self.succeed(originality_rating).await;
                }
                Ok(other) => {
                    tracing::debug!(
                        target: "worker",
                        request_id,
                        attempt = self.attempts,
                        outcome = ?other,
                        "result not ready"
                    );
                }
                Err(err) => {
                    tracing::debug!(
                        target: "worker",
                        request_id,
                        attempt = self.attempts,
                        error = %err,
                        "poll attempt failed"
                    );
                }
            }
        }

        self.give_up().await
    }

    async fn succeed(mut self, originality_rating: f64) -> WorkerReport {
        self.transition(WorkerState::Succeeded);
        let text = format_rating(self.ticket.request_id, originality_rating);
        reply(self.messenger.as_ref(), self.reply_to, &text).await;
        tracing::info!(
            target: "worker",
            request_id = self.ticket.request_id,
            attempts = self.attempts,
            originality_rating,
            "check finished"
        );
        self.report(Some(PollOutcome::Success { originality_rating }))
    }

    async fn give_up(mut self) -> WorkerReport {
        self.transition(WorkerState::GivenUp);
        reply(self.messenger.as_ref(), self.reply_to, GIVEN_UP_TEXT).await;
        tracing::warn!(
            target: "worker",
            request_id = self.ticket.request_id,
            attempts = self.attempts,
            "gave up waiting for result"
        );
        self.report(Some(PollOutcome::GivenUp))
    }

    async fn cancel(mut self) -> WorkerReport {
        self.transition(WorkerState::Cancelled);
        reply(self.messenger.as_ref(), self.reply_to, CANCELLED_TEXT).await;
        tracing::info!(
            target: "worker",
            request_id = self.ticket.request_id,
            attempts = self.attempts,
            "poll worker cancelled"
        );
        self.report(None)
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(!self.state.is_terminal(), "worker already finished");
        tracing::trace!(
            target: "worker",
            request_id = self.ticket.request_id,
            from = ?self.state,
            to = ?next,
            "state change"
        );
        self.state = next;
    }

    fn report(&self, outcome: Option<PollOutcome>) -> WorkerReport {
        WorkerReport {
            request_id: self.ticket.request_id,
            state: self.state,
            attempts: self.attempts,
            outcome,
        }
    }
}

pub fn format_rating(request_id: i64, originality_rating: f64) -> String {
    format!("request id: {request_id}\noriginality rating: {originality_rating}")
}
