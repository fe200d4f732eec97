use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    antiplagiat::CheckApi,
    domain::{parse_command, CheckSubmission, Command, Credentials, IncomingMessage, USAGE},
    infrastructure::shutdown::ShutdownListener,
    messaging::{reply, Messenger},
};

use super::{
    poll_worker::{PollPolicy, PollWorker, WorkerReport},
    pool::WorkerPool,
};

/// Handles incoming chat messages one at a time.
pub struct DispatchLoop {
    api: Arc<dyn CheckApi>,
    messenger: Arc<dyn Messenger>,
    credentials: Arc<Credentials>,
    pool: WorkerPool,
    policy: PollPolicy,
}

impl DispatchLoop {
    pub fn new(
        api: Arc<dyn CheckApi>,
        messenger: Arc<dyn Messenger>,
        credentials: Arc<Credentials>,
        pool: WorkerPool,
        policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            messenger,
            credentials,
            pool,
            policy,
        }
    }

    pub fn spawn(
        self,
        inbox: mpsc::Receiver<IncomingMessage>,
        shutdown: ShutdownListener,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(inbox, shutdown).await })
    }

    pub async fn run(&self, mut inbox: mpsc::Receiver<IncomingMessage>, shutdown: ShutdownListener) {
        loop {
            if shutdown.is_triggered() {
                break;
            }

            let message = tokio::select! {
                next = inbox.recv() => match next {
                    Some(message) => message,
                    None => break,
                },
                _ = shutdown.notified() => break,
            };

            // Never interrupted mid-message: once submit returns, the ticket must reach a worker.
            self.handle(message).await;
        }
        tracing::info!(target: "dispatch", "dispatch loop stopped");
    }

    /// Returns the spawned worker, if the message started a check.
    pub async fn handle(&self, message: IncomingMessage) -> Option<JoinHandle<WorkerReport>> {
        tracing::info!(
            target: "dispatch",
            chat_id = message.chat_id.0,
            message_id = message.message_id.0,
            sender = %message.sender,
            text = %message.text,
            "message received"
        );
        let target = message.reply_target();

        let command = match parse_command(&message.text) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(target: "dispatch", error = %err, "rejected command");
                reply(self.messenger.as_ref(), target, &err.to_string()).await;
                return None;
            }
        };

        match command {
            Command::Start => {
                reply(self.messenger.as_ref(), target, USAGE).await;
                None
            }
            Command::Check {
                year,
                filename,
                content,
            } => {
                let submission = CheckSubmission {
                    filename,
                    year,
                    body: String::from_utf8_lossy(&content).into_owned(),
                    credentials: Credentials::clone(&self.credentials),
                };
                self.start_check(&message, submission).await
            }
        }
    }

    async fn start_check(
        &self,
        message: &IncomingMessage,
        submission: CheckSubmission,
    ) -> Option<JoinHandle<WorkerReport>> {
        let target = message.reply_target();

        // Reserve before submitting so an accepted ticket always gets a poller.
        let Some(slot) = self.pool.try_reserve() else {
            tracing::warn!(
                target: "dispatch",
                chat_id = message.chat_id.0,
                active = self.pool.active(),
                "worker pool is full; rejecting check"
            );
            let text = format!(
                "too many checks in progress ({}), please try again later",
                self.pool.capacity()
            );
            reply(self.messenger.as_ref(), target, &text).await;
            return None;
        };

        let ticket = match self.api.submit(&submission).await {
            Ok(ticket) => ticket,
            Err(err) => {
                tracing::warn!(
                    target: "dispatch",
                    chat_id = message.chat_id.0,
                    error = %err,
                    "submission failed"
                );
                reply(self.messenger.as_ref(), target, &err.to_string()).await;
                return None;
            }
        };

        reply(self.messenger.as_ref(), target, &message.text).await;

        let worker = PollWorker::new(
            ticket,
            target,
            self.policy,
            self.credentials.clone(),
            self.api.clone(),
            self.messenger.clone(),
        );
        Some(self.pool.spawn(slot, worker))
    }
}
