use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use teloxide::{
    dispatching::Dispatcher, error_handlers::ErrorHandler, prelude::*, types::Message,
    update_listeners, utils::command::BotCommands,
};
use tokio::sync::mpsc;

use crate::{domain::IncomingMessage, infrastructure::shutdown::ShutdownListener};

use super::{
    types::{AppState, BotResult, GeneralCommand},
    utils::to_incoming,
};

/// Receive side of the chat transport: long-polls Telegram and feeds the inbox.
pub struct TelegramService {
    bot: Bot,
    state: Arc<AppState>,
}

#[derive(Clone, Copy, Debug)]
enum NetworkIssueKind {
    Timeout,
    Connection,
    Other,
}

impl NetworkIssueKind {
    fn label(&self) -> &'static str {
        match self {
            NetworkIssueKind::Timeout => "request timeout",
            NetworkIssueKind::Connection => "connection failure",
            NetworkIssueKind::Other => "network error",
        }
    }
}

struct ListenerErrorLogger;

impl ListenerErrorLogger {
    fn classify(error: &teloxide::RequestError) -> Option<NetworkIssueKind> {
        match error {
            teloxide::RequestError::Network(source) => {
                let req_err = source.as_ref();
                Some(if req_err.is_timeout() {
                    NetworkIssueKind::Timeout
                } else if req_err.is_connect() {
                    NetworkIssueKind::Connection
                } else {
                    NetworkIssueKind::Other
                })
            }
            _ => None,
        }
    }
}

impl ErrorHandler<teloxide::RequestError> for ListenerErrorLogger {
    fn handle_error(self: Arc<Self>, error: teloxide::RequestError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match Self::classify(&error) {
                Some(kind) => tracing::warn!(
                    target: "telegram",
                    issue = kind.label(),
                    error = %error,
                    "Telegram polling network failure"
                ),
                None => tracing::error!(
                    target: "telegram",
                    error = %error,
                    "update listener error"
                ),
            }
        })
    }
}

impl TelegramService {
    pub fn new(bot: Bot, inbox: mpsc::Sender<IncomingMessage>) -> Self {
        Self {
            bot,
            state: Arc::new(AppState { inbox }),
        }
    }

    pub async fn run(&self, shutdown: ShutdownListener) -> Result<()> {
        self.sync_commands().await?;
        let me = self.bot.get_me().await?;
        tracing::info!(
            target: "telegram",
            bot_id = me.id.0,
            username = ?me.username,
            "authorized on Telegram"
        );

        let handler = Update::filter_message().endpoint(Self::on_message);

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![self.state.clone()])
            .default_handler(|update| async move {
                tracing::debug!(target: "telegram", ?update, "unhandled update");
            })
            .build();

        let listener = update_listeners::polling_default(self.bot.clone()).await;

        let shutdown_token = dispatcher.shutdown_token();
        let mut dispatcher_future = Box::pin(
            dispatcher.dispatch_with_listener(listener, Arc::new(ListenerErrorLogger)),
        );
        let mut dispatcher_finished = false;

        tokio::select! {
            _ = shutdown.notified() => {
                tracing::info!(target: "telegram", "stopping Telegram dispatcher");
                if let Ok(wait) = shutdown_token.shutdown() {
                    wait.await;
                }
            }
            _ = &mut dispatcher_future => {
                dispatcher_finished = true;
                tracing::info!(target: "telegram", "Telegram dispatcher finished");
            }
        }

        if !dispatcher_finished {
            dispatcher_future.await;
        }

        Ok(())
    }

    async fn on_message(msg: Message, state: Arc<AppState>) -> BotResult<()> {
        let Some(incoming) = to_incoming(&msg) else {
            tracing::debug!(
                target: "telegram",
                chat_id = msg.chat.id.0,
                "ignoring non-text message"
            );
            return Ok(());
        };

        if state.inbox.send(incoming).await.is_err() {
            tracing::warn!(
                target: "telegram",
                chat_id = msg.chat.id.0,
                "dispatch loop is gone; dropping message"
            );
        }
        Ok(())
    }

    async fn sync_commands(&self) -> BotResult<()> {
        self.bot
            .set_my_commands(GeneralCommand::bot_commands())
            .await?;
        tracing::info!(target: "telegram", "bot commands registered");
        Ok(())
    }
}
