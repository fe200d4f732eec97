use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};

use crate::domain::ReplyTarget;

/// Send side of the chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> anyhow::Result<()>;
}

/// Replies to `target`, logging instead of propagating delivery failures.
pub async fn reply(messenger: &dyn Messenger, target: ReplyTarget, text: &str) {
    if let Err(err) = messenger
        .send(target.chat_id, text, Some(target.message_id))
        .await
    {
        tracing::warn!(
            target: "telegram",
            error = %err,
            chat_id = target.chat_id.0,
            message_id = target.message_id.0,
            "failed to deliver reply"
        );
    }
}
