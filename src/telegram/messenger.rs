use anyhow::Context;
use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{MessageId, ReplyParameters},
};

use crate::messaging::Messenger;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> anyhow::Result<()> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        request
            .await
            .with_context(|| format!("failed to send message to chat {}", chat_id.0))?;
        Ok(())
    }
}
