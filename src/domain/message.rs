use teloxide::types::{ChatId, MessageId};

use super::types::ReplyTarget;

#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: String,
    pub text: String,
}

impl IncomingMessage {
    pub fn reply_target(&self) -> ReplyTarget {
        ReplyTarget {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}
