use std::fmt;

use teloxide::types::{ChatId, MessageId};

/// Login/password pair sent as `secureinfo` with every remote request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CheckSubmission {
    pub filename: Option<String>,
    pub year: Option<i32>,
    /// Base64 encoded document body.
    pub body: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    pub request_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    Success { originality_rating: f64 },
    Pending,
    GivenUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}
