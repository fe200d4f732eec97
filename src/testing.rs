//! In-memory fakes for the remote API and the chat transport.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use tokio::time::Instant;

use crate::{
    antiplagiat::{
        protocol::{PollError, SubmitError},
        CheckApi,
    },
    domain::{CheckSubmission, CheckTicket, Credentials, IncomingMessage, PollOutcome},
    messaging::Messenger,
};

pub fn credentials() -> Credentials {
    Credentials {
        login: "tester".to_string(),
        password: "hunter2".to_string(),
    }
}

pub fn incoming(text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(100),
        message_id: MessageId(7),
        sender: "@student".to_string(),
        text: text.to_string(),
    }
}

pub enum SubmitBehavior {
    Ticket,
    BadStatus(u16),
    Remote(i32, &'static str),
}

pub struct FakeApi {
    submit: SubmitBehavior,
    next_request_id: AtomicI64,
    polls: Mutex<VecDeque<Result<PollOutcome, PollError>>>,
    pub submissions: Mutex<Vec<CheckSubmission>>,
    pub poll_calls: Mutex<Vec<(i64, Instant)>>,
}

impl FakeApi {
    pub fn new(submit: SubmitBehavior) -> Self {
        Self {
            submit,
            next_request_id: AtomicI64::new(1000),
            polls: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            poll_calls: Mutex::new(Vec::new()),
        }
    }

    /// Scripted poll results; once exhausted every poll fails transiently.
    pub fn with_polls(self, polls: Vec<Result<PollOutcome, PollError>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.lock().unwrap().len()
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckApi for FakeApi {
    async fn submit(&self, submission: &CheckSubmission) -> Result<CheckTicket, SubmitError> {
        self.submissions.lock().unwrap().push(submission.clone());
        match self.submit {
            SubmitBehavior::Ticket => Ok(CheckTicket {
                request_id: self.next_request_id.fetch_add(1, Ordering::SeqCst),
            }),
            SubmitBehavior::BadStatus(code) => Err(SubmitError::BadStatus(code)),
            SubmitBehavior::Remote(code, message) => Err(SubmitError::Remote {
                code,
                message: message.to_string(),
            }),
        }
    }

    async fn poll(
        &self,
        _credentials: &Credentials,
        request_id: i64,
    ) -> Result<PollOutcome, PollError> {
        self.poll_calls
            .lock()
            .unwrap()
            .push((request_id, Instant::now()));
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PollError::Transient("not ready".to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
    delay: Duration,
}

impl RecordingMessenger {
    /// Every send takes `delay` before it is recorded.
    pub fn slow(delay: Duration) -> Self {
        Self {
            sent: Mutex::default(),
            delay,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> anyhow::Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }
}
