use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Serialize;
use url::Url;

use crate::domain::{CheckSubmission, CheckTicket, Credentials, PollOutcome};

use super::protocol::{
    self, build_poll_request, build_submit_request, decode_poll_response, decode_submit_response,
    PollError, SubmitError,
};

/// Remote plagiarism API as seen by the dispatcher and the poll workers.
#[async_trait]
pub trait CheckApi: Send + Sync {
    async fn submit(&self, submission: &CheckSubmission) -> Result<CheckTicket, SubmitError>;

    /// Exactly one round trip; retrying is the caller's business.
    async fn poll(
        &self,
        credentials: &Credentials,
        request_id: i64,
    ) -> Result<PollOutcome, PollError>;
}

#[derive(Clone)]
pub struct RemoteCheckClient {
    http: Client,
    endpoint: Url,
}

impl RemoteCheckClient {
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    async fn post<T: Serialize + ?Sized>(&self, payload: &T) -> reqwest::Result<Response> {
        // `json` keeps an explicitly set content type.
        self.http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, protocol::CONTENT_TYPE)
            .json(payload)
            .send()
            .await
    }
}

#[async_trait]
impl CheckApi for RemoteCheckClient {
    async fn submit(&self, submission: &CheckSubmission) -> Result<CheckTicket, SubmitError> {
        let response = self.post(&build_submit_request(submission)).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return decode_submit_response(status, &[]);
        }

        let body = response.bytes().await?;
        let ticket = decode_submit_response(status, &body)?;
        tracing::info!(
            target: "antiplagiat",
            request_id = ticket.request_id,
            filename = submission.filename.as_deref(),
            "document submitted"
        );
        Ok(ticket)
    }

    async fn poll(
        &self,
        credentials: &Credentials,
        request_id: i64,
    ) -> Result<PollOutcome, PollError> {
        let response = self
            .post(&build_poll_request(credentials, request_id))
            .await
            .map_err(|err| PollError::Transient(format!("http error: {err}")))?;
        let status = response.status();
        if status != StatusCode::OK {
            return decode_poll_response(status, &[]);
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PollError::Transient(format!("failed to read body: {err}")))?;
        decode_poll_response(status, &body)
    }
}
