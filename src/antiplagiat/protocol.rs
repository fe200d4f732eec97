use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CheckSubmission, CheckTicket, Credentials, PollOutcome};

pub const METHOD_SUBMIT: &str = "like";
pub const METHOD_GET_RESULT: &str = "getresult";
pub const RESULT_FORMAT: &str = "json";
pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status code != 200 (got {0})")]
    BadStatus(u16),
    #[error("couldn't parse server response: {0}")]
    MalformedResponse(String),
    #[error("error from server: {message}")]
    Remote { code: i32, message: String },
}

/// Every failed poll attempt is transient from the worker's point of view.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("poll attempt failed: {0}")]
    Transient(String),
}

pub fn build_submit_request<'a>(submission: &'a CheckSubmission) -> SubmitRequest<'a> {
    SubmitRequest {
        request: Envelope {
            method: METHOD_SUBMIT,
            body: SubmitBody {
                doc: Document {
                    filename: submission.filename.as_deref(),
                    body: &submission.body,
                },
                parameters: Parameters {
                    year: submission.year,
                },
            },
            secureinfo: SecureInfo::from(&submission.credentials),
        },
    }
}

pub fn build_poll_request(credentials: &Credentials, request_id: i64) -> PollRequest<'_> {
    PollRequest {
        request: Envelope {
            method: METHOD_GET_RESULT,
            body: PollBody {
                request_id,
                format: RESULT_FORMAT,
            },
            secureinfo: SecureInfo::from(credentials),
        },
    }
}

/// The body is only looked at once the status is known to be 200.
pub fn decode_submit_response(status: StatusCode, body: &[u8]) -> Result<CheckTicket, SubmitError> {
    if status != StatusCode::OK {
        return Err(SubmitError::BadStatus(status.as_u16()));
    }

    let parsed: SubmitResponse = serde_json::from_slice(body)
        .map_err(|err| SubmitError::MalformedResponse(err.to_string()))?;
    let response = parsed.response;

    if response.error.code != 0 {
        return Err(SubmitError::Remote {
            code: response.error.code,
            message: response.error.message,
        });
    }

    match response.request_id {
        Some(request_id) if request_id != 0 => Ok(CheckTicket { request_id }),
        _ => Err(SubmitError::MalformedResponse(
            "response carried no request id".to_string(),
        )),
    }
}

pub fn decode_poll_response(status: StatusCode, body: &[u8]) -> Result<PollOutcome, PollError> {
    if status != StatusCode::OK {
        return Err(PollError::Transient(format!("status code {}", status.as_u16())));
    }

    let parsed: PollResponse = serde_json::from_slice(body)
        .map_err(|err| PollError::Transient(format!("malformed body: {err}")))?;
    let response = parsed.response;

    // The remote side reports "not ready yet" and real failures through the same code.
    if response.error.code != 0 {
        return Err(PollError::Transient(format!(
            "remote error {}: {}",
            response.error.code, response.error.message
        )));
    }

    Ok(match response.result {
        Some(result) => PollOutcome::Success {
            originality_rating: result.originality_rating,
        },
        None => PollOutcome::Pending,
    })
}

#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    pub request: Envelope<'a, SubmitBody<'a>>,
}

#[derive(Debug, Serialize)]
pub struct PollRequest<'a> {
    pub request: Envelope<'a, PollBody>,
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a, B> {
    pub method: &'static str,
    pub body: B,
    pub secureinfo: SecureInfo<'a>,
}

#[derive(Debug, Serialize)]
pub struct SubmitBody<'a> {
    pub doc: Document<'a>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Document<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<&'a str>,
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PollBody {
    #[serde(rename = "requestId")]
    pub request_id: i64,
    pub format: &'static str,
}

#[derive(Serialize)]
pub struct SecureInfo<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for SecureInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureInfo")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl<'a> From<&'a Credentials> for SecureInfo<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            login: &credentials.login,
            password: &credentials.password,
        }
    }
}

// The remote service spells the top-level key "reponse".
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "reponse")]
    pub response: SubmitResponseBody,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponseBody {
    #[serde(default)]
    pub error: RemoteError,
    #[serde(rename = "requestId", default)]
    pub request_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PollResponse {
    #[serde(rename = "reponse")]
    pub response: PollResponseBody,
}

#[derive(Debug, Deserialize)]
pub struct PollResponseBody {
    #[serde(default)]
    pub error: RemoteError,
    #[serde(default)]
    pub result: Option<PollResult>,
}

#[derive(Debug, Deserialize)]
pub struct PollResult {
    pub originality_rating: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            login: "user".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn submit_request_matches_wire_shape() {
        let submission = CheckSubmission {
            filename: Some("diplom.txt".to_string()),
            year: Some(2022),
            body: "SGVsbG8gRXhh".to_string(),
            credentials: credentials(),
        };

        let value = serde_json::to_value(build_submit_request(&submission)).unwrap();
        assert_eq!(value["request"]["method"], "like");
        assert_eq!(
            value["request"]["body"],
            json!({"doc":{"filename":"diplom.txt","body":"SGVsbG8gRXhh"},"parameters":{"year":2022}})
        );
        assert_eq!(
            value["request"]["secureinfo"],
            json!({"login":"user","password":"secret"})
        );
    }

    #[test]
    fn poll_request_matches_wire_shape() {
        let creds = credentials();
        let value = serde_json::to_value(build_poll_request(&creds, 4242)).unwrap();
        assert_eq!(
            value,
            json!({
                "request": {
                    "method": "getresult",
                    "body": {"requestId": 4242, "format": "json"},
                    "secureinfo": {"login": "user", "password": "secret"}
                }
            })
        );
    }

    #[test]
    fn secure_info_debug_hides_password() {
        let creds = credentials();
        let rendered = format!("{:?}", SecureInfo::from(&creds));
        assert!(!rendered.contains("secret"));
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn submit_bad_status_skips_body() {
        let err = decode_submit_response(StatusCode::BAD_GATEWAY, b"<html>not json</html>")
            .unwrap_err();
        assert!(matches!(err, SubmitError::BadStatus(502)));
    }

    #[test]
    fn submit_success_yields_ticket() {
        let body = br#"{"reponse":{"error":{"code":0,"message":""},"requestId":77}}"#;
        let ticket = decode_submit_response(StatusCode::OK, body).unwrap();
        assert_eq!(ticket, CheckTicket { request_id: 77 });
    }

    #[test]
    fn submit_remote_error_keeps_message() {
        let body = r#"{"reponse":{"error":{"code":12,"message":"Неверный логин"},"requestId":0}}"#;
        match decode_submit_response(StatusCode::OK, body.as_bytes()).unwrap_err() {
            SubmitError::Remote { code, message } => {
                assert_eq!(code, 12);
                assert_eq!(message, "Неверный логин");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submit_malformed_or_missing_ticket() {
        assert!(matches!(
            decode_submit_response(StatusCode::OK, b"{}"),
            Err(SubmitError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_submit_response(StatusCode::OK, br#"{"reponse":{"requestId":0}}"#),
            Err(SubmitError::MalformedResponse(_))
        ));
    }

    #[test]
    fn poll_classifies_attempts() {
        let ok = br#"{"reponse":{"error":{"code":0,"message":""},"result":{"originality_rating":87.5}}}"#;
        assert_eq!(
            decode_poll_response(StatusCode::OK, ok).unwrap(),
            PollOutcome::Success {
                originality_rating: 87.5
            }
        );

        let pending = br#"{"reponse":{"error":{"code":0,"message":""}}}"#;
        assert_eq!(
            decode_poll_response(StatusCode::OK, pending).unwrap(),
            PollOutcome::Pending
        );

        let not_ready = br#"{"reponse":{"error":{"code":3,"message":"in progress"}}}"#;
        assert!(matches!(
            decode_poll_response(StatusCode::OK, not_ready),
            Err(PollError::Transient(_))
        ));
        assert!(matches!(
            decode_poll_response(StatusCode::SERVICE_UNAVAILABLE, ok),
            Err(PollError::Transient(_))
        ));
        assert!(matches!(
            decode_poll_response(StatusCode::OK, b"garbage"),
            Err(PollError::Transient(_))
        ));
    }

    #[test]
    fn optional_document_fields_are_omitted() {
        let submission = CheckSubmission {
            filename: None,
            year: None,
            body: "eA==".to_string(),
            credentials: credentials(),
        };
        let value: Value = serde_json::to_value(build_submit_request(&submission)).unwrap();
        assert_eq!(
            value["request"]["body"],
            json!({"doc":{"body":"eA=="},"parameters":{}})
        );
    }
}
