// SPDX-License-Identifier: GPL-3.0-only

//! Wire types and the transport seam for the word-collection service.
//!
//! The service speaks JSON:
//!
//! ```text
//! POST <endpoint>  {"value": "...", "verified": false}
//!               -> {"status": "success" | "error", "message": "..."}
//!
//! GET <endpoint>?limit=500&random=true&lastTimestamp=<ISO-8601>
//!               -> {"status": "success", "words": [{"value", "verified", "timestamp"}], "total": n}
//! ```

use crate::app_settings;
use crate::client::error::ClientError;
use crate::config::ApiConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Timestamp that selects every word.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00.000Z";

/// Body of a word submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPayload {
    pub value: String,
    pub verified: bool,
}

/// Status field shared by every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Reply to a word submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitReply {
    pub fn success() -> Self {
        Self {
            status: ReplyStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// Query for the word collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordsQuery {
    pub limit: usize,
    pub random: bool,
    #[serde(rename = "lastTimestamp")]
    pub since: String,
}

/// One approved word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub value: String,
    #[serde(default)]
    pub verified: bool,
    /// ISO-8601 time the word was stored
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Reply to a word collection query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordsReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub words: Vec<WordRecord>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub message: Option<String>,
}

/// A single request/response exchange with the service.
///
/// Implementations perform exactly one attempt; retrying is the client's job.
/// An `Ok` reply may still carry an error status.
pub trait WordTransport {
    fn post_word(
        &self,
        payload: &WordPayload,
    ) -> impl Future<Output = Result<SubmitReply, ClientError>>;

    fn get_words(&self, query: &WordsQuery)
    -> impl Future<Output = Result<WordsReply, ClientError>>;
}

// ============================================================================
// HTTP transport
// ============================================================================

/// [`WordTransport`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Builds a transport for the configured endpoint and timeout.
    pub fn new(api: &ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(app_settings::USER_AGENT)
            .timeout(api.timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: api.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Reads a JSON reply. A non-2xx status is a server error whatever the body says.
async fn read_reply<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await?;
    parse_reply(status, &text)
}

fn parse_reply<T: serde::de::DeserializeOwned>(
    status: reqwest::StatusCode,
    text: &str,
) -> Result<T, ClientError> {
    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| match text.trim() {
                "" => status.to_string(),
                body => body.to_string(),
            });
        return Err(ClientError::Server {
            status: Some(status.as_u16()),
            message,
        });
    }

    serde_json::from_str(text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

impl WordTransport for HttpTransport {
    async fn post_word(&self, payload: &WordPayload) -> Result<SubmitReply, ClientError> {
        let response = self.client.post(&self.endpoint).json(payload).send().await?;
        read_reply(response).await
    }

    async fn get_words(&self, query: &WordsQuery) -> Result<WordsReply, ClientError> {
        let response = self.client.get(&self.endpoint).query(query).send().await?;
        read_reply(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: Submission payload field names
    #[test]
    fn test_payload_json() {
        let payload = WordPayload {
            value: "hello".into(),
            verified: false,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"value": "hello", "verified": false})
        );
    }

    /// Test 2: Replies with and without a message
    #[test]
    fn test_submit_reply_json() {
        let ok: SubmitReply = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(ok, SubmitReply::success());

        let err: SubmitReply =
            serde_json::from_str(r#"{"status":"error","message":"Invalid data format"}"#).unwrap();
        assert_eq!(err, SubmitReply::error("Invalid data format"));

        assert!(serde_json::from_str::<SubmitReply>(r#"{"status":"queued"}"#).is_err());
    }

    /// Test 3: Word collection reply
    #[test]
    fn test_words_reply_json() {
        let reply: WordsReply = serde_json::from_str(
            r#"{"status":"success","words":[
                {"value":"hello","verified":true,"timestamp":"2024-05-01T10:00:00.000Z"},
                {"value":"мир","verified":true}
            ],"total":2}"#,
        )
        .unwrap();

        assert_eq!(reply.total, 2);
        assert_eq!(reply.words[1].value, "мир");
        assert_eq!(reply.words[1].timestamp, None);
    }

    /// Test 4: Query parameter names
    #[test]
    fn test_query_json() {
        let query = WordsQuery {
            limit: 500,
            random: true,
            since: EPOCH_TIMESTAMP.into(),
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["lastTimestamp"], EPOCH_TIMESTAMP);
        assert_eq!(value["limit"], 500);
    }

    /// Test 5: Building the HTTP transport from the bundled configuration
    #[test]
    fn test_http_transport_from_config() {
        let config = crate::config::KioskConfig::embedded().unwrap().into_inner();
        let transport = HttpTransport::new(&config.api).unwrap();
        assert_eq!(transport.endpoint(), config.api.endpoint);
    }

    /// Test 6: Non-2xx statuses are server errors even with a success body
    #[test]
    fn test_parse_reply_checks_status() {
        use reqwest::StatusCode;

        let reply: SubmitReply = parse_reply(StatusCode::OK, r#"{"status":"success"}"#).unwrap();
        assert_eq!(reply, SubmitReply::success());

        let err = parse_reply::<SubmitReply>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"status":"success"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Server { status: Some(500), .. }));

        let err = parse_reply::<SubmitReply>(
            StatusCode::BAD_REQUEST,
            r#"{"status":"error","message":"Invalid data format"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClientError::Server {
                status: Some(400),
                message: "Invalid data format".into()
            }
        );

        let err = parse_reply::<SubmitReply>(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert!(matches!(err, ClientError::Server { status: Some(502), .. }));

        let err = parse_reply::<SubmitReply>(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
