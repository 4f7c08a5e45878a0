//! HTTP transport abstraction.
//!
//! Defines the request, response, and failure shapes shared across the whole
//! client, plus the trait concrete transports implement. Keeping the seam
//! this narrow lets tests drive the client with scripted responses.

mod reqwest_client;

pub use reqwest_client::ReqwestTransport;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Header carrying the challenge solution token on a retried request.
pub const CHALLENGE_TOKEN_HEADER: &str = "cf-turnstile-response";

/// JSON error payload the API attaches to failed requests.
///
/// Every field is optional on the wire; unknown fields are ignored so the
/// server can grow its error shape without breaking older clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "needChallenge")]
    pub need_challenge: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

/// One entry of a validation detail list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Tolerant parse: anything that is not a matching JSON object becomes an
    /// empty body rather than an error.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// Detail messages joined into a single line, when any are present.
    pub fn joined_details(&self) -> Option<String> {
        let messages: Vec<&str> = self
            .details
            .iter()
            .filter_map(|detail| detail.message.as_deref())
            .filter(|message| !message.is_empty())
            .collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}

/// Failure surfaced by the transport or the challenge flow.
#[derive(Debug, Clone, Error)]
pub enum ApiFailure {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a failure status.
    #[error("http status {status}")]
    Http { status: u16, body: ErrorBody },
    /// The user dismissed the challenge widget.
    #[error("challenge dismissed by the user")]
    ChallengeCancelled,
    /// No live credential was available for an authenticated call.
    #[error("no stored credential")]
    MissingCredential,
}

impl ApiFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiFailure::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiFailure::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Request description handed to the transport.
///
/// Bearer and challenge tokens travel as dedicated fields; the transport owns
/// turning them into headers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
    pub challenge_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            bearer: None,
            challenge_token: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_challenge_token(mut self, token: Option<String>) -> Self {
        self.challenge_token = token;
        self
    }
}

/// Successful HTTP response as seen by the client.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl ApiResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL after any redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Contract implemented by concrete HTTP transports.
///
/// A transport resolves to `Ok` only for success statuses; failed statuses
/// are folded into [`ApiFailure::Http`] with the parsed error body so callers
/// never branch on raw responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_error_body() {
        let raw = br#"{"error":"slug taken","message":"conflict","needChallenge":true,"details":[{"message":"slug must be unique"}]}"#;
        let body = ErrorBody::from_bytes(raw);

        assert_eq!(body.error.as_deref(), Some("slug taken"));
        assert_eq!(body.message.as_deref(), Some("conflict"));
        assert!(body.need_challenge);
        assert_eq!(body.joined_details().as_deref(), Some("slug must be unique"));
    }

    #[test]
    fn missing_flag_defaults_to_false() {
        let body = ErrorBody::from_bytes(br#"{"error":"nope"}"#);
        assert!(!body.need_challenge);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body = ErrorBody::from_bytes(br#"{"error":"x","requestId":"abc-123"}"#);
        assert_eq!(body.error.as_deref(), Some("x"));
    }

    #[test]
    fn non_json_body_becomes_empty() {
        let body = ErrorBody::from_bytes(b"<html>gateway error</html>");
        assert_eq!(body, ErrorBody::default());
    }

    #[test]
    fn joins_multiple_details() {
        let body = ErrorBody {
            details: vec![
                ErrorDetail {
                    message: Some("title required".into()),
                },
                ErrorDetail { message: None },
                ErrorDetail {
                    message: Some("slug required".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            body.joined_details().as_deref(),
            Some("title required; slug required")
        );
    }

    #[test]
    fn request_builder_collects_parts() {
        let request = ApiRequest::new(
            Method::POST,
            Url::parse("https://blog.example.com/api/add").unwrap(),
        )
        .with_query([("posts", "all")])
        .with_json(serde_json::json!({ "title": "hello" }))
        .with_bearer("tok")
        .with_challenge_token(Some("solution".into()));

        assert_eq!(request.query, vec![("posts".to_string(), "all".to_string())]);
        assert_eq!(request.bearer.as_deref(), Some("tok"));
        assert_eq!(request.challenge_token.as_deref(), Some("solution"));
        assert!(request.body.is_some());
    }
}
