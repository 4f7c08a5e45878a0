//! Reqwest-based implementation of the `HttpTransport` trait.
//!
//! Thin adapter around `reqwest::Client` that maps request descriptions onto
//! the concrete transport and folds failed statuses into `ApiFailure`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ApiFailure, ApiRequest, ApiResponse, CHALLENGE_TOKEN_HEADER, ErrorBody, HttpTransport};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-backed transport used by the admin client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a cookie store and a 30 second timeout.
    pub fn new() -> Result<Self, ApiFailure> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ApiFailure> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiFailure::Network(err.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client, keeping whatever middleware and
    /// policies it was built with.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new().expect("failed to create reqwest transport")
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiFailure> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(token) = &request.challenge_token {
            builder = builder.header(CHALLENGE_TOKEN_HEADER, token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| ApiFailure::Network(err.to_string()))?;

        let status = response.status().as_u16();
        let success = response.status().is_success();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiFailure::Network(err.to_string()))?;

        if success {
            Ok(ApiResponse::new(status, headers, body, url))
        } else {
            Err(ApiFailure::Http {
                status,
                body: ErrorBody::from_bytes(&body),
            })
        }
    }
}

type _AssertSync = Arc<ReqwestTransport>;
