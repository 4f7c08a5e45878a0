//! High level admin client orchestration.
//!
//! Wires together the transport, token store, challenge widget, dialog, and
//! failure handler to expose an ergonomic client for the blog admin API.
//! Operations themselves live in the `api` module; this file owns the
//! plumbing every operation rides on.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::{MemoryScope, RedbScope, StoreError, TokenStore};
use crate::challenge::{ChallengeWidget, execute_with_challenge_retry};
use crate::config::{ClientConfig, ConfigError};
use crate::dialog::{Dialog, LoggingDialog, LoggingRedirect, LoginRedirect};
use crate::outcome::FailureKind;
use crate::outcome::presenter::{FailureHandler, FailureReport, HandleOptions};
use crate::transport::{ApiFailure, ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

/// Result alias used across the client layer.
pub type ClientResult<T> = Result<T, ClientError>;

/// High-level error surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The request ultimately failed. Carries the raw failure plus what the
	/// failure handler did about it.
	#[error("request failed: {failure}")]
	Request {
		failure: ApiFailure,
		report: FailureReport,
	},
	#[error("failed to build http transport: {0}")]
	Transport(String),
	#[error("url parse error: {0}")]
	Url(#[from] url::ParseError),
	#[error("unusable response body: {0}")]
	Body(#[from] serde_json::Error),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("token store error: {0}")]
	Store(#[from] StoreError),
	#[error("{0}")]
	Precondition(String),
	#[error("unexpected response shape: {0}")]
	UnexpectedResponse(String),
	#[error(transparent)]
	Ai(#[from] crate::ai::AiError),
}

impl ClientError {
	/// Report produced while handling the failure, when there is one.
	pub fn report(&self) -> Option<&FailureReport> {
		match self {
			ClientError::Request { report, .. } => Some(report),
			_ => None,
		}
	}

	/// Classification of the underlying failure, when there is one.
	pub fn kind(&self) -> Option<FailureKind> {
		self.report().map(|report| report.kind)
	}

	/// User-facing message resolved for the failure, when there is one.
	pub fn message(&self) -> Option<&str> {
		self.report().and_then(|report| report.message.as_deref())
	}
}

/// Fluent builder for [`AdminClient`].
pub struct AdminClientBuilder {
	config: ClientConfig,
	transport: Option<Arc<dyn HttpTransport>>,
	widget: Option<Arc<dyn ChallengeWidget>>,
	dialog: Option<Arc<dyn Dialog>>,
	redirect: Option<Arc<dyn LoginRedirect>>,
	store: Option<Arc<TokenStore>>,
}

impl AdminClientBuilder {
	pub fn new(config: ClientConfig) -> Self {
		Self {
			config,
			transport: None,
			widget: None,
			dialog: None,
			redirect: None,
			store: None,
		}
	}

	pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Wires the challenge widget. Without one the client never retries a
	/// challenged request, whatever the server asks for.
	pub fn with_widget(mut self, widget: Arc<dyn ChallengeWidget>) -> Self {
		self.widget = Some(widget);
		self
	}

	pub fn with_dialog(mut self, dialog: Arc<dyn Dialog>) -> Self {
		self.dialog = Some(dialog);
		self
	}

	pub fn with_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
		self.redirect = Some(redirect);
		self
	}

	pub fn with_store(mut self, store: Arc<TokenStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn build(self) -> ClientResult<AdminClient> {
		self.config.validate()?;

		let transport = match self.transport {
			Some(transport) => transport,
			None => Arc::new(
				ReqwestTransport::with_timeout(Duration::from_millis(self.config.timeout_ms))
					.map_err(|failure| ClientError::Transport(failure.to_string()))?,
			),
		};

		let store = match self.store {
			Some(store) => store,
			None => match &self.config.token_db_path {
				Some(path) => Arc::new(TokenStore::new(
					Arc::new(RedbScope::open(path)?),
					Arc::new(MemoryScope::new()),
				)),
				None => Arc::new(TokenStore::in_memory()),
			},
		};

		let dialog = self.dialog.unwrap_or_else(|| Arc::new(LoggingDialog));
		let redirect = self.redirect.unwrap_or_else(|| Arc::new(LoggingRedirect));
		let handler = FailureHandler::new(dialog.clone(), store.clone(), redirect.clone());

		Ok(AdminClient {
			config: self.config,
			transport,
			store,
			widget: self.widget,
			dialog,
			handler,
		})
	}
}

/// Client for the blog admin API.
pub struct AdminClient {
	config: ClientConfig,
	transport: Arc<dyn HttpTransport>,
	store: Arc<TokenStore>,
	widget: Option<Arc<dyn ChallengeWidget>>,
	dialog: Arc<dyn Dialog>,
	handler: FailureHandler,
}

impl AdminClient {
	/// Construct a client with default collaborators.
	pub fn new(config: ClientConfig) -> ClientResult<Self> {
		AdminClientBuilder::new(config).build()
	}

	/// Obtain a builder to customise the client instance.
	pub fn builder(config: ClientConfig) -> AdminClientBuilder {
		AdminClientBuilder::new(config)
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Token store the client reads credentials from.
	pub fn store(&self) -> &Arc<TokenStore> {
		&self.store
	}

	pub(crate) fn endpoint(&self, path: &str) -> ClientResult<Url> {
		Ok(Url::parse(&format!("{}{path}", self.config.api_url))?)
	}

	pub(crate) fn default_options(&self) -> HandleOptions {
		HandleOptions {
			show_alert: self.config.show_alert,
			..HandleOptions::default()
		}
	}

	/// Sends a public request. Any stored token is attached opportunistically
	/// but the request is never challenge-retried and needs no credential.
	pub(crate) async fn public_request(
		&self,
		request: ApiRequest,
		options: &HandleOptions,
	) -> ClientResult<ApiResponse> {
		let request = match self.store.token()? {
			Some(token) => request.with_bearer(token),
			None => request,
		};
		match self.transport.send(&request).await {
			Ok(response) => Ok(response),
			Err(failure) => Err(self.fail(failure, options).await),
		}
	}

	/// Sends an authenticated read. A live credential is required, but reads
	/// skip the challenge retry flow.
	pub(crate) async fn authed_read(
		&self,
		request: ApiRequest,
		options: &HandleOptions,
	) -> ClientResult<ApiResponse> {
		let Some(credential) = self.store.live()? else {
			return Err(self.fail(ApiFailure::MissingCredential, options).await);
		};
		let request = request.with_bearer(credential.token());
		match self.transport.send(&request).await {
			Ok(response) => Ok(response),
			Err(failure) => Err(self.fail(failure, options).await),
		}
	}

	/// Sends an authenticated mutation through the challenge retry flow.
	pub(crate) async fn authed_request(
		&self,
		request: ApiRequest,
		options: &HandleOptions,
	) -> ClientResult<ApiResponse> {
		let Some(credential) = self.store.live()? else {
			return Err(self.fail(ApiFailure::MissingCredential, options).await);
		};
		let request = request.with_bearer(credential.token());
		self.challenge_request(request, options).await
	}

	/// Challenge-retried send without the credential guard. Login rides this
	/// directly since it has no credential yet.
	pub(crate) async fn challenge_request(
		&self,
		request: ApiRequest,
		options: &HandleOptions,
	) -> ClientResult<ApiResponse> {
		let result = execute_with_challenge_retry(
			self.transport.clone(),
			&request,
			self.widget.clone(),
			self.config.turnstile_site_key.as_deref(),
		)
		.await;
		match result {
			Ok(response) => Ok(response),
			Err(failure) => Err(self.fail(failure, options).await),
		}
	}

	/// Client-side validation failure: alert when the options allow it, then
	/// surface a precondition error without touching the network.
	pub(crate) async fn precondition_failed(
		&self,
		message: &str,
		options: &HandleOptions,
	) -> ClientError {
		if options.show_alert && !options.silent {
			self.dialog.alert(message).await;
		}
		ClientError::Precondition(message.to_string())
	}

	async fn fail(&self, failure: ApiFailure, options: &HandleOptions) -> ClientError {
		let report = self.handler.handle(&failure, options).await;
		ClientError::Request { failure, report }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NoopTransport;

	#[async_trait::async_trait]
	impl HttpTransport for NoopTransport {
		async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, ApiFailure> {
			Err(ApiFailure::Network("noop".into()))
		}
	}

	fn client() -> AdminClient {
		AdminClient::builder(ClientConfig::new("https://blog.api.example.com"))
			.with_transport(Arc::new(NoopTransport))
			.build()
			.unwrap()
	}

	#[test]
	fn endpoint_joins_base_and_path() {
		let client = client();
		let url = client.endpoint("/api/talks/get").unwrap();
		assert_eq!(url.as_str(), "https://blog.api.example.com/api/talks/get");
	}

	#[test]
	fn trailing_slash_in_config_does_not_double_up() {
		let client = AdminClient::builder(ClientConfig::new("https://api.example.com/"))
			.with_transport(Arc::new(NoopTransport))
			.build()
			.unwrap();
		let url = client.endpoint("/api/list").unwrap();
		assert_eq!(url.as_str(), "https://api.example.com/api/list");
	}

	#[test]
	fn build_rejects_a_bad_api_url() {
		let result = AdminClient::builder(ClientConfig::new("notaurl"))
			.with_transport(Arc::new(NoopTransport))
			.build();
		assert!(matches!(result, Err(ClientError::Config(_))));
	}

	#[test]
	fn default_options_honor_the_config() {
		let client = AdminClient::builder(
			ClientConfig::new("https://api.example.com").without_alerts(),
		)
		.with_transport(Arc::new(NoopTransport))
		.build()
		.unwrap();

		assert!(!client.default_options().show_alert);
		assert!(!client.default_options().silent);
	}

	#[tokio::test]
	async fn missing_credential_is_caught_before_the_network() {
		let client = client();
		let request = ApiRequest::new(
			http::Method::POST,
			client.endpoint("/api/add").unwrap(),
		);

		let error = client
			.authed_request(request, &HandleOptions::silent())
			.await
			.unwrap_err();

		assert_eq!(error.kind(), Some(FailureKind::MissingCredential));
	}
}
