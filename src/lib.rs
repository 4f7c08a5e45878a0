//! # blogadmin-rs
//!
//! Async client for a personal blog admin API, covering the full admin
//! surface: sign-in, articles, talks, account and API-token management, and
//! an OpenAI-compatible writing assistant.
//!
//! ## Features
//!
//! - Async HTTP client with cookie and bearer-token handling
//! - Turnstile-aware challenge retry with a pluggable widget
//! - Durable (redb) plus in-memory session token store
//! - Uniform failure classification with user-facing messages
//! - Paginated full-article export
//! - Streaming chat completions for the writing assistant
//!
//! ## Example
//!
//! ```no_run
//! use blogadmin_rs::{AdminClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://blog-api.example.com");
//!     let client = AdminClient::new(config)?;
//!
//!     client.login("admin-password", true).await?;
//!     let articles = client.list_articles().await?;
//!     println!("articles: {articles}");
//!     Ok(())
//! }
//! ```

mod client;

pub mod ai;
pub mod api;
pub mod auth;
pub mod challenge;
pub mod config;
pub mod dialog;
pub mod outcome;
pub mod retry;
pub mod transport;

pub use crate::client::{
    AdminClient,
    AdminClientBuilder,
    ClientError,
    ClientResult,
};

pub use crate::transport::{
    ApiFailure,
    ApiRequest,
    ApiResponse,
    CHALLENGE_TOKEN_HEADER,
    ErrorBody,
    ErrorDetail,
    HttpTransport,
    ReqwestTransport,
};

pub use crate::outcome::{
    FALLBACK_MESSAGE,
    FailureKind,
    NETWORK_MESSAGE,
    classify,
    failure_message,
    status_message,
};

pub use crate::outcome::presenter::{
    FailureHandler,
    FailureReport,
    HandleOptions,
};

pub use crate::auth::{
    Credential,
    DEFAULT_EXPIRY_BUFFER_MS,
    MemoryScope,
    RedbScope,
    StoreError,
    TokenScope,
    TokenStore,
};

pub use crate::challenge::{
    ChallengePrompt,
    ChallengeResult,
    ChallengeToken,
    ChallengeWidget,
    ChallengeWidgetError,
    PresetTokenWidget,
    execute_with_challenge_retry,
    needs_challenge,
};

pub use crate::config::{
    ClientConfig,
    ConfigError,
    DEFAULT_TIMEOUT_MS,
};

pub use crate::dialog::{
    Dialog,
    LoggingDialog,
    LoggingRedirect,
    LoginRedirect,
};

pub use crate::api::{
    AccountUpdate,
    ArticleExport,
    TokenRequest,
};

pub use crate::ai::{
    AiClient,
    AiConfig,
    AiError,
    ChatMessage,
    SseAccumulator,
    StreamEvent,
};

pub use crate::retry::{
    RetryPolicy,
    with_retry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
