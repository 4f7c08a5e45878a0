//! Interactive challenge widget contract.
//!
//! The widget is whatever surface can put a Turnstile-style challenge in
//! front of a person and hand back the minted token. The client stays
//! agnostic of how that happens.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Details the widget needs to render a challenge.
#[derive(Debug, Clone)]
pub struct ChallengePrompt {
    pub site_key: String,
    pub page_url: Url,
}

impl ChallengePrompt {
    pub fn new(site_key: impl Into<String>, page_url: Url) -> Self {
        Self {
            site_key: site_key.into(),
            page_url,
        }
    }
}

/// Token minted by a solved challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeToken {
    pub token: String,
}

impl ChallengeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Common result type returned by challenge widgets.
pub type ChallengeResult = Result<ChallengeToken, ChallengeWidgetError>;

/// Shared interface implemented by challenge surfaces.
#[async_trait]
pub trait ChallengeWidget: Send + Sync {
    fn name(&self) -> &'static str;
    async fn solve(&self, prompt: &ChallengePrompt) -> ChallengeResult;
}

/// Ways a widget can end without a token.
#[derive(Debug, Error)]
pub enum ChallengeWidgetError {
    /// The user closed the widget without solving it.
    #[error("challenge dismissed by the user")]
    Cancelled,
    /// The widget produced a token but it lapsed before it could be used.
    #[error("challenge token expired before submission")]
    Expired,
    /// The widget itself broke.
    #[error("challenge widget failed: {0}")]
    Failed(String),
}

/// Widget that replays a token minted out of band.
///
/// Useful for automation where an operator solves the challenge elsewhere
/// and feeds the token in, and for exercising the retry path in tests.
pub struct PresetTokenWidget {
    token: String,
}

impl PresetTokenWidget {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl ChallengeWidget for PresetTokenWidget {
    fn name(&self) -> &'static str {
        "preset-token"
    }

    async fn solve(&self, _prompt: &ChallengePrompt) -> ChallengeResult {
        Ok(ChallengeToken::new(self.token.clone()))
    }
}
