//! User-facing prompts and navigation hooks.
//!
//! The client never renders UI itself. These traits are the seams where an
//! embedding application plugs in its own alert surface and login routing;
//! the logging implementations are the headless defaults.

use async_trait::async_trait;
use log::{info, warn};

/// Surface for alerts and confirmations.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Show a message the user only acknowledges.
    async fn alert(&self, message: &str);

    /// Ask a yes/no question. Implementations with nothing to ask answer
    /// `false`, the safe answer for destructive confirmations.
    async fn confirm(&self, message: &str) -> bool;
}

/// Dialog that writes prompts to the log and declines confirmations.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDialog;

#[async_trait]
impl Dialog for LoggingDialog {
    async fn alert(&self, message: &str) {
        warn!("alert: {message}");
    }

    async fn confirm(&self, message: &str) -> bool {
        warn!("confirm declined, no interactive dialog mounted: {message}");
        false
    }
}

/// Navigation hook invoked when the session must be re-established.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Redirect that only records the demand in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRedirect;

impl LoginRedirect for LoggingRedirect {
    fn redirect_to_login(&self) {
        info!("session invalid, sign-in required");
    }
}
