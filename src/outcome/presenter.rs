//! Presentation and recovery policy applied after classification.

use std::sync::Arc;

use log::{debug, warn};

use super::{FailureKind, classify, failure_message};
use crate::auth::TokenStore;
use crate::dialog::{Dialog, LoginRedirect};
use crate::transport::ApiFailure;

/// Options controlling how a failure is presented.
///
/// `silent` and `show_alert` gate presentation only. Credential invalidation
/// on auth failures ignores both.
#[derive(Debug, Clone)]
pub struct HandleOptions {
    pub show_alert: bool,
    pub silent: bool,
    pub context: Option<String>,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            show_alert: true,
            silent: false,
            context: None,
        }
    }
}

impl HandleOptions {
    /// Options that log the failure without surfacing anything to the user.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// What the handler did with a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: Option<String>,
    pub alerted: bool,
    pub cleared_credentials: bool,
    pub redirected: bool,
}

/// Applies the recovery policy for classified failures.
pub struct FailureHandler {
    dialog: Arc<dyn Dialog>,
    store: Arc<TokenStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl FailureHandler {
    pub fn new(
        dialog: Arc<dyn Dialog>,
        store: Arc<TokenStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            dialog,
            store,
            redirect,
        }
    }

    /// Classifies the failure, resolves its message, and runs recovery.
    ///
    /// A dead session always invalidates the stored credential and demands a
    /// fresh sign-in, even when the caller asked for silence. A dismissed
    /// challenge produces a report with no message and touches nothing.
    pub async fn handle(&self, failure: &ApiFailure, options: &HandleOptions) -> FailureReport {
        let kind = classify(failure);

        if kind == FailureKind::ChallengeCancelled {
            debug!("challenge dismissed, staying quiet");
            return FailureReport {
                kind,
                message: None,
                alerted: false,
                cleared_credentials: false,
                redirected: false,
            };
        }

        match options.context.as_deref() {
            Some(context) => warn!("[{context}] request failed: {failure}"),
            None => warn!("request failed: {failure}"),
        }

        let message = failure_message(failure);

        let mut cleared_credentials = false;
        let mut redirected = false;
        if matches!(
            kind,
            FailureKind::AuthExpired | FailureKind::MissingCredential
        ) {
            if let Err(err) = self.store.clear() {
                warn!("failed to clear stored credentials: {err}");
            }
            cleared_credentials = true;
            self.redirect.redirect_to_login();
            redirected = true;
        }

        let mut alerted = false;
        if options.show_alert && !options.silent {
            if let Some(text) = &message {
                self.dialog.alert(text).await;
                alerted = true;
            }
        }

        FailureReport {
            kind,
            message,
            alerted,
            cleared_credentials,
            redirected,
        }
    }
}
