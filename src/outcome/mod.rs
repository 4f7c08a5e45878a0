//! Failure classification and user-facing message resolution.
//!
//! Classification is pure: the kind assigned to a failure depends only on
//! whether a response arrived, its status, and the challenge marker in the
//! body. Recovery policy lives in [`presenter`].

pub mod presenter;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::transport::{ApiFailure, ErrorBody};

/// Broad category assigned to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request never reached the server.
    NetworkUnreachable,
    /// 401, the bearer token is gone or stale.
    AuthExpired,
    /// 400 or 422 rejected input.
    ValidationFailed,
    /// 404.
    NotFound,
    /// 409, usually a duplicate slug or id.
    Conflict,
    /// 429.
    RateLimited,
    /// Any 5xx.
    ServerError,
    /// The body carried the challenge marker, whatever the status.
    ChallengeRequired,
    /// The user dismissed the challenge widget.
    ChallengeCancelled,
    /// An authenticated call was attempted with no stored credential.
    MissingCredential,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    /// Whether a failure of this kind may succeed on a plain retry.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::NetworkUnreachable | FailureKind::ServerError
        )
    }
}

const SIGN_IN_MESSAGE: &str = "Session expired, please sign in again";

/// Message shown when no HTTP response was received at all.
pub const NETWORK_MESSAGE: &str = "Network connection failed, please check your connection";

/// Last-resort message when nothing better can be resolved.
pub const FALLBACK_MESSAGE: &str = "Operation failed, please try again later";

/// Default user-facing text per status code.
static STATUS_MESSAGES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (400, "Invalid request parameters, please check your input"),
        (401, SIGN_IN_MESSAGE),
        (403, "Permission denied"),
        (404, "The requested resource does not exist"),
        (409, "Data conflict, the record already exists"),
        (422, "Data validation failed"),
        (429, "Too many requests, please retry later"),
        (500, "Internal server error"),
        (502, "Bad gateway"),
        (503, "Service temporarily unavailable"),
        (504, "Request timed out"),
    ])
});

/// Assigns the single kind a failure belongs to.
///
/// The challenge marker in the body wins over the status code, so a flagged
/// 403 and a flagged 500 classify the same way. A bare 403 without the
/// marker is not a challenge.
pub fn classify(failure: &ApiFailure) -> FailureKind {
    match failure {
        ApiFailure::Network(_) => FailureKind::NetworkUnreachable,
        ApiFailure::ChallengeCancelled => FailureKind::ChallengeCancelled,
        ApiFailure::MissingCredential => FailureKind::MissingCredential,
        ApiFailure::Http { status, body } => {
            if body.need_challenge {
                return FailureKind::ChallengeRequired;
            }
            match *status {
                401 => FailureKind::AuthExpired,
                400 | 422 => FailureKind::ValidationFailed,
                404 => FailureKind::NotFound,
                409 => FailureKind::Conflict,
                429 => FailureKind::RateLimited,
                500..=599 => FailureKind::ServerError,
                _ => FailureKind::Unknown,
            }
        }
    }
}

/// Table lookup for the default message of a status code.
pub fn status_message(status: u16) -> Option<&'static str> {
    STATUS_MESSAGES.get(&status).copied()
}

/// Resolves the user-facing message for a failure.
///
/// For HTTP failures the body `error` text wins, then `message`, then the
/// joined detail list, then the status table, then a generic fallback. Empty
/// strings are skipped at every step. Challenge cancellation resolves to no
/// message at all.
pub fn failure_message(failure: &ApiFailure) -> Option<String> {
    match failure {
        ApiFailure::Network(_) => Some(NETWORK_MESSAGE.to_string()),
        ApiFailure::ChallengeCancelled => None,
        ApiFailure::MissingCredential => Some(SIGN_IN_MESSAGE.to_string()),
        ApiFailure::Http { status, body } => Some(http_message(*status, body)),
    }
}

fn http_message(status: u16, body: &ErrorBody) -> String {
    non_empty(body.error.as_deref())
        .or_else(|| non_empty(body.message.as_deref()))
        .map(str::to_string)
        .or_else(|| body.joined_details())
        .or_else(|| status_message(status).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|value| !value.is_empty())
}
