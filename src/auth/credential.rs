//! Bearer credential value type.

use chrono::Utc;

/// Window before expiry in which a credential counts as expiring soon.
pub const DEFAULT_EXPIRY_BUFFER_MS: i64 = 30 * 60 * 1000;

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A bearer token together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at_ms: i64,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at_ms: i64) -> Self {
        Self {
            token: token.into(),
            expires_at_ms,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    /// Milliseconds left before expiry, clamped at zero.
    pub fn remaining_ms(&self) -> i64 {
        (self.expires_at_ms - now_ms()).max(0)
    }

    /// A credential on its expiry instant is already expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at_ms <= now_ms()
    }

    /// Still live but within `buffer_ms` of running out.
    pub fn expiring_soon(&self, buffer_ms: i64) -> bool {
        let remaining = self.expires_at_ms - now_ms();
        remaining > 0 && remaining <= buffer_ms
    }
}
