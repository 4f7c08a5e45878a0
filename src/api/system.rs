//! Sign-in, account management, and API token administration.

use http::Method;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{Credential, now_ms};
use crate::client::{AdminClient, ClientError, ClientResult};
use crate::transport::ApiRequest;

/// Session lifetime assumed when the server reports no expiry of its own.
pub const DEFAULT_SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Account update payload. Fields left as `None` stay unchanged server-side;
/// the current password is always required to authorise the change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub current_password: String,
}

impl AccountUpdate {
    pub fn new(current_password: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            current_password: current_password.into(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Request for a newly minted API token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lifetime in seconds; `None` asks for a token that never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            expires_in: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
}

/// Builds a credential from whatever expiry shape the server used: an
/// absolute `expiresAt` wins, a relative `expiresIn` is converted from
/// seconds, and a silent server gets the default TTL.
fn credential_from_login(body: &LoginBody) -> Option<Credential> {
    let token = body.token.as_deref().filter(|token| !token.is_empty())?;
    let expires_at_ms = body
        .expires_at
        .or_else(|| body.expires_in.map(|seconds| now_ms() + seconds * 1000))
        .unwrap_or_else(|| now_ms() + DEFAULT_SESSION_TTL_MS);
    Some(Credential::new(token, expires_at_ms))
}

impl AdminClient {
    /// Signs in with the admin password. Sign-in rides the challenge flow,
    /// and on success the credential lands in the requested store scope with
    /// the admin flag set.
    pub async fn login(&self, password: &str, persistent: bool) -> ClientResult<Credential> {
        let options = self.default_options();
        let request = ApiRequest::new(Method::POST, self.endpoint("/api/login")?)
            .with_json(serde_json::json!({ "password": password }));
        let response = self.challenge_request(request, &options).await?;

        let body: LoginBody = response.json()?;
        let Some(credential) = credential_from_login(&body) else {
            return Err(ClientError::UnexpectedResponse(
                "login response carried no token".into(),
            ));
        };

        self.store().set(&credential, persistent)?;
        self.store().set_admin_verified(persistent)?;
        info!(
            "signed in, session expires at {}",
            credential.expires_at_ms()
        );
        Ok(credential)
    }

    /// Drops the stored session from both scopes.
    pub fn logout(&self) -> ClientResult<()> {
        self.store().clear()?;
        info!("signed out");
        Ok(())
    }

    /// Changes the account username and/or password.
    pub async fn update_account(&self, update: &AccountUpdate) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::POST, self.endpoint("/api/system/updateAccount")?)
            .with_json(serde_json::to_value(update)?);
        let response = self.authed_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Lists the API tokens issued for this account.
    pub async fn list_tokens(&self) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::GET, self.endpoint("/api/tokens/list")?);
        let response = self.authed_read(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Mints a new API token.
    pub async fn create_token(&self, token: &TokenRequest) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::POST, self.endpoint("/api/tokens/create")?)
            .with_json(serde_json::to_value(token)?);
        let response = self.authed_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Revokes a token by id.
    pub async fn revoke_token(&self, id: i64) -> ClientResult<()> {
        let request = ApiRequest::new(Method::DELETE, self.endpoint("/api/tokens/revoke")?)
            .with_json(serde_json::json!({ "id": id }));
        self.authed_request(request, &self.default_options()).await?;
        Ok(())
    }
}
