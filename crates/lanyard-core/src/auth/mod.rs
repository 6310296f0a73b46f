//! Supabase sign-in and the identity seam used by sync.

mod identity;

use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteConfig;
use crate::util::{parse_api_error, unix_timestamp_now};

pub use identity::{IdentityProvider, Principal, StaticIdentity, SupabaseIdentity};

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth input: {0}")]
    InvalidInput(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where the signed-in session is kept between runs
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Email/password client for Supabase `GoTrue`
#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(config: &RemoteConfig, store: S) -> AuthResult<Self> {
        Ok(Self {
            auth_url: config.auth_url(),
            anon_key: config.anon_key().to_string(),
            client: Client::builder().timeout(config.request_timeout()).build()?,
            store,
        })
    }

    /// Load the persisted session, refreshing it when it is about to expire.
    ///
    /// A session whose refresh token is rejected is cleared and `None` is
    /// returned. Transport failures leave the stored session in place and
    /// surface as `Err`, so going offline does not sign the user out.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error @ (AuthError::Api(_) | AuthError::InvalidInput(_))) => {
                tracing::warn!("Persisted session was rejected, signing out: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
            Err(error) => {
                tracing::debug!("Could not refresh persisted session, keeping it: {}", error);
                Err(error)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        if email.trim().is_empty() {
            return Err(AuthError::InvalidInput("Email is required"));
        }
        if password.trim().is_empty() {
            return Err(AuthError::InvalidInput("Password is required"));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let session = self
            .request_session("password", &payload)
            .await?
            .ok_or_else(|| {
                AuthError::Api("Sign-in response did not include an active session".to_string())
            })?;

        self.store.save_session(&session)?;
        tracing::info!("Signed in as {}", session.user.id);
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidInput("Refresh token must not be empty"));
        }

        let payload = serde_json::json!({ "refresh_token": refresh_token });
        let session = self
            .request_session("refresh_token", &payload)
            .await?
            .ok_or_else(|| {
                AuthError::Api("Refresh response did not include an active session".to_string())
            })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Revoke the session server-side and forget it locally.
    ///
    /// An already-invalid token (401) still counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !(status.is_success() || status == StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()?;
        Ok(())
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn request_session(
        &self,
        grant_type: &str,
        payload: &serde_json::Value,
    ) -> AuthResult<Option<AuthSession>> {
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", grant_type)])
                .json(payload),
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        response.json::<TokenResponse>().await?.into_session()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (self.access_token, self.refresh_token, expires_at, self.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: AuthUser {
                        id: user.id,
                        email: user.email,
                    },
                }))
            }
            (None, None, None, _) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}
