//! OAuth Brokers
//!
//! One adapter per provider performing the authorization-code, token and
//! profile round trip. Handlers and the withdrawal coordinator only see the
//! [`OAuthBroker`] capability, so tests can substitute a scripted broker.

pub mod client;
pub mod kakao;
pub mod naver;

use serde::Deserialize;

use crate::domain::entity::canonical_profile::CanonicalProfile;
use crate::domain::value_object::provider::Provider;
use crate::error::{AuthError, AuthResult};

pub use client::ProviderClient;
pub use kakao::KakaoBroker;
pub use naver::NaverBroker;

/// Provider-issued tokens; only ever stored in client cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, when the provider reports it
    pub expires_in: Option<i64>,
    /// Refresh token lifetime in seconds, when the provider reports it
    pub refresh_token_expires_in: Option<i64>,
}

/// Provider adapter
#[trait_variant::make(OAuthBroker: Send)]
pub trait LocalOAuthBroker {
    fn provider(&self) -> Provider;

    /// Consent page URL carrying `state`
    fn authorize_url(&self, state: &str) -> AuthResult<String>;

    /// Exchange an authorization code; no access token means consent failed
    async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderTokens>;

    async fn fetch_profile(&self, access_token: &str) -> AuthResult<CanonicalProfile>;

    async fn refresh(&self, refresh_token: &str) -> AuthResult<ProviderTokens>;

    /// End the provider session without removing consent
    async fn logout(&self, access_token: &str) -> AuthResult<()>;

    /// Remove this application's consent (unlink)
    async fn revoke(&self, access_token: &str) -> AuthResult<()>;
}

/// One broker per supported provider
pub struct Brokers<B> {
    pub kakao: B,
    pub naver: B,
}

impl<B> Brokers<B> {
    pub fn get(&self, provider: Provider) -> &B {
        match provider {
            Provider::Kakao => &self.kakao,
            Provider::Naver => &self.naver,
        }
    }
}

// ============================================================================
// Shared response handling
// ============================================================================

/// Token endpoint body, success or error, as both providers shape it
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<Seconds>,
    refresh_token_expires_in: Option<Seconds>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Naver sends lifetimes as strings, Kakao as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(i64),
    Text(String),
}

impl Seconds {
    fn get(&self) -> Option<i64> {
        match self {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl TokenResponse {
    /// A body without an access token is a declined or failed consent
    pub(crate) fn into_tokens(self, provider: Provider) -> AuthResult<ProviderTokens> {
        let access_token = match self.access_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                tracing::warn!(
                    provider = %provider,
                    error = self.error.as_deref().unwrap_or("none"),
                    description = self.error_description.as_deref().unwrap_or(""),
                    "Token endpoint returned no access token"
                );
                return Err(AuthError::ProviderDenied);
            }
        };

        Ok(ProviderTokens {
            access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_in: self.expires_in.as_ref().and_then(Seconds::get),
            refresh_token_expires_in: self.refresh_token_expires_in.as_ref().and_then(Seconds::get),
        })
    }
}

/// Map a non-2xx provider API response to an error
pub(crate) async fn ensure_success(
    provider: Provider,
    response: reqwest::Response,
) -> AuthResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider = %provider, status = %status, body = %body, "Provider API error");
    Err(AuthError::Provider(format!("{provider} responded {status}")))
}
