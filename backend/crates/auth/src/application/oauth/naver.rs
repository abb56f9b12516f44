//! Naver Broker
//!
//! Naver Login API. Naver has no logout endpoint; both logout and revoke
//! delete the access token (`grant_type=delete`), which also removes consent.

use serde::Deserialize;
use url::Url;

use crate::application::config::ProviderConfig;
use crate::domain::entity::canonical_profile::CanonicalProfile;
use crate::domain::value_object::{email::Email, gender::Gender, provider::Provider};
use crate::error::{AuthError, AuthResult};

use super::{OAuthBroker, ProviderTokens, TokenResponse, ensure_success};

/// Naver API base URLs
#[derive(Debug, Clone)]
pub struct NaverEndpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Default for NaverEndpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://nid.naver.com".to_string(),
            api_base: "https://openapi.naver.com".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct NaverBroker {
    http: reqwest::Client,
    config: ProviderConfig,
    endpoints: NaverEndpoints,
}

impl NaverBroker {
    /// `http` must carry the provider call timeout
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self::with_endpoints(http, config, NaverEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        config: ProviderConfig,
        endpoints: NaverEndpoints,
    ) -> Self {
        Self {
            http,
            config,
            endpoints,
        }
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        self.token_request_raw(params).await
    }

    async fn delete_token(&self, access_token: &str) -> AuthResult<()> {
        let body: DeleteResponse = self
            .token_request_raw(&[
                ("grant_type", "delete"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("access_token", access_token),
                ("service_provider", "NAVER"),
            ])
            .await?;

        if body.result.as_deref() == Some("success") {
            Ok(())
        } else {
            Err(AuthError::Provider(format!(
                "naver token delete failed: {}",
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "unknown".to_string())
            )))
        }
    }

    async fn token_request_raw<T: for<'de> Deserialize<'de>>(
        &self,
        params: &[(&str, &str)],
    ) -> AuthResult<T> {
        let response = self
            .http
            .post(format!("{}/oauth2.0/token", self.endpoints.auth_base))
            .form(params)
            .send()
            .await?;
        Ok(ensure_success(Provider::Naver, response).await?.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    result: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaverMe {
    resultcode: String,
    #[serde(default)]
    message: String,
    response: Option<NaverUser>,
}

#[derive(Debug, Deserialize)]
struct NaverUser {
    id: String,
    email: Option<String>,
    name: Option<String>,
    nickname: Option<String>,
    gender: Option<String>,
}

impl NaverMe {
    fn into_profile(self) -> AuthResult<CanonicalProfile> {
        if self.resultcode != "00" {
            return Err(AuthError::Provider(format!(
                "naver profile failed: {} {}",
                self.resultcode, self.message
            )));
        }
        let user = self
            .response
            .ok_or_else(|| AuthError::Provider("naver profile has no body".to_string()))?;
        let email = user.email.ok_or(AuthError::ProviderDenied)?;
        let email = Email::new(&email)
            .map_err(|_| AuthError::Provider("naver returned an invalid email".to_string()))?;

        Ok(CanonicalProfile {
            provider: Provider::Naver,
            provider_user_id: user.id,
            email,
            name: user.name.or(user.nickname).unwrap_or_default(),
            gender: Gender::from_naver(user.gender.as_deref()),
        })
    }
}

impl OAuthBroker for NaverBroker {
    fn provider(&self) -> Provider {
        Provider::Naver
    }

    fn authorize_url(&self, state: &str) -> AuthResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/oauth2.0/authorize", self.endpoints.auth_base),
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("naver authorize url: {e}")))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderTokens> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("state", state),
        ])
        .await?
        .into_tokens(Provider::Naver)
    }

    async fn fetch_profile(&self, access_token: &str) -> AuthResult<CanonicalProfile> {
        let response = self
            .http
            .get(format!("{}/v1/nid/me", self.endpoints.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;
        let me: NaverMe = ensure_success(Provider::Naver, response).await?.json().await?;
        me.into_profile()
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<ProviderTokens> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await?
        .into_tokens(Provider::Naver)
    }

    async fn logout(&self, access_token: &str) -> AuthResult<()> {
        self.delete_token(access_token).await
    }

    async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        self.delete_token(access_token).await
    }
}
