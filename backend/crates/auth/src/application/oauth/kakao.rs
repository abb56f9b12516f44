//! Kakao Broker
//!
//! Kakao Login REST API: `kauth.kakao.com` for consent and tokens,
//! `kapi.kakao.com` for user info, logout and unlink.

use serde::Deserialize;
use url::Url;

use crate::application::config::ProviderConfig;
use crate::domain::entity::canonical_profile::CanonicalProfile;
use crate::domain::value_object::{email::Email, gender::Gender, provider::Provider};
use crate::error::{AuthError, AuthResult};

use super::{OAuthBroker, ProviderTokens, TokenResponse, ensure_success};

/// Kakao API base URLs
#[derive(Debug, Clone)]
pub struct KakaoEndpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Default for KakaoEndpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://kauth.kakao.com".to_string(),
            api_base: "https://kapi.kakao.com".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct KakaoBroker {
    http: reqwest::Client,
    config: ProviderConfig,
    endpoints: KakaoEndpoints,
}

impl KakaoBroker {
    /// `http` must carry the provider call timeout
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self::with_endpoints(http, config, KakaoEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        config: ProviderConfig,
        endpoints: KakaoEndpoints,
    ) -> Self {
        Self {
            http,
            config,
            endpoints,
        }
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> AuthResult<ProviderTokens> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.endpoints.auth_base))
            .form(params)
            .send()
            .await?;

        // Kakao reports consent failures as 4xx with an error body
        let body: TokenResponse = response.json().await?;
        body.into_tokens(Provider::Kakao)
    }

    async fn user_api(&self, path: &str, access_token: &str) -> AuthResult<()> {
        let response = self
            .http
            .post(format!("{}{}", self.endpoints.api_base, path))
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(Provider::Kakao, response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct KakaoUser {
    id: i64,
    #[serde(default)]
    kakao_account: KakaoAccount,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    name: Option<String>,
    gender: Option<String>,
    profile: Option<KakaoProfile>,
}

#[derive(Debug, Deserialize)]
struct KakaoProfile {
    nickname: Option<String>,
}

impl KakaoUser {
    fn into_profile(self) -> AuthResult<CanonicalProfile> {
        let account = self.kakao_account;
        // Email consent is optional on Kakao; without it there is no identity to link
        let email = account.email.ok_or(AuthError::ProviderDenied)?;
        let email = Email::new(&email)
            .map_err(|_| AuthError::Provider("kakao returned an invalid email".to_string()))?;
        let name = account
            .name
            .or_else(|| account.profile.and_then(|p| p.nickname))
            .unwrap_or_default();

        Ok(CanonicalProfile {
            provider: Provider::Kakao,
            provider_user_id: self.id.to_string(),
            email,
            name,
            gender: Gender::from_kakao(account.gender.as_deref()),
        })
    }
}

impl OAuthBroker for KakaoBroker {
    fn provider(&self) -> Provider {
        Provider::Kakao
    }

    fn authorize_url(&self, state: &str) -> AuthResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/oauth/authorize", self.endpoints.auth_base),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("kakao authorize url: {e}")))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> AuthResult<ProviderTokens> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ])
        .await
    }

    async fn fetch_profile(&self, access_token: &str) -> AuthResult<CanonicalProfile> {
        let response = self
            .http
            .get(format!("{}/v2/user/me", self.endpoints.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;
        let user: KakaoUser = ensure_success(Provider::Kakao, response).await?.json().await?;
        user.into_profile()
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<ProviderTokens> {
        // Kakao only rotates the refresh token near its expiry; otherwise
        // `refresh_token` is absent and the caller keeps its current one
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn logout(&self, access_token: &str) -> AuthResult<()> {
        self.user_api("/v1/user/logout", access_token).await
    }

    async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        self.user_api("/v1/user/unlink", access_token).await
    }
}
