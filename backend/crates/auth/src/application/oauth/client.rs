//! Production broker dispatch

use crate::domain::entity::canonical_profile::CanonicalProfile;
use crate::domain::value_object::provider::Provider;
use crate::error::AuthResult;

use super::{KakaoBroker, NaverBroker, OAuthBroker, ProviderTokens};

/// Concrete broker used by the server
#[derive(Clone)]
pub enum ProviderClient {
    Kakao(KakaoBroker),
    Naver(NaverBroker),
}

impl OAuthBroker for ProviderClient {
    fn provider(&self) -> Provider {
        match self {
            ProviderClient::Kakao(b) => b.provider(),
            ProviderClient::Naver(b) => b.provider(),
        }
    }

    fn authorize_url(&self, state: &str) -> AuthResult<String> {
        match self {
            ProviderClient::Kakao(b) => b.authorize_url(state),
            ProviderClient::Naver(b) => b.authorize_url(state),
        }
    }

    async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderTokens> {
        match self {
            ProviderClient::Kakao(b) => b.exchange_code(code, state).await,
            ProviderClient::Naver(b) => b.exchange_code(code, state).await,
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> AuthResult<CanonicalProfile> {
        match self {
            ProviderClient::Kakao(b) => b.fetch_profile(access_token).await,
            ProviderClient::Naver(b) => b.fetch_profile(access_token).await,
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<ProviderTokens> {
        match self {
            ProviderClient::Kakao(b) => b.refresh(refresh_token).await,
            ProviderClient::Naver(b) => b.refresh(refresh_token).await,
        }
    }

    async fn logout(&self, access_token: &str) -> AuthResult<()> {
        match self {
            ProviderClient::Kakao(b) => b.logout(access_token).await,
            ProviderClient::Naver(b) => b.logout(access_token).await,
        }
    }

    async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        match self {
            ProviderClient::Kakao(b) => b.revoke(access_token).await,
            ProviderClient::Naver(b) => b.revoke(access_token).await,
        }
    }
}
