//! Session Cookie Jar
//!
//! Writes and reads the cookies that carry application and provider tokens.
//! Every cookie is HttpOnly, Path=/ and expires with the token it carries.

use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;
use platform::cookie::{CookiePolicy, extract_cookie};

use crate::application::config::AuthConfig;
use crate::application::oauth::ProviderTokens;
use crate::application::token_service::TokenPair;
use crate::domain::value_object::provider::Provider;

/// `Bearer%20<access token>`
pub const AUTHORIZATION_COOKIE: &str = "authorization";
/// Application refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";
/// CSRF state for an in-flight provider consent
pub const OAUTH_STATE_COOKIE: &str = "oauthState";

/// `Set-Cookie` values ready to append to a response
pub type SetCookies = AppendHeaders<Vec<(axum::http::HeaderName, String)>>;

#[derive(Debug, Clone)]
pub struct SessionCookieJar {
    policy: CookiePolicy,
    access_ttl: Duration,
    refresh_ttl: Duration,
    provider_access_fallback_ttl: Duration,
    provider_refresh_fallback_ttl: Duration,
    state_ttl: Duration,
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

impl SessionCookieJar {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            policy: config.cookie_policy(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            provider_access_fallback_ttl: config.provider_access_fallback_ttl,
            provider_refresh_fallback_ttl: config.provider_refresh_fallback_ttl,
            state_ttl: config.oauth_state_ttl,
        }
    }

    /// Application tokens, with lifetimes matching the signed expiry
    pub fn session_cookies(&self, tokens: &TokenPair) -> Vec<String> {
        let bearer = urlencoding::encode(&format!("Bearer {}", tokens.access_token)).into_owned();
        vec![
            self.policy
                .build_set_cookie(AUTHORIZATION_COOKIE, &bearer, Some(secs(self.access_ttl))),
            self.policy.build_set_cookie(
                REFRESH_COOKIE,
                &tokens.refresh_token,
                Some(secs(self.refresh_ttl)),
            ),
        ]
    }

    /// Provider tokens, with lifetimes reported by the provider
    ///
    /// Without a new refresh token the existing refresh cookie is left as is.
    pub fn provider_cookies(&self, provider: Provider, tokens: &ProviderTokens) -> Vec<String> {
        let access_max_age = tokens
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or_else(|| secs(self.provider_access_fallback_ttl));
        let mut cookies = vec![self.policy.build_set_cookie(
            provider.access_cookie(),
            &tokens.access_token,
            Some(access_max_age),
        )];

        if let Some(refresh) = &tokens.refresh_token {
            let max_age = tokens
                .refresh_token_expires_in
                .unwrap_or_else(|| secs(self.provider_refresh_fallback_ttl));
            cookies.push(self.policy.build_set_cookie(
                provider.refresh_cookie(),
                refresh,
                Some(max_age),
            ));
        }

        cookies
    }

    pub fn oauth_state_cookie(&self, state: &str) -> String {
        self.policy
            .build_set_cookie(OAUTH_STATE_COOKIE, state, Some(secs(self.state_ttl)))
    }

    pub fn clear_oauth_state(&self) -> String {
        self.policy.build_delete_cookie(OAUTH_STATE_COOKIE)
    }

    /// Expire every cookie this jar can set
    pub fn clear_all(&self) -> Vec<String> {
        let mut names = vec![AUTHORIZATION_COOKIE, REFRESH_COOKIE, OAUTH_STATE_COOKIE];
        for provider in Provider::ALL {
            names.push(provider.access_cookie());
            names.push(provider.refresh_cookie());
        }
        names
            .into_iter()
            .map(|name| self.policy.build_delete_cookie(name))
            .collect()
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub fn provider_access_token(headers: &HeaderMap, provider: Provider) -> Option<String> {
        extract_cookie(headers, provider.access_cookie())
    }

    pub fn provider_refresh_token(headers: &HeaderMap, provider: Provider) -> Option<String> {
        extract_cookie(headers, provider.refresh_cookie())
    }

    /// First provider whose access cookie is present
    pub fn active_provider(headers: &HeaderMap) -> Option<(Provider, String)> {
        Provider::ALL
            .into_iter()
            .find_map(|p| Self::provider_access_token(headers, p).map(|token| (p, token)))
    }

    pub fn refresh_token(headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, REFRESH_COOKIE)
    }

    pub fn oauth_state(headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, OAUTH_STATE_COOKIE)
    }
}

/// Wrap cookie strings as response parts
pub fn set_cookies(cookies: Vec<String>) -> SetCookies {
    AppendHeaders(cookies.into_iter().map(|c| (SET_COOKIE, c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    fn jar() -> SessionCookieJar {
        SessionCookieJar::new(&AuthConfig::development())
    }

    #[test]
    fn test_session_cookies_carry_token_lifetimes() {
        let cookies = jar().session_cookies(&TokenPair {
            access_token: "aaa.bbb.ccc".to_string(),
            refresh_token: "rrr.sss.ttt".to_string(),
        });

        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("authorization=Bearer%20aaa.bbb.ccc;"));
        assert!(cookies[0].contains("Max-Age=43200"));
        assert!(cookies[0].contains("HttpOnly"));
        assert!(cookies[1].starts_with("refreshToken=rrr.sss.ttt;"));
        assert!(cookies[1].contains("Max-Age=604800"));
    }

    #[test]
    fn test_provider_cookies() {
        let tokens = ProviderTokens {
            access_token: "kat".to_string(),
            refresh_token: Some("krt".to_string()),
            expires_in: Some(21599),
            refresh_token_expires_in: Some(5183999),
        };
        let cookies = jar().provider_cookies(Provider::Kakao, &tokens);
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("kakaoAccessToken=kat;"));
        assert!(cookies[0].contains("Max-Age=21599"));
        assert!(cookies[1].starts_with("kakaoRefreshToken=krt;"));
        assert!(cookies[1].contains("Max-Age=5183999"));
    }

    #[test]
    fn test_provider_refresh_fallback_lifetime() {
        let tokens = ProviderTokens {
            access_token: "nat".to_string(),
            refresh_token: Some("nrt".to_string()),
            expires_in: Some(3600),
            refresh_token_expires_in: None,
        };
        let cookies = jar().provider_cookies(Provider::Naver, &tokens);
        assert!(cookies[1].contains(&format!("Max-Age={}", 30 * 24 * 3600)));
    }

    #[test]
    fn test_provider_without_refresh_token() {
        let tokens = ProviderTokens {
            access_token: "nat".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            refresh_token_expires_in: None,
        };
        assert_eq!(jar().provider_cookies(Provider::Naver, &tokens).len(), 1);
    }

    #[test]
    fn test_provider_access_fallback_lifetime() {
        let tokens = ProviderTokens {
            access_token: "kat".to_string(),
            refresh_token: None,
            expires_in: None,
            refresh_token_expires_in: None,
        };
        let cookies = jar().provider_cookies(Provider::Kakao, &tokens);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("kakaoAccessToken=kat;"));
        assert!(cookies[0].contains("Max-Age=3600"));
        assert!(!cookies[0].contains("Max-Age=0"));
    }

    #[test]
    fn test_clear_all() {
        let cleared = jar().clear_all();
        assert_eq!(cleared.len(), 7);
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
        assert!(cleared.iter().any(|c| c.starts_with("naverRefreshToken=;")));
    }

    #[test]
    fn test_active_provider() {
        let mut headers = HeaderMap::new();
        assert!(SessionCookieJar::active_provider(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("x=1; naverAccessToken=tok"));
        assert_eq!(
            SessionCookieJar::active_provider(&headers),
            Some((Provider::Naver, "tok".to_string()))
        );
    }
}
