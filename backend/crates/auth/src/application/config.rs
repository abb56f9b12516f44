//! Application Configuration
//!
//! Built once at startup and shared as `Arc<AuthConfig>`.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;
use platform::cookie::CookiePolicy;

use crate::domain::value_object::provider::Provider;

/// OAuth client registration for one provider
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback registered with the provider (our `/{provider}/sign-in`)
    pub redirect_uri: String,
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret for access tokens
    pub access_token_secret: Vec<u8>,
    /// HS256 secret for refresh tokens
    pub refresh_token_secret: Vec<u8>,
    /// Access token lifetime (12 hours)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Deadline for every provider HTTP call
    pub provider_timeout: Duration,
    /// Deadline for every credential store call
    pub store_timeout: Duration,
    /// Provider access cookie lifetime when the provider omits `expires_in`
    pub provider_access_fallback_ttl: Duration,
    /// Provider refresh cookie lifetime when the provider omits one
    pub provider_refresh_fallback_ttl: Duration,
    /// Lifetime of the OAuth `state` cookie
    pub oauth_state_ttl: Duration,
    pub kakao: ProviderConfig,
    pub naver: ProviderConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("provider_timeout", &self.provider_timeout)
            .field("store_timeout", &self.store_timeout)
            .field("kakao_client_id", &self.kakao.client_id)
            .field("naver_client_id", &self.naver.client_id)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: Vec::new(),
            refresh_token_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(12 * 3600), // 12 hours
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            provider_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(5),
            provider_access_fallback_ttl: Duration::from_secs(3600),
            provider_refresh_fallback_ttl: Duration::from_secs(30 * 24 * 3600),
            oauth_state_ttl: Duration::from_secs(10 * 60),
            kakao: ProviderConfig::default(),
            naver: ProviderConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with random signing secrets (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut access = vec![0u8; 32];
        let mut refresh = vec![0u8; 32];
        rand::rng().fill_bytes(&mut access);
        rand::rng().fill_bytes(&mut refresh);
        Self {
            access_token_secret: access,
            refresh_token_secret: refresh,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Kakao => &self.kakao,
            Provider::Naver => &self.naver,
        }
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
        }
    }
}
