//! Token Service
//!
//! Stateless HS256 access/refresh tokens. Verification is a pure function of
//! the token and the server secret; there is no revocation list, so a token
//! stays valid until it expires.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Which secret signed a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: Uuid,
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Freshly issued application tokens
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Signs and verifies application tokens
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            access: SigningKeys::new(&config.access_token_secret, config.access_token_ttl),
            refresh: SigningKeys::new(&config.refresh_token_secret, config.refresh_token_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn issue(&self, user_id: &UserId, kind: TokenKind) -> AuthResult<String> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: *user_id.as_uuid(),
            kind,
            iat: now,
            exp: now + keys.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    pub fn issue_access_token(&self, user_id: &UserId) -> AuthResult<String> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, user_id: &UserId) -> AuthResult<String> {
        self.issue(user_id, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, user_id: &UserId) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Verify signature, expiry and kind; returns the embedded user id
    pub fn verify(&self, token: &str, kind: TokenKind) -> AuthResult<UserId> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::MalformedToken,
            },
        )?;

        if data.claims.kind != kind {
            return Err(AuthError::MalformedToken);
        }

        Ok(UserId::from_uuid(data.claims.user_id))
    }

    /// Lifetime of the access token, used for the `authorization` cookie
    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    /// Lifetime of the refresh token, used for the `refreshToken` cookie
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }
}
