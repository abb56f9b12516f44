//! Token Refresh Use Case
//!
//! Refresh tokens are not rotated or revoked: the old one stays valid until
//! its own expiry.

use std::sync::Arc;

use crate::application::token_service::{TokenKind, TokenPair, TokenService};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct RefreshTokenUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> RefreshTokenUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let user_id = self.tokens.verify(refresh_token, TokenKind::Refresh)?;

        let user = self
            .repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserGone)?;

        tracing::debug!(user_id = %user.user_id, "Token pair refreshed");

        self.tokens.issue_pair(&user.user_id)
    }
}
