//! OAuth Sign-In Use Case
//!
//! Completes a provider callback: code exchange, profile fetch, account
//! linking and application token issuance.

use std::sync::Arc;

use crate::application::account_linker::{LinkDecision, link};
use crate::application::oauth::{OAuthBroker, ProviderTokens};
use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct OAuthSignInOutput {
    pub user: User,
    pub tokens: TokenPair,
    pub provider_tokens: ProviderTokens,
    /// True when this callback created the user
    pub created: bool,
}

pub struct OAuthSignInUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> OAuthSignInUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute<B>(&self, broker: &B, code: &str, state: &str) -> AuthResult<OAuthSignInOutput>
    where
        B: OAuthBroker,
    {
        let provider = broker.provider();
        let provider_tokens = broker.exchange_code(code, state).await?;
        let profile = broker.fetch_profile(&provider_tokens.access_token).await?;

        let existing = self.repo.find_by_email(&profile.email).await?;

        match link(&profile, existing) {
            LinkDecision::Create(user) => {
                // Tokens are signed first so the insert is the last fallible
                // step: a reported failure leaves no row behind.
                let tokens = self.tokens.issue_pair(&user.user_id)?;
                self.repo.create(&user).await?;

                tracing::info!(user_id = %user.user_id, provider = %provider, "Federated user created");

                Ok(OAuthSignInOutput {
                    user,
                    tokens,
                    provider_tokens,
                    created: true,
                })
            }
            LinkDecision::Existing(user) => {
                let tokens = self.tokens.issue_pair(&user.user_id)?;

                tracing::info!(user_id = %user.user_id, provider = %provider, "Federated user signed in");

                Ok(OAuthSignInOutput {
                    user,
                    tokens,
                    provider_tokens,
                    created: false,
                })
            }
            LinkDecision::Conflict => {
                tracing::warn!(provider = %provider, "Provider email belongs to an unlinked account");
                Err(AuthError::AlreadyRegisteredEmail)
            }
        }
    }
}
