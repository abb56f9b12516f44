//! Withdrawal Coordinator
//!
//! Deletes an account either after password re-authentication (local) or
//! after the provider confirmed unlinking (federated). Cookie clearing is
//! left to the HTTP layer.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::application::oauth::OAuthBroker;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct WithdrawalCoordinator<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> WithdrawalCoordinator<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Re-authenticate with email and password, then delete
    ///
    /// Nothing is deleted unless the password check passed.
    pub async fn withdraw_local(&self, email: &str, password: String) -> AuthResult<UserId> {
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let raw_password = RawPassword::presented(password);
        if !user.verify_password(&raw_password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        self.delete(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "User withdrew");

        Ok(user.user_id)
    }

    /// Confirm ownership of the provider token, revoke consent, then delete
    ///
    /// A failed revocation aborts before the row is touched.
    pub async fn withdraw_federated<B>(
        &self,
        user: &User,
        broker: &B,
        provider_access_token: &str,
    ) -> AuthResult<()>
    where
        B: OAuthBroker,
    {
        let provider = broker.provider();

        let linked_id = user
            .provider_id(provider)
            .ok_or(AuthError::ProviderMismatch)?;
        let profile = broker.fetch_profile(provider_access_token).await?;
        if profile.provider_user_id != linked_id {
            return Err(AuthError::ProviderMismatch);
        }

        broker.revoke(provider_access_token).await.inspect_err(|e| {
            tracing::warn!(
                user_id = %user.user_id,
                provider = %provider,
                error = %e,
                "Provider unlink failed, account kept"
            );
        })?;

        self.delete(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, provider = %provider, "Federated user withdrew");

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        if self.repo.delete(user_id).await? {
            Ok(())
        } else {
            Err(AuthError::UserGone)
        }
    }
}
