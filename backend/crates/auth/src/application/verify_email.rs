//! Email Verification Use Case

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Mark the email verified; a second call fails with `EmailAlreadyVerified`
    pub async fn execute(&self, email: &str) -> AuthResult<User> {
        let email = Email::new(email)?;
        let mut user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.mark_email_verified() {
            return Err(AuthError::EmailAlreadyVerified);
        }
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(user)
    }
}
