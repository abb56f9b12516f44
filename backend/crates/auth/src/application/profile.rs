//! Profile Update Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::{ProfileChanges, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{gender::Gender, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
pub struct UpdateProfileInput {
    /// Current password, re-verified before any change
    pub password: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: Option<String>,
    pub technology: Option<String>,
}

pub struct UpdateProfileUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> UpdateProfileUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, user_id: &UserId, input: UpdateProfileInput) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let raw_password = RawPassword::presented(input.password);
        if !user.verify_password(&raw_password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        let gender = input
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()?;
        if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AuthError::Validation("Name cannot be empty".to_string()));
        }

        user.apply_changes(ProfileChanges {
            name: input.name.map(|n| n.trim().to_string()),
            gender,
            age: input.age,
            oneliner: input.oneliner,
            status: input.status,
            technology: input.technology,
        });
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Profile updated");

        Ok(user)
    }
}
