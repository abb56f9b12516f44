//! Sign Up Use Case
//!
//! Creates a local user pending email verification.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::{DEFAULT_STATUS, User, UserProfile};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    gender::Gender,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input; required fields are checked here, not by deserialization
#[derive(Default)]
pub struct SignUpInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub check_pw: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: Option<String>,
    pub technology: Option<String>,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

fn required(value: Option<String>) -> AuthResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::Validation("All required fields must be provided".to_string()))
}

impl<R> SignUpUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<User> {
        let email = required(input.email)?;
        let password = required(input.password)?;
        let check_pw = required(input.check_pw)?;
        let name = required(input.name)?;
        let gender = required(input.gender)?;

        if password != check_pw {
            return Err(AuthError::Validation(
                "Password and confirmation do not match".to_string(),
            ));
        }

        let email = Email::new(email)?;
        let gender: Gender = gender.parse()?;
        if input.age.is_some_and(|age| !(0..=150).contains(&age)) {
            return Err(AuthError::Validation("Age is out of range".to_string()));
        }

        let raw_password = RawPassword::new(password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let profile = UserProfile {
            name: name.trim().to_string(),
            gender,
            age: input.age,
            oneliner: input.oneliner,
            status: input
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            technology: input.technology,
        };
        let user = User::new_local(email, password_hash, profile);

        // Uniqueness is decided by the store, not a prior lookup
        self.repo.create(&user).await?;

        tracing::info!(user_id = %user.user_id, "User signed up");

        Ok(user)
    }
}
