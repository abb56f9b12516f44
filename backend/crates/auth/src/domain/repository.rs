//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Credential store
///
/// Email uniqueness is enforced by the store itself: `create` fails with
/// `AuthError::AlreadyRegisteredEmail` when the email is taken, so callers
/// never rely on a preceding lookup.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Persist mutable fields (profile, verification flag, provider ids)
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Returns `false` if no row was deleted
    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;
}
