//! Account Linker
//!
//! Decides what an incoming provider identity means for the local table.
//! Pure: the caller performs the email lookup and acts on the decision.

use crate::domain::entity::{canonical_profile::CanonicalProfile, user::User};

#[derive(Debug)]
pub enum LinkDecision {
    /// Nobody holds the email; insert this federated user
    Create(User),
    /// Returning federated user
    Existing(User),
    /// Email belongs to an account not linked to this provider id
    Conflict,
}

/// Resolve a provider profile against the user currently holding its email
///
/// A local or differently-linked account is never linked implicitly.
pub fn link(profile: &CanonicalProfile, existing: Option<User>) -> LinkDecision {
    match existing {
        None => LinkDecision::Create(User::new_federated(profile)),
        Some(user)
            if user.provider_id(profile.provider) == Some(profile.provider_user_id.as_str()) =>
        {
            LinkDecision::Existing(user)
        }
        Some(_) => LinkDecision::Conflict,
    }
}
