//! Canonical Profile
//!
//! Provider-agnostic identity produced by an OAuth broker after the
//! code exchange and userinfo fetch.

use crate::domain::value_object::{email::Email, gender::Gender, provider::Provider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalProfile {
    pub provider: Provider,
    /// Provider-scoped subject id, stringified (Kakao ids are numeric)
    pub provider_user_id: String,
    pub email: Email,
    pub name: String,
    pub gender: Gender,
}
