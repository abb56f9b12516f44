//! User Entity
//!
//! Identity record shared by local and federated accounts.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::canonical_profile::CanonicalProfile;
use crate::domain::value_object::{
    email::Email,
    gender::Gender,
    provider::Provider,
    user_password::{RawPassword, UserPassword},
};

/// Status assigned when signup does not name one
pub const DEFAULT_STATUS: &str = "job_seeker";

/// Owner-editable profile fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub gender: Gender,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: String,
    pub technology: Option<String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
            age: None,
            oneliner: None,
            status: DEFAULT_STATUS.to_string(),
            technology: None,
        }
    }
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: Option<String>,
    pub technology: Option<String>,
}

/// User entity
///
/// `password_hash` is present iff the user signed up locally.
/// A provider id slot is set iff the user federated with that provider.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    pub password_hash: Option<UserPassword>,
    pub kakao_id: Option<String>,
    pub naver_id: Option<String>,
    pub is_email_valid: bool,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Local signup, pending email verification
    pub fn new_local(email: Email, password_hash: UserPassword, profile: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            password_hash: Some(password_hash),
            kakao_id: None,
            naver_id: None,
            is_email_valid: false,
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    /// First sign-in through a provider; the provider already verified the email
    pub fn new_federated(profile: &CanonicalProfile) -> Self {
        let now = Utc::now();
        let mut user = Self {
            user_id: UserId::new(),
            email: profile.email.clone(),
            password_hash: None,
            kakao_id: None,
            naver_id: None,
            is_email_valid: true,
            profile: UserProfile::new(profile.name.clone(), profile.gender),
            created_at: now,
            updated_at: now,
        };
        *user.provider_slot_mut(profile.provider) = Some(profile.provider_user_id.clone());
        user
    }

    pub fn provider_id(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Kakao => self.kakao_id.as_deref(),
            Provider::Naver => self.naver_id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }

    fn provider_slot_mut(&mut self, provider: Provider) -> &mut Option<String> {
        match provider {
            Provider::Kakao => &mut self.kakao_id,
            Provider::Naver => &mut self.naver_id,
        }
    }

    pub fn is_federated_with(&self, provider: Provider) -> bool {
        self.provider_id(provider).is_some()
    }

    /// Re-authenticate with a password
    ///
    /// Federation-only accounts have no hash and never match.
    pub fn verify_password(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(raw, pepper))
    }

    /// Returns `false` if the email was already verified
    pub fn mark_email_verified(&mut self) -> bool {
        if self.is_email_valid {
            return false;
        }
        self.is_email_valid = true;
        self.updated_at = Utc::now();
        true
    }

    pub fn apply_changes(&mut self, changes: ProfileChanges) {
        let profile = &mut self.profile;
        if let Some(name) = changes.name {
            profile.name = name;
        }
        if let Some(gender) = changes.gender {
            profile.gender = gender;
        }
        if let Some(age) = changes.age {
            profile.age = Some(age);
        }
        if let Some(oneliner) = changes.oneliner {
            profile.oneliner = Some(oneliner);
        }
        if let Some(status) = changes.status {
            profile.status = status;
        }
        if let Some(technology) = changes.technology {
            profile.technology = Some(technology);
        }
        self.updated_at = Utc::now();
    }
}
