//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{SignUpInput, TokenPair, UpdateProfileInput};
use crate::domain::entity::user::User;

// ============================================================================
// Envelope
// ============================================================================

/// Success body shared by every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request; presence of required fields is checked by the use case
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
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

impl From<SignUpRequest> for SignUpInput {
    fn from(req: SignUpRequest) -> Self {
        SignUpInput {
            email: req.email,
            password: req.password,
            check_pw: req.check_pw,
            name: req.name,
            gender: req.gender,
            age: req.age,
            oneliner: req.oneliner,
            status: req.status,
            technology: req.technology,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

// ============================================================================
// Login / Tokens
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Falls back to the `refreshToken` cookie when absent
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub gender: String,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: String,
    pub technology: Option<String>,
    pub is_email_valid: bool,
    pub kakao_linked: bool,
    pub naver_linked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        use crate::domain::value_object::provider::Provider;

        Self {
            user_id: user.user_id.to_string(),
            email: user.email.to_string(),
            name: user.profile.name.clone(),
            gender: user.profile.gender.to_string(),
            age: user.profile.age,
            oneliner: user.profile.oneliner.clone(),
            status: user.profile.status.clone(),
            technology: user.profile.technology.clone(),
            is_email_valid: user.is_email_valid,
            kakao_linked: user.is_federated_with(Provider::Kakao),
            naver_linked: user.is_federated_with(Provider::Naver),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub password: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub oneliner: Option<String>,
    pub status: Option<String>,
    pub technology: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfileInput {
    fn from(req: UpdateProfileRequest) -> Self {
        UpdateProfileInput {
            password: req.password,
            name: req.name,
            gender: req.gender,
            age: req.age,
            oneliner: req.oneliner,
            status: req.status,
            technology: req.technology,
        }
    }
}

// ============================================================================
// Withdrawal
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExitRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// OAuth
// ============================================================================

/// Provider redirect back to `/{provider}/sign-in`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user declined consent
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSignInResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub created: bool,
}
