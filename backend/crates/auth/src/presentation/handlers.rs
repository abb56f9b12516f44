//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use kernel::id::UserId;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::oauth::{Brokers, OAuthBroker};
use crate::application::{
    LoginInput, LoginUseCase, RefreshTokenUseCase, SignUpUseCase, TokenService,
    UpdateProfileUseCase, VerifyEmailUseCase, WithdrawalCoordinator,
};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::cookies::{SessionCookieJar, set_cookies};
use crate::presentation::dto::{
    ApiResponse, EmailQuery, ExitRequest, LoginRequest, RefreshRequest, SignUpRequest,
    TokenResponse, UpdateProfileRequest, UserResponse,
};
use crate::presentation::middleware::{AuthenticatedUser, authenticate};

/// Shared state for auth handlers
pub struct AuthAppState<R, B> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
    pub cookies: Arc<SessionCookieJar>,
    pub brokers: Arc<Brokers<B>>,
}

impl<R, B> AuthAppState<R, B> {
    pub fn new(repo: R, config: AuthConfig, brokers: Brokers<B>) -> Self {
        Self {
            repo: Arc::new(repo),
            tokens: Arc::new(TokenService::new(&config)),
            cookies: Arc::new(SessionCookieJar::new(&config)),
            config: Arc::new(config),
            brokers: Arc::new(brokers),
        }
    }
}

impl<R, B> Clone for AuthAppState<R, B> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
            cookies: self.cookies.clone(),
            brokers: self.brokers.clone(),
        }
    }
}

/// Empty bodies deserialize to `T::default()`
pub(crate) fn parse_optional_json<T>(body: &Bytes) -> AuthResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AuthError::Validation(format!("Invalid request body: {e}")))
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/users/sign-up
pub async fn sign_up<R, B>(
    State(state): State<AuthAppState<R, B>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = SignUpUseCase::new(state.repo.clone(), state.config.clone());

    let user = use_case.execute(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Signed up, please verify your email",
            UserResponse::from(&user),
        )),
    ))
}

/// GET /api/users/validation?email=
pub async fn validate_email<R, B>(
    State(state): State<AuthAppState<R, B>>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let Query(query) = query?;
    VerifyEmailUseCase::new(state.repo.clone())
        .execute(&query.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::<()>::message("Email verified")),
    ))
}

// ============================================================================
// Login / Tokens
// ============================================================================

/// POST /api/users/login
pub async fn login<R, B>(
    State(state): State<AuthAppState<R, B>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookies = state.cookies.session_cookies(&output.tokens);

    Ok((
        set_cookies(cookies),
        Json(ApiResponse::ok(
            "Logged in",
            TokenResponse::from(output.tokens),
        )),
    ))
}

/// POST /api/token
pub async fn refresh_token<R, B>(
    State(state): State<AuthAppState<R, B>>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let req: RefreshRequest = parse_optional_json(&body)?;
    let token = req
        .refresh_token
        .or_else(|| SessionCookieJar::refresh_token(&headers))
        .ok_or(AuthError::MissingToken)?;

    let pair = RefreshTokenUseCase::new(state.repo.clone(), state.tokens.clone())
        .execute(&token)
        .await?;

    let cookies = state.cookies.session_cookies(&pair);

    Ok((
        set_cookies(cookies),
        Json(ApiResponse::ok("Tokens reissued", TokenResponse::from(pair))),
    ))
}

// ============================================================================
// Profile
// ============================================================================

/// GET /api/me
pub async fn me(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> impl IntoResponse {
    Json(ApiResponse::ok("Profile", UserResponse::from(&user)))
}

/// PATCH /api/me/{userId}
pub async fn update_me<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let Json(req) = payload?;
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| AuthError::Validation("Invalid user id".to_string()))?;

    let user = UpdateProfileUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&user_id, req.into())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Profile updated",
        UserResponse::from(&user),
    )))
}

// ============================================================================
// Withdrawal
// ============================================================================

/// GET|POST /api/users/exit
///
/// A provider access cookie selects the federated path (bearer required);
/// otherwise the body's email and password are re-verified. The email may be
/// omitted when a valid bearer token identifies the caller.
pub async fn exit<R, B>(
    State(state): State<AuthAppState<R, B>>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let coordinator = WithdrawalCoordinator::new(state.repo.clone(), state.config.clone());

    if let Some((provider, provider_token)) = SessionCookieJar::active_provider(&headers) {
        let user = authenticate(&state, &headers).await?;
        coordinator
            .withdraw_federated(&user, state.brokers.get(provider), &provider_token)
            .await?;
    } else {
        let req: ExitRequest = parse_optional_json(&body)?;
        let password = req
            .password
            .ok_or_else(|| AuthError::Validation("Password is required".to_string()))?;
        let email = match req.email {
            Some(email) => email,
            None => authenticate(&state, &headers)
                .await
                .map_err(|_| AuthError::Validation("Email is required".to_string()))?
                .email
                .to_string(),
        };
        coordinator.withdraw_local(&email, password).await?;
    }

    Ok((
        set_cookies(state.cookies.clear_all()),
        Json(ApiResponse::<()>::message("Withdrawal complete")),
    ))
}
