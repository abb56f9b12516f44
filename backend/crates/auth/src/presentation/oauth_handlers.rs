//! Provider HTTP Handlers
//!
//! Mounted once per provider under `/{provider}`; the provider is read from
//! a router-level `Extension`.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use platform::crypto::{constant_time_eq, random_url_token};

use crate::application::oauth::OAuthBroker;
use crate::application::{OAuthSignInUseCase, WithdrawalCoordinator};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::provider::Provider;
use crate::error::{AuthError, AuthResult};
use crate::presentation::cookies::{SessionCookieJar, set_cookies};
use crate::presentation::dto::{ApiResponse, OAuthCallbackQuery, OAuthSignInResponse, UserResponse};
use crate::presentation::handlers::AuthAppState;
use crate::presentation::middleware::AuthenticatedUser;

/// Relative to `/{provider}/sign-in`, so it resolves wherever the router is mounted
const RESTART_SIGN_IN: &str = "sign-up";

/// GET /api/{provider}/sign-up
pub async fn begin_sign_in<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Extension(provider): Extension<Provider>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let oauth_state = random_url_token(24);
    let url = state.brokers.get(provider).authorize_url(&oauth_state)?;

    tracing::debug!(provider = %provider, "Redirecting to provider consent");

    Ok((
        set_cookies(vec![state.cookies.oauth_state_cookie(&oauth_state)]),
        Redirect::to(&url),
    ))
}

/// GET /api/{provider}/sign-in?code=&state=
pub async fn complete_sign_in<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Extension(provider): Extension<Provider>,
    headers: HeaderMap,
    query: Result<Query<OAuthCallbackQuery>, QueryRejection>,
) -> AuthResult<Response>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let Query(query) = query?;
    let restart = || {
        (
            set_cookies(vec![state.cookies.clear_oauth_state()]),
            Redirect::to(RESTART_SIGN_IN),
        )
            .into_response()
    };

    if let Some(error) = &query.error {
        tracing::info!(
            provider = %provider,
            error = %error,
            description = query.error_description.as_deref().unwrap_or(""),
            "Provider consent declined"
        );
        return Ok(restart());
    }

    let expected = SessionCookieJar::oauth_state(&headers);
    let state_ok = match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(actual)) => constant_time_eq(expected.as_bytes(), actual.as_bytes()),
        _ => false,
    };
    if !state_ok {
        return Err(AuthError::Unauthorized("OAuth state mismatch".to_string()));
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Ok(restart());
    };
    let oauth_state = query.state.as_deref().unwrap_or_default();

    let use_case = OAuthSignInUseCase::new(state.repo.clone(), state.tokens.clone());
    let output = match use_case
        .execute(state.brokers.get(provider), code, oauth_state)
        .await
    {
        Ok(output) => output,
        Err(AuthError::ProviderDenied) => return Ok(restart()),
        Err(e) => return Err(e),
    };

    let mut cookies = state.cookies.provider_cookies(provider, &output.provider_tokens);
    cookies.extend(state.cookies.session_cookies(&output.tokens));
    cookies.push(state.cookies.clear_oauth_state());

    let body = OAuthSignInResponse {
        user: UserResponse::from(&output.user),
        access_token: output.tokens.access_token,
        refresh_token: output.tokens.refresh_token,
        created: output.created,
    };

    Ok((set_cookies(cookies), Json(ApiResponse::ok("Signed in", body))).into_response())
}

/// GET /api/{provider}/token
pub async fn refresh_provider_token<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Extension(provider): Extension<Provider>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let refresh = SessionCookieJar::provider_refresh_token(&headers, provider).ok_or_else(|| {
        AuthError::Unauthorized(format!("{provider} refresh token is missing"))
    })?;

    let tokens = state.brokers.get(provider).refresh(&refresh).await?;

    tracing::debug!(provider = %provider, "Provider token refreshed");

    Ok((
        set_cookies(state.cookies.provider_cookies(provider, &tokens)),
        Json(ApiResponse::<()>::message("Provider token reissued")),
    ))
}

/// GET /api/{provider}/logout
///
/// Cookies are cleared even if the provider call fails.
pub async fn provider_logout<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Extension(provider): Extension<Provider>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    if let Some(token) = SessionCookieJar::provider_access_token(&headers, provider) {
        if let Err(e) = state.brokers.get(provider).logout(&token).await {
            tracing::warn!(provider = %provider, error = %e, "Provider logout failed");
        }
    }

    (
        set_cookies(state.cookies.clear_all()),
        Json(ApiResponse::<()>::message("Logged out")),
    )
}

/// GET /api/{provider}/withdrawal (behind the auth gate)
pub async fn provider_withdrawal<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Extension(provider): Extension<Provider>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let token = SessionCookieJar::provider_access_token(&headers, provider).ok_or_else(|| {
        AuthError::Unauthorized(format!("{provider} access token is missing"))
    })?;

    WithdrawalCoordinator::new(state.repo.clone(), state.config.clone())
        .withdraw_federated(&user, state.brokers.get(provider), &token)
        .await?;

    Ok((
        set_cookies(state.cookies.clear_all()),
        Json(ApiResponse::<()>::message("Withdrawal complete")),
    ))
}
