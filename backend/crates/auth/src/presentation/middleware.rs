//! Auth Gate
//!
//! Middleware for requiring a bearer access token on protected routes.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::extract_cookie;

use crate::application::oauth::OAuthBroker;
use crate::application::token_service::TokenKind;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::cookies::AUTHORIZATION_COOKIE;
use crate::presentation::handlers::AuthAppState;

/// Caller identity resolved by [`require_bearer`], stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Read `Authorization`, falling back to the `authorization` cookie,
/// and return the bearer token
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let raw = match headers.get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::MalformedToken)?
            .to_string(),
        None => {
            let cookie = extract_cookie(headers, AUTHORIZATION_COOKIE).ok_or(AuthError::MissingToken)?;
            urlencoding::decode(&cookie)
                .map_err(|_| AuthError::MalformedToken)?
                .into_owned()
        }
    };

    let (scheme, token) = raw.trim().split_once(' ').ok_or(AuthError::InvalidScheme)?;
    if scheme != "Bearer" {
        return Err(AuthError::InvalidScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token.to_string())
}

/// Verify the bearer token and load its user
///
/// A valid token whose user was deleted fails with `UserGone`.
pub async fn authenticate<R, B>(state: &AuthAppState<R, B>, headers: &HeaderMap) -> AuthResult<User>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let token = bearer_token(headers)?;
    let user_id = state.tokens.verify(&token, TokenKind::Access)?;

    state
        .repo
        .find_by_id(&user_id)
        .await?
        .ok_or(AuthError::UserGone)
}

/// Middleware that requires a valid access token
pub async fn require_bearer<R, B>(
    State(state): State<AuthAppState<R, B>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let user = authenticate(&state, req.headers()).await?;

    tracing::debug!(user_id = %user.user_id, "Request authenticated");

    req.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(req).await)
}
