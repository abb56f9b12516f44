//! Auth Router

use axum::{
    Extension, Router, middleware,
    routing::{get, patch, post},
};

use crate::application::config::AuthConfig;
use crate::application::oauth::{Brokers, OAuthBroker, ProviderClient};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::provider::Provider;
use crate::infra::postgres::PgUserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_bearer;
use crate::presentation::oauth_handlers;

/// Create the Auth router with PostgreSQL repository and live provider clients
pub fn auth_router(
    repo: PgUserRepository,
    config: AuthConfig,
    brokers: Brokers<ProviderClient>,
) -> Router {
    auth_router_generic(repo, config, brokers)
}

/// Create a generic Auth router for any repository and broker implementation
///
/// Paths are relative; the caller nests the result under `/api`.
pub fn auth_router_generic<R, B>(repo: R, config: AuthConfig, brokers: Brokers<B>) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let state = AuthAppState::new(repo, config, brokers);

    let public = Router::new()
        .route("/users/sign-up", post(handlers::sign_up::<R, B>))
        .route("/users/validation", get(handlers::validate_email::<R, B>))
        .route("/users/login", post(handlers::login::<R, B>))
        .route(
            "/users/exit",
            get(handlers::exit::<R, B>).post(handlers::exit::<R, B>),
        )
        .route("/token", post(handlers::refresh_token::<R, B>))
        .route("/me/{user_id}", patch(handlers::update_me::<R, B>));

    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer::<R, B>,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest("/kakao", provider_router(&state, Provider::Kakao))
        .nest("/naver", provider_router(&state, Provider::Naver))
        .with_state(state)
}

fn provider_router<R, B>(
    state: &AuthAppState<R, B>,
    provider: Provider,
) -> Router<AuthAppState<R, B>>
where
    R: UserRepository + Send + Sync + 'static,
    B: OAuthBroker + Send + Sync + 'static,
{
    let gated = Router::new()
        .route(
            "/withdrawal",
            get(oauth_handlers::provider_withdrawal::<R, B>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer::<R, B>,
        ));

    Router::new()
        .route("/sign-up", get(oauth_handlers::begin_sign_in::<R, B>))
        .route("/sign-in", get(oauth_handlers::complete_sign_in::<R, B>))
        .route("/token", get(oauth_handlers::refresh_provider_token::<R, B>))
        .route("/logout", get(oauth_handlers::provider_logout::<R, B>))
        .merge(gated)
        .layer(Extension(provider))
}
