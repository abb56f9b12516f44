//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository trait
//! - `application/` - Use cases, token service, OAuth brokers
//! - `infra/` - PostgreSQL and in-memory user stores
//! - `presentation/` - HTTP handlers, DTOs, cookies, router, auth gate
//!
//! ## Features
//! - Local sign-up with email verification and email + password login
//! - Kakao / Naver authorization-code sign-in with account linking by email
//! - Stateless HS256 access / refresh tokens, delivered as JSON and cookies
//! - Profile read and update behind a bearer-token gate
//! - Local and federated withdrawal (provider consent revoked first)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id plus an optional server-side pepper
//! - Access and refresh tokens signed with distinct secrets and kinds
//! - OAuth `state` bound to an HttpOnly cookie and compared in constant time
//! - Email uniqueness enforced by the store, not by read-then-write

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthConfig, ProviderConfig};
pub use application::oauth::{Brokers, KakaoBroker, NaverBroker, OAuthBroker, ProviderClient};
pub use application::token_service::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryUserRepository, PgUserRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgUserRepository as UserStore;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
