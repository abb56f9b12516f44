//! Presentation Layer
//!
//! HTTP handlers, DTOs, cookies, router, and middleware.

pub mod cookies;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod oauth_handlers;
pub mod router;

pub use cookies::SessionCookieJar;
pub use handlers::AuthAppState;
pub use middleware::{AuthenticatedUser, authenticate, bearer_token, require_bearer};
pub use router::{auth_router, auth_router_generic};
