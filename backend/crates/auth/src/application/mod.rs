//! Application Layer
//!
//! Use cases and application services.

pub mod account_linker;
pub mod config;
pub mod login;
pub mod oauth;
pub mod oauth_sign_in;
pub mod profile;
pub mod refresh;
pub mod sign_up;
pub mod token_service;
pub mod verify_email;
pub mod withdrawal;

// Re-exports
pub use config::{AuthConfig, ProviderConfig};
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use oauth_sign_in::{OAuthSignInOutput, OAuthSignInUseCase};
pub use profile::{UpdateProfileInput, UpdateProfileUseCase};
pub use refresh::RefreshTokenUseCase;
pub use sign_up::{SignUpInput, SignUpUseCase};
pub use token_service::{TokenKind, TokenPair, TokenService};
pub use verify_email::VerifyEmailUseCase;
pub use withdrawal::WithdrawalCoordinator;
