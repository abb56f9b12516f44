//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Random tokens and constant-time comparison
//! - Password hashing (Argon2id with optional pepper)
//! - Cookie management
//! - Outbound HTTP client construction

pub mod cookie;
pub mod crypto;
pub mod http_client;
pub mod password;
