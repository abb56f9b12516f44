//! Value Object Module

pub mod email;
pub mod gender;
pub mod provider;
pub mod user_password;
