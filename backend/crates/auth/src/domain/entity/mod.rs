//! Entities

pub mod canonical_profile;
pub mod user;
