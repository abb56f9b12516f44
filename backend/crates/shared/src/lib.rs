//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the vocabulary every bounded context agrees on:
//! - The error envelope returned to HTTP clients and its kind taxonomy
//! - Typed identifiers
//!
//! Only things that are hard to change and mean the same thing everywhere
//! belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
