//! Ecom Core - Shared types library.
//!
//! This crate provides the types used across the ecom client components:
//! - `client` - Authenticated request pipeline and API services
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Session tokens, user profile, response envelopes, auth bodies and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
