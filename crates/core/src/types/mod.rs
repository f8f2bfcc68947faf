//! Core types for the ecom client.
//!
//! Wire and session types shared by the client library and the CLI.

pub mod auth;
pub mod cart;
pub mod envelope;
pub mod profile;
pub mod token;

pub use auth::{
    AuthResponse, LoginRequest, LoginResponse, RefreshTokenApiResponse, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest,
};
pub use cart::{Cart, CartItem, CartItemRequest, CartResponse};
pub use envelope::{Page, PageResponse, ResponseApi};
pub use profile::{Role, UserProfile};
pub use token::{TokenPair, bearer_value};
