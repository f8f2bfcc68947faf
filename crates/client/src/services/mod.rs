//! Typed wrappers over backend endpoints, all routed through the pipeline.

pub mod auth;
pub mod cart;
pub mod resource;
pub mod upload;

pub use auth::AuthService;
pub use cart::CartService;
pub use resource::{PageQuery, Resource};
pub use upload::{UploadService, file_part};
