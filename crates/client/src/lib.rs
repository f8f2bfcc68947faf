//! Ecom Client - Authenticated access to the e-commerce REST backend.
//!
//! # Architecture
//!
//! - [`pipeline`] - [`ApiClient`], which attaches bearer tokens, refreshes
//!   expired sessions once per burst of 401s and replays queued requests
//! - [`store`] - Where the single active session lives (memory or JSON file)
//! - [`session`] - Navigation and notification hooks driven on failure
//! - [`services`] - Auth, upload and collection endpoints on top of the pipeline
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ecom_client::{ApiClient, ClientConfig, MemoryCredentialStore};
//! use ecom_client::services::{PageQuery, Resource, resource::BRANDS};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder(ClientConfig::from_env()?)
//!     .store(Arc::new(MemoryCredentialStore::new()))
//!     .build()?;
//!
//! let brands = Resource::new(client, BRANDS);
//! let page: ecom_core::Page<serde_json::Value> = brands.list(&PageQuery::default()).await?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use pipeline::{ApiClient, ApiClientBuilder, ApiRequest, Body, FilePart};
pub use session::{LogNavigator, LogNotifier, Navigator, Notice, Notifier};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
