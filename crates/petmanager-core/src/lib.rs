//! Core library for petmanager.
//!
//! A client for the pet manager API: session handling with automatic token
//! refresh, pets and tutors CRUD, photo upload, and pet/tutor links.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use petmanager_core::{api::ApiClient, api::ListQuery, auth::MemoryStorage, config::Config};
//! # async fn run() -> Result<(), petmanager_core::ApiError> {
//! let config = Config::default();
//! let client = ApiClient::new(&config, Arc::new(MemoryStorage::new()), Arc::new(|| {}))?;
//! client.session().login("user", "secret").await?;
//! let pets = client.pets().list(&ListQuery::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod utils;

pub use error::ApiError;
