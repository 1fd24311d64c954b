//! REST API client module for the pet manager service.
//!
//! This module provides the `ApiClient` and the resource services built on
//! it: `PetsApi` and `TutorsApi`. Every call goes through the auth
//! interceptor, which attaches the bearer token and refreshes it on 401.

pub mod client;
pub mod pets;
pub mod tutors;
pub mod upload;

pub use client::{ApiClient, ListQuery};
pub use pets::PetsApi;
pub use tutors::TutorsApi;
pub use upload::{content_type_for, PhotoUpload, MAX_PHOTO_BYTES};
