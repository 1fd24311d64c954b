//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: login, refresh and logout against the remote API
//! - `TokenStorage`: where access and refresh tokens are persisted
//!   (`MemoryStorage`, `FileStorage`, or the OS keychain via `KeyringStorage`)

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::{
    LoginRedirect, RefreshPolicy, Session, SessionStore, LOGIN_PATH, REFRESH_PATH, REGISTER_PATH,
};
pub use storage::{FileStorage, MemoryStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
