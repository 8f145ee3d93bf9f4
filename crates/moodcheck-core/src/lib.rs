//! Core library for moodcheck.
//!
//! Talks to a sentiment analysis backend over HTTP and keeps the screen
//! state machines that front ends render:
//!
//! - `api`: `ApiClient` for `/login` and `/predict`, plus the `ApiError` taxonomy
//! - `auth`: `SessionStore` holding the single persisted bearer credential
//! - `models`: request and response types exchanged with the backend
//! - `views`: login, landing and analysis controllers
//! - `config`: user configuration loaded from the config directory

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, SessionStore};
pub use config::Config;
