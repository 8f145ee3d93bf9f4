//! REST API client module for the sentiment backend.
//!
//! This module provides the `ApiClient` for exchanging credentials on
//! `/login` and classifying text on `/predict`, and the `ApiError` type
//! every failure is normalized into.
//!
//! The backend uses bearer token authentication; the token is obtained
//! from `/login` and passed explicitly to each `/predict` call.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::{ApiError, TRANSPORT_ERROR_MESSAGE};
