//! Authentication module for the persisted bearer credential.
//!
//! This module provides:
//! - `Credential`: a non-empty bearer token
//! - `SessionStore`: save/read/clear of the single credential slot
//! - `TokenStorage`: where the slot lives (JSON file, OS keychain, memory)
//!
//! Tokens carry no expiry metadata; only the backend decides whether a
//! stored token is still good.

pub mod session;
pub mod storage;

pub use session::{Credential, SessionStore};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageKind, TokenStorage, TOKEN_KEY};
