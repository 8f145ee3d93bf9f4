//! Data models exchanged with the sentiment backend.
//!
//! - `LoginRequest`, `LoginResult`: the credential exchange on `/login`
//! - `AnalysisRequest`, `AnalysisResult`: text classification on `/predict`
//! - `Polarity`: normalized sentiment used for display

pub mod analysis;
pub mod auth;

pub use analysis::{AnalysisRequest, AnalysisResult, Polarity};
pub use auth::{LoginRequest, LoginResult};
