//! Per-screen content rendering.

pub mod analysis;
pub mod login;
