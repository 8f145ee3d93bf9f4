//! Screen controllers.
//!
//! Each screen is a small state machine over `Phase` with at most one
//! request in flight. Requests are split into a synchronous `begin` step
//! that validates input and enters `Loading`, and a `complete` step that
//! applies the outcome, so front ends can run the request wherever they
//! like. Nothing here cancels a request once it has been handed out.

use std::time::Duration;

pub mod analysis;
pub mod landing;
pub mod login;

pub use analysis::{AnalysisController, PendingAnalysis};
pub use landing::LandingController;
pub use login::LoginController;

/// Delay before leaving the analysis screen after the backend rejected
/// the stored credential.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Screens a front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Analysis,
}

/// Navigation to perform once `after` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub route: Route,
    pub after: Duration,
}
