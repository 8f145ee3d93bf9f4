use tracing::debug;

use crate::auth::SessionStore;

use super::Route;

/// Entry screen: sends the user where their session allows.
pub struct LandingController;

impl LandingController {
    /// Read the session once and pick the next screen. This is a one-shot
    /// decision; later changes to the store are not observed.
    pub fn resolve(store: &SessionStore) -> Route {
        let route = if store.is_authenticated() {
            Route::Analysis
        } else {
            Route::Login
        };
        debug!(?route, "Landing resolved");
        route
    }
}
