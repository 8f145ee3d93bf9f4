//! Application state management for moodcheck.
//!
//! This module contains the core `App` struct that owns the screen
//! controllers, the session store and API client, and the channel that
//! background requests report back on.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use moodcheck_core::models::{AnalysisResult, LoginResult};
use moodcheck_core::views::{AnalysisController, LandingController, LoginController, Redirect, Route};
use moodcheck_core::{ApiClient, ApiError, Config, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// At most one login, one analysis and one redirect are in flight.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the text to analyze, in characters.
const MAX_TEXT_LENGTH: usize = 2000;

/// Environment variables prefilling the login form
const USERNAME_ENV: &str = "MOODCHECK_USERNAME";
const PASSWORD_ENV: &str = "MOODCHECK_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks.
///
/// Tasks are never cancelled: a result is applied to its controller even
/// if the user has navigated elsewhere in the meantime.
enum TaskResult {
    /// Answer to a `/login` request
    Login(Result<LoginResult, ApiError>),
    /// Answer to a `/predict` request
    Analysis(Result<AnalysisResult, ApiError>),
    /// A scheduled redirect came due
    Navigate(Route),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    /// Where `config` is written back; `None` keeps it in memory only
    pub config_path: Option<PathBuf>,
    pub session: SessionStore,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub route: Route,

    // Screen controllers
    pub login: LoginController,
    pub login_focus: LoginFocus,
    pub analysis: AnalysisController,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    // Status message
    pub status_message: Option<String>,

    /// Set while a redirect to login is counting down
    pub redirect_pending: bool,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, session: SessionStore, api: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Get credentials from env vars or config
        let username = std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        let mut login = LoginController::new(username);
        login.password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        let analysis = AnalysisController::new(config.redirect_delay());

        Self {
            config,
            config_path: None,
            session,
            api,

            state: AppState::Normal,
            route: Route::Landing,

            login,
            login_focus: LoginFocus::Username,
            analysis,

            task_rx: rx,
            task_tx: tx,

            status_message: None,
            redirect_pending: false,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Resolve the landing screen and show wherever it leads
    pub fn start(&mut self) {
        self.navigate(Route::Landing);
    }

    /// Switch screens. Entering a screen starts it fresh unless its request
    /// is still in flight.
    pub fn navigate(&mut self, route: Route) {
        match route {
            Route::Landing => {
                let next = LandingController::resolve(&self.session);
                self.navigate(next);
            }
            Route::Login => {
                self.redirect_pending = false;
                if !self.login.is_loading() {
                    let username = std::mem::take(&mut self.login.username);
                    let password = std::mem::take(&mut self.login.password);
                    self.login = LoginController::new(username);
                    self.login.password = password;
                }
                self.login_focus = if self.login.username.is_empty() {
                    LoginFocus::Username
                } else {
                    LoginFocus::Password
                };
                self.route = Route::Login;
            }
            Route::Analysis => {
                if !self.analysis.is_loading() {
                    self.analysis.reset();
                }
                match self.analysis.mount(&self.session) {
                    Some(redirect) => self.navigate(redirect),
                    None => self.route = Route::Analysis,
                }
            }
        }
        debug!(route = ?self.route, "Navigated");
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Submit the login form; the request runs in the background
    pub fn submit_login(&mut self) {
        let Some(request) = self.login.submit() else {
            return;
        };

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = api.login(&request.username, &request.password).await;
            Self::send_result(&tx, TaskResult::Login(outcome)).await;
        });
    }

    /// Send the current text for analysis in the background
    pub fn submit_analysis(&mut self) {
        let Some(pending) = self.analysis.begin_analyze() else {
            return;
        };

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = pending.send(&api).await;
            Self::send_result(&tx, TaskResult::Analysis(outcome)).await;
        });
    }

    pub fn reset_analysis(&mut self) {
        self.analysis.reset();
    }

    pub fn logout(&mut self) {
        let route = self.analysis.logout(&self.session);
        self.status_message = Some("Logged out".to_string());
        self.navigate(route);
    }

    /// Navigate once the delay has passed. There is no way to call it off.
    fn schedule_redirect(&mut self, redirect: Redirect) {
        info!(after_ms = redirect.after.as_millis() as u64, "Redirect scheduled");
        self.redirect_pending = true;
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(redirect.after).await;
            Self::send_result(&tx, TaskResult::Navigate(redirect.route)).await;
        });
    }

    // =========================================================================
    // Background Results
    // =========================================================================

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            warn!("Task result dropped, app is shutting down");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Login(outcome) => {
                if let Some(route) = self.login.complete(outcome, &self.session) {
                    self.remember_username();
                    self.status_message = self
                        .login
                        .signed_in_as()
                        .map(|user| format!("Signed in as {}", user));
                    self.navigate(route);
                }
            }
            TaskResult::Analysis(outcome) => {
                if let Some(redirect) = self.analysis.complete(outcome, &self.session) {
                    self.schedule_redirect(redirect);
                }
            }
            TaskResult::Navigate(route) => {
                self.navigate(route);
            }
        }
    }

    fn remember_username(&mut self) {
        let username = self.login.username.trim().to_string();
        if self.config.last_username.as_deref() == Some(username.as_str()) {
            return;
        }
        self.config.last_username = Some(username);
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path.clone()) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the active screen has a request in flight
    pub fn is_busy(&self) -> bool {
        match self.route {
            Route::Login => self.login.is_loading(),
            Route::Analysis => self.analysis.is_loading(),
            Route::Landing => false,
        }
    }

    /// Wait for one background result and apply it.
    #[cfg(test)]
    async fn process_next_task(&mut self) {
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), self.task_rx.recv())
            .await
            .expect("timed out waiting for background task")
            .expect("task channel closed");
        self.process_task_result(result);
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a character may be appended to the text to analyze.
/// Length is counted in characters, not bytes.
pub fn can_add_text_char(current_chars: usize, c: char) -> bool {
    current_chars < MAX_TEXT_LENGTH && is_valid_input_char(c)
}

/// Delay used by tests that go through a redirect
#[cfg(test)]
const TEST_REDIRECT_DELAY: std::time::Duration = std::time::Duration::from_millis(20);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_core::views::Phase;
    use moodcheck_core::Credential;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_app(server: &MockServer, session: SessionStore) -> App {
        let config = Config {
            redirect_delay_ms: Some(TEST_REDIRECT_DELAY.as_millis() as u64),
            ..Config::default()
        };
        let api = ApiClient::new(&server.uri()).unwrap();
        App::new(config, session, api)
    }

    fn logged_in(token: &str) -> SessionStore {
        let session = SessionStore::in_memory();
        session.save(&Credential::new(token).unwrap()).unwrap();
        session
    }

    // -------------------------------------------------------------------------
    // Navigation Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_without_session_shows_login() {
        let server = MockServer::start().await;
        let mut app = test_app(&server, SessionStore::in_memory());
        app.start();
        assert_eq!(app.route, Route::Login);
    }

    #[tokio::test]
    async fn test_start_with_session_shows_analysis() {
        let server = MockServer::start().await;
        let mut app = test_app(&server, logged_in("abc"));
        app.start();
        assert_eq!(app.route, Route::Analysis);
    }

    #[tokio::test]
    async fn test_navigate_to_analysis_without_session_redirects() {
        let server = MockServer::start().await;
        let mut app = test_app(&server, SessionStore::in_memory());
        app.navigate(Route::Analysis);
        assert_eq!(app.route, Route::Login);
    }

    // -------------------------------------------------------------------------
    // Flow Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer",
                "username": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = SessionStore::in_memory();
        let mut app = test_app(&server, session.clone());
        app.start();
        app.login.username = "admin".to_string();
        app.login.password = "admin123".to_string();

        app.submit_login();
        assert!(app.is_busy());
        // Second submit while loading is ignored
        app.submit_login();

        app.process_next_task().await;
        assert_eq!(app.route, Route::Analysis);
        assert_eq!(session.read().unwrap().as_str(), "abc");
        assert_eq!(app.status_message.as_deref(), Some("Signed in as admin"));
    }

    #[tokio::test]
    async fn test_analysis_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "ok",
                "score": 4,
                "sentiment": "positif",
                "user": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut app = test_app(&server, logged_in("abc"));
        app.start();
        app.analysis.text = "ok".to_string();
        app.submit_analysis();
        assert!(app.is_busy());

        app.process_next_task().await;
        assert_eq!(app.analysis.phase(), Phase::Success);
        let result = app.analysis.result().unwrap();
        assert_eq!(result.sentiment, "positif");
        assert_eq!(result.score, 4);
    }

    #[tokio::test]
    async fn test_expired_session_redirects_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token invalide"})))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in("stale");
        let mut app = test_app(&server, session.clone());
        app.start();
        app.analysis.text = "ok".to_string();
        app.submit_analysis();

        app.process_next_task().await;
        // Message shown, credential gone, still on the screen until the delay passes
        assert!(app.analysis.error().unwrap().contains("Token invalide"));
        assert!(!session.is_authenticated());
        assert!(app.redirect_pending);
        assert_eq!(app.route, Route::Analysis);

        app.process_next_task().await;
        assert_eq!(app.route, Route::Login);
        assert!(!app.redirect_pending);
    }

    #[tokio::test]
    async fn test_logout() {
        let server = MockServer::start().await;
        let session = logged_in("abc");
        let mut app = test_app(&server, session.clone());
        app.start();
        app.logout();
        assert_eq!(app.route, Route::Login);
        assert!(!session.is_authenticated());
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        // Valid chars within length
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        // Exceeds max length
        assert!(!can_add_username_char(50, 'a'));
        // Control characters rejected
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_text_char() {
        assert!(can_add_text_char(0, 'é'));
        assert!(can_add_text_char(1999, ' '));
        assert!(!can_add_text_char(2000, 'a'));
        assert!(!can_add_text_char(0, '\x1b'));
    }
}
