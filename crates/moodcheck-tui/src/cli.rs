//! Command-line argument parsing and one-shot command handlers.
//!
//! Without a subcommand the TUI starts. The subcommands drive the same
//! controllers the TUI uses and print the outcome:
//! - login: exchange a username and password for a stored token
//! - analyze: classify a text with the stored token
//! - logout: forget the stored token
//! - status: show the backend and whether a token is stored

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use moodcheck_core::models::analysis::MAX_SCORE;
use moodcheck_core::views::{AnalysisController, LandingController, LoginController, Route};
use moodcheck_core::{ApiClient, Config, SessionStore};

use crate::utils::score_bar;

/// Environment variables read by `login`
const USERNAME_ENV: &str = "MOODCHECK_USERNAME";
const PASSWORD_ENV: &str = "MOODCHECK_PASSWORD";

/// Sentiment analysis from the terminal
#[derive(Parser)]
#[command(name = "moodcheck")]
#[command(version)]
#[command(about = "Sentiment analysis from the terminal", long_about = None)]
pub struct Cli {
    /// Backend address, overriding config and MOODCHECK_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the token
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Analyze the sentiment of a text
    Analyze {
        /// Print the backend's answer as JSON
        #[arg(long)]
        json: bool,

        /// Text to analyze
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the backend address and session state
    Status,
}

/// Everything a command or the TUI needs, built from config and flags.
pub struct Services {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub session: SessionStore,
    pub api: ApiClient,
}

impl Services {
    pub fn build(cli: &Cli) -> Result<Self> {
        let config_path = Config::path().ok();
        let config = match &config_path {
            Some(path) => Config::load_from(path.clone()).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }),
            None => Config::default(),
        };

        let session = if cli.ephemeral {
            SessionStore::in_memory()
        } else {
            config.session_store()
        };

        let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url());
        let api = ApiClient::with_timeout(&api_url, config.request_timeout())
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            config_path,
            session,
            api,
        })
    }
}

pub async fn run_command(command: Commands, services: Services) -> Result<()> {
    match command {
        Commands::Login { username } => login(services, username).await,
        Commands::Analyze { json, text } => analyze(services, &text.join(" "), json).await,
        Commands::Logout => logout(services),
        Commands::Status => status(services),
    }
}

async fn login(services: Services, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(username) => username,
        None => prompt_username(services.config.last_username.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    let signed_in_as = login_with(services, username, password).await?;
    println!("Logged in as {}", signed_in_as);
    Ok(())
}

/// Sign in, store the token and remember the username. Returns the
/// username the backend confirmed.
async fn login_with(mut services: Services, username: String, password: String) -> Result<String> {
    let mut controller = LoginController::new(username);
    controller.password = password;

    if controller.run(&services.api, &services.session).await.is_none() {
        bail!("{}", controller.error().unwrap_or("Login failed"));
    }

    let signed_in_as = controller.signed_in_as().unwrap_or(controller.username.as_str()).to_string();
    services.config.last_username = Some(controller.username.trim().to_string());
    if let Some(path) = services.config_path {
        if let Err(e) = services.config.save_to(path) {
            warn!(error = %e, "Failed to save config");
        }
    }

    Ok(signed_in_as)
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

async fn analyze(services: Services, text: &str, json: bool) -> Result<()> {
    if LandingController::resolve(&services.session) == Route::Login {
        bail!("Not logged in. Run `moodcheck login` first.");
    }

    // No screen to linger on, so leave immediately on session expiry
    let mut controller = AnalysisController::new(std::time::Duration::ZERO);
    if controller.mount(&services.session).is_some() {
        bail!("Not logged in. Run `moodcheck login` first.");
    }
    controller.text = text.to_string();

    let redirect = controller.analyze(&services.api, &services.session).await;

    let Some(result) = controller.result() else {
        let message = controller.error().unwrap_or("Analysis failed").to_string();
        if redirect.is_some() {
            bail!("{} Run `moodcheck login`.", message);
        }
        bail!("{}", message);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let polarity = result.polarity();
        println!("Sentiment: {} ({})", result.sentiment.to_uppercase(), polarity.display_name());
        println!("Score:     {}/{} {}", result.score, MAX_SCORE, score_bar(result.score, MAX_SCORE));
        println!("Text:      \"{}\"", result.text);
        println!("User:      {}", result.user);
    }
    Ok(())
}

fn logout(services: Services) -> Result<()> {
    let mut controller = AnalysisController::default();
    controller.mount(&services.session);
    controller.logout(&services.session);
    println!("Logged out");
    Ok(())
}

fn status(services: Services) -> Result<()> {
    println!("{}", status_report(&services));
    Ok(())
}

fn status_report(services: &Services) -> String {
    let state = if !services.session.is_available() {
        "storage unavailable"
    } else if services.session.is_authenticated() {
        "logged in"
    } else {
        "not logged in"
    };
    format!(
        "Backend:  {}\nStorage:  {:?}\nSession:  {}",
        services.api.base_url(),
        services.config.storage,
        state
    )
}
