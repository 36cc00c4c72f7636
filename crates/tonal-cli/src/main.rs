//! Tonal CLI - sign in to a Tonal account and print API data as JSON.

use std::io;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tonal_core::api::client::DEFAULT_WORKOUT_PAGE_SIZE;
use tonal_core::{ClientConfig, ClientError, Config, CredentialStore, TonalClient};

// ============================================================================
// Constants
// ============================================================================

/// File name prefix for daily-rotated log files under `TONAL_LOG_DIR`.
const LOG_FILE_PREFIX: &str = "tonal.log";

#[derive(Parser)]
#[command(name = "tonal", author, version, about = "Command-line client for the Tonal API", long_about = None)]
struct Cli {
    /// Account email; defaults to the last username that logged in
    #[arg(short, long, env = "TONAL_USERNAME", global = true)]
    username: Option<String>,

    /// Account password; falls back to the keychain, then a prompt
    #[arg(long, env = "TONAL_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the username
    Login {
        /// Also store the password in the OS keychain
        #[arg(long)]
        save: bool,
    },
    /// Forget the saved password and username
    Logout,
    /// Show the signed-in user's profile
    Userinfo,
    /// List custom workouts
    Workouts {
        #[arg(default_value_t = 0)]
        offset: u32,
        #[arg(default_value_t = DEFAULT_WORKOUT_PAGE_SIZE)]
        limit: u32,
    },
    /// List the movement catalog
    Movements {
        /// Skip the on-disk cache and fetch a fresh catalog
        #[arg(long)]
        no_cache: bool,
    },
    /// Show the current workout streak
    Streak,
    /// Delete a custom workout
    DeleteWorkout { id: String },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays clean JSON. When `TONAL_LOG_DIR` is
/// set, a daily-rotated file is written as well; the returned guard must
/// live until exit so buffered lines are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var("TONAL_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ClientError>() {
                Some(client_err) => eprintln!("Error: {}", client_err.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// A signed-in client plus the credentials that got it there.
struct Session {
    client: TonalClient,
    username: String,
    password: String,
}

async fn connect(
    username: Option<String>,
    password: Option<String>,
    config: &Config,
) -> Result<Session> {
    let username = resolve_username(username, config)?;
    let password = resolve_password(password, &username)?;
    let client = TonalClient::login(client_config(), &username, &password).await?;
    Ok(Session {
        client,
        username,
        password,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable config file");
        Config::default()
    });
    let Cli {
        username,
        password,
        command,
    } = cli;

    let session = match command {
        Commands::Logout => return logout(username, &mut config),
        Commands::Login { save } => {
            let session = connect(username, password, &config).await?;
            if save {
                CredentialStore::store(&session.username, &session.password)?;
                info!(username = %session.username, "Password saved to keychain");
            }
            let expires_at = session.client.session().credential().map(|c| c.expires_at);
            print_json(&json!({
                "username": session.username,
                "expires_at": expires_at,
                "password_saved": save || saved_password(&session.username).is_some(),
            }))?;
            session
        }
        Commands::Userinfo => {
            let session = connect(username, password, &config).await?;
            print_json(&session.client.get_user_info().await?)?;
            session
        }
        Commands::Workouts { offset, limit } => {
            let session = connect(username, password, &config).await?;
            print_json(&session.client.get_user_workouts(offset, limit).await?)?;
            session
        }
        Commands::Movements { no_cache } => {
            let session = connect(username, password, &config).await?;
            print_json(&session.client.get_movements(!no_cache).await?)?;
            session
        }
        Commands::Streak => {
            let session = connect(username, password, &config).await?;
            print_json(&session.client.get_current_streak().await?)?;
            session
        }
        Commands::DeleteWorkout { id } => {
            let session = connect(username, password, &config).await?;
            session.client.delete_workout(&id).await?;
            print_json(&json!({ "deleted": id }))?;
            session
        }
    };

    if config.last_username.as_deref() != Some(session.username.as_str()) {
        config.last_username = Some(session.username);
        config.save()?;
    }
    Ok(())
}

fn client_config() -> ClientConfig {
    let config = ClientConfig::from_env();
    if config.cache_dir.is_some() {
        return config;
    }
    config.clone().with_default_cache_dir().unwrap_or_else(|e| {
        warn!(error = %e, "Running without a response cache");
        config
    })
}

fn resolve_username(arg: Option<String>, config: &Config) -> Result<String> {
    arg.or_else(|| config.last_username.clone())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow!("No username given. Pass --username or set TONAL_USERNAME."))
}

fn resolve_password(arg: Option<String>, username: &str) -> Result<String> {
    if let Some(password) = arg {
        return Ok(password);
    }
    if let Some(password) = saved_password(username) {
        return Ok(password);
    }
    rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")
}

/// Keychain lookup that degrades to "nothing saved" after logging why.
fn saved_password(username: &str) -> Option<String> {
    match CredentialStore::get_password(username) {
        Ok(password) => password,
        Err(err) => {
            warn!(error = %format!("{:#}", err), "Keychain unavailable");
            None
        }
    }
}

fn logout(username: Option<String>, config: &mut Config) -> Result<()> {
    let username = resolve_username(username, config)?;
    CredentialStore::delete(&username)?;
    if config.last_username.as_deref() == Some(username.as_str()) {
        config.last_username = None;
        config.save()?;
    }
    print_json(&json!({ "logged_out": username }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
