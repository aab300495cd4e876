//! sinum - command-line host for the Sinum room client.
//!
//! Stores the controller connection, polls the room list on an interval and
//! prints the room sensors a home-automation host would publish.

mod format;

use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sinum_core::{
    Config, CredentialStore, Credentials, FetchError, Room, RoomPoller, UpdateCoordinator,
};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use format::{format_flag, format_reading, truncate_string};

// ============================================================================
// Constants
// ============================================================================

/// Width of the room name column in table output
const NAME_COLUMN_WIDTH: usize = 24;

/// Environment variable that overrides the keychain password
const PASSWORD_ENV: &str = "SINUM_PASSWORD";

#[derive(Parser)]
#[command(name = "sinum", version, about = "Poll a Sinum controller for room temperatures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the connection and store host, username and password
    Setup {
        /// Controller URL including scheme, e.g. http://192.168.1.50:8080
        #[arg(long, env = "SINUM_HOST")]
        host: String,
        #[arg(long, env = "SINUM_USERNAME")]
        username: String,
    },
    /// Fetch the rooms once and print them
    Rooms {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Poll on an interval and print entity states until interrupted
    Watch {
        /// Poll interval in seconds (defaults to the configured scan interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Remove the stored password from the keychain
    Forget,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=sinum_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Setup { host, username } => setup(&host, &username).await,
        Command::Rooms { json } => rooms(json).await,
        Command::Watch { interval } => watch(interval).await,
        Command::Forget => forget(),
    }
}

/// Password from the environment, falling back to the keychain
fn stored_password(host: &str, username: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        debug!("Using password from {}", PASSWORD_ENV);
        return Ok(password);
    }
    CredentialStore::get_password(host, username).context("Run `sinum setup` first.")
}

/// Configured host and username, or an error pointing at `sinum setup`
fn configured_account(config: &Config) -> Result<(&str, &str)> {
    match (config.host.as_deref(), config.username.as_deref()) {
        (Some(host), Some(username)) => Ok((host, username)),
        _ => bail!("No controller configured. Run `sinum setup` first."),
    }
}

fn configured_poller(config: &Config) -> Result<RoomPoller> {
    let (host, username) = configured_account(config)?;
    let credentials = config.credentials(&stored_password(host, username)?)?;
    Ok(RoomPoller::connect(credentials, config.request_timeout())?)
}

async fn setup(host: &str, username: &str) -> Result<()> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
    };

    let credentials = Credentials::new(host, username, password.as_str())?;
    let mut config = Config::load()?;
    let mut poller = RoomPoller::connect(credentials.clone(), config.request_timeout())?;

    let rooms = match poller.test_connection().await {
        Ok(rooms) => rooms,
        Err(FetchError::InvalidAuth(msg)) => {
            bail!("Configuration rejected: the controller refused these credentials ({})", msg)
        }
        Err(FetchError::CannotConnect(msg)) => {
            bail!(
                "Warning: cannot connect to {} ({}). Check the host and port.",
                credentials.host(),
                msg
            )
        }
        Err(err @ FetchError::InvalidResponse(_)) => {
            bail!("The controller answered with something unexpected: {}", err)
        }
    };

    config.host = Some(credentials.host().to_string());
    config.username = Some(credentials.username().to_string());
    config.save()?;
    CredentialStore::store(credentials.host(), credentials.username(), credentials.password())?;

    info!(host = %credentials.host(), rooms = rooms.len(), "Setup complete");
    println!("Connected to {} - found {} rooms.", credentials.host(), rooms.len());
    Ok(())
}

async fn rooms(json: bool) -> Result<()> {
    let config = Config::load()?;
    let mut poller = configured_poller(&config)?;

    let rooms = poller.fetch_rooms().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
    } else {
        print_rooms(&rooms);
    }
    Ok(())
}

fn print_rooms(rooms: &[Room]) {
    println!(
        "{:>5}  {:<width$}  {:>9}  {:>8}  {:>7}  {:>7}",
        "ID", "Name", "Temp", "Humidity", "Heating", "Cooling",
        width = NAME_COLUMN_WIDTH
    );
    for room in rooms {
        println!(
            "{:>5}  {:<width$}  {:>9}  {:>8}  {:>7}  {:>7}",
            room.id,
            truncate_string(&room.name, NAME_COLUMN_WIDTH),
            format_reading(room.temperature, "°C"),
            format_reading(room.humidity, "%"),
            format_flag(room.heating),
            format_flag(room.cooling),
            width = NAME_COLUMN_WIDTH
        );
    }
}

async fn watch(interval: Option<u64>) -> Result<()> {
    let config = Config::load()?;
    let poller = configured_poller(&config)?;
    let mut coordinator =
        UpdateCoordinator::new(poller).with_unavailable_after(config.unavailable_after_failures);

    let period = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.scan_interval());
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = period.as_secs(), "Watching rooms");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(());
            }
            _ = poll_cycle(&mut coordinator, &mut ticker) => {}
        }
    }
}

/// Wait for the next tick, poll once and print the result.
async fn poll_cycle(coordinator: &mut UpdateCoordinator, ticker: &mut Interval) {
    ticker.tick().await;
    let now = chrono::Local::now().format("%H:%M:%S");

    if let Err(err) = coordinator.refresh().await {
        println!("[{}] update failed ({}): {}", now, err.code(), err);
    }

    let Some(snapshot) = coordinator.snapshot() else {
        println!("[{}] no data yet", now);
        return;
    };
    if !coordinator.is_available() {
        println!(
            "[{}] unavailable after {} failed polls",
            now,
            coordinator.consecutive_failures()
        );
        return;
    }

    println!("[{}] {} rooms, updated {}", now, snapshot.len(), snapshot.age_display());
    for entity in coordinator.entities() {
        println!(
            "  {:<width$}  {}",
            truncate_string(&entity.name, NAME_COLUMN_WIDTH + 10),
            entity.display_value(),
            width = NAME_COLUMN_WIDTH + 10
        );
    }
}

fn forget() -> Result<()> {
    let config = Config::load()?;
    let Ok((host, username)) = configured_account(&config) else {
        bail!("No controller configured, nothing to forget.");
    };
    CredentialStore::delete(host, username)?;
    println!("Removed stored password for {} on {}.", username, host);
    Ok(())
}
