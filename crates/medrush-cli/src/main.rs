mod commerce;
mod location;
mod ocr;
mod orders;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use medrush_core::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::commerce::{AddressCommands, CartCommands, CheckoutCommands};
use crate::location::GeocodeCommands;
use crate::orders::{EmergencyCommands, OrderCommands};

#[derive(Debug, Parser)]
#[command(name = "medrush")]
#[command(about = "Medicine delivery companion: locate, scan prescriptions, manage the cart, sync orders")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Acquire a position from a recorded sensor script
    Locate {
        /// JSON replay script of sensor readings
        #[arg(long)]
        script: PathBuf,
        /// Reverse-geocode the chosen position
        #[arg(long)]
        resolve: bool,
        /// Skip the pauses between attempts
        #[arg(long)]
        no_delays: bool,
    },
    /// Convert between coordinates and addresses
    Geocode {
        #[command(subcommand)]
        command: GeocodeCommands,
    },
    /// Read an uploaded prescription image
    Ocr {
        image: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Manage saved delivery addresses
    Address {
        #[command(subcommand)]
        command: AddressCommands,
    },
    /// Validate payment details and price the cart
    Checkout {
        #[command(subcommand)]
        command: CheckoutCommands,
    },
    /// Send orders to the admin dashboard
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Request emergency delivery and track it
    Emergency {
        #[command(subcommand)]
        command: EmergencyCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = medrush_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("medrush ready; run `medrush --help` for commands");
        return Ok(());
    };

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match command {
        Commands::Locate {
            script,
            resolve,
            no_delays,
        } => location::run_locate(&config, &script, resolve, no_delays, &cancel).await,
        Commands::Geocode { command } => location::run_geocode(&config, command).await,
        Commands::Ocr { image, json } => ocr::run_ocr(&config, &image, json).await,
        Commands::Cart { command } => commerce::run_cart(&config, command),
        Commands::Address { command } => commerce::run_address(&config, command).await,
        Commands::Checkout { command } => commerce::run_checkout(&config, command),
        Commands::Order { command } => orders::run_order(&config, command).await,
        Commands::Emergency { command } => {
            orders::run_emergency(&config, command, &cancel).await
        }
    }
}

/// Cancels `cancel` on the first ctrl-c so in-flight acquisitions stop
/// cleanly instead of the process being killed mid-write.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

fn geocoding_client(config: &AppConfig) -> anyhow::Result<medrush_geo::GeocodingClient> {
    Ok(medrush_geo::GeocodingClient::with_base_url(
        config.require_maps_key()?,
        config.http_timeout_secs,
        &config.user_agent,
        &config.geocoding_base_url,
    )?)
}

fn acquire_options(config: &AppConfig, no_delays: bool) -> medrush_geo::AcquireOptions {
    let options = medrush_geo::AcquireOptions::default()
        .with_fallback(config.fallback_location)
        .with_max_attempts(config.location_max_attempts);
    if no_delays {
        options.without_delays()
    } else {
        options
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<medrush_cart::JsonFileStore> {
    Ok(medrush_cart::JsonFileStore::open(&config.data_dir)?)
}

#[cfg(test)]
mod tests;
