//! `locate` and `geocode` command handlers.

use std::path::Path;

use clap::Subcommand;
use medrush_core::{AppConfig, ResolvedAddress};
use medrush_geo::{acquire, locate_and_resolve, LocationFix, ReplayScript, ReplaySensor};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Subcommand)]
pub enum GeocodeCommands {
    /// Coordinates to address
    Reverse {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Free-text address to coordinates
    Search { query: String },
}

pub(crate) fn load_sensor(script: &Path) -> anyhow::Result<ReplaySensor> {
    let script = ReplayScript::from_file(script)
        .map_err(|e| anyhow::anyhow!("cannot read sensor script {}: {e}", script.display()))?;
    Ok(ReplaySensor::from_script(script))
}

/// Run the acquirer against a replayed sensor and print the chosen fix.
///
/// With `resolve`, the fix is also reverse-geocoded; a geocoding failure
/// prints the placeholder address rather than an error.
///
/// # Errors
///
/// Returns an error if the script cannot be read, or if `resolve` is set and
/// no maps API key is configured.
pub(crate) async fn run_locate(
    config: &AppConfig,
    script: &Path,
    resolve: bool,
    no_delays: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let sensor = load_sensor(script)?;
    let options = crate::acquire_options(config, no_delays);

    if resolve {
        let geocoder = crate::geocoding_client(config)?;
        let Some(located) = locate_and_resolve(&sensor, &geocoder, &options, cancel).await else {
            println!("cancelled");
            return Ok(());
        };
        print_fix(&located.fix);
        print_address(&located.address);
    } else {
        let Some(fix) = acquire(&sensor, &options, cancel).await.into_fix() else {
            println!("cancelled");
            return Ok(());
        };
        print_fix(&fix);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if no maps API key is configured or the provider call fails.
pub(crate) async fn run_geocode(config: &AppConfig, command: GeocodeCommands) -> anyhow::Result<()> {
    let geocoder = crate::geocoding_client(config)?;
    let address = match command {
        GeocodeCommands::Reverse {
            latitude,
            longitude,
        } => geocoder.resolve_address(latitude, longitude).await?,
        GeocodeCommands::Search { query } => geocoder.search_address(&query).await?,
    };
    print_address(&address);
    Ok(())
}

fn print_fix(fix: &LocationFix) {
    let sample = &fix.sample;
    println!(
        "position: {:.6}, {:.6} (±{:.0} m)",
        sample.latitude, sample.longitude, sample.accuracy_meters
    );
    println!(
        "attempts: {} over {} pass(es){}",
        fix.attempts_made,
        fix.passes,
        if fix.high_accuracy_mode_failed {
            ", low-accuracy read used"
        } else {
            ""
        }
    );
    if let Some(message) = fix.user_message() {
        println!("note: {message}");
    }
}

pub(crate) fn print_address(address: &ResolvedAddress) {
    println!("address: {}", address.full_address);
    println!(
        "         {}, {} {}",
        address.city, address.state, address.zip_code
    );
    println!(
        "         ({:.6}, {:.6})",
        address.latitude, address.longitude
    );
}
