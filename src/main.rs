// ============================================================================
// Main Application Entry Point
// ============================================================================

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use colored::*;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dz_latency::geo_locator::GeoLocator;
use dz_latency::ip_source::{IpSource, DEFAULT_INTERFACE};
use dz_latency::latency_prober::LatencyProber;
use dz_latency::output_generator::{OutputGenerator, OUTPUT_FILE};
use dz_latency::pipeline::{check_ips, ClusterTables};
use dz_latency::solana_cli::SolanaCli;

pub fn main() -> Result<()> {
    // Everything is awaited in sequence, one thread is enough
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub async fn async_main() -> Result<()> {
    let matches = Command::new("dz-latency")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check validator status and latency of IPs routed over DoubleZero")
        .arg(Arg::new("ip_list")
            .long("ip_list").value_name("FILE")
            .help("Path to a file containing a list of IP addresses, one per line"))
        .arg(Arg::new("no_geo")
            .long("no_geo")
            .help("Skip geolocation lookups")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("interface")
            .long("interface").value_name("IFACE")
            .help("Interface whose routes provide the IP list")
            .default_value(DEFAULT_INTERFACE))
        .arg(Arg::new("verbose")
            .short('v').long("verbose")
            .help("Enable debug logging")
            .action(ArgAction::SetTrue))
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let with_geo = !matches.get_flag("no_geo");
    let source = match matches.get_one::<String>("ip_list") {
        Some(path) => IpSource::File(PathBuf::from(path)),
        None => IpSource::RouteTable {
            interface: matches
                .get_one::<String>("interface")
                .cloned()
                .unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
        },
    };

    info!("Starting validator check...");

    let ips = source.resolve().await?;
    if ips.is_empty() {
        info!("No IP addresses to process. Exiting.");
        return Ok(());
    }
    info!("Checking {} IP addresses", ips.len());

    let solana = SolanaCli::default();
    let tables = ClusterTables {
        validators: solana.fetch_validator_set().await?,
        identity_info: solana.fetch_identity_info().await?,
        gossip: solana.fetch_gossip_table().await?,
    };

    if let Some(reason) = tables.unusable_reason() {
        warn!("{}", reason);
        return Ok(());
    }
    if tables.identity_info.is_empty() {
        warn!("No validator details loaded. Validator names will be reported as Unknown.");
    }

    let prober = LatencyProber::new();
    let geo = if with_geo { Some(GeoLocator::new()?) } else { None };

    let records = check_ips(&ips, &tables, &prober, geo.as_ref()).await;

    OutputGenerator::save_csv(&records, with_geo, OUTPUT_FILE)?;
    OutputGenerator::print_summary(&records);

    println!(
        "\n{} Process complete. Results saved to '{}'",
        "[DONE]".green().bold(),
        OUTPUT_FILE
    );

    Ok(())
}
