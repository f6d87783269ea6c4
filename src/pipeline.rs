// ============================================================================
// Pipeline Module
// ============================================================================
// Per-IP probe, classification and geolocation

use tracing::{info, warn};

use crate::correlator::{classify, Status};
use crate::geo_locator::GeoLocator;
use crate::latency_prober::LatencyProber;
use crate::output_generator::IpRecord;
use crate::solana_cli::{GossipTable, IdentityInfo, ValidatorSet};

/// The three lookup tables, read-only once fetched
#[derive(Debug, Default)]
pub struct ClusterTables {
    pub gossip: GossipTable,
    pub validators: ValidatorSet,
    pub identity_info: IdentityInfo,
}

impl ClusterTables {
    /// Why nothing could be classified, if that is the case
    pub fn unusable_reason(&self) -> Option<&'static str> {
        if self.validators.is_empty() {
            Some("No active validators loaded. IPs cannot be confirmed as validators.")
        } else if self.gossip.is_empty() {
            Some("No gossip data loaded. IPs cannot be confirmed as validators.")
        } else {
            None
        }
    }
}

pub async fn check_ip(
    ip: &str,
    tables: &ClusterTables,
    prober: &LatencyProber,
    geo: Option<&GeoLocator>,
) -> IpRecord {
    info!("--- Checking IP: {} ---", ip);

    let latency_ms = prober.probe(ip).await;
    let classification = classify(ip, &tables.gossip, &tables.validators, &tables.identity_info);

    match (&classification.status, &classification.identity) {
        (Status::Validator, Some(identity)) => {
            let delinquent = tables
                .validators
                .get(identity)
                .is_some_and(|v| v.delinquent);
            info!(
                "IP {} with identity {} is an active validator named '{}'{}",
                ip,
                identity,
                classification.name.as_deref().unwrap_or_default(),
                if delinquent { " (delinquent)" } else { "" }
            );
        }
        (Status::Gossip, Some(identity)) => {
            info!(
                "IP {} has an identity ({}) but is NOT in the active validator list",
                ip, identity
            );
        }
        _ => warn!("IP {} not found in gossip", ip),
    }

    let location = match geo {
        Some(locator) => locator.locate(ip).await,
        None => None,
    };

    IpRecord {
        ip: ip.to_string(),
        status: classification.status,
        name: classification.name,
        latency_ms,
        location,
    }
}

/// Checks every IP one after another, keeping input order
pub async fn check_ips(
    ips: &[String],
    tables: &ClusterTables,
    prober: &LatencyProber,
    geo: Option<&GeoLocator>,
) -> Vec<IpRecord> {
    let mut records = Vec::with_capacity(ips.len());
    for ip in ips {
        records.push(check_ip(ip, tables, prober, geo).await);
    }
    records
}
