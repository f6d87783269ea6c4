// ============================================================================
// IP Source Module
// ============================================================================
// Resolves the list of target IPs from a file or the local routing table

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::command_runner::{display_command, run_command};

/// Interface DoubleZero brings up for its overlay routes
pub const DEFAULT_INTERFACE: &str = "doublezero0";

const ROUTE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub enum IpSource {
    /// Newline-separated IP list
    File(PathBuf),
    /// Destinations of every route installed on `interface`
    RouteTable { interface: String },
}

impl IpSource {
    pub async fn resolve(&self) -> Result<Vec<String>> {
        match self {
            IpSource::File(path) => {
                info!("Loading IP list from {}", path.display());
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read IP list {}", path.display()))?;
                Ok(parse_ip_list(&content))
            }
            IpSource::RouteTable { interface } => Ok(ips_from_route_table(interface).await),
        }
    }
}

/// One IP per line, trimmed, blank lines skipped, duplicates collapsed
pub fn parse_ip_list(content: &str) -> Vec<String> {
    dedup_preserving_order(content.lines().map(str::trim).filter(|l| !l.is_empty()))
}

/// First column of `ip route show dev <iface>` output
pub fn parse_route_table(output: &str) -> Vec<String> {
    dedup_preserving_order(output.lines().filter_map(|l| l.split_whitespace().next()))
}

async fn ips_from_route_table(interface: &str) -> Vec<String> {
    let args = ["route", "show", "dev", interface];
    info!("Running command to get IPs: `{}`", display_command("ip", &args));

    match run_command("ip", &args, ROUTE_TIMEOUT).await {
        Ok(output) => parse_route_table(&output),
        Err(e) => {
            warn!("Could not read routes for {}: {}", interface, e);
            Vec::new()
        }
    }
}

fn dedup_preserving_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_table_first_column() {
        let output = "\
64.130.57.16 proto bgp scope link src 137.174.145.145
38.58.176.139 proto bgp scope link src 137.174.145.145

169.254.0.0/31 proto kernel scope link src 169.254.0.1
";
        assert_eq!(
            parse_route_table(output),
            vec!["64.130.57.16", "38.58.176.139", "169.254.0.0/31"]
        );
    }

    #[test]
    fn test_parse_route_table_empty() {
        assert!(parse_route_table("").is_empty());
        assert!(parse_route_table("\n   \n").is_empty());
    }

    #[test]
    fn test_parse_ip_list_trims_and_dedups() {
        let content = "  10.0.0.5\n\n10.0.0.9  \n10.0.0.5\n";
        assert_eq!(parse_ip_list(content), vec!["10.0.0.5", "10.0.0.9"]);
    }

    #[test]
    fn test_parse_ip_list_keeps_unvalidated_entries() {
        let content = "not-an-ip\n10.0.0.1\n";
        assert_eq!(parse_ip_list(content), vec!["not-an-ip", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_resolve_missing_file_is_error() {
        let source = IpSource::File(PathBuf::from("/nonexistent/ip_list.txt"));
        assert!(source.resolve().await.is_err());
    }
}
