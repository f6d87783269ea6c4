// ============================================================================
// Solana CLI Module
// ============================================================================
// Gossip, validator set and validator-info lookups via the `solana` CLI

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::command_runner::{display_command, run_command};

const GOSSIP_TIMEOUT: Duration = Duration::from_secs(30);
const VALIDATORS_TIMEOUT: Duration = Duration::from_secs(60);
const VALIDATOR_INFO_TIMEOUT: Duration = Duration::from_secs(60);

/// IP address -> node identity, as advertised in gossip
#[derive(Debug, Clone, Default)]
pub struct GossipTable {
    identities: HashMap<String, String>,
}

impl GossipTable {
    /// Keeps the first identity seen for an IP.
    pub fn insert(&mut self, ip: impl Into<String>, identity: impl Into<String>) {
        self.identities.entry(ip.into()).or_insert_with(|| identity.into());
    }

    pub fn identity_for(&self, ip: &str) -> Option<&str> {
        self.identities.get(ip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorEntry {
    pub vote_account: String,
    pub activated_stake: u64,
    pub delinquent: bool,
}

/// Identities of the current validator set
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: HashMap<String, ValidatorEntry>,
}

impl ValidatorSet {
    pub fn insert(&mut self, identity: impl Into<String>, entry: ValidatorEntry) {
        self.validators.insert(identity.into(), entry);
    }

    pub fn get(&self, identity: &str) -> Option<&ValidatorEntry> {
        self.validators.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.validators.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Identity -> published validator name
#[derive(Debug, Clone, Default)]
pub struct IdentityInfo {
    names: HashMap<String, String>,
}

impl IdentityInfo {
    pub fn insert(&mut self, identity: impl Into<String>, name: impl Into<String>) {
        self.names.insert(identity.into(), name.into());
    }

    pub fn name_for(&self, identity: &str) -> Option<&str> {
        self.names.get(identity).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// `solana gossip --output=json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliGossipNode {
    ip_address: Option<String>,
    identity_pubkey: Option<String>,
}

// `solana validators --output=json`
#[derive(Debug, Deserialize)]
struct CliValidators {
    #[serde(default)]
    validators: Vec<CliValidator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliValidator {
    identity_pubkey: Option<String>,
    #[serde(default)]
    vote_account_pubkey: String,
    #[serde(default)]
    activated_stake: u64,
    #[serde(default)]
    delinquent: bool,
}

// `solana validator-info get --output=json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliValidatorInfo {
    identity_pubkey: Option<String>,
    info: Option<CliValidatorInfoFields>,
}

#[derive(Debug, Deserialize)]
struct CliValidatorInfoFields {
    name: Option<String>,
}

pub fn parse_gossip_table(json: &str) -> Result<GossipTable> {
    let nodes: Vec<CliGossipNode> =
        serde_json::from_str(json).context("Could not decode JSON from `solana gossip`")?;

    let mut table = GossipTable::default();
    for node in nodes {
        if let (Some(ip), Some(identity)) = (node.ip_address, node.identity_pubkey) {
            if !ip.is_empty() && !identity.is_empty() {
                table.insert(ip, identity);
            }
        }
    }
    Ok(table)
}

pub fn parse_validator_set(json: &str) -> Result<ValidatorSet> {
    let parsed: CliValidators =
        serde_json::from_str(json).context("Could not decode JSON from `solana validators`")?;

    let mut set = ValidatorSet::default();
    for v in parsed.validators {
        let Some(identity) = v.identity_pubkey.filter(|id| !id.is_empty()) else {
            continue;
        };
        set.insert(
            identity,
            ValidatorEntry {
                vote_account: v.vote_account_pubkey,
                activated_stake: v.activated_stake,
                delinquent: v.delinquent,
            },
        );
    }
    Ok(set)
}

pub fn parse_identity_info(json: &str) -> Result<IdentityInfo> {
    let entries: Vec<CliValidatorInfo> = serde_json::from_str(json)
        .context("Could not decode JSON from `solana validator-info get`")?;

    let mut info = IdentityInfo::default();
    for entry in entries {
        if let (Some(identity), Some(name)) = (entry.identity_pubkey, entry.info.and_then(|i| i.name)) {
            if !identity.is_empty() && !name.is_empty() {
                info.insert(identity, name);
            }
        }
    }
    Ok(info)
}

/// Thin wrapper over the `solana` binary
pub struct SolanaCli {
    program: String,
}

impl Default for SolanaCli {
    fn default() -> Self {
        Self::new("solana")
    }
}

impl SolanaCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run_json(&self, args: &[&str], timeout: Duration) -> Result<String> {
        let command = display_command(&self.program, args);
        info!("Running command: `{}`", command);
        run_command(&self.program, args, timeout)
            .await
            .with_context(|| format!("Failed to run `{}`", command))
    }

    pub async fn fetch_gossip_table(&self) -> Result<GossipTable> {
        let json = self
            .run_json(&["gossip", "--output=json"], GOSSIP_TIMEOUT)
            .await?;
        let table = parse_gossip_table(&json)?;
        info!("Loaded {} gossip entries.", table.len());
        Ok(table)
    }

    pub async fn fetch_validator_set(&self) -> Result<ValidatorSet> {
        let json = self
            .run_json(&["validators", "--output=json"], VALIDATORS_TIMEOUT)
            .await?;
        let set = parse_validator_set(&json)?;
        info!("Loaded {} active validator identities.", set.len());
        Ok(set)
    }

    pub async fn fetch_identity_info(&self) -> Result<IdentityInfo> {
        let json = self
            .run_json(
                &["validator-info", "get", "--output=json"],
                VALIDATOR_INFO_TIMEOUT,
            )
            .await?;
        let info = parse_identity_info(&json)?;
        info!("Loaded {} validator details.", info.len());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOSSIP_JSON: &str = r#"[
        {"ipAddress": "10.0.0.5", "identityPubkey": "ABCvalidator111", "gossipPort": 8001, "tpuPort": 8003, "version": "2.2.14"},
        {"ipAddress": "10.0.0.7", "identityPubkey": "DEFgossiponly22", "gossipPort": 8001},
        {"ipAddress": "10.0.0.5", "identityPubkey": "SecondSeen33333"},
        {"identityPubkey": "NoAddress444444"}
    ]"#;

    #[test]
    fn test_parse_gossip_table() {
        let table = parse_gossip_table(GOSSIP_JSON).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.identity_for("10.0.0.5"), Some("ABCvalidator111"));
        assert_eq!(table.identity_for("10.0.0.7"), Some("DEFgossiponly22"));
        assert_eq!(table.identity_for("10.0.0.9"), None);
    }

    #[test]
    fn test_parse_gossip_table_rejects_garbage() {
        assert!(parse_gossip_table("Error: RPC request error").is_err());
    }

    #[test]
    fn test_parse_validator_set() {
        let json = r#"{
            "totalActiveStake": 1000,
            "validators": [
                {"identityPubkey": "ABCvalidator111", "voteAccountPubkey": "Vote111", "activatedStake": 700, "delinquent": false, "commission": 5},
                {"identityPubkey": "Late222", "voteAccountPubkey": "Vote222", "activatedStake": 300, "delinquent": true},
                {"voteAccountPubkey": "Orphan"}
            ]
        }"#;
        let set = parse_validator_set(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("ABCvalidator111"));
        assert_eq!(
            set.get("Late222"),
            Some(&ValidatorEntry {
                vote_account: "Vote222".to_string(),
                activated_stake: 300,
                delinquent: true,
            })
        );
    }

    #[test]
    fn test_parse_validator_set_missing_list() {
        let set = parse_validator_set("{}").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_parse_identity_info_skips_nameless() {
        let json = r#"[
            {"identityPubkey": "ABCvalidator111", "infoPubkey": "Info1", "info": {"name": "Acme Validator", "website": "https://acme.example"}},
            {"identityPubkey": "NoName222", "info": {"website": "https://x.example"}},
            {"identityPubkey": "EmptyName333", "info": {"name": ""}},
            {"identityPubkey": "NoInfo444"}
        ]"#;
        let info = parse_identity_info(json).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info.name_for("ABCvalidator111"), Some("Acme Validator"));
        assert_eq!(info.name_for("NoName222"), None);
    }

    #[tokio::test]
    async fn test_missing_solana_binary_is_fatal() {
        let cli = SolanaCli::new("definitely-not-solana-xyz");
        let err = cli.fetch_gossip_table().await.unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }
}
