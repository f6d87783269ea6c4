// ============================================================================
// Correlator Module
// ============================================================================
// Joins an IP against gossip, validator set and validator-info tables

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::solana_cli::{GossipTable, IdentityInfo, ValidatorSet};

/// Name reported for a validator that never published validator-info
pub const UNKNOWN_VALIDATOR_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Gossip identity is in the active validator set
    Validator,
    /// Seen in gossip, not voting
    Gossip,
    GossipNotFound,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Validator => "validator",
            Status::Gossip => "gossip",
            Status::GossipNotFound => "gossip_not_found",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub identity: Option<String>,
    pub name: Option<String>,
}

pub fn classify(
    ip: &str,
    gossip: &GossipTable,
    validators: &ValidatorSet,
    identity_info: &IdentityInfo,
) -> Classification {
    let Some(identity) = gossip.identity_for(ip) else {
        return Classification {
            status: Status::GossipNotFound,
            identity: None,
            name: None,
        };
    };

    if validators.contains(identity) {
        let name = identity_info
            .name_for(identity)
            .unwrap_or(UNKNOWN_VALIDATOR_NAME);
        Classification {
            status: Status::Validator,
            identity: Some(identity.to_string()),
            name: Some(name.to_string()),
        }
    } else {
        Classification {
            status: Status::Gossip,
            identity: Some(identity.to_string()),
            name: None,
        }
    }
}
