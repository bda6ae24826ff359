//! Per-network chain profiles: consensus rules, genesis anchors, address
//! prefixes and quorum tables for main, test, dev and regtest.

pub mod consensus;
pub mod genesis;
pub mod networks;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ChainParamsError;
use crate::llmq::params::LlmqParams;
use crate::primitives::{Block, Hash256, Target};

pub use consensus::{ConsensusParams, Deployment, DeploymentPos, Deployments};
pub use genesis::GenesisCheck;
pub use registry::{install_params, params, try_params, ChainRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Network {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "test")]
    Testnet,
    #[serde(rename = "dev")]
    Devnet,
    #[serde(rename = "regtest")]
    Regtest,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Main, Network::Testnet, Network::Devnet, Network::Regtest];

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Testnet => "test",
            Network::Devnet => "dev",
            Network::Regtest => "regtest",
        }
    }
}

impl FromStr for Network {
    type Err = ChainParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Network::Main),
            "test" => Ok(Network::Testnet),
            "dev" => Ok(Network::Devnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(ChainParamsError::UnknownChain(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base58Type {
    PubkeyAddress,
    ScriptAddress,
    SecretKey,
    ExtPublicKey,
    ExtSecretKey,
}

impl Base58Type {
    pub const ALL: [Base58Type; 5] = [
        Base58Type::PubkeyAddress,
        Base58Type::ScriptAddress,
        Base58Type::SecretKey,
        Base58Type::ExtPublicKey,
        Base58Type::ExtSecretKey,
    ];
}

/// Four-byte version prefixes for base58check encodings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Base58Prefixes {
    pub pubkey_address: [u8; 4],
    pub script_address: [u8; 4],
    pub secret_key: [u8; 4],
    pub ext_public_key: [u8; 4],
    pub ext_secret_key: [u8; 4],
}

impl Base58Prefixes {
    pub fn get(&self, kind: Base58Type) -> &[u8; 4] {
        match kind {
            Base58Type::PubkeyAddress => &self.pubkey_address,
            Base58Type::ScriptAddress => &self.script_address,
            Base58Type::SecretKey => &self.secret_key,
            Base58Type::ExtPublicKey => &self.ext_public_key,
            Base58Type::ExtSecretKey => &self.ext_secret_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSeed {
    pub name: &'static str,
    pub host: &'static str,
}

/// Everything that distinguishes one network from another. Built once per
/// network and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub network: Network,
    pub network_id: String,
    pub consensus: ConsensusParams,
    pub message_start: [u8; 4],
    /// Uncompressed secp256k1 key; empty when the network has no alert key.
    pub alert_pubkey: Vec<u8>,
    pub default_port: u16,
    pub prune_after_height: u64,
    pub genesis: Block,
    pub devnet_genesis: Option<Block>,
    pub dns_seeds: Vec<DnsSeed>,
    pub base58_prefixes: Base58Prefixes,
    pub ext_coin_type: u32,
    pub checkpoints: BTreeMap<u32, Hash256>,
    pub mining_requires_peers: bool,
    pub default_consistency_checks: bool,
    pub require_standard: bool,
    pub require_routable_external_ip: bool,
    pub mine_blocks_on_demand: bool,
    pub allow_multiple_addresses_from_group: bool,
    pub allow_multiple_ports: bool,
    pub pool_max_transactions: u32,
    /// Seconds.
    pub fulfilled_request_expire_time: i64,
    pub spork_addresses: Vec<&'static str>,
    pub min_spork_keys: u32,
    pub bip9_check_masternodes_upgraded: bool,
}

impl ParameterSet {
    pub fn genesis_hash(&self) -> Hash256 {
        self.consensus.hash_genesis_block
    }

    pub fn devnet_genesis_hash(&self) -> Option<Hash256> {
        self.consensus.hash_devnet_genesis_block
    }

    pub fn base58_prefix(&self, kind: Base58Type) -> &[u8; 4] {
        self.base58_prefixes.get(kind)
    }

    /// Parses the alert key. Returns `None` for networks without one.
    pub fn alert_public_key(&self) -> Option<Result<secp256k1::PublicKey, secp256k1::Error>> {
        if self.alert_pubkey.is_empty() {
            None
        } else {
            Some(secp256k1::PublicKey::from_slice(&self.alert_pubkey))
        }
    }

    pub fn checkpoint(&self, height: u32) -> Option<&Hash256> {
        self.checkpoints.get(&height)
    }

    pub fn last_checkpoint_height(&self) -> Option<u32> {
        self.checkpoints.keys().next_back().copied()
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            network: self.network,
            network_id: self.network_id.clone(),
            message_start: hex::encode(self.message_start),
            default_port: self.default_port,
            genesis_hash: self.genesis_hash(),
            devnet_genesis_hash: self.devnet_genesis_hash(),
            pow_limit: self.consensus.pow_limit,
            deployments: self
                .consensus
                .deployments
                .iter()
                .map(|(pos, d)| DeploymentSummary {
                    name: pos.name(),
                    bit: d.bit,
                    start_time: format_time(d.start_time),
                    timeout: format_time(d.timeout),
                    window_size: d.window_size,
                    threshold: d.threshold,
                })
                .collect(),
            llmqs: self.consensus.llmqs.values().cloned().collect(),
            checkpoints: self.checkpoints.clone(),
        }
    }
}

/// JSON view of a profile for operators and tooling.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub network: Network,
    pub network_id: String,
    pub message_start: String,
    pub default_port: u16,
    pub genesis_hash: Hash256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devnet_genesis_hash: Option<Hash256>,
    pub pow_limit: Target,
    pub deployments: Vec<DeploymentSummary>,
    pub llmqs: Vec<LlmqParams>,
    pub checkpoints: BTreeMap<u32, Hash256>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    pub name: &'static str,
    pub bit: u8,
    pub start_time: String,
    pub timeout: String,
    pub window_size: u32,
    pub threshold: u32,
}

pub(crate) fn format_time(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_round_trip() {
        for network in Network::ALL {
            assert_eq!(network.as_str().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn unknown_network_is_an_error() {
        let err = "mainnet".parse::<Network>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown chain mainnet.");
    }

    #[test]
    fn times_render_as_rfc3339() {
        assert_eq!(format_time(1199145601), "2008-01-01T00:00:01+00:00");
    }
}
