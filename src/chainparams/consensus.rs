use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ChainParamsError;
use crate::llmq::params::{LlmqParams, LlmqType};
use crate::primitives::{Hash256, Target};
use crate::versionbits::VERSIONBITS_NUM_BITS;

/// Soft-fork deployments tracked through version bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPos {
    TestDummy,
    /// BIP68, BIP112 and BIP113.
    Csv,
    Dip0001,
    Bip147,
    Dip0003,
}

impl DeploymentPos {
    pub const ALL: [DeploymentPos; 5] = [
        DeploymentPos::TestDummy,
        DeploymentPos::Csv,
        DeploymentPos::Dip0001,
        DeploymentPos::Bip147,
        DeploymentPos::Dip0003,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeploymentPos::TestDummy => "testdummy",
            DeploymentPos::Csv => "csv",
            DeploymentPos::Dip0001 => "dip0001",
            DeploymentPos::Bip147 => "bip147",
            DeploymentPos::Dip0003 => "dip0003",
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DeploymentPos {
    type Error = ChainParamsError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        DeploymentPos::ALL
            .get(index as usize)
            .copied()
            .ok_or(ChainParamsError::UnknownDeployment(index))
    }
}

impl FromStr for DeploymentPos {
    type Err = ChainParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeploymentPos::ALL
            .iter()
            .copied()
            .find(|pos| pos.name() == s)
            .ok_or_else(|| ChainParamsError::UnknownDeploymentName(s.to_string()))
    }
}

impl fmt::Display for DeploymentPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static configuration of one version-bits deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deployment {
    /// Bit position in the block version (0..29).
    pub bit: u8,
    /// Median time past at which signalling may begin.
    pub start_time: i64,
    /// Median time past after which a deployment that has not locked in fails.
    pub timeout: i64,
    pub window_size: u32,
    pub threshold: u32,
}

impl Deployment {
    pub fn mask(&self) -> u32 {
        1u32 << self.bit
    }

    pub fn validate(&self, pos: DeploymentPos) -> Result<(), ChainParamsError> {
        let invalid = |reason: String| ChainParamsError::InvalidDeployment { name: pos.name(), reason };

        if self.bit >= VERSIONBITS_NUM_BITS {
            return Err(invalid(format!("bit {} is not below {}", self.bit, VERSIONBITS_NUM_BITS)));
        }
        if self.window_size == 0 {
            return Err(invalid("window size must be positive".into()));
        }
        if self.threshold > self.window_size {
            return Err(invalid(format!(
                "threshold {} exceeds window size {}",
                self.threshold, self.window_size
            )));
        }
        Ok(())
    }
}

/// One entry per [`DeploymentPos`]; lookups are an exhaustive `match`, so a
/// new deployment cannot be added without giving every network an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployments {
    pub test_dummy: Deployment,
    pub csv: Deployment,
    pub dip0001: Deployment,
    pub bip147: Deployment,
    pub dip0003: Deployment,
}

impl Deployments {
    pub fn get(&self, pos: DeploymentPos) -> &Deployment {
        match pos {
            DeploymentPos::TestDummy => &self.test_dummy,
            DeploymentPos::Csv => &self.csv,
            DeploymentPos::Dip0001 => &self.dip0001,
            DeploymentPos::Bip147 => &self.bip147,
            DeploymentPos::Dip0003 => &self.dip0003,
        }
    }

    pub fn get_mut(&mut self, pos: DeploymentPos) -> &mut Deployment {
        match pos {
            DeploymentPos::TestDummy => &mut self.test_dummy,
            DeploymentPos::Csv => &mut self.csv,
            DeploymentPos::Dip0001 => &mut self.dip0001,
            DeploymentPos::Bip147 => &mut self.bip147,
            DeploymentPos::Dip0003 => &mut self.dip0003,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeploymentPos, &Deployment)> + '_ {
        DeploymentPos::ALL.iter().map(move |pos| (*pos, self.get(*pos)))
    }

    /// Checks every deployment and that no two share a bit.
    pub fn validate(&self) -> Result<(), ChainParamsError> {
        let mut used = 0u32;
        for (pos, deployment) in self.iter() {
            deployment.validate(pos)?;
            if used & deployment.mask() != 0 {
                return Err(ChainParamsError::InvalidDeployment {
                    name: pos.name(),
                    reason: format!("bit {} is already used", deployment.bit),
                });
            }
            used |= deployment.mask();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsensusParams {
    pub hash_genesis_block: Hash256,
    pub hash_devnet_genesis_block: Option<Hash256>,
    pub subsidy_halving_interval: i32,
    pub masternode_payments_start_block: i32,
    pub masternode_payments_increase_block: i32,
    pub masternode_payments_increase_period: i32,
    pub instant_send_confirmations_required: i32,
    pub instant_send_keep_lock: i32,
    pub budget_payments_start_block: i32,
    pub budget_payments_cycle_blocks: i32,
    pub budget_payments_window_blocks: i32,
    pub superblock_start_block: i32,
    /// Zero means "do not check".
    pub superblock_start_hash: Hash256,
    pub superblock_cycle: i32,
    pub governance_min_quorum: i32,
    pub governance_filter_elements: i32,
    pub masternode_minimum_confirmations: i32,
    pub bip34_height: i32,
    pub bip34_hash: Hash256,
    pub bip65_height: i32,
    pub bip66_height: i32,
    pub dip0001_height: i32,
    pub pow_limit: Target,
    pub pow_target_timespan: i64,
    pub pow_target_spacing: i64,
    pub pow_allow_min_difficulty_blocks: bool,
    pub pow_no_retargeting: bool,
    /// `pow_kgw_height >= pow_dgw_height` means KGW is never used.
    pub pow_kgw_height: i32,
    pub pow_dgw_height: i32,
    /// Defaults for deployments that do not set their own window.
    pub rule_change_activation_threshold: u32,
    pub miner_confirmation_window: u32,
    pub deployments: Deployments,
    /// Zero disables the check.
    pub minimum_chain_work: Hash256,
    /// Zero disables assume-valid.
    pub default_assume_valid: Hash256,
    // devnet-only knobs, overridable through the test harness
    pub minimum_difficulty_blocks: i32,
    pub high_subsidy_blocks: i32,
    pub high_subsidy_factor: i32,
    pub llmqs: BTreeMap<LlmqType, LlmqParams>,
    pub llmq_allow_dummy_commitments: bool,
}

impl ConsensusParams {
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    pub fn deployment(&self, pos: DeploymentPos) -> &Deployment {
        self.deployments.get(pos)
    }

    pub fn llmq(&self, llmq_type: LlmqType) -> Option<&LlmqParams> {
        self.llmqs.get(&llmq_type)
    }
}
