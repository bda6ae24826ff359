use thiserror::Error;

use crate::primitives::Hash256;

/// Failures while building, selecting or overriding chain profiles.
///
/// Everything except the caller-input variants is fatal: a node must abort
/// startup rather than run with parameters it could not verify.
#[derive(Debug, Error)]
pub enum ChainParamsError {
    #[error("Unknown chain {0}.")]
    UnknownChain(String),

    #[error("{network}: genesis hash mismatch (expected {expected}, computed {computed} with {hasher})")]
    GenesisHashMismatch {
        network: String,
        expected: Hash256,
        computed: Hash256,
        hasher: &'static str,
    },

    #[error("{network}: genesis merkle root mismatch (expected {expected}, computed {computed})")]
    MerkleRootMismatch {
        network: String,
        expected: Hash256,
        computed: Hash256,
    },

    #[error("devnet name must not be empty")]
    EmptyDevnetName,

    #[error("could not find devnet genesis block for {0}")]
    DevnetNonceExhausted(String),

    #[error("invalid compact difficulty bits {0:#010x}")]
    InvalidDifficultyBits(u32),

    #[error("devnet parameters have not been initialized")]
    DevnetNotInitialized,

    #[error("devnet already initialized as {existing}, refusing to re-initialize as {requested}")]
    DevnetAlreadyInitialized { existing: String, requested: String },

    #[error("no devnet name configured for selecting the dev chain")]
    DevnetNameMissing,

    #[error("deployment index {0} is out of range")]
    UnknownDeployment(u8),

    #[error("unknown deployment name {0}")]
    UnknownDeploymentName(String),

    #[error("invalid deployment {name}: {reason}")]
    InvalidDeployment { name: &'static str, reason: String },

    #[error("invalid parameters for {name}: {reason}")]
    InvalidLlmqParams { name: &'static str, reason: String },

    #[error("process-wide chain params were already installed")]
    ParamsAlreadyInstalled,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("header builds on {prev}, chain tip is {tip}")]
    DoesNotExtendTip { tip: Hash256, prev: Hash256 },
}

#[derive(Debug, Error)]
pub enum QuorumError {
    #[error("unknown llmq type {0}")]
    UnknownLlmqType(u8),

    #[error("llmq type {0} is not enabled on this network")]
    LlmqTypeNotEnabled(u8),

    #[error("no masternode list available for block {0}")]
    MasternodeListUnavailable(Hash256),

    #[error("bitset has {actual} entries, quorum size is {expected}")]
    InvalidBitsetSize { expected: usize, actual: usize },

    #[error("{field} count {count} is below the minimum of {min}")]
    NotEnoughMembers { field: &'static str, count: usize, min: usize },

    #[error("commitment is for llmq type {actual}, expected {expected}")]
    LlmqTypeMismatch { expected: u8, actual: u8 },

    #[error("unsupported commitment version {0}")]
    InvalidVersion(u16),

    #[error("member bit {0} is set beyond the end of the member list")]
    MemberBitOutOfRange(usize),

    #[error("quorum public key is not valid")]
    InvalidPublicKey,

    #[error("null commitment carries data")]
    NonNullNullCommitment,

    #[error("quorum signature is invalid")]
    InvalidQuorumSignature,

    #[error("aggregated member signature is invalid")]
    InvalidMembersSignature,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid hash for {field}: {source}")]
    InvalidHash {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("{section} overrides only apply to the {expected} network, selected network is {selected}")]
    OverrideNetworkMismatch {
        section: &'static str,
        expected: &'static str,
        selected: String,
    },

    #[error(transparent)]
    ChainParams(#[from] ChainParamsError),
}
