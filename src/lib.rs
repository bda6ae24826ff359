//! Consensus parameters and masternode quorum selection for the Blaze chain:
//! network profiles with their genesis anchors, BIP9 deployment voting and
//! the LLMQ parameter table.

pub mod blockchain;
pub mod chainparams;
pub mod error;
pub mod llmq;
pub mod primitives;
pub mod settings;
pub mod versionbits;

pub use chainparams::{ChainRegistry, Network, ParameterSet};
pub use error::{ChainError, ChainParamsError, QuorumError, SettingsError};
pub use settings::Settings;
