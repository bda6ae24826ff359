use std::sync::{Arc, OnceLock};

use log::info;

use super::consensus::DeploymentPos;
use super::genesis::GenesisCheck;
use super::networks::{devnet_params, main_params, regtest_params, testnet_params};
use super::{format_time, Network, ParameterSet};
use crate::error::ChainParamsError;
use crate::primitives::{BlockHasher, Hash256};

/// Owns the four network profiles and tracks which one is active.
///
/// Main, test and regtest are built eagerly. The devnet profile is built on
/// first use because it has to mine its anchor block. Profiles are handed out
/// as `Arc`s; the test-harness mutators copy on write, so a reader holding an
/// earlier `Arc` keeps seeing the values it started with.
pub struct ChainRegistry {
    hasher: Arc<dyn BlockHasher>,
    check: GenesisCheck,
    main: Arc<ParameterSet>,
    testnet: Arc<ParameterSet>,
    regtest: Arc<ParameterSet>,
    devnet: Option<Arc<ParameterSet>>,
    devnet_name: Option<String>,
    active: Option<Network>,
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("hasher", &self.hasher.name())
            .field("check", &self.check)
            .field("devnet", &self.devnet.as_ref().map(|dev| dev.network_id.as_str()))
            .field("active", &self.active)
            .finish()
    }
}

impl ChainRegistry {
    pub fn new(hasher: Arc<dyn BlockHasher>, check: GenesisCheck) -> Result<Self, ChainParamsError> {
        let main = Arc::new(main_params(hasher.as_ref(), check)?);
        let testnet = Arc::new(testnet_params(hasher.as_ref(), check)?);
        let regtest = Arc::new(regtest_params(hasher.as_ref(), check)?);
        Ok(ChainRegistry {
            hasher,
            check,
            main,
            testnet,
            regtest,
            devnet: None,
            devnet_name: None,
            active: None,
        })
    }

    /// Name used when `select("dev")` has to build the devnet profile. Once
    /// the devnet exists only its own name is accepted.
    pub fn set_devnet_name(&mut self, name: impl Into<String>) -> Result<(), ChainParamsError> {
        let name = name.into();
        if let Some(existing) = &self.devnet {
            let requested = super::genesis::devnet_network_id(&name);
            if existing.network_id != requested {
                return Err(ChainParamsError::DevnetAlreadyInitialized {
                    existing: existing.network_id.clone(),
                    requested,
                });
            }
        }
        self.devnet_name = Some(name);
        Ok(())
    }

    pub fn devnet_name(&self) -> Option<&str> {
        self.devnet_name.as_deref()
    }

    /// Looks a profile up by selector string. Asking for `dev` before the
    /// devnet has been initialized is an error.
    pub fn profile(&self, name: &str) -> Result<&Arc<ParameterSet>, ChainParamsError> {
        let network: Network = name.parse()?;
        self.get(network).ok_or(ChainParamsError::DevnetNotInitialized)
    }

    pub fn get(&self, network: Network) -> Option<&Arc<ParameterSet>> {
        match network {
            Network::Main => Some(&self.main),
            Network::Testnet => Some(&self.testnet),
            Network::Devnet => self.devnet.as_ref(),
            Network::Regtest => Some(&self.regtest),
        }
    }

    /// Makes `name` the active profile, building the devnet on first selection.
    pub fn select(&mut self, name: &str) -> Result<Arc<ParameterSet>, ChainParamsError> {
        let network: Network = name.parse()?;
        if network == Network::Devnet && self.devnet.is_none() {
            let devnet_name = self.devnet_name.clone().ok_or(ChainParamsError::DevnetNameMissing)?;
            self.initialize_devnet(&devnet_name)?;
        }
        let selected = self
            .get(network)
            .cloned()
            .ok_or(ChainParamsError::DevnetNotInitialized)?;
        self.active = Some(network);
        info!("Selected chain params for {} ({})", selected.network_id, selected.genesis_hash());
        Ok(selected)
    }

    /// The active profile.
    ///
    /// # Panics
    ///
    /// Panics if no profile has been selected yet.
    pub fn active(&self) -> &Arc<ParameterSet> {
        self.try_active()
            .unwrap_or_else(|| panic!("chain params used before a network was selected"))
    }

    pub fn try_active(&self) -> Option<&Arc<ParameterSet>> {
        self.active.and_then(|network| self.get(network))
    }

    pub fn active_network(&self) -> Option<Network> {
        self.active
    }

    /// Builds the devnet profile for `name`. A second call with the same name
    /// returns the existing profile; a different name is refused until
    /// [`reset_devnet`](Self::reset_devnet) is called.
    pub fn initialize_devnet(&mut self, name: &str) -> Result<&Arc<ParameterSet>, ChainParamsError> {
        if let Some(existing) = &self.devnet {
            let requested = super::genesis::devnet_network_id(name);
            if existing.network_id != requested {
                return Err(ChainParamsError::DevnetAlreadyInitialized {
                    existing: existing.network_id.clone(),
                    requested,
                });
            }
        } else {
            let params = devnet_params(name, self.hasher.as_ref(), self.check)?;
            self.devnet = Some(Arc::new(params));
            self.devnet_name = Some(name.to_string());
        }
        self.devnet.as_ref().ok_or(ChainParamsError::DevnetNotInitialized)
    }

    /// Drops the devnet profile so tests can build another one.
    pub fn reset_devnet(&mut self) {
        self.devnet = None;
        if self.active == Some(Network::Devnet) {
            self.active = None;
        }
    }

    pub fn update_regtest_bip9_parameters(&mut self, pos: DeploymentPos, start_time: i64, timeout: i64) {
        let deployment = Arc::make_mut(&mut self.regtest).consensus.deployments.get_mut(pos);
        deployment.start_time = start_time;
        deployment.timeout = timeout;
        info!(
            "Regtest deployment {} now starts {} and times out {}",
            pos,
            format_time(start_time),
            format_time(timeout)
        );
    }

    pub fn update_regtest_budget_parameters(
        &mut self,
        masternode_payments_start_block: i32,
        budget_payments_start_block: i32,
        superblock_start_block: i32,
    ) {
        let consensus = &mut Arc::make_mut(&mut self.regtest).consensus;
        consensus.masternode_payments_start_block = masternode_payments_start_block;
        consensus.budget_payments_start_block = budget_payments_start_block;
        consensus.superblock_start_block = superblock_start_block;
        info!(
            "Regtest budget parameters: masternode payments {}, budget {}, superblocks {}",
            masternode_payments_start_block, budget_payments_start_block, superblock_start_block
        );
    }

    pub fn update_devnet_subsidy_and_diff_params(
        &mut self,
        minimum_difficulty_blocks: i32,
        high_subsidy_blocks: i32,
        high_subsidy_factor: i32,
    ) -> Result<(), ChainParamsError> {
        let devnet = self.devnet.as_mut().ok_or(ChainParamsError::DevnetNotInitialized)?;
        let consensus = &mut Arc::make_mut(devnet).consensus;
        consensus.minimum_difficulty_blocks = minimum_difficulty_blocks;
        consensus.high_subsidy_blocks = high_subsidy_blocks;
        consensus.high_subsidy_factor = high_subsidy_factor;
        info!(
            "Devnet subsidy/difficulty parameters: min difficulty blocks {}, high subsidy blocks {} x{}",
            minimum_difficulty_blocks, high_subsidy_blocks, high_subsidy_factor
        );
        Ok(())
    }

    /// Sets minimum chain work and assume-valid for `network`. Zero disables either.
    pub fn update_chain_work_params(
        &mut self,
        network: Network,
        minimum_chain_work: Hash256,
        default_assume_valid: Hash256,
    ) -> Result<(), ChainParamsError> {
        let slot = match network {
            Network::Main => &mut self.main,
            Network::Testnet => &mut self.testnet,
            Network::Regtest => &mut self.regtest,
            Network::Devnet => self.devnet.as_mut().ok_or(ChainParamsError::DevnetNotInitialized)?,
        };
        let consensus = &mut Arc::make_mut(slot).consensus;
        consensus.minimum_chain_work = minimum_chain_work;
        consensus.default_assume_valid = default_assume_valid;
        Ok(())
    }
}

static GLOBAL_PARAMS: OnceLock<Arc<ParameterSet>> = OnceLock::new();

/// Publishes `params` as the process-wide profile. Can only happen once.
pub fn install_params(params: Arc<ParameterSet>) -> Result<(), ChainParamsError> {
    GLOBAL_PARAMS.set(params).map_err(|_| ChainParamsError::ParamsAlreadyInstalled)
}

/// The process-wide profile.
///
/// # Panics
///
/// Panics if [`install_params`] has not been called.
pub fn params() -> &'static ParameterSet {
    try_params().unwrap_or_else(|| panic!("chain params used before they were installed"))
}

pub fn try_params() -> Option<&'static ParameterSet> {
    GLOBAL_PARAMS.get().map(Arc::as_ref)
}
